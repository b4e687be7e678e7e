//! Route guard extractors.
//!
//! | user    | loading | role allowed | action               |
//! |---------|---------|--------------|----------------------|
//! | none    | yes     | -            | loading page (retry) |
//! | none    | no      | -            | redirect to login    |
//! | present | no      | no           | redirect to role home|
//! | present | no      | yes          | handler runs         |
//!
//! The login redirect always carries `redirect=<path + query>`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use mix_catalogo_core::UserRole;

use crate::models::AuthSession;
use crate::services::{SessionState, load_state};

/// What the guard does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    ShowLoading,
    RedirectToLogin,
    RedirectHome(&'static str),
    Allow,
}

/// Apply the guard table.
#[must_use]
pub fn guard_decision(state: &SessionState, allowed: &[UserRole]) -> GuardDecision {
    match state {
        SessionState::Loading => GuardDecision::ShowLoading,
        SessionState::Anonymous => GuardDecision::RedirectToLogin,
        SessionState::Authenticated(auth) if allowed.contains(&auth.user.role) => {
            GuardDecision::Allow
        }
        SessionState::Authenticated(auth) => GuardDecision::RedirectHome(auth.user.role.home_path()),
    }
}

/// Login URL for a request to `target` (path plus query).
///
/// Back-office paths and former staff sessions use `/admin/login`.
#[must_use]
pub fn login_path(target: &str, was_staff: bool) -> String {
    let base = if was_staff || is_admin_path(target) {
        "/admin/login"
    } else {
        "/login"
    };
    format!("{base}?redirect={}", urlencoding::encode(target))
}

fn is_admin_path(target: &str) -> bool {
    target == "/admin" || target.starts_with("/admin/") || target.starts_with("/admin?")
}

/// The full requested path; nested routers see the URI with their prefix
/// stripped, so the original is preferred.
fn requested_target(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |OriginalUri(uri)| uri);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string())
}

/// Page shown while the session cannot be read; it reloads itself.
#[derive(Template, WebTemplate)]
#[template(path = "loading.html")]
pub struct LoadingTemplate {
    pub retry_url: String,
}

/// Why a guarded request did not reach its handler.
#[derive(Debug)]
pub enum GuardRejection {
    Loading { retry_url: String },
    RedirectToLogin(String),
    RedirectHome(&'static str),
    /// `SessionManagerLayer` is not installed.
    MissingSession,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Loading { retry_url } => {
                let mut response = (
                    StatusCode::SERVICE_UNAVAILABLE,
                    LoadingTemplate { retry_url },
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from_static("2"));
                response
            }
            Self::RedirectToLogin(to) => Redirect::to(&to).into_response(),
            Self::RedirectHome(to) => Redirect::to(to).into_response(),
            Self::MissingSession => {
                tracing::error!("Session layer missing from router");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Run the guard for `allowed` roles.
async fn guard(parts: &Parts, allowed: &[UserRole]) -> Result<AuthSession, GuardRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(GuardRejection::MissingSession)?;

    let state = load_state(session).await;
    match guard_decision(&state, allowed) {
        GuardDecision::Allow => state.into_auth().ok_or(GuardRejection::MissingSession),
        GuardDecision::ShowLoading => Err(GuardRejection::Loading {
            retry_url: requested_target(parts),
        }),
        GuardDecision::RedirectToLogin => Err(GuardRejection::RedirectToLogin(login_path(
            &requested_target(parts),
            false,
        ))),
        GuardDecision::RedirectHome(home) => Err(GuardRejection::RedirectHome(home)),
    }
}

/// Extractor for back-office pages: admins and vendors.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireStaff(auth): RequireStaff) -> impl IntoResponse {
///     format!("Olá, {}!", auth.user.name)
/// }
/// ```
pub struct RequireStaff(pub AuthSession);

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        guard(parts, UserRole::STAFF).await.map(Self)
    }
}

/// Extractor for admin-only pages (vendor management).
pub struct RequireAdmin(pub AuthSession);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        guard(parts, &[UserRole::Admin]).await.map(Self)
    }
}

/// Extractor that optionally gets the current session.
///
/// Never rejects; a session that cannot be read counts as anonymous here.
pub struct OptionalAuth(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => load_state(session).await.into_auth(),
            None => None,
        };
        Ok(Self(auth))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mix_catalogo_core::{Email, UserId};

    use super::*;
    use crate::api::ApiToken;
    use crate::models::SessionUser;

    fn authenticated(role: UserRole) -> SessionState {
        SessionState::Authenticated(AuthSession {
            token: ApiToken::new("tok"),
            user: SessionUser {
                id: UserId::new(1),
                email: Email::parse("user@mix.com").unwrap(),
                name: "User".to_string(),
                role,
                phone: None,
            },
        })
    }

    #[test]
    fn test_guard_table() {
        let staff = UserRole::STAFF;
        assert_eq!(
            guard_decision(&SessionState::Loading, staff),
            GuardDecision::ShowLoading
        );
        assert_eq!(
            guard_decision(&SessionState::Anonymous, staff),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(
            guard_decision(&authenticated(UserRole::Customer), staff),
            GuardDecision::RedirectHome("/")
        );
        assert_eq!(
            guard_decision(&authenticated(UserRole::Vendor), staff),
            GuardDecision::Allow
        );
        assert_eq!(
            guard_decision(&authenticated(UserRole::Admin), staff),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_vendor_is_sent_home_from_admin_only_pages() {
        assert_eq!(
            guard_decision(&authenticated(UserRole::Vendor), &[UserRole::Admin]),
            GuardDecision::RedirectHome("/admin/dashboard")
        );
    }

    #[test]
    fn test_login_path_keeps_requested_target() {
        assert_eq!(
            login_path("/admin/vendedores", false),
            "/admin/login?redirect=%2Fadmin%2Fvendedores"
        );
        assert_eq!(
            login_path("/admin/pedidos?status=pendente", false),
            "/admin/login?redirect=%2Fadmin%2Fpedidos%3Fstatus%3Dpendente"
        );
        assert_eq!(login_path("/checkout", false), "/login?redirect=%2Fcheckout");
        assert_eq!(login_path("/carrinho", true), "/admin/login?redirect=%2Fcarrinho");
        assert_eq!(login_path("/administracao", false), "/login?redirect=%2Fadministracao");
    }
}
