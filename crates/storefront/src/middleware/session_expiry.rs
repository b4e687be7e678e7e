//! Global handling of tokens the backend rejected.
//!
//! Handlers turn a backend 401 into [`AppError::SessionExpired`](crate::error::AppError),
//! whose response carries a [`SessionExpired`] marker. This middleware sees
//! the marker, clears the session (unless the backend said no token was sent
//! at all) and redirects to the right login page with `redirect` set to where
//! the user was.

use axum::{
    extract::Request,
    http::{HeaderValue, Method, StatusCode, header::REFERER},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use url::Url;

use crate::api::TOKEN_NOT_PROVIDED;
use crate::error::SessionExpired;
use crate::middleware::auth::login_path;
use crate::models::SessionUser;
use crate::services::{flash, load_state, session::clear_auth};

/// Where to send the user back to after logging in again.
///
/// GET requests return to themselves. Form posts return to the page the
/// form was on, when the referer is a path on this site.
fn return_target(request: &Request) -> String {
    let own = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
        .to_string();
    if request.method() == Method::GET {
        return own;
    }

    request
        .headers()
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| Url::parse(referer).ok())
        .filter(|url| {
            request
                .headers()
                .get(axum::http::header::HOST)
                .and_then(|host| host.to_str().ok())
                .is_some_and(|host| url.authority() == host)
        })
        .map_or(own, |url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        })
}

/// Login page to send the user to.
///
/// A missing token says nothing about who the user is, so only the path
/// decides. A rejected token sends staff to the back-office login.
fn login_location(target: &str, code: Option<&str>, was_staff: bool) -> String {
    let token_missing = code == Some(TOKEN_NOT_PROVIDED);
    login_path(target, was_staff && !token_missing)
}

/// Middleware that invalidates the session when the backend rejects its token.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let target = return_target(&request);
    let is_htmx = request.headers().contains_key("hx-request");

    let response = next.run(request).await;
    let Some(marker) = response.extensions().get::<SessionExpired>().cloned() else {
        return response;
    };

    let was_staff = load_state(&session)
        .await
        .user()
        .is_some_and(SessionUser::is_staff);

    if marker.code.as_deref() == Some(TOKEN_NOT_PROVIDED) {
        tracing::debug!("Backend reported a missing token; session kept");
    } else {
        tracing::info!(code = ?marker.code, "Backend rejected session token, logging out");
        if let Err(e) = clear_auth(&session).await {
            tracing::warn!(error = %e, "Failed to clear expired session");
        }
        flash::warning(&session, "Sua sessão expirou. Faça login novamente.").await;
    }

    let location = login_location(&target, marker.code.as_deref(), was_staff);
    if is_htmx {
        let mut redirect = StatusCode::NO_CONTENT.into_response();
        if let Ok(value) = HeaderValue::from_str(&location) {
            redirect.headers_mut().insert("hx-redirect", value);
        }
        return redirect;
    }
    Redirect::to(&location).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_token_uses_role() {
        assert_eq!(
            login_location("/produtos", Some("TOKEN_INVALIDO"), true),
            "/admin/login?redirect=%2Fprodutos"
        );
        assert_eq!(
            login_location("/produtos", None, false),
            "/login?redirect=%2Fprodutos"
        );
    }

    #[test]
    fn test_missing_token_uses_path_only() {
        assert_eq!(
            login_location("/checkout", Some(TOKEN_NOT_PROVIDED), true),
            "/login?redirect=%2Fcheckout"
        );
        assert_eq!(
            login_location("/admin/pedidos", Some(TOKEN_NOT_PROVIDED), false),
            "/admin/login?redirect=%2Fadmin%2Fpedidos"
        );
    }
}
