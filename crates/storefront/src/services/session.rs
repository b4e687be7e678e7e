//! Session store: who is logged in, and with which backend token.
//!
//! The token and the cached user live together under one session key as an
//! [`AuthSession`]. Every request rehydrates it through [`load_state`] before
//! any render-dependent decision.

use thiserror::Error;
use tower_sessions::Session;

use mix_catalogo_core::{Email, EmailError, UserRole};

use crate::api::{ApiClient, ApiError, ApiToken, AuthResponse, ProfileUpdate, RegisterRequest, User};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{AuthSession, SessionUser, session_keys};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A required field was left blank.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Password shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("password too short")]
    WeakPassword,

    /// Self-registration is limited to customers and vendors.
    #[error("role not allowed for registration: {0}")]
    RoleNotAllowed(UserRole),

    /// No one is logged in.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The backend refused or failed.
    #[error("backend error: {0}")]
    Api(#[from] ApiError),

    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// Message to show the user; `fallback` covers backend and store failures
    /// that carry no message of their own.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::InvalidEmail(err) => err.to_string(),
            Self::MissingField(_) => "Preencha todos os campos obrigatórios".to_string(),
            Self::PasswordMismatch => "As senhas não coincidem".to_string(),
            Self::WeakPassword => {
                format!("A senha deve ter no mínimo {MIN_PASSWORD_LENGTH} caracteres")
            }
            Self::RoleNotAllowed(_) => "Tipo de conta inválido".to_string(),
            Self::NotAuthenticated => "Você precisa estar logado".to_string(),
            Self::Api(err) => err.user_message(fallback),
            Self::Session(_) => fallback.to_string(),
        }
    }
}

/// What the current request knows about its user.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// The session backend could not be read; nothing can be decided yet.
    Loading,
    /// No valid session.
    Anonymous,
    /// Token and user present.
    Authenticated(AuthSession),
}

impl SessionState {
    /// The logged-in session, if any.
    #[must_use]
    pub const fn auth(&self) -> Option<&AuthSession> {
        match self {
            Self::Authenticated(auth) => Some(auth),
            Self::Loading | Self::Anonymous => None,
        }
    }

    /// Consume into the logged-in session, if any.
    #[must_use]
    pub fn into_auth(self) -> Option<AuthSession> {
        match self {
            Self::Authenticated(auth) => Some(auth),
            Self::Loading | Self::Anonymous => None,
        }
    }

    /// The cached user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.auth().map(|auth| &auth.user)
    }
}

/// Rehydrate the session.
///
/// A store failure yields [`SessionState::Loading`]. An entry that does not
/// decode (for instance a token without a user) is removed and treated as
/// logged out.
pub async fn load_state(session: &Session) -> SessionState {
    match session.get_value(session_keys::AUTH).await {
        Err(e) => {
            tracing::warn!(error = %e, "Session store unavailable");
            SessionState::Loading
        }
        Ok(None) => SessionState::Anonymous,
        Ok(Some(value)) => match serde_json::from_value::<AuthSession>(value) {
            Ok(auth) => SessionState::Authenticated(auth),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding malformed auth session");
                if let Err(e) = session.remove_value(session_keys::AUTH).await {
                    tracing::warn!(error = %e, "Failed to remove malformed auth session");
                }
                SessionState::Anonymous
            }
        },
    }
}

/// Remove token, user, and cart snapshot.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove_value(session_keys::AUTH).await?;
    session.remove_value(session_keys::CART).await?;
    clear_sentry_user();
    Ok(())
}

/// Where to send a user after login.
///
/// A local `redirect` target wins; otherwise staff go to the dashboard and
/// customers to the shop.
#[must_use]
pub fn post_login_path(user: &SessionUser, redirect: Option<&str>) -> String {
    redirect
        .and_then(safe_redirect)
        .unwrap_or_else(|| user.role.home_path())
        .to_string()
}

/// Accept only same-origin absolute paths.
#[must_use]
pub fn safe_redirect(target: &str) -> Option<&str> {
    let target = target.trim();
    let local = target.starts_with('/') && !target.starts_with("//") && !target.contains('\\');
    local.then_some(target)
}

/// Registration form contents.
#[derive(Debug)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
    pub phone: Option<&'a str>,
    pub role: UserRole,
}

impl Registration<'_> {
    /// Local checks run before the backend is called.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<Email, AuthError> {
        if self.name.trim().is_empty() {
            return Err(AuthError::MissingField("nome"));
        }
        let email = Email::parse(self.email)?;
        if self.password != self.password_confirmation {
            return Err(AuthError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        if self.role == UserRole::Admin {
            return Err(AuthError::RoleNotAllowed(self.role));
        }
        Ok(email)
    }
}

/// Session operations for one request.
pub struct SessionStore<'a> {
    session: &'a Session,
    api: &'a ApiClient,
}

impl<'a> SessionStore<'a> {
    /// Create a session store for the current request.
    #[must_use]
    pub const fn new(session: &'a Session, api: &'a ApiClient) -> Self {
        Self { session, api }
    }

    /// Rehydrate the current state.
    pub async fn state(&self) -> SessionState {
        load_state(self.session).await
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and
    /// `AuthError::Api` with the backend's message when credentials are
    /// rejected.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(AuthError::MissingField("senha"));
        }

        let response = self.api.login(email.as_str(), password).await?;
        self.establish(response).await
    }

    /// Create an account and log into it.
    ///
    /// # Errors
    ///
    /// Returns the first failing local rule, or `AuthError::Api` when the
    /// backend refuses (e.g. duplicate email).
    #[tracing::instrument(skip(self, registration), fields(role = %registration.role))]
    pub async fn register(&self, registration: &Registration<'_>) -> Result<SessionUser, AuthError> {
        let email = registration.validate()?;

        let request = RegisterRequest {
            email: email.as_str(),
            password: registration.password,
            name: registration.name.trim(),
            role: registration.role,
            phone: registration.phone.map(str::trim).filter(|p| !p.is_empty()),
        };
        let response = self.api.register(None, &request).await?;
        self.establish(response).await
    }

    /// Drop token, user, and cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn logout(&self) -> Result<(), AuthError> {
        clear_auth(self.session).await?;
        self.session.cycle_id().await?;
        tracing::info!("User logged out");
        Ok(())
    }

    /// Replace the cached user (after a profile edit).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if no one is logged in.
    pub async fn update_user(&self, user: User) -> Result<SessionUser, AuthError> {
        let mut auth = self.state().await.into_auth().ok_or(AuthError::NotAuthenticated)?;
        auth.user = user.into();
        self.session.insert(session_keys::AUTH, &auth).await?;
        Ok(auth.user)
    }

    /// `PUT /auth/perfil`, then cache the returned user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if no one is logged in, or
    /// `AuthError::Api` if the backend rejects the update.
    pub async fn update_profile(
        &self,
        name: &str,
        phone: Option<&str>,
    ) -> Result<SessionUser, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("nome"));
        }
        let auth = self.state().await.into_auth().ok_or(AuthError::NotAuthenticated)?;
        let update = ProfileUpdate {
            name,
            phone: phone.map(str::trim).filter(|p| !p.is_empty()),
        };
        let user = self.api.update_profile(&auth.token, &update).await?;
        self.update_user(user).await
    }

    /// Persist a fresh login atomically and reset per-user state.
    async fn establish(&self, response: AuthResponse) -> Result<SessionUser, AuthError> {
        let auth = AuthSession {
            token: ApiToken::new(response.token),
            user: response.user.into(),
        };

        self.session.cycle_id().await?;
        self.session.insert(session_keys::AUTH, &auth).await?;
        self.session.remove_value(session_keys::CART).await?;

        set_sentry_user(&auth.user.id, Some(auth.user.email.as_str()));
        tracing::info!(user_id = %auth.user.id, role = %auth.user.role, "User logged in");

        Ok(auth.user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use mix_catalogo_core::UserId;
    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn user(role: UserRole) -> SessionUser {
        SessionUser {
            id: UserId::new(1),
            email: Email::parse("ana@mix.com").unwrap(),
            name: "Ana".to_string(),
            role,
            phone: None,
        }
    }

    fn registration<'a>(password: &'a str, confirmation: &'a str) -> Registration<'a> {
        Registration {
            name: "Ana",
            email: "ana@mix.com",
            password,
            password_confirmation: confirmation,
            phone: None,
            role: UserRole::Customer,
        }
    }

    #[tokio::test]
    async fn test_empty_session_is_anonymous() {
        let session = session();
        assert!(matches!(load_state(&session).await, SessionState::Anonymous));
    }

    #[tokio::test]
    async fn test_stored_auth_is_authenticated() {
        let session = session();
        let auth = AuthSession {
            token: ApiToken::new("tok"),
            user: user(UserRole::Vendor),
        };
        session.insert(session_keys::AUTH, &auth).await.unwrap();

        let state = load_state(&session).await;
        assert_eq!(state.user().map(|u| u.role), Some(UserRole::Vendor));
    }

    #[tokio::test]
    async fn test_user_without_token_is_logged_out_and_removed() {
        let session = session();
        session
            .insert(
                session_keys::AUTH,
                json!({"user": {"id": 1, "email": "ana@mix.com", "name": "Ana", "role": "admin"}}),
            )
            .await
            .unwrap();

        assert!(matches!(load_state(&session).await, SessionState::Anonymous));
        assert!(session.get_value(session_keys::AUTH).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_auth_drops_cart_snapshot() {
        let session = session();
        session
            .insert(session_keys::AUTH, AuthSession {
                token: ApiToken::new("tok"),
                user: user(UserRole::Customer),
            })
            .await
            .unwrap();
        session
            .insert(session_keys::CART, json!({"owner": 1, "cart": null}))
            .await
            .unwrap();

        clear_auth(&session).await.unwrap();

        assert!(session.get_value(session_keys::AUTH).await.unwrap().is_none());
        assert!(session.get_value(session_keys::CART).await.unwrap().is_none());
    }

    #[test]
    fn test_post_login_path_by_role() {
        assert_eq!(post_login_path(&user(UserRole::Vendor), None), "/admin/dashboard");
        assert_eq!(post_login_path(&user(UserRole::Admin), None), "/admin/dashboard");
        assert_eq!(post_login_path(&user(UserRole::Customer), None), "/");
    }

    #[test]
    fn test_post_login_path_honours_local_redirect() {
        assert_eq!(
            post_login_path(&user(UserRole::Customer), Some("/checkout")),
            "/checkout"
        );
        assert_eq!(
            post_login_path(&user(UserRole::Admin), Some("/admin/pedidos?status=pendente")),
            "/admin/pedidos?status=pendente"
        );
        assert_eq!(
            post_login_path(&user(UserRole::Customer), Some("https://evil.example")),
            "/"
        );
        assert_eq!(post_login_path(&user(UserRole::Customer), Some("//evil.example")), "/");
    }

    #[test]
    fn test_registration_rules() {
        assert!(registration("segredo", "segredo").validate().is_ok());
        assert!(matches!(
            registration("segredo", "segredx").validate(),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            registration("12345", "12345").validate(),
            Err(AuthError::WeakPassword)
        ));

        let admin = Registration {
            role: UserRole::Admin,
            ..registration("segredo", "segredo")
        };
        assert!(matches!(admin.validate(), Err(AuthError::RoleNotAllowed(_))));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AuthError::PasswordMismatch.user_message("Erro"),
            "As senhas não coincidem"
        );
        assert_eq!(
            AuthError::WeakPassword.user_message("Erro"),
            "A senha deve ter no mínimo 6 caracteres"
        );
        assert_eq!(
            AuthError::Api(ApiError::EmptyBody).user_message("Erro ao fazer login"),
            "Erro ao fazer login"
        );
    }
}
