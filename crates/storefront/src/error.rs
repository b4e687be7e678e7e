//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! A 401 from the backend becomes [`AppError::SessionExpired`]. Its response
//! carries a [`SessionExpired`] extension which
//! [`session_expiry_middleware`](crate::middleware::session_expiry_middleware)
//! turns into session invalidation plus a login redirect.

use std::any::Any;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::services::{AuthError, CartError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// MIX backend call failed.
    #[error("Backend error: {0}")]
    Api(ApiError),

    /// The backend rejected the session token.
    #[error("Session expired")]
    SessionExpired { code: Option<String> },

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { code, .. } => Self::SessionExpired { code },
            ApiError::NotFound { message } => {
                Self::NotFound(message.unwrap_or_else(|| "Recurso não encontrado".to_string()))
            }
            other => Self::Api(other),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Api(api) => Self::from(api),
            other => Self::BadRequest(other.user_message("")),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Api(api) => Self::from(api),
            AuthError::Session(session) => Self::Session(session),
            other => Self::BadRequest(other.user_message("")),
        }
    }
}

/// Response extension marking a rejected backend token.
#[derive(Debug, Clone)]
pub struct SessionExpired {
    /// Backend error code, e.g. `TOKEN_NAO_FORNECIDO`.
    pub code: Option<String>,
}

/// Standalone error page; it does not depend on session state.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}

impl ErrorTemplate {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Api(_) | Self::Internal(_) | Self::Session(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Internal(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::SessionExpired { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) | Self::Session(_) => "Erro interno do servidor".to_string(),
            Self::Api(err) => err.user_message("Serviço indisponível. Tente novamente em instantes."),
            Self::SessionExpired { .. } => "Sua sessão expirou. Faça login novamente.".to_string(),
            Self::NotFound(what) => what.clone(),
            Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Muitas tentativas. Aguarde um momento.".to_string(),
        };

        let mut response = (status, ErrorTemplate::new(status, message)).into_response();
        if let Self::SessionExpired { code } = self {
            response.extensions_mut().insert(SessionExpired { code });
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Response for a handler panic caught by `CatchPanicLayer`.
#[must_use]
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorTemplate::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Ocorreu um erro inesperado ao exibir esta página.",
        ),
    )
        .into_response()
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
