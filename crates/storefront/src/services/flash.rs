//! Flash notifications stored in the session until the next render.

use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::AppError;
use crate::models::{Toast, session_keys};

/// Queue a toast for the next page. Store failures are logged, not raised.
pub async fn push(session: &Session, toast: Toast) {
    if let Err(e) = session.insert(session_keys::TOAST, toast).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

pub async fn success(session: &Session, message: impl Into<String>) {
    push(session, Toast::success(message)).await;
}

pub async fn error(session: &Session, message: impl Into<String>) {
    push(session, Toast::error(message)).await;
}

pub async fn warning(session: &Session, message: impl Into<String>) {
    push(session, Toast::warning(message)).await;
}

/// Put back a toast that was taken but never rendered, unless a newer one
/// is already queued.
pub async fn keep(session: &Session, toast: Toast) {
    match session.get::<Toast>(session_keys::TOAST).await {
        Ok(None) => push(session, toast).await,
        Ok(Some(_)) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read flash message"),
    }
}

/// Remove and return the pending toast.
pub async fn take(session: &Session) -> Option<Toast> {
    session
        .remove::<Toast>(session_keys::TOAST)
        .await
        .ok()
        .flatten()
}

/// Surface a backend failure from a form action.
///
/// # Errors
///
/// A 401 becomes `AppError::SessionExpired` so the session is invalidated;
/// every other failure is queued as an error toast with the backend's
/// message or `fallback`.
pub async fn report_api_error(
    session: &Session,
    err: ApiError,
    fallback: &str,
) -> Result<(), AppError> {
    if err.is_unauthorized() {
        return Err(AppError::from(err));
    }
    tracing::warn!(error = %err, "Backend action failed");
    error(session, err.user_message(fallback)).await;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::ToastKind;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_toast_is_shown_once() {
        let session = session();
        success(&session, "Produto adicionado ao carrinho!").await;

        let toast = take(&session).await.unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.message, "Produto adicionado ao carrinho!");
        assert!(take(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_report_uses_backend_message_or_fallback() {
        let session = session();
        let err = ApiError::Status {
            status: 400,
            message: Some("Estoque insuficiente".to_string()),
        };
        report_api_error(&session, err, "Erro ao criar pedido").await.unwrap();
        assert_eq!(take(&session).await.unwrap().message, "Estoque insuficiente");

        report_api_error(&session, ApiError::EmptyBody, "Erro ao criar pedido")
            .await
            .unwrap();
        assert_eq!(take(&session).await.unwrap().message, "Erro ao criar pedido");
    }

    #[tokio::test]
    async fn test_report_escalates_unauthorized() {
        let session = session();
        let err = ApiError::Unauthorized {
            code: Some("TOKEN_INVALIDO".to_string()),
            message: None,
        };
        let result = report_api_error(&session, err, "Erro").await;
        assert!(matches!(result, Err(AppError::SessionExpired { .. })));
        assert!(take(&session).await.is_none());
    }
}
