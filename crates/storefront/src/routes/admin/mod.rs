//! Back-office route handlers (`/admin`).
//!
//! Every handler takes [`RequireStaff`](crate::middleware::RequireStaff) or
//! [`RequireAdmin`](crate::middleware::RequireAdmin) as its first extractor,
//! so the guard runs before anything else touches the session. Mutations are
//! form posts that redirect back to the listing with a flash toast.

pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod profile;
pub mod promotions;
pub mod vendors;

use axum::response::Redirect;
use tower_sessions::Session;

use crate::api::ApiError;
use crate::error::Result;
use crate::services::flash;

/// `GET /admin`.
pub async fn index() -> Redirect {
    Redirect::to("/admin/dashboard")
}

/// Flash the outcome of a backend mutation and redirect to `back`.
///
/// # Errors
///
/// A rejected token is propagated so the session is invalidated.
pub(crate) async fn finish<T>(
    session: &Session,
    result: std::result::Result<T, ApiError>,
    success: &str,
    failure: &str,
    back: &str,
) -> Result<Redirect> {
    match result {
        Ok(_) => flash::success(session, success).await,
        Err(e) => flash::report_api_error(session, e, failure).await?,
    }
    Ok(Redirect::to(back))
}

/// Trimmed form text, `None` when blank.
pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::header::LOCATION;
    use axum::response::IntoResponse;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::ToastKind;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn test_optional_trims_blank() {
        assert_eq!(optional("  "), None);
        assert_eq!(optional(" Azul "), Some("Azul".to_string()));
    }

    #[tokio::test]
    async fn test_finish_flashes_backend_message() {
        let session = session();
        let err = ApiError::Status {
            status: 409,
            message: Some("Categoria possui produtos".to_string()),
        };

        let redirect = finish::<()>(
            &session,
            Err(err),
            "ok",
            "Erro ao deletar categoria",
            "/admin/categorias",
        )
        .await
        .unwrap();
        let response = redirect.into_response();
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/admin/categorias");

        let toast = flash::take(&session).await.unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Categoria possui produtos");
    }

    #[tokio::test]
    async fn test_finish_propagates_rejected_token() {
        let session = session();
        let err = ApiError::Unauthorized {
            code: Some("TOKEN_INVALIDO".to_string()),
            message: None,
        };

        let result = finish::<()>(&session, Err(err), "ok", "erro", "/admin").await;
        assert!(result.is_err());
        assert!(flash::take(&session).await.is_none());
    }
}
