//! Per-request data every page layout needs.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::Redirect,
};
use tower_sessions::Session;

use crate::models::{CartSnapshot, SessionUser, Toast, session_keys};
use crate::services::{flash, load_state};

/// Header and notification data for the base layouts.
///
/// Extracting it consumes the pending toast. Handlers that end in a
/// redirect instead of a render use [`PageContext::redirect`] so the toast
/// reaches the next page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<SessionUser>,
    /// Badge count from the session's cart snapshot, if it is this user's.
    pub cart_count: u32,
    pub toast: Option<Toast>,
    pub path: String,
    /// Path and query, for "come back here" links.
    pub url: String,
    session: Option<Session>,
}

impl PageContext {
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.user.as_ref().is_some_and(SessionUser::is_staff)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(SessionUser::is_admin)
    }

    /// Whether the current path is within `prefix` (navigation highlighting).
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        self.path == prefix || self.path.starts_with(&format!("{prefix}/"))
    }

    /// Redirect without rendering, handing the unshown toast back to the
    /// session.
    pub async fn redirect(self, to: &str) -> Redirect {
        if let (Some(session), Some(toast)) = (&self.session, self.toast) {
            flash::keep(session, toast).await;
        }
        Redirect::to(to)
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |OriginalUri(uri)| uri);
        let path = uri.path().to_string();
        let url = uri
            .path_and_query()
            .map_or_else(|| path.clone(), |pq| pq.as_str().to_string());
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self {
                path,
                url,
                ..Self::default()
            });
        };

        let user = load_state(session).await.into_auth().map(|auth| auth.user);

        let cart_count = match &user {
            Some(user) => session
                .get::<CartSnapshot>(session_keys::CART)
                .await
                .ok()
                .flatten()
                .filter(|snapshot| snapshot.owner == user.id)
                .map_or(0, |snapshot| snapshot.item_count()),
            None => 0,
        };

        let toast = flash::take(session).await;

        Ok(Self {
            user,
            cart_count,
            toast,
            path,
            url,
            session: Some(session.clone()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Request, header::LOCATION};
    use axum::response::IntoResponse;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn extract(uri: &str, session: &Session) -> PageContext {
        let (mut parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        parts.extensions.insert(session.clone());
        PageContext::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_url_keeps_query() {
        let ctx = extract("/produtos?q=vestido&categoria=2", &session()).await;

        assert_eq!(ctx.path, "/produtos");
        assert_eq!(ctx.url, "/produtos?q=vestido&categoria=2");
        assert!(ctx.is_active("/produtos"));
    }

    #[tokio::test]
    async fn test_redirect_hands_toast_back() {
        let session = session();
        flash::error(&session, "Erro ao criar pedido").await;

        let ctx = extract("/checkout", &session).await;
        assert!(ctx.toast.is_some());
        assert!(flash::take(&session).await.is_none());

        let response = ctx.redirect("/carrinho").await.into_response();
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/carrinho");
        let toast = flash::take(&session).await.unwrap();
        assert_eq!(toast.message, "Erro ao criar pedido");
    }

    #[tokio::test]
    async fn test_redirect_does_not_replace_newer_toast() {
        let session = session();
        flash::warning(&session, "Antigo").await;

        let ctx = extract("/admin/pedidos/9", &session).await;
        flash::error(&session, "Erro ao carregar pedido").await;
        let response = ctx.redirect("/admin/pedidos").await.into_response();
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/admin/pedidos");

        let toast = flash::take(&session).await.unwrap();
        assert_eq!(toast.message, "Erro ao carregar pedido");
    }
}
