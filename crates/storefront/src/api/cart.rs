//! Cart endpoints. The backend keys the cart by the bearer token's user.

use mix_catalogo_core::{CartItemId, ProductId};
use reqwest::Method;
use tracing::instrument;

use super::{AddToCartInput, ApiClient, ApiError, ApiToken, Cart, UpdateCartItemInput};

impl ApiClient {
    /// `GET /carrinho`. A 404 means the user has no cart yet.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than 404.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &ApiToken) -> Result<Option<Cart>, ApiError> {
        let builder = self.request(Method::GET, "/carrinho", Some(token))?;
        match self.fetch_optional(builder).await {
            Err(ApiError::NotFound { .. }) => Ok(None),
            other => other,
        }
    }

    /// `POST /carrinho/adicionar`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the item (e.g. out of stock).
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: &ApiToken,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let builder = self
            .request(Method::POST, "/carrinho/adicionar", Some(token))?
            .json(&AddToCartInput {
                product_id,
                quantity,
            });
        self.fetch(builder).await
    }

    /// `PUT /carrinho/itens/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the new quantity.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        token: &ApiToken,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/carrinho/itens/{item_id}"), Some(token))?
            .json(&UpdateCartItemInput { quantity });
        self.fetch(builder).await
    }

    /// `DELETE /carrinho/itens/{id}`. Returns `None` when the backend answers
    /// with no cart (the last line was removed).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        token: &ApiToken,
        item_id: CartItemId,
    ) -> Result<Option<Cart>, ApiError> {
        let builder = self.request(
            Method::DELETE,
            &format!("/carrinho/itens/{item_id}"),
            Some(token),
        )?;
        self.fetch_optional(builder).await
    }

    /// `DELETE /carrinho/limpar`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &ApiToken) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, "/carrinho/limpar", Some(token))?;
        self.execute(builder).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Json, Router,
        http::StatusCode,
        routing::{delete, get},
    };
    use serde_json::json;

    use super::*;
    use crate::api::fixtures;

    fn token() -> ApiToken {
        ApiToken::new("tok")
    }

    #[tokio::test]
    async fn test_missing_cart_is_none() {
        let routes = Router::new().route(
            "/carrinho",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"message": "Carrinho não encontrado"})),
                )
            }),
        );
        let api = fixtures::client(fixtures::backend(routes).await);

        assert!(api.get_cart(&token()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cart_load_failure_is_error() {
        let routes = Router::new().route(
            "/carrinho",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "falha") }),
        );
        let api = fixtures::client(fixtures::backend(routes).await);

        let err = api.get_cart(&token()).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_removing_last_item_leaves_no_cart() {
        let routes = Router::new().route(
            "/carrinho/itens/{id}",
            delete(|| async { Json(json!({"data": null, "message": "Item removido"})) }),
        );
        let api = fixtures::client(fixtures::backend(routes).await);

        let cart = api
            .remove_cart_item(&token(), CartItemId::new(7))
            .await
            .unwrap();
        assert!(cart.is_none());
    }

    #[tokio::test]
    async fn test_remove_returns_remaining_lines() {
        let routes = Router::new().route(
            "/carrinho/itens/{id}",
            delete(|| async {
                Json(json!({"data": {
                    "id": 1,
                    "itens": [{
                        "id": 8,
                        "produtoId": 3,
                        "quantidade": 2,
                        "produto": fixtures::product_json(3, 50.0, None, false, 10),
                    }]
                }}))
            }),
        );
        let api = fixtures::client(fixtures::backend(routes).await);

        let cart = api
            .remove_cart_item(&token(), CartItemId::new(7))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count(), 2);
    }
}
