//! Order endpoints.

use mix_catalogo_core::{OrderId, OrderStatus};
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError, ApiToken, CreateOrderInput, Order, StatusUpdate};

impl ApiClient {
    /// `GET /pedidos`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &ApiToken) -> Result<Vec<Order>, ApiError> {
        let builder = self.request(Method::GET, "/pedidos", Some(token))?;
        Ok(self.fetch_optional(builder).await?.unwrap_or_default())
    }

    /// `GET /pedidos/status/{status}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(status = %status))]
    pub async fn orders_by_status(
        &self,
        token: &ApiToken,
        status: OrderStatus,
    ) -> Result<Vec<Order>, ApiError> {
        let builder = self.request(Method::GET, &format!("/pedidos/status/{status}"), Some(token))?;
        Ok(self.fetch_optional(builder).await?.unwrap_or_default())
    }

    /// `GET /pedidos/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn order(&self, token: &ApiToken, id: OrderId) -> Result<Order, ApiError> {
        let builder = self.request(Method::GET, &format!("/pedidos/{id}"), Some(token))?;
        self.fetch_optional(builder)
            .await?
            .ok_or(ApiError::NotFound { message: None })
    }

    /// `GET /pedidos/numero/{numero}`. Public: shoppers track orders by
    /// number without logging in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no order has this number.
    #[instrument(skip(self, token))]
    pub async fn order_by_number(
        &self,
        token: Option<&ApiToken>,
        number: &str,
    ) -> Result<Order, ApiError> {
        let path = format!("/pedidos/numero/{}", urlencoding::encode(number));
        let builder = self.request(Method::GET, &path, token)?;
        self.fetch_optional(builder)
            .await?
            .ok_or(ApiError::NotFound { message: None })
    }

    /// `POST /pedidos`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order.
    #[instrument(skip(self, token, input), fields(lines = input.items.len()))]
    pub async fn create_order(
        &self,
        token: &ApiToken,
        input: &CreateOrderInput,
    ) -> Result<Order, ApiError> {
        let builder = self
            .request(Method::POST, "/pedidos", Some(token))?
            .json(input);
        self.fetch(builder).await
    }

    /// `PUT /pedidos/{id}/status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the transition.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: &ApiToken,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/pedidos/{id}/status"), Some(token))?
            .json(&StatusUpdate { status });
        self.execute(builder).await
    }

    /// `DELETE /pedidos/{id}` cancels the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the cancellation.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn cancel_order(&self, token: &ApiToken, id: OrderId) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/pedidos/{id}"), Some(token))?;
        self.execute(builder).await
    }
}
