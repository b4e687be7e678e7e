//! Category endpoints.

use mix_catalogo_core::CategoryId;
use reqwest::Method;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError, ApiToken, Category, CategoryInput};

impl ApiClient {
    /// `GET /categorias` (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let builder = self.request(Method::GET, "/categorias", None)?;
        let categories: Vec<Category> = self.fetch_optional(builder).await?.unwrap_or_default();

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// `GET /categorias/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the category does not exist.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category(&self, id: CategoryId) -> Result<Category, ApiError> {
        let builder = self.request(Method::GET, &format!("/categorias/{id}"), None)?;
        self.fetch_optional(builder)
            .await?
            .ok_or(ApiError::NotFound { message: None })
    }

    /// `POST /categorias`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the category.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        token: &ApiToken,
        input: &CategoryInput,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::POST, "/categorias", Some(token))?
            .json(input);
        self.execute(builder).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// `PUT /categorias/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        token: &ApiToken,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/categorias/{id}"), Some(token))?
            .json(input);
        self.execute(builder).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// `DELETE /categorias/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion (e.g. products
    /// still reference the category).
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn delete_category(&self, token: &ApiToken, id: CategoryId) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/categorias/{id}"), Some(token))?;
        self.execute(builder).await?;
        self.invalidate_cache();
        Ok(())
    }
}
