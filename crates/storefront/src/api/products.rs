//! Product endpoints.
//!
//! The four home-page sections are cached; everything else goes straight to
//! the backend. Create, update, promotion, and delete invalidate the cache.

use mix_catalogo_core::{CategoryId, ProductId};
use reqwest::Method;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError, ApiToken, Product, ProductFilters, ProductInput, PromotionInput};

impl ApiClient {
    /// `GET /produtos`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn products(&self, token: Option<&ApiToken>) -> Result<Vec<Product>, ApiError> {
        let builder = self.request(Method::GET, "/produtos", token)?;
        Ok(self.fetch_optional(builder).await?.unwrap_or_default())
    }

    /// `GET /produtos/{id}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn product(&self, token: Option<&ApiToken>, id: ProductId) -> Result<Product, ApiError> {
        let builder = self.request(Method::GET, &format!("/produtos/{id}"), token)?;
        self.fetch_optional(builder)
            .await?
            .ok_or(ApiError::NotFound { message: None })
    }

    /// `GET /produtos/busca/search?nome=`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn search_products_by_name(
        &self,
        token: Option<&ApiToken>,
        name: &str,
    ) -> Result<Vec<Product>, ApiError> {
        let builder = self
            .request(Method::GET, "/produtos/busca/search", token)?
            .query(&[("nome", name)]);
        Ok(self.fetch_optional(builder).await?.unwrap_or_default())
    }

    /// `GET /produtos/buscar/global/search?q=`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn global_search(
        &self,
        token: Option<&ApiToken>,
        query: &str,
    ) -> Result<Vec<Product>, ApiError> {
        let builder = self
            .request(Method::GET, "/produtos/buscar/global/search", token)?
            .query(&[("q", query)]);
        Ok(self.fetch_optional(builder).await?.unwrap_or_default())
    }

    /// `GET /produtos/filtrar/avancado/search` with the given filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn filter_products(
        &self,
        token: Option<&ApiToken>,
        filters: &ProductFilters,
    ) -> Result<Vec<Product>, ApiError> {
        let builder = self
            .request(Method::GET, "/produtos/filtrar/avancado/search", token)?
            .query(filters);
        Ok(self.fetch_optional(builder).await?.unwrap_or_default())
    }

    /// `GET /produtos/categoria/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn products_by_category(
        &self,
        token: Option<&ApiToken>,
        id: CategoryId,
    ) -> Result<Vec<Product>, ApiError> {
        let builder = self.request(Method::GET, &format!("/produtos/categoria/{id}"), token)?;
        Ok(self.fetch_optional(builder).await?.unwrap_or_default())
    }

    /// `GET /produtos/similares/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn similar_products(
        &self,
        token: Option<&ApiToken>,
        id: ProductId,
    ) -> Result<Vec<Product>, ApiError> {
        let builder = self.request(Method::GET, &format!("/produtos/similares/{id}"), token)?;
        Ok(self.fetch_optional(builder).await?.unwrap_or_default())
    }

    /// `GET /produtos/bestsellers/lista` (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn bestsellers(&self) -> Result<Vec<Product>, ApiError> {
        self.cached_listing(CacheKey::Bestsellers, "/produtos/bestsellers/lista", None)
            .await
    }

    /// `GET /produtos/promocoes/lista?limit=` (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn promotions(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        self.cached_listing(
            CacheKey::Promotions(limit),
            "/produtos/promocoes/lista",
            Some(limit),
        )
        .await
    }

    /// `GET /produtos/novidades/lista?limit=` (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn new_arrivals(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        self.cached_listing(
            CacheKey::NewArrivals(limit),
            "/produtos/novidades/lista",
            Some(limit),
        )
        .await
    }

    /// `GET /produtos/mais-vendidos/lista?limit=` (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn most_sold(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        self.cached_listing(
            CacheKey::MostSold(limit),
            "/produtos/mais-vendidos/lista",
            Some(limit),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn cached_listing(
        &self,
        key: CacheKey,
        path: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let mut builder = self.request(Method::GET, path, None)?;
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }
        let products: Vec<Product> = self.fetch_optional(builder).await?.unwrap_or_default();

        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// `POST /produtos`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the product.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &ApiToken,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let builder = self
            .request(Method::POST, "/produtos", Some(token))?
            .json(input);
        let product = self.fetch(builder).await?;
        self.invalidate_cache();
        Ok(product)
    }

    /// `PUT /produtos/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &ApiToken,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/produtos/{id}"), Some(token))?
            .json(input);
        self.execute(builder).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// `PUT /produtos/{id}/promocao`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the promotion.
    #[instrument(skip(self, token, input), fields(product_id = %id, on = input.on_promotion))]
    pub async fn set_promotion(
        &self,
        token: &ApiToken,
        id: ProductId,
        input: &PromotionInput,
    ) -> Result<(), ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/produtos/{id}/promocao"), Some(token))?
            .json(input);
        self.execute(builder).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// `DELETE /produtos/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &ApiToken, id: ProductId) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/produtos/{id}"), Some(token))?;
        self.execute(builder).await?;
        self.invalidate_cache();
        Ok(())
    }
}
