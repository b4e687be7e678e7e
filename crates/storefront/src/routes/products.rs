//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use mix_catalogo_core::{CategoryId, ProductId};

use crate::api::{ApiError, Category, Product, ProductFilters};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext};
use crate::state::AppState;

/// Similar products shown under a product detail.
const SIMILAR_LIMIT: usize = 4;

/// Product card data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Effective unit price, e.g. `"R$ 80.00"`.
    pub price: String,
    /// Struck-through base price when a promotion applies.
    pub original_price: Option<String>,
    /// Discount badge such as `"-20%"`.
    pub badge: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub stock: u32,
    pub in_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let pricing = product.pricing();
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone().filter(|d| !d.is_empty()),
            image_url: product.image_url.clone().filter(|url| !url.is_empty()),
            price: pricing.effective.to_string(),
            original_price: pricing.original.map(|price| price.to_string()),
            badge: pricing.badge(),
            category: product.category_name().map(str::to_string),
            color: product.color.clone().filter(|c| !c.is_empty()),
            size: product.size.clone().filter(|s| !s.is_empty()),
            stock: product.stock_quantity,
            in_stock: product.in_stock(),
        }
    }
}

/// Map a product list into card views.
pub fn product_views(products: &[Product]) -> Vec<ProductView> {
    products.iter().map(ProductView::from).collect()
}

/// Category option for filter selects.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

impl CategoryOption {
    pub fn list(categories: &[Category], selected: Option<CategoryId>) -> Vec<Self> {
        categories
            .iter()
            .map(|category| Self {
                id: category.id.as_i32(),
                name: category.name.clone(),
                selected: Some(category.id) == selected,
            })
            .collect()
    }
}

/// Catalog query parameters. Unparseable values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub categoria: Option<String>,
    #[serde(rename = "precoMin")]
    pub preco_min: Option<String>,
    #[serde(rename = "precoMax")]
    pub preco_max: Option<String>,
}

impl CatalogQuery {
    fn text(value: Option<&String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn price(value: Option<&String>) -> Option<Decimal> {
        Self::text(value).and_then(|v| v.replace(',', ".").parse().ok())
    }

    /// Backend filters for the valid parameters.
    #[must_use]
    pub fn filters(&self) -> ProductFilters {
        ProductFilters {
            q: Self::text(self.q.as_ref()),
            category_id: Self::text(self.categoria.as_ref())
                .and_then(|v| v.parse::<CategoryId>().ok()),
            min_price: Self::price(self.preco_min.as_ref()),
            max_price: Self::price(self.preco_max.as_ref()),
            ..ProductFilters::default()
        }
    }
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryOption>,
    pub q: String,
    pub min_price: String,
    pub max_price: String,
    pub has_filters: bool,
    pub error: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductView,
    pub similar_products: Vec<ProductView>,
}

/// Product not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub ctx: PageContext,
}

/// Display the catalog.
///
/// Any valid filter switches from the plain listing to the backend's
/// advanced filter. A backend failure renders the page with an error and an
/// empty catalog.
#[instrument(skip(state, ctx, auth))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let token = auth.as_ref().map(|auth| &auth.token);
    let filters = query.filters();

    let categories = match state.api().categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            Vec::new()
        }
    };

    let api = state.api();
    let listing = if filters.is_empty() {
        api.products(token).await
    } else if let Some(q) = filters.only_query() {
        api.global_search(token, q).await
    } else if let Some(id) = filters.only_category() {
        api.products_by_category(token, id).await
    } else {
        api.filter_products(token, &filters).await
    };

    let (products, error) = match listing {
        Ok(products) => (product_views(&products), None),
        Err(e) if e.is_unauthorized() => return Err(AppError::from(e)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products");
            (
                Vec::new(),
                Some("Erro ao carregar produtos. Tente novamente.".to_string()),
            )
        }
    };

    Ok(ProductsIndexTemplate {
        ctx,
        products,
        categories: CategoryOption::list(&categories, filters.category_id),
        q: filters.q.clone().unwrap_or_default(),
        min_price: filters.min_price.map(|p| p.to_string()).unwrap_or_default(),
        max_price: filters.max_price.map(|p| p.to_string()).unwrap_or_default(),
        has_filters: !filters.is_empty(),
        error,
    })
}

/// Display a product with similar products.
#[instrument(skip(state, ctx, auth))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<axum::response::Response> {
    let token = auth.as_ref().map(|auth| &auth.token);
    let id = ProductId::new(id);

    let (product, similar) = tokio::join!(
        state.api().product(token, id),
        state.api().similar_products(token, id),
    );

    let product = match product {
        Ok(product) => product,
        Err(ApiError::NotFound { .. }) => {
            return Ok((
                axum::http::StatusCode::NOT_FOUND,
                ProductNotFoundTemplate { ctx },
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let similar_products = match similar {
        Ok(products) => products
            .iter()
            .filter(|p| p.id != product.id)
            .take(SIMILAR_LIMIT)
            .map(ProductView::from)
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, product_id = %id, "Failed to load similar products");
            Vec::new()
        }
    };

    Ok(ProductShowTemplate {
        ctx,
        product: ProductView::from(&product),
        similar_products,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixtures;

    #[test]
    fn test_catalog_query_ignores_invalid_values() {
        let query = CatalogQuery {
            q: Some("  ".to_string()),
            categoria: Some("abc".to_string()),
            preco_min: Some("10,50".to_string()),
            preco_max: Some("caro".to_string()),
        };
        let filters = query.filters();

        assert_eq!(filters.q, None);
        assert_eq!(filters.category_id, None);
        assert_eq!(filters.min_price, Some(Decimal::new(1050, 2)));
        assert_eq!(filters.max_price, None);
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_catalog_query_without_parameters_is_unfiltered() {
        assert!(CatalogQuery::default().filters().is_empty());
    }

    #[test]
    fn test_product_view_shows_promotion() {
        let product = fixtures::product(1, 100.0, Some(80.0), true);
        let view = ProductView::from(&product);

        assert_eq!(view.price, "R$ 80.00");
        assert_eq!(view.original_price.as_deref(), Some("R$ 100.00"));
        assert_eq!(view.badge.as_deref(), Some("-20%"));
        assert!(view.in_stock);
    }

    #[test]
    fn test_product_view_without_flag_uses_base_price() {
        let product = fixtures::product(1, 100.0, Some(80.0), false);
        let view = ProductView::from(&product);

        assert_eq!(view.price, "R$ 100.00");
        assert!(view.original_price.is_none());
        assert!(view.badge.is_none());
    }
}
