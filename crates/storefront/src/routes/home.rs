//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::api::{ApiError, Category, Product};
use crate::filters;
use crate::middleware::PageContext;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Cards per home page shelf.
const SHELF_SIZE: usize = 8;

/// Category tile on the home page.
#[derive(Clone)]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.as_i32(),
            name: category.name.clone(),
            description: category.description.clone().filter(|d| !d.is_empty()),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub bestsellers: Vec<ProductView>,
    pub promotions: Vec<ProductView>,
    pub new_arrivals: Vec<ProductView>,
    pub categories: Vec<CategoryView>,
}

/// A shelf that failed to load is rendered empty.
fn shelf(name: &str, result: Result<Vec<Product>, ApiError>) -> Vec<ProductView> {
    match result {
        Ok(products) => products
            .iter()
            .take(SHELF_SIZE)
            .map(ProductView::from)
            .collect(),
        Err(e) => {
            tracing::warn!(shelf = name, error = %e, "Failed to load home shelf");
            Vec::new()
        }
    }
}

/// Display the home page.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let api = state.api();
    let limit = u32::try_from(SHELF_SIZE).unwrap_or(u32::MAX);

    let (bestsellers, promotions, new_arrivals, categories) = tokio::join!(
        api.bestsellers(),
        api.promotions(limit),
        api.new_arrivals(limit),
        api.categories(),
    );

    let categories = match categories {
        Ok(categories) => categories.iter().map(CategoryView::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            Vec::new()
        }
    };

    let mut bestsellers = shelf("bestsellers", bestsellers);
    if bestsellers.is_empty() {
        bestsellers = shelf("most_sold", api.most_sold(limit).await);
    }

    HomeTemplate {
        ctx,
        bestsellers,
        promotions: shelf("promotions", promotions),
        new_arrivals: shelf("new_arrivals", new_arrivals),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixtures;

    #[test]
    fn test_shelf_is_capped() {
        let products: Vec<Product> = (1..=12)
            .map(|id| fixtures::product(id, 10.0, None, false))
            .collect();
        assert_eq!(shelf("bestsellers", Ok(products)).len(), SHELF_SIZE);
    }

    #[test]
    fn test_failed_shelf_is_empty() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };
        assert!(shelf("promotions", Err(err)).is_empty());
    }
}
