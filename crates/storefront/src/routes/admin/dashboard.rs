//! Back-office dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::instrument;

use mix_catalogo_core::Price;

use crate::api::Order;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::routes::tracking::OrderView;
use crate::state::AppState;

/// Orders listed under "Últimos Pedidos".
const RECENT_ORDERS: usize = 10;

/// Headline numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_sales: String,
    pub order_count: usize,
    pub product_count: usize,
    /// Orders per product, in percent with one decimal.
    pub conversion_rate: String,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(orders: &[Order], product_count: usize) -> Self {
        let total_sales: Price = orders.iter().map(|order| order.total).sum();
        let conversion = if product_count == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(orders.len()) * Decimal::ONE_HUNDRED / Decimal::from(product_count))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        };

        Self {
            total_sales: total_sales.to_string(),
            order_count: orders.len(),
            product_count,
            conversion_rate: format!("{conversion:.1}%"),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub stats: DashboardStats,
    pub recent_orders: Vec<OrderView>,
}

/// Display the dashboard. A failed listing counts as empty.
#[instrument(skip(auth, state, ctx))]
pub async fn show(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let (orders, products) = tokio::join!(
        state.api().orders(&auth.token),
        state.api().products(Some(&auth.token)),
    );

    let orders = match orders {
        Ok(orders) => orders,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders for dashboard");
            Vec::new()
        }
    };
    let product_count = match products {
        Ok(products) => products.len(),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products for dashboard");
            0
        }
    };

    Ok(DashboardTemplate {
        ctx,
        stats: DashboardStats::compute(&orders, product_count),
        recent_orders: orders.iter().take(RECENT_ORDERS).map(OrderView::from).collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order(id: i32, total: f64) -> Order {
        serde_json::from_value(json!({
            "id": id,
            "numero": format!("N{id}"),
            "status": "pendente",
            "total": total,
            "clienteNome": "Ana",
            "clienteEmail": "ana@example.com"
        }))
        .unwrap()
    }

    #[test]
    fn test_stats() {
        let orders = vec![order(1, 100.0), order(2, 60.5)];
        let stats = DashboardStats::compute(&orders, 3);

        assert_eq!(stats.total_sales, "R$ 160.50");
        assert_eq!(stats.order_count, 2);
        assert_eq!(stats.conversion_rate, "66.7%");
    }

    #[test]
    fn test_stats_without_products() {
        let stats = DashboardStats::compute(&[], 0);

        assert_eq!(stats.total_sales, "R$ 0.00");
        assert_eq!(stats.conversion_rate, "0.0%");
    }
}
