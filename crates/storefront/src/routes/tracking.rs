//! Order tracking by order number.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use mix_catalogo_core::OrderStatus;

use crate::api::{ApiError, Order};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext};
use crate::models::Toast;
use crate::state::AppState;

/// Order line display data.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// One step of the status timeline.
#[derive(Clone)]
pub struct TimelineStep {
    pub label: &'static str,
    pub reached: bool,
}

/// Order display data shared by the tracking page and the back-office.
#[derive(Clone)]
pub struct OrderView {
    pub id: i32,
    pub number: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub status_badge: &'static str,
    pub status_description: &'static str,
    pub total: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub notes: Option<String>,
    pub items: Vec<OrderItemView>,
    pub created_at: Option<String>,
    pub cancelled: bool,
    pub can_cancel: bool,
    /// Timeline progress in percent; `None` when cancelled.
    pub progress: Option<u32>,
    pub timeline: Vec<TimelineStep>,
}

fn timeline(status: OrderStatus) -> Vec<TimelineStep> {
    let current = status.timeline_index();
    OrderStatus::TIMELINE
        .iter()
        .enumerate()
        .map(|(index, step)| TimelineStep {
            label: step.label(),
            reached: current.is_some_and(|current| current >= index),
        })
        .collect()
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemView {
                name: item.product_name(),
                quantity: item.quantity,
                unit_price: item.unit_price.to_string(),
                line_total: item.line_total().to_string(),
            })
            .collect();

        Self {
            id: order.id.as_i32(),
            number: order.number.clone(),
            status: order.status.as_str(),
            status_label: order.status.label(),
            status_badge: order.status.badge_class(),
            status_description: order.status.description(),
            total: order.total.to_string(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_address: order.customer_address.clone(),
            notes: order.notes.clone().filter(|n| !n.is_empty()),
            items,
            created_at: order
                .created_at
                .map(|at| at.format("%d/%m/%Y %H:%M").to_string()),
            cancelled: order.status == OrderStatus::Cancelled,
            can_cancel: order.status.can_cancel(),
            progress: order.status.progress_percent(),
            timeline: timeline(order.status),
        }
    }
}

/// Tracking query parameters.
#[derive(Debug, Deserialize)]
pub struct TrackingQuery {
    pub numero: Option<String>,
}

/// Tracking page template.
#[derive(Template, WebTemplate)]
#[template(path = "tracking.html")]
pub struct TrackingTemplate {
    pub ctx: PageContext,
    pub number: String,
    pub searched: bool,
    pub order: Option<OrderView>,
}

/// Look up an order by number.
///
/// Without `numero` only the search form is shown; an empty `numero` asks
/// for one.
#[instrument(skip(state, ctx, auth))]
pub async fn track(
    State(state): State<AppState>,
    mut ctx: PageContext,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<TrackingQuery>,
) -> Result<impl IntoResponse> {
    let Some(number) = query.numero.map(|n| n.trim().to_string()) else {
        return Ok(TrackingTemplate {
            ctx,
            number: String::new(),
            searched: false,
            order: None,
        });
    };

    if number.is_empty() {
        ctx.toast = Some(Toast::warning("Digite o número do pedido"));
        return Ok(TrackingTemplate {
            ctx,
            number,
            searched: false,
            order: None,
        });
    }

    let token = auth.as_ref().map(|auth| &auth.token);
    let order = match state.api().order_by_number(token, &number).await {
        Ok(order) => Some(OrderView::from(&order)),
        Err(ApiError::NotFound { .. }) => {
            ctx.toast = Some(Toast::error("Pedido não encontrado"));
            None
        }
        Err(e) if e.is_unauthorized() => return Err(AppError::from(e)),
        Err(e) => {
            tracing::warn!(order_number = %number, error = %e, "Order lookup failed");
            ctx.toast = Some(Toast::error("Erro ao buscar pedido"));
            None
        }
    };

    Ok(TrackingTemplate {
        ctx,
        number,
        searched: true,
        order,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order(status: &str) -> Order {
        serde_json::from_value(json!({
            "id": 3,
            "numero": "ABC123",
            "status": status,
            "total": 160.0,
            "clienteNome": "Ana",
            "clienteEmail": "ana@example.com",
            "clienteTelefone": "11999999999",
            "clienteEndereco": "Rua A, 1",
            "observacoes": "",
            "itens": [
                {"produtoId": 7, "quantidade": 2, "precoUnitario": 80.0, "produto": null}
            ],
            "createdAt": "2024-05-02T14:30:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_order_view_timeline() {
        let view = OrderView::from(&order("enviado"));

        assert_eq!(view.status_label, "Enviado");
        assert_eq!(view.progress, Some(66));
        let reached: Vec<bool> = view.timeline.iter().map(|s| s.reached).collect();
        assert_eq!(reached, vec![true, true, true, false]);
        assert!(view.can_cancel);
        assert_eq!(view.created_at.as_deref(), Some("02/05/2024 14:30"));
    }

    #[test]
    fn test_cancelled_order_has_no_progress() {
        let view = OrderView::from(&order("cancelado"));

        assert!(view.cancelled);
        assert!(!view.can_cancel);
        assert_eq!(view.progress, None);
        assert!(view.timeline.iter().all(|s| !s.reached));
    }

    #[test]
    fn test_order_lines() {
        let view = OrderView::from(&order("pendente"));
        let line = view.items.first().unwrap();

        assert_eq!(line.name, "Produto #7");
        assert_eq!(line.line_total, "R$ 160.00");
        assert!(view.notes.is_none());
    }
}
