//! Order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mix_catalogo_core::{OrderId, OrderStatus};

use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::models::Toast;
use crate::routes::admin::finish;
use crate::routes::tracking::OrderView;
use crate::services::flash;
use crate::state::AppState;

const BACK: &str = "/admin/pedidos";

/// Status filter option.
#[derive(Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Status change button on the order page.
#[derive(Clone)]
pub struct StatusAction {
    pub value: &'static str,
    pub label: &'static str,
    /// The order already has this status.
    pub current: bool,
}

fn status_options(selected: Option<OrderStatus>) -> Vec<StatusOption> {
    OrderStatus::ALL
        .iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: selected == Some(*status),
        })
        .collect()
}

/// Buttons for moving an order along the timeline; none for finished orders.
#[must_use]
pub fn status_actions(status: OrderStatus) -> Vec<StatusAction> {
    if status.is_terminal() {
        return Vec::new();
    }
    OrderStatus::TIMELINE
        .iter()
        .map(|step| StatusAction {
            value: step.as_str(),
            label: step.label(),
            current: *step == status,
        })
        .collect()
}

/// Listing query; an empty `status` means all orders.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

impl OrdersQuery {
    fn status(&self) -> Option<OrderStatus> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
    }
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Order listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderView>,
    pub statuses: Vec<StatusOption>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/order_show.html")]
pub struct OrderShowTemplate {
    pub ctx: PageContext,
    pub order: OrderView,
    pub actions: Vec<StatusAction>,
}

/// List orders, optionally by status.
#[instrument(skip(auth, state, ctx))]
pub async fn index(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    mut ctx: PageContext,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.status();
    let listing = match filter {
        Some(status) => state.api().orders_by_status(&auth.token, status).await,
        None => state.api().orders(&auth.token).await,
    };

    let orders = match listing {
        Ok(orders) => orders.iter().map(OrderView::from).collect(),
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            ctx.toast = Some(Toast::error("Erro ao carregar pedidos"));
            Vec::new()
        }
    };

    Ok(OrdersTemplate {
        ctx,
        orders,
        statuses: status_options(filter),
    })
}

/// Order detail.
#[instrument(skip(auth, state, session, ctx))]
pub async fn show(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    match state.api().order(&auth.token, OrderId::new(id)).await {
        Ok(order) => Ok(OrderShowTemplate {
            ctx,
            actions: status_actions(order.status),
            order: OrderView::from(&order),
        }
        .into_response()),
        Err(e) => {
            flash::report_api_error(&session, e, "Erro ao carregar pedido").await?;
            Ok(ctx.redirect(BACK).await.into_response())
        }
    }
}

/// Change an order's status.
#[instrument(skip(auth, state, session))]
pub async fn update_status(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let back = format!("{BACK}/{id}");
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        flash::error(&session, "Erro ao atualizar status").await;
        return Ok(Redirect::to(&back));
    };
    let result = state
        .api()
        .update_order_status(&auth.token, OrderId::new(id), status)
        .await;
    finish(
        &session,
        result,
        "Status atualizado com sucesso!",
        "Erro ao atualizar status",
        &back,
    )
    .await
}

/// Cancel an order.
#[instrument(skip(auth, state, session))]
pub async fn cancel(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let result = state.api().cancel_order(&auth.token, OrderId::new(id)).await;
    finish(
        &session,
        result,
        "Pedido cancelado com sucesso!",
        "Erro ao cancelar pedido",
        &format!("{BACK}/{id}"),
    )
    .await
}
