//! Cart route handlers.
//!
//! Actions are plain form posts answered with a redirect and a flash toast.
//! When the request comes from HTMX (`HX-Request`), add-to-cart answers with
//! the badge fragment and an `HX-Trigger: cart-updated` header instead, or
//! `HX-Redirect` back to the page when the add fails.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mix_catalogo_core::{CartItemId, ProductId};

use crate::api::Cart;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext};
use crate::services::cart as cart_store;
use crate::services::session::safe_redirect;
use crate::services::{CartError, flash};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub stock: u32,
    pub unit_price: String,
    pub original_unit_price: Option<String>,
    pub line_total: String,
    pub original_line_total: Option<String>,
    pub can_increment: bool,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub total: String,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            total: mix_catalogo_core::Price::ZERO.to_string(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let items = cart
            .items
            .iter()
            .map(|item| {
                let pricing = item.product.pricing();
                CartItemView {
                    id: item.id.as_i32(),
                    product_id: item.product_id.as_i32(),
                    name: item.product.name.clone(),
                    image_url: item.product.image_url.clone().filter(|url| !url.is_empty()),
                    quantity: item.quantity,
                    stock: item.product.stock_quantity,
                    unit_price: pricing.effective.to_string(),
                    original_unit_price: pricing.original.map(|p| p.to_string()),
                    line_total: pricing.line_total(item.quantity).to_string(),
                    original_line_total: pricing
                        .original_line_total(item.quantity)
                        .map(|p| p.to_string()),
                    can_increment: item.quantity < item.product.stock_quantity,
                }
            })
            .collect();

        Self {
            items,
            item_count: cart.item_count(),
            total: cart.total().to_string(),
        }
    }
}

impl From<Option<&Cart>> for CartView {
    fn from(cart: Option<&Cart>) -> Self {
        cart.map_or_else(Self::empty, Self::from)
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub produto_id: i32,
    pub quantidade: Option<u32>,
    /// Local path to return to; defaults to the product page.
    pub voltar: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub quantidade: u32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub signed_in: bool,
    pub error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Queue the toast for a failed cart action.
///
/// # Errors
///
/// Propagates a rejected token so the session is invalidated.
async fn report(session: &Session, err: CartError, fallback: &str) -> Result<()> {
    match err {
        CartError::Api(api) => flash::report_api_error(session, api, fallback).await,
        CartError::NotAuthenticated(message) => {
            flash::warning(session, message).await;
            Ok(())
        }
        other => {
            flash::error(session, other.user_message(fallback)).await;
            Ok(())
        }
    }
}

/// Display the cart page.
///
/// The cart is always refreshed from the backend here. A failed load shows
/// an error with a retry link rather than an empty cart.
#[instrument(skip(state, session, ctx, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Response> {
    let signed_in = auth.is_some();
    let mut store = cart_store::open(&session, state.api(), auth).await;

    let (cart, error) = match store.load().await {
        Ok(cart) => (CartView::from(cart), None),
        Err(CartError::Api(e)) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart");
            (
                CartView::empty(),
                Some("Erro ao carregar o carrinho.".to_string()),
            )
        }
    };
    cart_store::save(&session, &store).await?;
    ctx.cart_count = store.item_count();

    Ok(CartShowTemplate {
        ctx,
        cart,
        signed_in,
        error,
    }
    .into_response())
}

/// Add a product to the cart.
#[instrument(skip(state, session, headers, auth))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(auth): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.produto_id);
    let quantity = form.quantidade.unwrap_or(1);
    let mut store = cart_store::open(&session, state.api(), auth).await;

    // The local stock check needs the current lines.
    let loaded = store.ensure_loaded().await.map(|_| ());
    let result = match loaded {
        Ok(()) => store.add_item(product_id, quantity).await.map(|_| ()),
        Err(e) => Err(e),
    };

    let htmx = is_htmx(&headers);
    match result {
        Ok(()) => {
            tracing::info!(%product_id, quantity, "Added to cart");
            let id = product_id.to_string();
            add_breadcrumb("cart", "Added product", Some(&[("product_id", id.as_str())]));
            cart_store::save(&session, &store).await?;
            if htmx {
                return Ok((
                    AppendHeaders([("HX-Trigger", "cart-updated")]),
                    CartCountTemplate {
                        count: store.item_count(),
                    },
                )
                    .into_response());
            }
            flash::success(&session, "Produto adicionado ao carrinho!").await;
        }
        Err(e) => {
            tracing::warn!(%product_id, error = %e, "Add to cart failed");
            report(&session, e, "Erro ao adicionar ao carrinho").await?;
            cart_store::save(&session, &store).await?;
        }
    }

    let fallback = format!("/produto/{product_id}");
    let target = form
        .voltar
        .as_deref()
        .and_then(safe_redirect)
        .unwrap_or(&fallback);
    if htmx {
        // A plain redirect would be swapped into the badge; reload the page
        // so the toast is shown.
        return Ok(AppendHeaders([("HX-Redirect", target.to_string())]).into_response());
    }
    Ok(Redirect::to(target).into_response())
}

/// Change a line's quantity.
#[instrument(skip(state, session, auth))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<i32>,
    Form(form): Form<UpdateQuantityForm>,
) -> Result<Redirect> {
    let item_id = CartItemId::new(id);
    let mut store = cart_store::open(&session, state.api(), auth).await;

    if let Err(e) = store.update_quantity(item_id, form.quantidade).await {
        tracing::warn!(%item_id, error = %e, "Quantity update failed");
        report(&session, e, "Erro ao atualizar quantidade").await?;
    }
    cart_store::save(&session, &store).await?;

    Ok(Redirect::to("/carrinho"))
}

/// Remove a line.
#[instrument(skip(state, session, auth))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let item_id = CartItemId::new(id);
    let mut store = cart_store::open(&session, state.api(), auth).await;

    match store.remove_item(item_id).await {
        Ok(_) => flash::success(&session, "Item removido do carrinho").await,
        Err(e) => {
            tracing::warn!(%item_id, error = %e, "Remove from cart failed");
            report(&session, e, "Erro ao remover item").await?;
        }
    }
    cart_store::save(&session, &store).await?;

    Ok(Redirect::to("/carrinho"))
}

/// Empty the cart.
#[instrument(skip(state, session, auth))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Redirect> {
    let mut store = cart_store::open(&session, state.api(), auth).await;

    match store.clear().await {
        Ok(()) => flash::success(&session, "Carrinho limpo com sucesso").await,
        Err(e) => {
            tracing::warn!(error = %e, "Clear cart failed");
            report(&session, e, "Erro ao limpar carrinho").await?;
        }
    }
    cart_store::save(&session, &store).await?;

    Ok(Redirect::to("/carrinho"))
}

/// Cart count badge (HTMX). Uses the snapshot when it is current.
#[instrument(skip(state, session, auth))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Result<impl IntoResponse> {
    let mut store = cart_store::open(&session, state.api(), auth).await;

    match store.ensure_loaded().await {
        Ok(_) => cart_store::save(&session, &store).await?,
        Err(CartError::Api(e)) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => tracing::warn!(error = %e, "Failed to load cart for badge"),
    }

    Ok(CartCountTemplate {
        count: store.item_count(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::fixtures;

    #[test]
    fn test_cart_view_strikes_base_price() {
        let product = fixtures::product(7, 100.0, Some(80.0), true);
        let cart = fixtures::cart(&[(1, product, 2)]);
        let view = CartView::from(&cart);

        assert_eq!(view.item_count, 2);
        assert_eq!(view.total, "R$ 160.00");
        let line = view.items.first().unwrap();
        assert_eq!(line.unit_price, "R$ 80.00");
        assert_eq!(line.original_unit_price.as_deref(), Some("R$ 100.00"));
        assert_eq!(line.original_line_total.as_deref(), Some("R$ 200.00"));
        assert!(line.can_increment);
    }

    #[test]
    fn test_absent_cart_is_empty_view() {
        let view = CartView::from(None::<&Cart>);
        assert!(view.is_empty());
        assert_eq!(view.total, "R$ 0.00");
    }

    #[test]
    fn test_htmx_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", "true".parse().unwrap());
        assert!(is_htmx(&headers));
    }
}
