//! Checkout: delivery details form and order creation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{Cart, CreateOrderInput};
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext};
use crate::models::Toast;
use crate::routes::cart::CartView;
use crate::services::cart as cart_store;
use crate::services::{CartError, flash};
use crate::state::AppState;

/// Delivery details form data.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub cliente_nome: String,
    #[serde(default)]
    pub cliente_email: String,
    #[serde(default)]
    pub cliente_telefone: String,
    #[serde(default)]
    pub cliente_endereco: String,
    #[serde(default)]
    pub observacoes: String,
}

impl CheckoutForm {
    fn is_complete(&self) -> bool {
        [
            &self.cliente_nome,
            &self.cliente_email,
            &self.cliente_telefone,
            &self.cliente_endereco,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    fn into_input(self, cart: &Cart) -> CreateOrderInput {
        let notes = self.observacoes.trim().to_string();
        CreateOrderInput {
            customer_name: self.cliente_nome.trim().to_string(),
            customer_email: self.cliente_email.trim().to_string(),
            customer_phone: self.cliente_telefone.trim().to_string(),
            customer_address: self.cliente_endereco.trim().to_string(),
            notes: (!notes.is_empty()).then_some(notes),
            items: CreateOrderInput::lines_from_cart(cart),
        }
    }
}

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub form: CheckoutForm,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub ctx: PageContext,
    pub order_number: String,
}

/// Display the checkout form, or go back to the cart when it is empty.
#[instrument(skip(state, session, ctx, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Response> {
    let form = auth
        .as_ref()
        .map(|auth| CheckoutForm {
            cliente_nome: auth.user.name.clone(),
            cliente_email: auth.user.email.to_string(),
            cliente_telefone: auth.user.phone.clone().unwrap_or_default(),
            ..CheckoutForm::default()
        })
        .unwrap_or_default();

    let mut store = cart_store::open(&session, state.api(), auth).await;
    let cart = match store.ensure_loaded().await {
        Ok(Some(cart)) if !cart.is_empty() => CartView::from(cart),
        Ok(_) => return Ok(ctx.redirect("/carrinho").await.into_response()),
        Err(CartError::Api(e)) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load cart for checkout");
            return Ok(ctx.redirect("/carrinho").await.into_response());
        }
    };
    cart_store::save(&session, &store).await?;

    Ok(CheckoutTemplate { ctx, cart, form }.into_response())
}

/// Create the order from the current cart, then empty the cart.
///
/// Line prices are the effective prices the shopper saw.
#[instrument(skip(state, session, ctx, auth, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    mut ctx: PageContext,
    OptionalAuth(auth): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let Some(token) = auth.as_ref().map(|auth| auth.token.clone()) else {
        flash::error(&session, "Carrinho vazio").await;
        return Ok(Redirect::to("/carrinho").into_response());
    };

    let mut store = cart_store::open(&session, state.api(), auth).await;
    let cart = match store.load().await {
        Ok(Some(cart)) if !cart.is_empty() => cart.clone(),
        Ok(_) => {
            cart_store::save(&session, &store).await?;
            flash::error(&session, "Carrinho vazio").await;
            return Ok(Redirect::to("/carrinho").into_response());
        }
        Err(CartError::Api(e)) => {
            flash::report_api_error(&session, e, "Erro ao criar pedido").await?;
            return Ok(Redirect::to("/checkout").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    if !form.is_complete() {
        ctx.toast = Some(Toast::error("Preencha todos os campos obrigatórios"));
        return Ok(CheckoutTemplate {
            ctx,
            cart: CartView::from(&cart),
            form,
        }
        .into_response());
    }

    let input = form.clone().into_input(&cart);
    let order = match state.api().create_order(&token, &input).await {
        Ok(order) => order,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Order creation failed");
            ctx.toast = Some(Toast::error(e.user_message("Erro ao criar pedido")));
            return Ok(CheckoutTemplate {
                ctx,
                cart: CartView::from(&cart),
                form,
            }
            .into_response());
        }
    };
    tracing::info!(order_number = %order.number, total = %order.total, "Order created");

    if let Err(e) = store.clear().await {
        tracing::warn!(error = %e, "Cart not cleared after checkout");
    }
    cart_store::save(&session, &store).await?;

    ctx.cart_count = store.item_count();
    ctx.toast = Some(Toast::success("Pedido realizado com sucesso!"));
    Ok(CheckoutSuccessTemplate {
        ctx,
        order_number: order.number,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::api::fixtures;

    fn filled() -> CheckoutForm {
        CheckoutForm {
            cliente_nome: " Ana ".to_string(),
            cliente_email: "ana@example.com".to_string(),
            cliente_telefone: "11999999999".to_string(),
            cliente_endereco: "Rua A, 1".to_string(),
            observacoes: "   ".to_string(),
        }
    }

    #[test]
    fn test_incomplete_form_is_rejected() {
        let mut form = filled();
        assert!(form.is_complete());
        form.cliente_endereco = " ".to_string();
        assert!(!form.is_complete());
    }

    #[test]
    fn test_order_uses_effective_prices() {
        let promo = fixtures::product(1, 100.0, Some(80.0), true);
        let plain = fixtures::product(2, 50.0, None, false);
        let cart = fixtures::cart(&[(1, promo, 2), (2, plain, 1)]);

        let input = filled().into_input(&cart);

        assert_eq!(input.customer_name, "Ana");
        assert_eq!(input.notes, None);
        let prices: Vec<Decimal> = input.items.iter().map(|l| l.unit_price).collect();
        assert_eq!(prices, vec![Decimal::from(80), Decimal::from(50)]);
        assert_eq!(input.items.iter().map(|l| l.quantity).sum::<u32>(), 3);
    }
}
