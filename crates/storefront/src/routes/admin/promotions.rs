//! Promotion management.
//!
//! The backend stores whatever promotional price it is given; the rule that a
//! promotion must be cheaper than the base price is enforced here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mix_catalogo_core::{Price, ProductId};

use crate::api::{Product, PromotionInput};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::models::Toast;
use crate::routes::admin::finish;
use crate::services::flash;
use crate::state::AppState;

const BACK: &str = "/admin/promocoes";

/// Suggested promotional price: 80% of the base price.
#[must_use]
pub fn suggested_price(base: Price) -> Price {
    Price::new(
        (base.amount() * Decimal::new(8, 1))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
    )
}

/// Check a promotional price against the base price.
///
/// # Errors
///
/// Returns the message to show when the price is not positive or not below
/// the base price.
pub fn validate_promotion(base: Price, promo: Decimal) -> std::result::Result<Decimal, &'static str> {
    if promo <= Decimal::ZERO {
        return Err("Informe um preço promocional válido");
    }
    if promo >= base.amount() {
        return Err("O preço promocional deve ser menor que o preço original");
    }
    Ok(promo)
}

/// Promotion row data for templates.
#[derive(Clone)]
pub struct PromotionRow {
    pub id: i32,
    pub name: String,
    pub price: String,
    /// Prefilled value for the promotional price input.
    pub promo_input: String,
    pub effective_price: Option<String>,
    pub badge: Option<String>,
    pub active: bool,
}

impl From<&Product> for PromotionRow {
    fn from(product: &Product) -> Self {
        let pricing = product.pricing();
        let promo = product
            .promotional_price
            .unwrap_or_else(|| suggested_price(product.price));
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            price: product.price.to_string(),
            promo_input: promo.plain(),
            effective_price: pricing
                .is_discounted()
                .then(|| pricing.effective.to_string()),
            badge: pricing.badge(),
            active: product.on_promotion,
        }
    }
}

/// Promotion form data.
#[derive(Debug, Deserialize)]
pub struct PromotionForm {
    #[serde(default)]
    pub preco_promocional: String,
}

/// Promotions page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/promotions.html")]
pub struct PromotionsTemplate {
    pub ctx: PageContext,
    pub active: Vec<PromotionRow>,
    pub available: Vec<PromotionRow>,
}

/// List products on promotion and products that could be.
#[instrument(skip(auth, state, ctx))]
pub async fn index(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    mut ctx: PageContext,
) -> Result<impl IntoResponse> {
    let products = match state.api().products(Some(&auth.token)).await {
        Ok(products) => products,
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load promotions");
            ctx.toast = Some(Toast::error("Erro ao carregar promoções"));
            Vec::new()
        }
    };

    let (active, available): (Vec<_>, Vec<_>) = products
        .iter()
        .map(PromotionRow::from)
        .partition(|row| row.active);

    Ok(PromotionsTemplate {
        ctx,
        active,
        available,
    })
}

/// Put a product on promotion or change its promotional price.
#[instrument(skip(auth, state, session))]
pub async fn set(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<PromotionForm>,
) -> Result<Redirect> {
    let id = ProductId::new(id);
    let product = match state.api().product(Some(&auth.token), id).await {
        Ok(product) => product,
        Err(e) => {
            flash::report_api_error(&session, e, "Erro ao atualizar promoção").await?;
            return Ok(Redirect::to(BACK));
        }
    };

    let promo = form
        .preco_promocional
        .trim()
        .replace(',', ".")
        .parse::<Decimal>()
        .map_err(|_| "Informe um preço promocional válido")
        .and_then(|promo| validate_promotion(product.price, promo));
    let promo = match promo {
        Ok(promo) => promo,
        Err(message) => {
            flash::error(&session, message).await;
            return Ok(Redirect::to(BACK));
        }
    };

    let result = state
        .api()
        .set_promotion(&auth.token, id, &PromotionInput::enable(promo))
        .await;
    finish(
        &session,
        result,
        "Promoção atualizada com sucesso!",
        "Erro ao atualizar promoção",
        BACK,
    )
    .await
}

/// End a product's promotion.
#[instrument(skip(auth, state, session))]
pub async fn remove(
    RequireStaff(auth): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    let result = state
        .api()
        .set_promotion(&auth.token, ProductId::new(id), &PromotionInput::disable())
        .await;
    finish(
        &session,
        result,
        "Promoção removida com sucesso!",
        "Erro ao remover promoção",
        BACK,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixtures;

    #[test]
    fn test_suggested_price_is_eighty_percent() {
        assert_eq!(suggested_price(Price::from_cents(10_000)), Price::from_cents(8_000));
        assert_eq!(suggested_price(Price::from_cents(1_999)), Price::from_cents(1_599));
    }

    #[test]
    fn test_promotion_must_be_below_base() {
        let base = Price::from_cents(10_000);
        assert!(validate_promotion(base, Decimal::new(8000, 2)).is_ok());
        assert!(validate_promotion(base, Decimal::new(10_000, 2)).is_err());
        assert!(validate_promotion(base, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_row_prefills_suggestion() {
        let product = fixtures::product(1, 100.0, None, false);
        let row = PromotionRow::from(&product);

        assert!(!row.active);
        assert_eq!(row.promo_input, "80.00");
        assert!(row.badge.is_none());
    }

    #[test]
    fn test_row_for_active_promotion() {
        let product = fixtures::product(1, 100.0, Some(75.0), true);
        let row = PromotionRow::from(&product);

        assert!(row.active);
        assert_eq!(row.promo_input, "75.00");
        assert_eq!(row.effective_price.as_deref(), Some("R$ 75.00"));
        assert_eq!(row.badge.as_deref(), Some("-25%"));
    }
}
