//! Promotional pricing rules.
//!
//! Every view that shows a price (catalog cards, product detail, cart lines,
//! checkout summary) and the order payload itself go through [`derive`], so
//! the storefront never disagrees with itself about what a product costs.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::Price;

/// Result of resolving a product's promotional pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// What the shopper pays per unit.
    pub effective: Price,
    /// The base price, present only when a promotion applies.
    pub original: Option<Price>,
    /// Whole-number discount, present only when a promotion applies.
    pub discount_percent: Option<u32>,
}

impl PriceBreakdown {
    /// Whether a promotion is in effect.
    #[must_use]
    pub const fn is_discounted(&self) -> bool {
        self.original.is_some()
    }

    /// Badge text such as `"-20%"`.
    #[must_use]
    pub fn badge(&self) -> Option<String> {
        self.discount_percent.map(|pct| format!("-{pct}%"))
    }

    /// Effective price of `quantity` units.
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Price {
        self.effective.times(quantity)
    }

    /// Base price of `quantity` units, when discounted.
    #[must_use]
    pub fn original_line_total(&self, quantity: u32) -> Option<Price> {
        self.original.map(|price| price.times(quantity))
    }
}

/// Whether the promotional price replaces the base price.
///
/// The flag must be set and the promotional price must be positive and
/// strictly below the base price.
#[must_use]
pub fn promotion_applies(base: Price, promotional: Option<Price>, on_promotion: bool) -> bool {
    on_promotion && promotional.is_some_and(|promo| promo.is_positive() && promo < base)
}

/// Resolve the effective price and discount for a product.
#[must_use]
pub fn derive(base: Price, promotional: Option<Price>, on_promotion: bool) -> PriceBreakdown {
    match promotional {
        Some(promo) if promotion_applies(base, promotional, on_promotion) => PriceBreakdown {
            effective: promo,
            original: Some(base),
            discount_percent: discount_percent(base, promo),
        },
        _ => PriceBreakdown {
            effective: base,
            original: None,
            discount_percent: None,
        },
    }
}

/// `round((base - promo) / base * 100)`, half away from zero.
///
/// `None` when the base price is not positive.
#[must_use]
pub fn discount_percent(base: Price, promo: Price) -> Option<u32> {
    if !base.is_positive() {
        return None;
    }
    let ratio = (base.amount() - promo.amount()) / base.amount() * Decimal::ONE_HUNDRED;
    let rounded = ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_u32()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reais(value: i64) -> Price {
        Price::from_cents(value * 100)
    }

    #[test]
    fn test_promotion_replaces_base_price() {
        let breakdown = derive(reais(100), Some(reais(80)), true);
        assert_eq!(breakdown.effective, reais(80));
        assert_eq!(breakdown.original, Some(reais(100)));
        assert_eq!(breakdown.badge().as_deref(), Some("-20%"));
        assert_eq!(breakdown.effective.to_string(), "R$ 80.00");
    }

    #[test]
    fn test_flag_off_uses_base_price() {
        let breakdown = derive(reais(100), Some(reais(80)), false);
        assert_eq!(breakdown.effective, reais(100));
        assert!(!breakdown.is_discounted());
        assert_eq!(breakdown.badge(), None);
    }

    #[test]
    fn test_missing_promotional_price_uses_base_price() {
        let breakdown = derive(reais(100), None, true);
        assert_eq!(breakdown.effective, reais(100));
        assert_eq!(breakdown.discount_percent, None);
    }

    #[test]
    fn test_promotional_price_not_below_base_is_ignored() {
        assert_eq!(derive(reais(100), Some(reais(100)), true).effective, reais(100));
        assert_eq!(derive(reais(100), Some(reais(120)), true).effective, reais(100));
        assert_eq!(derive(reais(100), Some(Price::ZERO), true).effective, reais(100));
    }

    #[test]
    fn test_discount_rounds_half_away_from_zero() {
        // 12.5% off
        assert_eq!(discount_percent(Price::from_cents(8000), Price::from_cents(7000)), Some(13));
        // 33.33% off
        assert_eq!(discount_percent(reais(30), reais(20)), Some(33));
        assert_eq!(discount_percent(Price::ZERO, Price::ZERO), None);
    }

    #[test]
    fn test_line_totals() {
        let breakdown = derive(reais(100), Some(reais(80)), true);
        assert_eq!(breakdown.line_total(3), reais(240));
        assert_eq!(breakdown.original_line_total(3), Some(reais(300)));
    }
}
