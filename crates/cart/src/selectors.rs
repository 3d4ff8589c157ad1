//! Derived cart values.
//!
//! Every projection is a pure function of the line items, so reading twice
//! from the same items always yields equal results. The store computes a
//! [`CartSummary`] once per change and publishes it; callers read the
//! published value instead of recomputing.
//!
//! All amounts are [`Decimal`], so `subtotal`, `tax` and `total` are exact.

use rust_decimal::Decimal;
use serde::Serialize;
use storefront_cart_core::{CartLineItem, CurrencyCode, Price, ProductId};

/// Default sales tax rate (10%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Pricing constants applied when summarizing a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    /// Fraction of the subtotal charged as tax.
    pub tax_rate: Decimal,
    /// Flat shipping charge reported with the summary.
    pub shipping: Decimal,
    /// Currency used for display.
    pub currency: CurrencyCode,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            shipping: Decimal::ZERO,
            currency: CurrencyCode::default(),
        }
    }
}

/// Sum of quantities across all lines.
#[must_use]
pub fn item_count(items: &[CartLineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

/// Sum of `price × quantity` across all lines.
///
/// Saturates at `Decimal::MAX` rather than overflowing.
#[must_use]
pub fn subtotal(items: &[CartLineItem]) -> Decimal {
    items
        .iter()
        .map(CartLineItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Tax owed on `subtotal`.
#[must_use]
pub fn tax(subtotal: Decimal, rate: Decimal) -> Decimal {
    subtotal.saturating_mul(rate)
}

/// Subtotal plus tax.
#[must_use]
pub fn grand_total(subtotal: Decimal, tax: Decimal) -> Decimal {
    subtotal.saturating_add(tax)
}

/// Whether a line with `id` is in the cart.
#[must_use]
pub fn is_in_cart(items: &[CartLineItem], id: &ProductId) -> bool {
    items.iter().any(|item| &item.id == id)
}

/// All derived values for one set of line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartLineItem>,
    pub item_count: u64,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    /// Subtotal plus tax. Shipping is reported separately.
    pub total: Decimal,
    pub currency: CurrencyCode,
}

impl Default for CartSummary {
    fn default() -> Self {
        summarize(&[], &Pricing::default())
    }
}

impl CartSummary {
    /// Whether a line with `id` is in the cart.
    #[must_use]
    pub fn is_in_cart(&self, id: &ProductId) -> bool {
        is_in_cart(&self.items, id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Subtotal as a displayable price.
    #[must_use]
    pub const fn subtotal_price(&self) -> Price {
        Price::new(self.subtotal, self.currency)
    }

    /// Tax as a displayable price.
    #[must_use]
    pub const fn tax_price(&self) -> Price {
        Price::new(self.tax, self.currency)
    }

    /// Shipping as a displayable price.
    #[must_use]
    pub const fn shipping_price(&self) -> Price {
        Price::new(self.shipping, self.currency)
    }

    /// Grand total as a displayable price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::new(self.total, self.currency)
    }
}

/// Compute every derived value for `items`.
#[must_use]
pub fn summarize(items: &[CartLineItem], pricing: &Pricing) -> CartSummary {
    let subtotal = subtotal(items);
    let tax = tax(subtotal, pricing.tax_rate);

    CartSummary {
        items: items.to_vec(),
        item_count: item_count(items),
        subtotal,
        tax,
        shipping: pricing.shipping,
        total: grand_total(subtotal, tax),
        currency: pricing.currency,
    }
}
