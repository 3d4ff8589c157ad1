//! Catalog products and the cart lines built from them.
//!
//! Both types serialize with camelCase field names (`productName`,
//! `imageUrl`, `brandName`) and a plain JSON number for `price`, which is the
//! layout the persisted cart snapshot uses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A catalog product as handed to the cart by product listings and detail
/// pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub brand_name: String,
}

impl Product {
    /// Create a product with empty descriptive fields.
    #[must_use]
    pub fn new(id: ProductId, product_name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            product_name: product_name.into(),
            description: String::new(),
            image_url: String::new(),
            price,
            brand_name: String::new(),
        }
    }
}

/// One product entry in the cart with its quantity.
///
/// `quantity` is always positive for lines held by the cart; zero-quantity
/// entries are rejected before they reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub brand_name: String,
    pub quantity: u32,
}

impl CartLineItem {
    /// Build a line for `product` with the given quantity.
    #[must_use]
    pub fn from_product(product: Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            product_name: product.product_name,
            description: product.description,
            image_url: product.image_url,
            price: product.price,
            brand_name: product.brand_name,
            quantity,
        }
    }

    /// Price multiplied by quantity, or `None` when the product is outside
    /// the representable range.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }

    /// Price multiplied by quantity, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}
