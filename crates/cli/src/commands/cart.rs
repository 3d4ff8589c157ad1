//! Cart commands run against file-backed storage.
//!
//! # Environment Variables
//!
//! See [`CartConfig::from_env`]; `CART_STORAGE_DIR` selects where the cart
//! snapshot lives.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rust_decimal::Decimal;
use storefront_cart::{CartConfig, CartService, CartStore, CartSummary, ConfigError, FileStorage};
use storefront_cart_core::{CartLineItem, Price, Product, ProductId};
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The sync file could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The sync file is not a JSON array of cart lines.
    #[error("Invalid cart file: {0}")]
    InvalidCartFile(#[from] serde_json::Error),

    /// A sync line has a zero quantity.
    #[error("Cart line {0} has zero quantity")]
    ZeroQuantity(ProductId),

    /// A sync file lists the same product twice.
    #[error("Cart line {0} appears more than once")]
    DuplicateId(ProductId),

    /// Prices must not be negative.
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),
}

/// Product details for `cart-cli add`.
#[derive(Debug)]
pub struct AddArgs {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: NonZeroU32,
    pub brand: String,
    pub image: String,
    pub description: String,
}

/// Open the cart stored under `config.storage_dir` and hydrate it.
///
/// A storage read failure leaves the cart empty; it is logged rather than
/// returned.
pub fn open(config: &CartConfig) -> CartService {
    let storage = Arc::new(FileStorage::new(&config.storage_dir));
    tracing::debug!(dir = %storage.dir().display(), "Opening cart storage");
    let cart = CartService::new(CartStore::new(config, storage));

    cart.load();
    if let Some(error) = cart.store().status().error {
        tracing::warn!(%error, "Starting from an empty cart");
    }

    cart
}

/// Add a product to the cart.
pub fn add(cart: &CartService, args: AddArgs) -> Result<(), CliError> {
    if args.price.is_sign_negative() {
        return Err(CliError::InvalidPrice(args.price));
    }

    let product = Product {
        id: args.id,
        product_name: args.name,
        description: args.description,
        image_url: args.image,
        price: args.price,
        brand_name: args.brand,
    };

    tracing::info!(id = %product.id, quantity = args.quantity.get(), "Adding to cart");
    cart.add_quantity(product, args.quantity);
    Ok(())
}

/// Remove a product line from the cart.
pub fn remove(cart: &CartService, id: ProductId) {
    if !cart.is_in_cart(&id) {
        tracing::info!(%id, "Product is not in the cart");
    }
    cart.remove_by_id(id);
}

/// Empty the cart.
pub fn clear(cart: &CartService) {
    tracing::info!("Clearing cart");
    cart.clear_cart();
}

/// Replace the cart with the lines in `path`.
pub fn sync(cart: &CartService, path: &Path) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let items: Vec<CartLineItem> = serde_json::from_str(&raw)?;
    if let Some(line) = items.iter().find(|line| line.quantity == 0) {
        return Err(CliError::ZeroQuantity(line.id.clone()));
    }
    if let Some(line) = items.iter().find(|line| line.price.is_sign_negative()) {
        return Err(CliError::InvalidPrice(line.price));
    }
    let mut seen = HashSet::new();
    if let Some(line) = items.iter().find(|line| !seen.insert(&line.id)) {
        return Err(CliError::DuplicateId(line.id.clone()));
    }

    tracing::info!(lines = items.len(), "Syncing cart");
    cart.sync(items);
    Ok(())
}

/// Format the cart contents and totals for the terminal.
pub fn render(summary: &CartSummary) -> String {
    if summary.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for line in &summary.items {
        let _ = writeln!(
            out,
            "{:>4} x {} ({}) @ {} = {}",
            line.quantity,
            line.product_name,
            line.id,
            Price::new(line.price, summary.currency),
            Price::new(line.line_total(), summary.currency),
        );
    }

    let _ = writeln!(out, "Items:    {}", summary.item_count);
    let _ = writeln!(out, "Subtotal: {}", summary.subtotal_price());
    let _ = writeln!(out, "Tax:      {}", summary.tax_price());
    let _ = writeln!(out, "Shipping: {}", summary.shipping_price());
    let _ = writeln!(out, "Total:    {}", summary.total_price());
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> CartConfig {
        CartConfig {
            storage_dir: dir.to_path_buf(),
            ..CartConfig::default()
        }
    }

    fn add_args(id: &str, price: Decimal, quantity: u32) -> AddArgs {
        AddArgs {
            id: ProductId::parse(id).unwrap(),
            name: format!("Product {id}"),
            price,
            quantity: NonZeroU32::new(quantity).unwrap(),
            brand: String::new(),
            image: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render(&CartSummary::default()), "Cart is empty\n");
    }

    #[tokio::test]
    async fn test_add_persists_across_runs() {
        let dir = tempfile::tempdir().unwrap();

        let cart = open(&config(dir.path()));
        add(&cart, add_args("sku-1", Decimal::new(1250, 2), 2)).unwrap();
        cart.store().flush().await;
        drop(cart);

        let reopened = open(&config(dir.path()));
        let summary = reopened.summary();
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.subtotal, Decimal::new(2500, 2));

        let text = render(&summary);
        assert!(text.contains("2 x Product sku-1 (sku-1) @ $12.50 = $25.00"));
        assert!(text.contains("Tax:      $2.50"));
        assert!(text.contains("Total:    $27.50"));
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cart = open(&config(dir.path()));

        let result = add(&cart, add_args("sku-1", Decimal::new(-1, 0), 1));

        assert!(matches!(result, Err(CliError::InvalidPrice(_))));
        assert_eq!(cart.item_count(), 0);
    }

    #[tokio::test]
    async fn test_sync_replaces_cart() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lines.json");
        std::fs::write(
            &file,
            r#"[{"id":"b","productName":"B","price":3.5,"quantity":2}]"#,
        )
        .unwrap();

        let cart = open(&config(dir.path()));
        add(&cart, add_args("a", Decimal::ONE, 1)).unwrap();
        sync(&cart, &file).unwrap();

        let summary = cart.summary();
        assert!(!summary.is_in_cart(&ProductId::parse("a").unwrap()));
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.subtotal, Decimal::new(7, 0));
    }

    #[tokio::test]
    async fn test_sync_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let cart = open(&config(dir.path()));

        let missing = sync(&cart, &dir.path().join("missing.json"));
        assert!(matches!(missing, Err(CliError::ReadFile { .. })));

        let file = dir.path().join("zero.json");
        std::fs::write(&file, r#"[{"id":"z","productName":"Z","price":1,"quantity":0}]"#)
            .unwrap();
        assert!(matches!(
            sync(&cart, &file),
            Err(CliError::ZeroQuantity(id)) if id.as_str() == "z"
        ));

        std::fs::write(
            &file,
            r#"[{"id":"a","productName":"A","price":1,"quantity":1},
                {"id":"b","productName":"B","price":2,"quantity":1},
                {"id":"a","productName":"A again","price":1,"quantity":3}]"#,
        )
        .unwrap();
        assert!(matches!(
            sync(&cart, &file),
            Err(CliError::DuplicateId(id)) if id.as_str() == "a"
        ));
        assert!(cart.summary().is_empty());

        std::fs::write(&file, "{}").unwrap();
        assert!(matches!(
            sync(&cart, &file),
            Err(CliError::InvalidCartFile(_))
        ));
    }
}
