//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CART_STORAGE_KEY` - Key holding the cart snapshot (default: `shopping_cart`)
//! - `CART_STORAGE_DIR` - Directory for file-backed storage (default: `.cart`)
//! - `CART_TAX_RATE` - Tax as a fraction of the subtotal (default: 0.10)
//! - `CART_SHIPPING` - Flat shipping amount (default: 0)
//! - `CART_CURRENCY` - ISO 4217 currency code (default: USD)
//! - `CART_PERSIST_DEBOUNCE_MS` - Write-behind quiet period (default: 100)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use storefront_cart_core::CurrencyCode;
use thiserror::Error;

use crate::persistence::DEFAULT_STORAGE_KEY;
use crate::selectors::{DEFAULT_TAX_RATE, Pricing};

const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 100;

/// Default write-behind quiet period.
pub const DEFAULT_PERSIST_DEBOUNCE: Duration = Duration::from_millis(DEFAULT_PERSIST_DEBOUNCE_MS);

const DEFAULT_STORAGE_DIR: &str = ".cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Storage key holding the serialized cart
    pub storage_key: String,
    /// Directory used by file-backed storage
    pub storage_dir: PathBuf,
    /// Tax, shipping and currency applied to summaries
    pub pricing: Pricing,
    /// Quiet period before a mutation is written back to storage
    pub persist_debounce: Duration,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            pricing: Pricing::default(),
            persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed or is
    /// out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed or is
    /// out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage_key = lookup("CART_STORAGE_KEY").unwrap_or(defaults.storage_key);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let storage_dir = lookup("CART_STORAGE_DIR").map_or(defaults.storage_dir, PathBuf::from);

        let tax_rate = parse_var(&lookup, "CART_TAX_RATE", DEFAULT_TAX_RATE)?;
        if tax_rate.is_sign_negative() || tax_rate > Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "CART_TAX_RATE".to_string(),
                format!("must be between 0 and 1 (got {tax_rate})"),
            ));
        }

        let shipping = parse_var(&lookup, "CART_SHIPPING", Decimal::ZERO)?;
        if shipping.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_SHIPPING".to_string(),
                format!("must not be negative (got {shipping})"),
            ));
        }

        let currency = match lookup("CART_CURRENCY") {
            Some(code) => code
                .parse::<CurrencyCode>()
                .map_err(|e| ConfigError::InvalidEnvVar("CART_CURRENCY".to_string(), e))?,
            None => CurrencyCode::default(),
        };

        let debounce_ms = parse_var(
            &lookup,
            "CART_PERSIST_DEBOUNCE_MS",
            DEFAULT_PERSIST_DEBOUNCE_MS,
        )?;

        Ok(Self {
            storage_key,
            storage_dir,
            pricing: Pricing {
                tax_rate,
                shipping,
                currency,
            },
            persist_debounce: Duration::from_millis(debounce_ms),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
