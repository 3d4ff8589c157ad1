//! Durable storage for the cart snapshot.
//!
//! The cart is mirrored under a single key as a JSON array of line items.
//! [`CartPersistence`] owns that mirror: it validates entries on the way in,
//! writes the whole array in one operation on the way out, and never lets a
//! storage problem escape as anything worse than a log line (writes) or a
//! `LoadCartFailure` (reads).
//!
//! # Backends
//!
//! - [`MemoryStorage`] - in-process map with an optional quota
//! - [`FileStorage`] - one file per key, replaced atomically on write

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use storefront_cart_core::CartLineItem;
use tempfile::NamedTempFile;
use tracing::{debug, error, instrument, warn};

use crate::error::StorageError;

/// Default storage key for the cart snapshot.
pub const DEFAULT_STORAGE_KEY: &str = "shopping_cart";

// =============================================================================
// Storage Backends
// =============================================================================

/// A durable string key-value store.
///
/// Operations are synchronous and fallible. `set` must replace the whole
/// value or leave the previous one untouched.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value for `key`. A missing key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write was rejected; the old value survives.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage.
///
/// Mirrors browser-style storage limits: with a quota set, a write that would
/// push the total size of stored values past it fails and the previous value
/// is kept. Write and remove counters make persistence traffic observable.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
    removes: AtomicUsize,
}

impl MemoryStorage {
    /// Create an empty, unlimited store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes beyond `limit` bytes.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    /// Simulate the backend going away (or coming back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful `set` calls.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of successful `remove` calls.
    #[must_use]
    pub fn remove_count(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory storage disabled".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Unavailable("Lock poisoned".to_string()))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        let mut values = self.lock()?;

        if let Some(limit) = self.quota {
            let others: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        values.insert(key.to_owned(), value.to_owned());
        drop(values);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.lock()?.remove(key);
        self.removes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Directory-backed storage: each key is a `<key>.json` file.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a reader sees either the previous value or the new
/// one.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store files under `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the stored values.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(value.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Cart Persistence
// =============================================================================

/// Reads and writes the cart snapshot under one storage key.
#[derive(Clone)]
pub struct CartPersistence {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl std::fmt::Debug for CartPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartPersistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl CartPersistence {
    /// Persist the cart under `key` in `storage`.
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// The storage key holding the snapshot.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored cart.
    ///
    /// A missing key, unparseable JSON or a non-array value all load as an
    /// empty cart. Entries that fail validation are dropped one by one, as
    /// are repeated ids after their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns an error only when the storage backend itself cannot be read.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn load(&self) -> Result<Vec<CartLineItem>, StorageError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            debug!("No stored cart");
            return Ok(Vec::new());
        };
        Ok(parse_snapshot(&raw))
    }

    /// Write `items` as the new snapshot.
    ///
    /// Failures are logged and dropped; the in-memory cart stays
    /// authoritative and the previous stored value is left as it was.
    pub fn save(&self, items: &[CartLineItem]) {
        match self.try_save(items) {
            Ok(()) => debug!(key = %self.key, items = items.len(), "Saved cart to storage"),
            Err(e) => error!(key = %self.key, error = %e, "Error saving cart to storage"),
        }
    }

    /// Write `items` as the new snapshot, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or written.
    pub fn try_save(&self, items: &[CartLineItem]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items)?;
        self.storage.set(&self.key, &json)
    }

    /// Remove the snapshot key. Failures are logged and dropped.
    pub fn clear(&self) {
        match self.storage.remove(&self.key) {
            Ok(()) => debug!(key = %self.key, "Removed cart from storage"),
            Err(e) => warn!(key = %self.key, error = %e, "Error removing cart from storage"),
        }
    }
}

/// Decode a stored snapshot, keeping every entry that validates.
fn parse_snapshot(raw: &str) -> Vec<CartLineItem> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Stored cart is not valid JSON, starting empty");
            return Vec::new();
        }
    };

    let Value::Array(entries) = value else {
        warn!("Stored cart is not an array, starting empty");
        return Vec::new();
    };

    let stored = entries.len();
    let mut seen = HashSet::new();
    let items: Vec<CartLineItem> = entries
        .into_iter()
        .filter(is_valid_entry)
        .filter_map(|entry| match serde_json::from_value::<CartLineItem>(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!(error = %e, "Dropping undecodable cart entry");
                None
            }
        })
        .filter(|item| {
            let in_range = item.checked_line_total().is_some();
            if !in_range {
                debug!(id = %item.id, "Dropping cart entry with out-of-range line total");
            }
            in_range
        })
        .filter(|item| seen.insert(item.id.clone()))
        .collect();

    if items.len() < stored {
        warn!(
            stored,
            kept = items.len(),
            "Dropped invalid entries from stored cart"
        );
    }
    items
}

/// Structural check applied to each stored entry before decoding.
fn is_valid_entry(entry: &Value) -> bool {
    let Some(fields) = entry.as_object() else {
        return false;
    };

    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty());
    let product_name = fields.get("productName").is_some_and(Value::is_string);
    let price = fields.get("price").is_some_and(Value::is_number);
    let quantity = fields
        .get("quantity")
        .and_then(Value::as_f64)
        .is_some_and(|quantity| quantity > 0.0);

    id && product_name && price && quantity
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use storefront_cart_core::{Product, ProductId};

    use super::*;

    fn widget(quantity: u32) -> CartLineItem {
        CartLineItem::from_product(
            Product {
                description: "Blue".to_string(),
                image_url: "https://cdn.example.com/a.png".to_string(),
                brand_name: "Acme".to_string(),
                ..Product::new(ProductId::parse("a").unwrap(), "Widget", Decimal::new(999, 2))
            },
            quantity,
        )
    }

    fn memory_persistence() -> (Arc<MemoryStorage>, CartPersistence) {
        let storage = Arc::new(MemoryStorage::new());
        let persistence = CartPersistence::new(storage.clone(), DEFAULT_STORAGE_KEY);
        (storage, persistence)
    }

    #[test]
    fn test_load_missing_key_is_empty() {
        let (_, persistence) = memory_persistence();
        assert!(persistence.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (_, persistence) = memory_persistence();
        let items = vec![widget(2)];

        persistence.save(&items);

        assert_eq!(persistence.load().unwrap(), items);
    }

    #[test]
    fn test_stored_layout_uses_camel_case_numbers() {
        let (storage, persistence) = memory_persistence();
        persistence.save(&[widget(2)]);

        let raw = storage.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(
            value,
            json!([{
                "id": "a",
                "productName": "Widget",
                "description": "Blue",
                "imageUrl": "https://cdn.example.com/a.png",
                "price": 9.99,
                "brandName": "Acme",
                "quantity": 2
            }])
        );
    }

    #[test]
    fn test_load_malformed_json_is_empty() {
        let (storage, persistence) = memory_persistence();
        storage.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();

        assert!(persistence.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_non_array_is_empty() {
        let (storage, persistence) = memory_persistence();
        storage
            .set(DEFAULT_STORAGE_KEY, r#"{"id":"a","productName":"W","price":1,"quantity":1}"#)
            .unwrap();

        assert!(persistence.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_drops_zero_quantity_entry() {
        let (storage, persistence) = memory_persistence();
        let raw = json!([
            {"id": "a", "productName": "Widget", "price": 9.99, "quantity": 2},
            {"id": "b", "productName": "Gadget", "price": 5, "quantity": 0}
        ]);
        storage.set(DEFAULT_STORAGE_KEY, &raw.to_string()).unwrap();

        let items = persistence.load().unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().id.as_str(), "a");
    }

    #[test]
    fn test_load_drops_each_kind_of_invalid_entry() {
        let (storage, persistence) = memory_persistence();
        let raw = json!([
            "not an object",
            {"id": "", "productName": "Empty id", "price": 1, "quantity": 1},
            {"id": 7, "productName": "Numeric id", "price": 1, "quantity": 1},
            {"id": "c", "price": 1, "quantity": 1},
            {"id": "d", "productName": "String price", "price": "1.00", "quantity": 1},
            {"id": "e", "productName": "Negative qty", "price": 1, "quantity": -3},
            {"id": "f", "productName": "Fractional qty", "price": 1, "quantity": 1.5},
            {"id": "g", "productName": "Kept", "price": 2.5, "quantity": 3}
        ]);
        storage.set(DEFAULT_STORAGE_KEY, &raw.to_string()).unwrap();

        let items = persistence.load().unwrap();

        assert_eq!(items.len(), 1);
        let kept = items.first().unwrap();
        assert_eq!(kept.id.as_str(), "g");
        assert_eq!(kept.price, Decimal::new(25, 1));
        assert_eq!(kept.quantity, 3);
    }

    #[test]
    fn test_load_keeps_first_of_duplicate_ids() {
        let (storage, persistence) = memory_persistence();
        let raw = json!([
            {"id": "a", "productName": "First", "price": 1, "quantity": 1},
            {"id": "a", "productName": "Second", "price": 1, "quantity": 4}
        ]);
        storage.set(DEFAULT_STORAGE_KEY, &raw.to_string()).unwrap();

        let items = persistence.load().unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().product_name, "First");
    }

    #[test]
    fn test_load_drops_entry_whose_line_total_overflows() {
        let (storage, persistence) = memory_persistence();
        let raw = json!([
            {"id": "huge", "productName": "Huge", "price": 7e28, "quantity": 2},
            {"id": "a", "productName": "Widget", "price": 9.99, "quantity": 2}
        ]);
        storage.set(DEFAULT_STORAGE_KEY, &raw.to_string()).unwrap();

        let items = persistence.load().unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().id.as_str(), "a");
    }

    #[test]
    fn test_load_backend_failure_is_error() {
        let (storage, persistence) = memory_persistence();
        storage.set_unavailable(true);

        assert!(matches!(
            persistence.load(),
            Err(StorageError::Unavailable(_))
        ));
    }

    #[test]
    fn test_save_over_quota_keeps_previous_value() {
        let storage = Arc::new(MemoryStorage::with_quota(200));
        let persistence = CartPersistence::new(storage.clone(), DEFAULT_STORAGE_KEY);
        let small = vec![widget(1)];
        persistence.save(&small);

        let big: Vec<CartLineItem> = (0..20)
            .map(|i| {
                CartLineItem::from_product(
                    Product::new(
                        ProductId::parse(&format!("p{i}")).unwrap(),
                        "Bulk item",
                        Decimal::ONE,
                    ),
                    1,
                )
            })
            .collect();

        assert!(matches!(
            persistence.try_save(&big),
            Err(StorageError::QuotaExceeded { .. })
        ));
        persistence.save(&big);

        assert_eq!(persistence.load().unwrap(), small);
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn test_clear_removes_key() {
        let (storage, persistence) = memory_persistence();
        persistence.save(&[widget(1)]);

        persistence.clear();

        assert!(storage.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
        assert_eq!(storage.remove_count(), 1);
    }

    #[test]
    fn test_clear_on_unavailable_storage_does_not_panic() {
        let (storage, persistence) = memory_persistence();
        storage.set_unavailable(true);

        persistence.clear();
        persistence.save(&[widget(1)]);

        assert_eq!(storage.remove_count(), 0);
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = CartPersistence::new(
            Arc::new(FileStorage::new(dir.path().join("nested"))),
            DEFAULT_STORAGE_KEY,
        );
        let items = vec![widget(3)];

        persistence.save(&items);

        assert!(dir.path().join("nested/shopping_cart.json").exists());
        assert_eq!(persistence.load().unwrap(), items);
    }

    #[test]
    fn test_file_storage_missing_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(storage.get("cart").unwrap().is_none());
        storage.remove("cart").unwrap();

        storage.set("cart", "[]").unwrap();
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));

        storage.remove("cart").unwrap();
        assert!(storage.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.set("cart", "[1]").unwrap();
        storage.set("cart", "[2]").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("cart.json")]);
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn test_file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(matches!(
            storage.set("../escape", "[]"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(storage.set("", "[]").is_err());
        assert!(storage.get("a/b").is_err());
    }
}
