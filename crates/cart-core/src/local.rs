//! # In-Process Cart Stores
//!
//! Local (device-scoped) cart persistence plus an in-memory persisted-store
//! implementation. The JSON file store is the server-side analog of the
//! original browser-local cart; the memory stores back tests and
//! single-node deployments without an external database.

use crate::cart::{CartEntry, LocalCartStore, PersistedCartStore, PersistedCartRow};
use crate::error::{CartError, CartResult};
use crate::product::ProductCatalog;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// In-memory local cart store (one entry list per device token)
#[derive(Default)]
pub struct MemoryLocalStore {
    carts: Mutex<HashMap<String, Vec<CartEntry>>>,
}

impl MemoryLocalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalCartStore for MemoryLocalStore {
    async fn load(&self, device_token: &str) -> CartResult<Vec<CartEntry>> {
        let carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(carts.get(device_token).cloned().unwrap_or_default())
    }

    async fn save(&self, device_token: &str, entries: &[CartEntry]) -> CartResult<()> {
        let mut carts = self.carts.lock().unwrap_or_else(PoisonError::into_inner);
        carts.insert(device_token.to_string(), entries.to_vec());
        Ok(())
    }
}

/// JSON-file local cart store: one file per device scope under a base
/// directory. No transactional guarantees; concurrent writers race with
/// last-write-wins.
pub struct JsonFileLocalStore {
    dir: PathBuf,
}

impl JsonFileLocalStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, device_token: &str) -> PathBuf {
        // Device tokens come from the outside; never let them traverse paths
        let safe: String = device_token
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

#[async_trait]
impl LocalCartStore for JsonFileLocalStore {
    async fn load(&self, device_token: &str) -> CartResult<Vec<CartEntry>> {
        let path = self.path_for(device_token);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CartError::StoreUnavailable(e.to_string())),
        };

        // A corrupt file behaves like an empty cart, same as the original
        // local-storage parse fallback
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    async fn save(&self, device_token: &str, entries: &[CartEntry]) -> CartResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CartError::StoreUnavailable(e.to_string()))?;

        let serialized = serde_json::to_string(entries)
            .map_err(|e| CartError::Serialization(e.to_string()))?;

        tokio::fs::write(self.path_for(device_token), serialized)
            .await
            .map_err(|e| CartError::StoreUnavailable(e.to_string()))
    }
}

#[derive(Debug, Clone)]
struct MemoryRow {
    id: String,
    user_id: String,
    product_id: String,
    qty: u32,
    added_at: DateTime<Utc>,
}

/// In-memory persisted cart store joined against a [`ProductCatalog`].
///
/// The upsert-or-increment runs under one lock, giving the same atomicity
/// the real store provides at the storage layer.
pub struct MemoryCartStore {
    rows: Mutex<Vec<MemoryRow>>,
    catalog: ProductCatalog,
}

impl MemoryCartStore {
    /// Create an empty store joining against the given catalog
    pub fn new(catalog: ProductCatalog) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            catalog,
        }
    }
}

#[async_trait]
impl PersistedCartStore for MemoryCartStore {
    async fn list_joined(&self, user_id: &str) -> CartResult<Vec<PersistedCartRow>> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                // Inner-join semantics: rows whose product vanished from the
                // catalog are not listed
                self.catalog.get(&r.product_id).map(|product| PersistedCartRow {
                    id: r.id.clone(),
                    product_id: r.product_id.clone(),
                    qty: r.qty,
                    added_at: r.added_at,
                    product: product.clone(),
                })
            })
            .collect())
    }

    async fn upsert_increment(
        &self,
        user_id: &str,
        product_id: &str,
        delta_qty: u32,
    ) -> CartResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        match rows
            .iter_mut()
            .find(|r| r.user_id == user_id && r.product_id == product_id)
        {
            Some(row) => row.qty += delta_qty,
            None => rows.push(MemoryRow {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                product_id: product_id.to_string(),
                qty: delta_qty,
                added_at: Utc::now(),
            }),
        }
        Ok(())
    }

    async fn delete_row(&self, row_id: &str) -> CartResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.retain(|r| r.id != row_id);
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> CartResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.retain(|r| r.user_id != user_id);
        Ok(())
    }
}
