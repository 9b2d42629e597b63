//! # Cart Store
//!
//! One read/write API over the two cart backends: the device-local store
//! for anonymous identities and the server-persisted store for
//! authenticated ones. All reads come back in the same normalized shape
//! regardless of origin.

use crate::catalog::BoxedCatalog;
use crate::error::{CartError, CartResult};
use crate::identity::CartIdentity;
use crate::product::Product;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// A stored cart entry: the minimal `{product_id, qty}` pair.
///
/// This is the only shape that ever crosses the trust boundary to the
/// server; prices are never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Product ID
    pub product_id: String,
    /// Quantity (positive)
    pub qty: u32,
}

impl CartEntry {
    /// Create a new entry
    pub fn new(product_id: impl Into<String>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }

    /// Well-formed: non-empty product id and positive quantity.
    /// Malformed entries in the local store are dropped on read, not errored.
    pub fn is_well_formed(&self) -> bool {
        !self.product_id.is_empty() && self.qty > 0
    }
}

/// Reference to a line item within a cart.
///
/// Anonymous carts key lines by product id; authenticated carts by the
/// persisted row identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "ref")]
pub enum ItemRef {
    /// Product-id reference (anonymous carts)
    Product(String),
    /// Row-id reference (authenticated carts)
    Row(String),
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemRef::Product(id) => write!(f, "product:{}", id),
            ItemRef::Row(id) => write!(f, "row:{}", id),
        }
    }
}

/// A normalized cart line item with its resolved product record
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    /// Reference for removal
    pub item_ref: ItemRef,
    /// Product ID
    pub product_id: String,
    /// Quantity
    pub qty: u32,
    /// Resolved product record
    pub product: Product,
}

impl CartItem {
    /// Line total in decimal major units (display only, not trusted)
    pub fn line_total(&self) -> f64 {
        self.product.price * self.qty as f64
    }
}

/// A persisted cart row joined with its product record
#[derive(Debug, Clone, Deserialize)]
pub struct PersistedCartRow {
    /// Row identifier
    pub id: String,
    /// Product ID
    pub product_id: String,
    /// Quantity
    pub qty: u32,
    /// When the row was created
    pub added_at: DateTime<Utc>,
    /// Embedded product record from the joined listing query
    pub product: Product,
}

/// Device-local cart persistence (anonymous identities).
///
/// No transactional guarantees: single-writer is assumed and concurrent
/// writers race with last-write-wins.
#[async_trait]
pub trait LocalCartStore: Send + Sync {
    /// Load the serialized entry list for a device scope
    async fn load(&self, device_token: &str) -> CartResult<Vec<CartEntry>>;

    /// Replace the serialized entry list for a device scope
    async fn save(&self, device_token: &str, entries: &[CartEntry]) -> CartResult<()>;
}

/// Server-persisted cart store (authenticated identities).
#[async_trait]
pub trait PersistedCartStore: Send + Sync {
    /// Joined listing: cart rows with embedded product records, one round trip
    async fn list_joined(&self, user_id: &str) -> CartResult<Vec<PersistedCartRow>>;

    /// Atomic upsert-or-increment by `(user_id, product_id, delta_qty)`.
    ///
    /// Must be a single operation at the storage layer; separate
    /// read-then-write calls lose updates under concurrent adds.
    async fn upsert_increment(
        &self,
        user_id: &str,
        product_id: &str,
        delta_qty: u32,
    ) -> CartResult<()>;

    /// Delete by row identifier; deleting a missing row is a no-op
    async fn delete_row(&self, row_id: &str) -> CartResult<()>;

    /// Delete all rows for a user
    async fn delete_all(&self, user_id: &str) -> CartResult<()>;
}

/// Notification emitted after every successful cart write.
///
/// Badge counters and summary views subscribe through
/// [`CartStore::subscribe`] instead of listening to ambient global events.
#[derive(Debug, Clone)]
pub struct CartChanged {
    /// Identity whose cart changed
    pub identity: CartIdentity,
}

/// Unified cart store over the local and persisted backends
pub struct CartStore {
    catalog: BoxedCatalog,
    persisted: Arc<dyn PersistedCartStore>,
    local: Arc<dyn LocalCartStore>,
    events: broadcast::Sender<CartChanged>,
}

impl CartStore {
    /// Create a cart store over the given collaborators
    pub fn new(
        catalog: BoxedCatalog,
        persisted: Arc<dyn PersistedCartStore>,
        local: Arc<dyn LocalCartStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            catalog,
            persisted,
            local,
            events,
        }
    }

    /// Subscribe to cart-changed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.events.subscribe()
    }

    fn notify(&self, identity: &CartIdentity) {
        // Send fails only when nobody is subscribed
        let _ = self.events.send(CartChanged {
            identity: identity.clone(),
        });
    }

    /// List the cart as normalized line items with resolved products.
    ///
    /// All-or-nothing: an entry whose product the catalog no longer knows
    /// fails the whole listing with `InvalidCart`; collaborator I/O failures
    /// propagate as `CatalogUnavailable` / `StoreUnavailable`. Malformed
    /// local entries are dropped silently before resolution.
    pub async fn list_items(&self, identity: &CartIdentity) -> CartResult<Vec<CartItem>> {
        match identity {
            CartIdentity::Anonymous { device_token } => {
                let entries = self.local.load(device_token).await?;
                let total = entries.len();
                let valid: Vec<CartEntry> =
                    entries.into_iter().filter(CartEntry::is_well_formed).collect();
                if valid.len() < total {
                    debug!(
                        dropped = total - valid.len(),
                        "dropped malformed local cart entries"
                    );
                }
                if valid.is_empty() {
                    return Ok(Vec::new());
                }

                let mut ids: Vec<String> =
                    valid.iter().map(|e| e.product_id.clone()).collect();
                ids.sort();
                ids.dedup();

                let products = self.catalog.resolve_products(&ids).await?;

                valid
                    .into_iter()
                    .map(|entry| {
                        let product =
                            products.get(&entry.product_id).cloned().ok_or_else(|| {
                                CartError::InvalidCart(format!(
                                    "unresolvable product: {}",
                                    entry.product_id
                                ))
                            })?;
                        Ok(CartItem {
                            item_ref: ItemRef::Product(entry.product_id.clone()),
                            product_id: entry.product_id,
                            qty: entry.qty,
                            product,
                        })
                    })
                    .collect()
            }
            CartIdentity::Authenticated { user_id } => {
                let rows = self.persisted.list_joined(user_id).await?;
                Ok(rows
                    .into_iter()
                    .map(|row| CartItem {
                        item_ref: ItemRef::Row(row.id),
                        product_id: row.product_id,
                        qty: row.qty,
                        product: row.product,
                    })
                    .collect())
            }
        }
    }

    /// Add a product to the cart, merging by product id.
    ///
    /// Anonymous: local read-modify-write (single-writer assumption).
    /// Authenticated: atomic upsert-or-increment at the storage layer.
    pub async fn add_item(
        &self,
        identity: &CartIdentity,
        product_id: &str,
        qty: u32,
    ) -> CartResult<()> {
        if product_id.is_empty() {
            return Err(CartError::InvalidLineItem("product id is empty".into()));
        }
        if qty == 0 {
            return Err(CartError::InvalidLineItem(
                "quantity must be positive".into(),
            ));
        }

        match identity {
            CartIdentity::Anonymous { device_token } => {
                let mut entries = self.local.load(device_token).await?;
                match entries.iter_mut().find(|e| e.product_id == product_id) {
                    Some(existing) => existing.qty += qty,
                    None => entries.push(CartEntry::new(product_id, qty)),
                }
                self.local.save(device_token, &entries).await?;
            }
            CartIdentity::Authenticated { user_id } => {
                self.persisted
                    .upsert_increment(user_id, product_id, qty)
                    .await?;
            }
        }

        self.notify(identity);
        Ok(())
    }

    /// Remove a line item. Idempotent: a missing reference is a no-op.
    ///
    /// The reference kind must match the identity: product-id refs for
    /// anonymous carts, row-id refs for authenticated carts.
    pub async fn remove_item(
        &self,
        identity: &CartIdentity,
        item_ref: &ItemRef,
    ) -> CartResult<()> {
        match (identity, item_ref) {
            (CartIdentity::Anonymous { device_token }, ItemRef::Product(product_id)) => {
                let entries = self.local.load(device_token).await?;
                let remaining: Vec<CartEntry> = entries
                    .into_iter()
                    .filter(|e| &e.product_id != product_id)
                    .collect();
                self.local.save(device_token, &remaining).await?;
            }
            (CartIdentity::Authenticated { .. }, ItemRef::Row(row_id)) => {
                self.persisted.delete_row(row_id).await?;
            }
            (CartIdentity::Anonymous { .. }, ItemRef::Row(_)) => {
                return Err(CartError::InvalidLineItem(
                    "row reference on an anonymous cart".into(),
                ));
            }
            (CartIdentity::Authenticated { .. }, ItemRef::Product(_)) => {
                return Err(CartError::InvalidLineItem(
                    "product reference on an authenticated cart".into(),
                ));
            }
        }

        self.notify(identity);
        Ok(())
    }

    /// Remove all line items. Requires an authenticated identity.
    pub async fn clear(&self, identity: &CartIdentity) -> CartResult<()> {
        match identity {
            CartIdentity::Anonymous { .. } => Err(CartError::NotAuthenticated),
            CartIdentity::Authenticated { user_id } => {
                self.persisted.delete_all(user_id).await?;
                self.notify(identity);
                Ok(())
            }
        }
    }

    /// Merge an anonymous cart into an authenticated one on login.
    ///
    /// Merge-by-product-id with quantity summation through the atomic
    /// increment, then the local side is emptied. Returns the number of
    /// entries merged.
    pub async fn merge_into_authenticated(
        &self,
        device_token: &str,
        user_id: &str,
    ) -> CartResult<usize> {
        let entries = self.local.load(device_token).await?;
        let valid: Vec<CartEntry> =
            entries.into_iter().filter(CartEntry::is_well_formed).collect();

        for entry in &valid {
            self.persisted
                .upsert_increment(user_id, &entry.product_id, entry.qty)
                .await?;
        }

        self.local.save(device_token, &[]).await?;
        self.notify(&CartIdentity::authenticated(user_id));
        Ok(valid.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::{MemoryCartStore, MemoryLocalStore};
    use crate::product::{Product, ProductCatalog};

    fn test_catalog() -> ProductCatalog {
        ProductCatalog::new()
            .with_product(Product::new("p1", "First", 12.50))
            .with_product(Product::new("p2", "Second", 3.99))
    }

    fn test_store() -> (CartStore, Arc<MemoryLocalStore>) {
        let catalog = Arc::new(test_catalog());
        let local = Arc::new(MemoryLocalStore::new());
        let persisted = Arc::new(MemoryCartStore::new(test_catalog()));
        (
            CartStore::new(catalog, persisted, local.clone()),
            local,
        )
    }

    #[tokio::test]
    async fn test_add_merges_by_product_id() {
        let (store, _) = test_store();
        let anon = CartIdentity::anonymous("dev-1");

        store.add_item(&anon, "p1", 1).await.unwrap();
        store.add_item(&anon, "p1", 1).await.unwrap();

        let items = store.list_items(&anon).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].qty, 2);
    }

    #[tokio::test]
    async fn test_add_merges_for_authenticated() {
        let (store, _) = test_store();
        let auth = CartIdentity::authenticated("user-1");

        store.add_item(&auth, "p1", 1).await.unwrap();
        store.add_item(&auth, "p1", 2).await.unwrap();
        store.add_item(&auth, "p2", 1).await.unwrap();

        let items = store.list_items(&auth).await.unwrap();
        assert_eq!(items.len(), 2);
        let p1 = items.iter().find(|i| i.product_id == "p1").unwrap();
        assert_eq!(p1.qty, 3);
        assert!(matches!(p1.item_ref, ItemRef::Row(_)));
    }

    #[tokio::test]
    async fn test_add_rejects_zero_quantity() {
        let (store, _) = test_store();
        let anon = CartIdentity::anonymous("dev-1");

        let err = store.add_item(&anon, "p1", 0).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidLineItem(_)));
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let (store, _) = test_store();
        let anon = CartIdentity::anonymous("dev-1");

        store.add_item(&anon, "p1", 2).await.unwrap();
        store
            .remove_item(&anon, &ItemRef::Product("ghost".into()))
            .await
            .unwrap();

        let items = store.list_items(&anon).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].qty, 2);
    }

    #[tokio::test]
    async fn test_remove_by_row_id() {
        let (store, _) = test_store();
        let auth = CartIdentity::authenticated("user-1");

        store.add_item(&auth, "p1", 1).await.unwrap();
        let items = store.list_items(&auth).await.unwrap();
        let item_ref = items[0].item_ref.clone();

        store.remove_item(&auth, &item_ref).await.unwrap();
        assert!(store.list_items(&auth).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_rejects_mismatched_ref_kind() {
        let (store, _) = test_store();
        let anon = CartIdentity::anonymous("dev-1");

        let err = store
            .remove_item(&anon, &ItemRef::Row("some-row".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidLineItem(_)));
    }

    #[tokio::test]
    async fn test_clear_requires_authentication() {
        let (store, _) = test_store();
        let anon = CartIdentity::anonymous("dev-1");

        let err = store.clear(&anon).await.unwrap_err();
        assert!(matches!(err, CartError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_clear_empties_authenticated_cart() {
        let (store, _) = test_store();
        let auth = CartIdentity::authenticated("user-1");

        store.add_item(&auth, "p1", 1).await.unwrap();
        store.add_item(&auth, "p2", 1).await.unwrap();
        store.clear(&auth).await.unwrap();

        assert!(store.list_items(&auth).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_drops_malformed_local_entries() {
        let (store, local) = test_store();
        let anon = CartIdentity::anonymous("dev-1");

        local
            .save(
                "dev-1",
                &[
                    CartEntry::new("p1", 2),
                    CartEntry::new("", 1),
                    CartEntry::new("p2", 0),
                ],
            )
            .await
            .unwrap();

        let items = store.list_items(&anon).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "p1");
    }

    #[tokio::test]
    async fn test_list_fails_on_unresolvable_product() {
        let (store, local) = test_store();
        let anon = CartIdentity::anonymous("dev-1");

        local
            .save("dev-1", &[CartEntry::new("ghost", 1)])
            .await
            .unwrap();

        let err = store.list_items(&anon).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidCart(_)));
    }

    #[tokio::test]
    async fn test_merge_sums_quantities_and_empties_local() {
        let (store, local) = test_store();
        let anon = CartIdentity::anonymous("dev-1");
        let auth = CartIdentity::authenticated("user-1");

        store.add_item(&auth, "p1", 1).await.unwrap();
        store.add_item(&anon, "p1", 2).await.unwrap();
        store.add_item(&anon, "p2", 1).await.unwrap();

        let merged = store
            .merge_into_authenticated("dev-1", "user-1")
            .await
            .unwrap();
        assert_eq!(merged, 2);

        let items = store.list_items(&auth).await.unwrap();
        let p1 = items.iter().find(|i| i.product_id == "p1").unwrap();
        assert_eq!(p1.qty, 3);

        assert!(local.load("dev-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_receives_change_events() {
        let (store, _) = test_store();
        let anon = CartIdentity::anonymous("dev-1");

        let mut events = store.subscribe();
        store.add_item(&anon, "p1", 1).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.identity, anon);
    }
}
