//! # Catalog Collaborator
//!
//! Trait boundary to the product catalog. Implementations: the Supabase
//! REST catalog (cart-supabase) and the in-memory [`ProductCatalog`] for
//! tests and single-node deployments.

use crate::error::CartResult;
use crate::product::{Product, ProductCatalog};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only product resolution.
///
/// `resolve_products` must return entries for every id it can find and omit
/// unknown ones; callers detect omissions and fail the operation. A failed
/// request (network, timeout) is reported as `CatalogUnavailable`, never as
/// an empty map.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Batch-resolve products by identifier in a single request
    async fn resolve_products(&self, ids: &[String]) -> CartResult<HashMap<String, Product>>;

    /// List all products (for storefront display)
    async fn list_products(&self) -> CartResult<Vec<Product>>;
}

/// Type alias for a shared catalog handle (dynamic dispatch)
pub type BoxedCatalog = Arc<dyn Catalog>;

#[async_trait]
impl Catalog for ProductCatalog {
    async fn resolve_products(&self, ids: &[String]) -> CartResult<HashMap<String, Product>> {
        let mut resolved = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = self.get(id) {
                resolved.insert(id.clone(), product.clone());
            }
        }
        Ok(resolved)
    }

    async fn list_products(&self) -> CartResult<Vec<Product>> {
        Ok(self.products.clone())
    }
}
