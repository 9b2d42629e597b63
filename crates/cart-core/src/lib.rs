//! # cart-core
//!
//! Core types and traits for the storefront cart and checkout engine.
//!
//! This crate provides:
//! - `CartStore` unifying the device-local (anonymous) and server-persisted
//!   (authenticated) cart backends behind one read/write API
//! - `CheckoutTotalizer` computing display estimates and the trusted
//!   minor-unit total that gates payment-intent creation
//! - `Catalog`, `PersistedCartStore`, `LocalCartStore`, and
//!   `PaymentIntentProvider` collaborator traits
//! - `CartError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{CartIdentity, CartStore, CheckoutTotalizer, Currency};
//!
//! let identity = CartIdentity::authenticated("user-42");
//! cart.add_item(&identity, "p1", 2).await?;
//!
//! // Server-side trusted total: only (product_id, qty) pairs go in
//! let totalizer = CheckoutTotalizer::new(Currency::EUR, 1000);
//! let pairs = vec![CartEntry::new("p1", 2)];
//! let total = totalizer.authoritative(catalog.as_ref(), &pairs).await?;
//!
//! let request = PaymentIntentRequest::new(total.total_minor, total.currency);
//! let intent = provider.create_intent(&request).await?;
//! // Hand intent.client_secret to the confirmation UI
//! ```

pub mod cart;
pub mod catalog;
pub mod error;
pub mod identity;
pub mod intent;
pub mod local;
pub mod product;
pub mod totals;

// Re-exports for convenience
pub use cart::{
    CartChanged, CartEntry, CartItem, CartStore, ItemRef, LocalCartStore, PersistedCartRow,
    PersistedCartStore,
};
pub use catalog::{BoxedCatalog, Catalog};
pub use error::{CartError, CartResult};
pub use identity::CartIdentity;
pub use intent::{
    BoxedPaymentIntentProvider, PaymentIntent, PaymentIntentProvider, PaymentIntentRequest,
    PaymentIntentStatus,
};
pub use local::{JsonFileLocalStore, MemoryCartStore, MemoryLocalStore};
pub use product::{Currency, Product, ProductCatalog};
pub use totals::{CheckoutEstimate, CheckoutTotal, CheckoutTotalizer};
