//! # cart-supabase
//!
//! Supabase REST implementations of the cart-core collaborator traits.
//!
//! This crate provides:
//! - **SupabaseCatalog** — `Catalog` over the `products` table, batched
//!   `id=in.(...)` resolution
//! - **SupabaseCartStore** — `PersistedCartStore` over the `carts` table,
//!   with the atomic `increment_cart_item` stored procedure backing the
//!   upsert-or-increment
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_supabase::{SupabaseCartStore, SupabaseCatalog, SupabaseConfig};
//!
//! let config = SupabaseConfig::from_env()?;
//! let catalog = SupabaseCatalog::with_config(&config);
//! let persisted = SupabaseCartStore::with_config(&config);
//!
//! let cart = CartStore::new(Arc::new(catalog), Arc::new(persisted), local);
//! ```

pub mod cart;
pub mod catalog;
pub mod config;

// Re-exports
pub use cart::SupabaseCartStore;
pub use catalog::SupabaseCatalog;
pub use config::SupabaseConfig;
