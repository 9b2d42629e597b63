//! # Application State
//!
//! Shared state for the Axum application.
//! Wires the cart store, catalog, totalizer, and payment provider together.

use cart_core::{
    BoxedCatalog, BoxedPaymentIntentProvider, CartStore, CheckoutTotalizer, Currency,
    JsonFileLocalStore, MemoryCartStore, ProductCatalog,
};
use cart_supabase::{SupabaseCartStore, SupabaseCatalog, SupabaseConfig};
use cart_stripe::StripePaymentIntents;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Checkout currency
    pub currency: Currency,
    /// Flat shipping surcharge in minor units
    pub shipping_minor: i64,
    /// Directory for device-local cart files
    pub cart_data_dir: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            currency: std::env::var("CURRENCY")
                .ok()
                .and_then(|c| Currency::parse(&c))
                .unwrap_or_default(),
            // The original storefront charged a flat 10.00 shipping
            shipping_minor: std::env::var("SHIPPING_MINOR_UNITS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            cart_data_dir: std::env::var("CART_DATA_DIR")
                .unwrap_or_else(|_| "data/carts".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Unified cart store
    pub cart: Arc<CartStore>,
    /// Product catalog collaborator
    pub catalog: BoxedCatalog,
    /// Checkout totalizer
    pub totalizer: CheckoutTotalizer,
    /// Payment-intent provider
    pub payments: BoxedPaymentIntentProvider,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState from the environment.
    ///
    /// Uses Supabase for the catalog and persisted cart when configured;
    /// otherwise falls back to the TOML catalog and the in-memory cart
    /// store for single-node development.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let payments = StripePaymentIntents::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        let (catalog, persisted): (BoxedCatalog, Arc<dyn cart_core::PersistedCartStore>) =
            match SupabaseConfig::from_env() {
                Ok(supabase) => (
                    Arc::new(SupabaseCatalog::with_config(&supabase)),
                    Arc::new(SupabaseCartStore::with_config(&supabase)),
                ),
                Err(e) => {
                    tracing::warn!(
                        "Supabase not configured ({}), using local catalog and in-memory carts",
                        e
                    );
                    let file_catalog = load_product_catalog()?;
                    (
                        Arc::new(file_catalog.clone()),
                        Arc::new(MemoryCartStore::new(file_catalog)),
                    )
                }
            };

        let local = Arc::new(JsonFileLocalStore::new(&config.cart_data_dir));

        Ok(Self::with_parts(
            catalog,
            persisted,
            local,
            Arc::new(payments),
            config,
        ))
    }

    /// Assemble state from explicit collaborators (tests, embeddings)
    pub fn with_parts(
        catalog: BoxedCatalog,
        persisted: Arc<dyn cart_core::PersistedCartStore>,
        local: Arc<dyn cart_core::LocalCartStore>,
        payments: BoxedPaymentIntentProvider,
        config: AppConfig,
    ) -> Self {
        let totalizer = CheckoutTotalizer::new(config.currency, config.shipping_minor);
        let cart = Arc::new(CartStore::new(catalog.clone(), persisted, local));

        Self {
            cart,
            catalog,
            totalizer,
            payments,
            config,
        }
    }
}

/// Load product catalog from config file
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    // Try to load from config/products.toml
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    // Return empty catalog if no config found
    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}
