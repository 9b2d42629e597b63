//! # Storefront-Cart RS
//!
//! Cart reconciliation and trusted checkout totals for the storefront.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_PUBLISHABLE_KEY=pk_test_...
//! export SUPABASE_URL=https://xyz.supabase.co
//! export SUPABASE_KEY=...
//!
//! # Run the server
//! storefront-cart
//! ```

use cart_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Currency: {}", state.config.currency);
    info!("Payment provider: {}", state.payments.provider_name());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🛒 Storefront-Cart starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Checkout: POST http://{}/create-payment-intent", addr);
        info!("🧺 Cart: GET http://{}/api/v1/cart", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 Storefront-Cart RS 🛒
  ━━━━━━━━━━━━━━━━━━━━━━━━
  Cart reconciliation & trusted checkout totals
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
