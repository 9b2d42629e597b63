//! # Routes
//!
//! Axum router configuration for the storefront cart API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Checkout:
///   - POST /create-payment-intent - Recompute total, create payment intent
///
/// - Cart (identity from x-user-id / x-device-id headers):
///   - GET    /api/v1/cart - List the cart with a display estimate
///   - DELETE /api/v1/cart - Clear the cart (authenticated only)
///   - POST   /api/v1/cart/items - Add a product
///   - DELETE /api/v1/cart/items/{item_ref} - Remove a line
///   - POST   /api/v1/cart/merge - Merge the device cart into the user cart
///
/// - Products:
///   - GET /api/v1/products - List all products
///   - GET /api/v1/products/{product_id} - Get product by ID
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - the storefront runs on a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cart_routes = Router::new()
        .route("/", get(handlers::get_cart).delete(handlers::clear_cart))
        .route("/items", post(handlers::add_cart_item))
        .route("/items/{item_ref}", delete(handlers::remove_cart_item))
        .route("/merge", post(handlers::merge_cart));

    let product_routes = Router::new()
        .route("/", get(handlers::list_products))
        .route("/{product_id}", get(handlers::get_product));

    let api_routes = Router::new()
        .nest("/cart", cart_routes)
        .nest("/products", product_routes);

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Checkout boundary, path kept stable for the storefront client
        .route(
            "/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        // API v1
        .nest("/api/v1", api_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
