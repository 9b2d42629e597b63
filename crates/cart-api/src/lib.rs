//! # cart-api
//!
//! HTTP API layer for storefront-cart-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for cart management and checkout
//! - Header-based identity resolution (`x-user-id` / `x-device-id`)
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/create-payment-intent` | Create payment intent from trusted prices |
//! | GET | `/api/v1/cart` | List cart with display estimate |
//! | DELETE | `/api/v1/cart` | Clear cart (authenticated only) |
//! | POST | `/api/v1/cart/items` | Add product to cart |
//! | DELETE | `/api/v1/cart/items/:ref` | Remove a line |
//! | POST | `/api/v1/cart/merge` | Merge device cart into user cart |
//! | GET | `/api/v1/products` | List products |
//! | GET | `/api/v1/products/:id` | Get product |

pub mod handlers;
pub mod identity;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
