//! # cart-stripe
//!
//! Stripe PaymentIntents provider for storefront-cart-rs.
//!
//! The server recomputes the checkout total from trusted catalog prices and
//! hands only that amount (in minor units) to this crate; the returned
//! client secret drives the separate hosted confirmation step.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cart_stripe::StripePaymentIntents;
//! use cart_core::{Currency, PaymentIntentProvider, PaymentIntentRequest};
//!
//! // Create provider from environment
//! let provider = StripePaymentIntents::from_env()?;
//!
//! let request = PaymentIntentRequest::new(3500, Currency::EUR)
//!     .with_email("buyer@example.com");
//! let intent = provider.create_intent(&request).await?;
//!
//! // Hand intent.client_secret to the confirmation UI
//! ```

pub mod config;
pub mod intent;

// Re-exports
pub use config::StripeConfig;
pub use intent::StripePaymentIntents;
