//! # Cart Error Types
//!
//! Typed error handling for the storefront cart core.
//! All cart and checkout operations return `Result<T, CartError>`.

use thiserror::Error;

/// Core error type for all cart and checkout operations
#[derive(Debug, Error)]
pub enum CartError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cart is empty or references a product the catalog cannot resolve
    #[error("Invalid cart: {0}")]
    InvalidCart(String),

    /// Malformed line item (non-positive quantity, empty product id)
    #[error("Invalid line item: {0}")]
    InvalidLineItem(String),

    /// Computed total is zero or negative; gates payment-intent creation
    #[error("Non-positive amount: {amount_minor}")]
    NonPositiveAmount { amount_minor: i64 },

    /// Catalog collaborator failed (network, timeout, bad response)
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Persisted cart store failed (network, timeout, bad response)
    #[error("Cart store unavailable: {0}")]
    StoreUnavailable(String),

    /// Operation requires an authenticated identity
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with a collaborator
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CartError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CartError::NetworkError(_)
                | CartError::CatalogUnavailable(_)
                | CartError::StoreUnavailable(_)
                | CartError::ProviderError { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CartError::Configuration(_) => 500,
            CartError::InvalidCart(_) => 400,
            CartError::InvalidLineItem(_) => 400,
            CartError::NonPositiveAmount { .. } => 400,
            CartError::CatalogUnavailable(_) => 503,
            CartError::StoreUnavailable(_) => 503,
            CartError::NotAuthenticated => 401,
            CartError::ProviderError { .. } => 502,
            CartError::NetworkError(_) => 503,
            CartError::Serialization(_) => 500,
            CartError::Internal(_) => 500,
        }
    }
}

/// Result type alias for cart operations
pub type CartResult<T> = Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CartError::NetworkError("timeout".into()).is_retryable());
        assert!(CartError::CatalogUnavailable("down".into()).is_retryable());
        assert!(CartError::StoreUnavailable("down".into()).is_retryable());
        assert!(!CartError::InvalidCart("empty".into()).is_retryable());
        assert!(!CartError::NotAuthenticated.is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CartError::InvalidCart("empty".into()).status_code(), 400);
        assert_eq!(
            CartError::InvalidLineItem("qty".into()).status_code(),
            400
        );
        assert_eq!(
            CartError::NonPositiveAmount { amount_minor: 0 }.status_code(),
            400
        );
        assert_eq!(CartError::NotAuthenticated.status_code(), 401);
        assert_eq!(CartError::CatalogUnavailable("x".into()).status_code(), 503);
        assert_eq!(
            CartError::ProviderError {
                provider: "stripe".into(),
                message: "boom".into()
            }
            .status_code(),
            502
        );
    }
}
