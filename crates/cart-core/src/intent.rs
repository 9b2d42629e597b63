//! # Payment-Intent Collaborator
//!
//! Trait boundary to the hosted payment provider. The core hands the
//! provider a trusted minor-unit amount and gets back the client secret the
//! confirmation UI needs; the confirmation flow itself is out of scope.

use crate::error::CartResult;
use crate::product::Currency;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Request for a hosted payment intent
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentRequest {
    /// Amount in integer minor units (already authoritative)
    pub amount_minor: i64,

    /// Currency
    pub currency: Currency,

    /// Receipt email (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_email: Option<String>,

    /// Custom metadata passed through to the provider
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Idempotency key (prevents duplicate charges on retry)
    pub idempotency_key: String,
}

impl PaymentIntentRequest {
    /// Create a request with a generated idempotency key
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
            receipt_email: None,
            metadata: HashMap::new(),
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }

    /// Builder: set receipt email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.receipt_email = Some(email.into());
        self
    }

    /// Builder: add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Provider-reported intent status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// A created payment intent
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    /// Provider's intent ID
    pub id: String,

    /// Opaque client secret for the separate confirmation step
    pub client_secret: String,

    /// Intent status as reported by the provider
    pub status: PaymentIntentStatus,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Payment-intent provider trait.
///
/// Implementations: Stripe (cart-stripe). The request amount is already the
/// server-recomputed total; providers never see cart contents.
#[async_trait]
pub trait PaymentIntentProvider: Send + Sync {
    /// Create a payment intent and return its client secret
    async fn create_intent(&self, request: &PaymentIntentRequest) -> CartResult<PaymentIntent>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed provider (dynamic dispatch)
pub type BoxedPaymentIntentProvider = Arc<dyn PaymentIntentProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = PaymentIntentRequest::new(3500, Currency::EUR)
            .with_email("buyer@example.com")
            .with_metadata("source", "storefront");

        assert_eq!(request.amount_minor, 3500);
        assert_eq!(request.receipt_email.as_deref(), Some("buyer@example.com"));
        assert_eq!(request.metadata.get("source").map(String::as_str), Some("storefront"));
        assert!(!request.idempotency_key.is_empty());
    }

    #[test]
    fn test_status_deserializes_unknown() {
        let status: PaymentIntentStatus = serde_json::from_str("\"succeeded\"").unwrap();
        assert_eq!(status, PaymentIntentStatus::Succeeded);

        let status: PaymentIntentStatus =
            serde_json::from_str("\"some_future_status\"").unwrap();
        assert_eq!(status, PaymentIntentStatus::Unknown);
    }
}
