//! # Stripe PaymentIntents
//!
//! Implementation of the Stripe PaymentIntents API. The server hands the
//! intent's client secret to the hosted confirmation flow; only the
//! recomputed authoritative amount ever reaches this module.

use crate::config::StripeConfig;
use async_trait::async_trait;
use cart_core::{
    CartError, CartResult, PaymentIntent, PaymentIntentProvider, PaymentIntentRequest,
    PaymentIntentStatus,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe PaymentIntents provider
pub struct StripePaymentIntents {
    config: StripeConfig,
    client: Client,
}

impl StripePaymentIntents {
    /// Create a new Stripe provider
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> CartResult<Self> {
        let config = StripeConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Publishable key for the confirmation UI
    pub fn publishable_key(&self) -> &str {
        &self.config.publishable_key
    }

    /// Build form data for the Stripe API
    fn build_form(request: &PaymentIntentRequest) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency.as_str().to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];

        if let Some(ref email) = request.receipt_email {
            form_params.push(("receipt_email".to_string(), email.clone()));
        }

        for (key, value) in &request.metadata {
            form_params.push((format!("metadata[{}]", key), value.clone()));
        }

        form_params
    }
}

#[async_trait]
impl PaymentIntentProvider for StripePaymentIntents {
    #[instrument(skip(self, request), fields(amount_minor = request.amount_minor))]
    async fn create_intent(&self, request: &PaymentIntentRequest) -> CartResult<PaymentIntent> {
        if request.amount_minor <= 0 {
            return Err(CartError::NonPositiveAmount {
                amount_minor: request.amount_minor,
            });
        }

        let form_params = Self::build_form(request);

        debug!(
            "Creating Stripe payment intent: amount={}, currency={}",
            request.amount_minor, request.currency
        );

        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| CartError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CartError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            // Parse Stripe error
            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(CartError::ProviderError {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(CartError::ProviderError {
                provider: "stripe".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let intent_response: StripePaymentIntentResponse = serde_json::from_str(&body)
            .map_err(|e| {
                CartError::Serialization(format!("Failed to parse Stripe response: {}", e))
            })?;

        let client_secret = intent_response.client_secret.ok_or_else(|| {
            CartError::ProviderError {
                provider: "stripe".to_string(),
                message: "Payment intent response missing client_secret".to_string(),
            }
        })?;

        info!("Created Stripe payment intent: id={}", intent_response.id);

        let created_at = intent_response
            .created
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);

        Ok(PaymentIntent {
            id: intent_response.id,
            client_secret,
            status: parse_status(&intent_response.status),
            created_at,
        })
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

fn parse_status(status: &str) -> PaymentIntentStatus {
    match status {
        "requires_payment_method" => PaymentIntentStatus::RequiresPaymentMethod,
        "requires_confirmation" => PaymentIntentStatus::RequiresConfirmation,
        "requires_action" => PaymentIntentStatus::RequiresAction,
        "processing" => PaymentIntentStatus::Processing,
        "succeeded" => PaymentIntentStatus::Succeeded,
        "canceled" => PaymentIntentStatus::Canceled,
        _ => PaymentIntentStatus::Unknown,
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    created: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::Currency;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> StripePaymentIntents {
        StripePaymentIntents::new(
            StripeConfig::new("sk_test_abc", "pk_test_xyz").with_api_base_url(server.uri()),
        )
    }

    #[test]
    fn test_build_form_includes_amount_and_email() {
        let request = PaymentIntentRequest::new(3500, Currency::EUR)
            .with_email("buyer@example.com");

        let form = StripePaymentIntents::build_form(&request);

        assert!(form.contains(&("amount".to_string(), "3500".to_string())));
        assert!(form.contains(&("currency".to_string(), "eur".to_string())));
        assert!(form.contains(&(
            "receipt_email".to_string(),
            "buyer@example.com".to_string()
        )));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            parse_status("requires_payment_method"),
            PaymentIntentStatus::RequiresPaymentMethod
        );
        assert_eq!(parse_status("succeeded"), PaymentIntentStatus::Succeeded);
        assert_eq!(parse_status("whatever"), PaymentIntentStatus::Unknown);
    }

    #[tokio::test]
    async fn test_create_intent_returns_client_secret() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Authorization", "Bearer sk_test_abc"))
            .and(body_string_contains("amount=3500"))
            .and(body_string_contains("currency=eur"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_123",
                "client_secret": "pi_123_secret_456",
                "status": "requires_payment_method",
                "created": 1735689600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let request = PaymentIntentRequest::new(3500, Currency::EUR);
        let intent = provider.create_intent(&request).await.unwrap();

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret, "pi_123_secret_456");
        assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);
    }

    #[tokio::test]
    async fn test_stripe_error_body_is_parsed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "error": { "message": "Your card was declined." }
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let request = PaymentIntentRequest::new(3500, Currency::EUR);
        let err = provider.create_intent(&request).await.unwrap_err();

        match err {
            CartError::ProviderError { provider, message } => {
                assert_eq!(provider, "stripe");
                assert_eq!(message, "Your card was declined.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_positive_amount_never_reaches_stripe() {
        let server = MockServer::start().await;
        // No mock mounted: a request would fail the test
        let provider = provider_for(&server);

        let request = PaymentIntentRequest::new(0, Currency::EUR);
        let err = provider.create_intent(&request).await.unwrap_err();

        assert!(matches!(err, CartError::NonPositiveAmount { .. }));
    }
}
