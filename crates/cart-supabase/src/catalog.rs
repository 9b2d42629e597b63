//! # Supabase Product Catalog
//!
//! `Catalog` implementation over the Supabase `products` table. Product
//! resolution is one batched `id=in.(...)` request; unknown ids are simply
//! absent from the response and the caller detects the omission.

use crate::config::SupabaseConfig;
use async_trait::async_trait;
use cart_core::{CartError, CartResult, Catalog, Product};
use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, instrument};

const PRODUCT_COLUMNS: &str = "id,title,description,price,image_url";

/// Supabase-backed product catalog
pub struct SupabaseCatalog {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseCatalog {
    /// Create a new catalog collaborator
    pub fn new(config: SupabaseConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> CartResult<Self> {
        let config = SupabaseConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Share an existing config (catalog and cart store use one project)
    pub fn with_config(config: &SupabaseConfig) -> Self {
        Self::new(config.clone())
    }

    async fn fetch_products(&self, query: &[(&str, String)]) -> CartResult<Vec<Product>> {
        let response = self
            .client
            .get(self.config.table_url("products"))
            .header("apikey", &self.config.service_key)
            .header("Authorization", self.config.auth_header())
            .query(query)
            .send()
            .await
            .map_err(|e| CartError::CatalogUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CartError::CatalogUnavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(CartError::CatalogUnavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            CartError::Serialization(format!("Failed to parse products response: {}", e))
        })
    }
}

/// Quote ids for a PostgREST `in.(...)` filter
fn in_filter(ids: &[String]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("\"{}\"", id.replace('"', "")))
        .collect();
    format!("in.({})", quoted.join(","))
}

#[async_trait]
impl Catalog for SupabaseCatalog {
    #[instrument(skip(self), fields(ids = ids.len()))]
    async fn resolve_products(&self, ids: &[String]) -> CartResult<HashMap<String, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let products = self
            .fetch_products(&[
                ("select", PRODUCT_COLUMNS.to_string()),
                ("id", in_filter(ids)),
            ])
            .await?;

        debug!("Resolved {} of {} product ids", products.len(), ids.len());

        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }

    #[instrument(skip(self))]
    async fn list_products(&self) -> CartResult<Vec<Product>> {
        self.fetch_products(&[("select", PRODUCT_COLUMNS.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog_for(server: &MockServer) -> SupabaseCatalog {
        SupabaseCatalog::new(SupabaseConfig::new(server.uri(), "test-key"))
    }

    #[test]
    fn test_in_filter_quotes_ids() {
        let ids = vec!["p1".to_string(), "p2".to_string()];
        assert_eq!(in_filter(&ids), "in.(\"p1\",\"p2\")");
    }

    #[tokio::test]
    async fn test_resolve_products_batches_one_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "in.(\"p1\",\"p2\")"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "p1", "title": "First", "price": 12.5 },
                { "id": "p2", "title": "Second", "price": 3.99 }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let catalog = catalog_for(&server);
        let ids = vec!["p1".to_string(), "p2".to_string()];
        let resolved = catalog.resolve_products(&ids).await.unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.get("p1").unwrap().price, 12.5);
    }

    #[tokio::test]
    async fn test_resolve_omits_unknown_ids() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "p1", "title": "First", "price": 12.5 }
            ])))
            .mount(&server)
            .await;

        let catalog = catalog_for(&server);
        let ids = vec!["p1".to_string(), "ghost".to_string()];
        let resolved = catalog.resolve_products(&ids).await.unwrap();

        assert_eq!(resolved.len(), 1);
        assert!(!resolved.contains_key("ghost"));
    }

    #[tokio::test]
    async fn test_server_error_is_catalog_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let catalog = catalog_for(&server);
        let err = catalog
            .resolve_products(&["p1".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::CatalogUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_id_list_skips_request() {
        let server = MockServer::start().await;
        // No mock mounted: any request would 404 and fail the test
        let catalog = catalog_for(&server);

        let resolved = catalog.resolve_products(&[]).await.unwrap();
        assert!(resolved.is_empty());
    }
}
