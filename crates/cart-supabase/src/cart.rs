//! # Supabase Persisted Cart Store
//!
//! `PersistedCartStore` implementation over the Supabase `carts` table
//! (`id`, `user_id`, `product_id`, `qty`, `added_at`).
//!
//! The upsert-or-increment goes through the `increment_cart_item` stored
//! procedure so it is one atomic statement at the storage layer:
//!
//! ```sql
//! create function increment_cart_item(p_user_id uuid, p_product_id text, p_delta_qty int)
//! returns void language sql as $$
//!   insert into carts (user_id, product_id, qty)
//!   values (p_user_id, p_product_id, p_delta_qty)
//!   on conflict (user_id, product_id)
//!   do update set qty = carts.qty + excluded.qty;
//! $$;
//! ```

use crate::config::SupabaseConfig;
use async_trait::async_trait;
use cart_core::{CartError, CartResult, PersistedCartRow, PersistedCartStore};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

const JOINED_COLUMNS: &str =
    "id,product_id,qty,added_at,product:products!inner(id,title,description,price,image_url)";

/// Supabase-backed persisted cart store
pub struct SupabaseCartStore {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseCartStore {
    /// Create a new cart store collaborator
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

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.service_key)
            .header("Authorization", self.config.auth_header())
    }

    async fn expect_success(
        response: Result<reqwest::Response, reqwest::Error>,
        context: &str,
    ) -> CartResult<String> {
        let response = response.map_err(|e| CartError::StoreUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CartError::StoreUnavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(CartError::StoreUnavailable(format!(
                "{}: HTTP {}: {}",
                context, status, body
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl PersistedCartStore for SupabaseCartStore {
    #[instrument(skip(self))]
    async fn list_joined(&self, user_id: &str) -> CartResult<Vec<PersistedCartRow>> {
        let response = self
            .authed(self.client.get(self.config.table_url("carts")))
            .query(&[
                ("select", JOINED_COLUMNS.to_string()),
                ("user_id", format!("eq.{}", user_id)),
            ])
            .send()
            .await;

        let body = Self::expect_success(response, "cart listing").await?;

        let rows: Vec<PersistedCartRow> = serde_json::from_str(&body).map_err(|e| {
            CartError::Serialization(format!("Failed to parse cart listing: {}", e))
        })?;

        debug!("Listed {} cart rows", rows.len());
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn upsert_increment(
        &self,
        user_id: &str,
        product_id: &str,
        delta_qty: u32,
    ) -> CartResult<()> {
        let response = self
            .authed(self.client.post(self.config.rpc_url("increment_cart_item")))
            .json(&json!({
                "p_user_id": user_id,
                "p_product_id": product_id,
                "p_delta_qty": delta_qty,
            }))
            .send()
            .await;

        Self::expect_success(response, "cart upsert").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_row(&self, row_id: &str) -> CartResult<()> {
        let response = self
            .authed(self.client.delete(self.config.table_url("carts")))
            .query(&[("id", format!("eq.{}", row_id))])
            .send()
            .await;

        // Deleting zero rows still answers 2xx, which keeps removal idempotent
        Self::expect_success(response, "cart row delete").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, user_id: &str) -> CartResult<()> {
        let response = self
            .authed(self.client.delete(self.config.table_url("carts")))
            .query(&[("user_id", format!("eq.{}", user_id))])
            .send()
            .await;

        Self::expect_success(response, "cart clear").await?;
        Ok(())
    }
}
