//! # Supabase Configuration
//!
//! Configuration management for the Supabase REST collaborators.
//! All secrets are loaded from environment variables.

use cart_core::CartError;
use std::env;

/// Supabase API configuration
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL (https://<project>.supabase.co)
    pub url: String,

    /// Service key used for both `apikey` and bearer auth headers
    pub service_key: String,
}

impl SupabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_KEY`
    pub fn from_env() -> Result<Self, CartError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let url = env::var("SUPABASE_URL")
            .map_err(|_| CartError::Configuration("SUPABASE_URL not set".to_string()))?;

        let service_key = env::var("SUPABASE_KEY")
            .map_err(|_| CartError::Configuration("SUPABASE_KEY not set".to_string()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(CartError::Configuration(
                "SUPABASE_URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(Self::new(url, service_key))
    }

    /// Create config with explicit values (for testing)
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        let mut url: String = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        Self {
            url,
            service_key: service_key.into(),
        }
    }

    /// REST endpoint for a table
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// REST endpoint for a stored procedure
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.url, function)
    }

    /// Get bearer authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.service_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = SupabaseConfig::new("https://proj.supabase.co/", "key-123");

        assert_eq!(
            config.table_url("products"),
            "https://proj.supabase.co/rest/v1/products"
        );
        assert_eq!(
            config.rpc_url("increment_cart_item"),
            "https://proj.supabase.co/rest/v1/rpc/increment_cart_item"
        );
        assert_eq!(config.auth_header(), "Bearer key-123");
    }

    #[test]
    fn test_from_env_missing_url() {
        std::env::remove_var("SUPABASE_URL");

        let result = SupabaseConfig::from_env();
        assert!(result.is_err());
    }
}
