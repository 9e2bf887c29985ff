//! Upstream endpoint configuration for the admin data coordinator.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
}

/// Endpoints and credentials for both upstreams: the studio REST API and the
/// hosted Postgres REST endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Config {
    pub fn new(
        api_base_url: impl Into<String>,
        supabase_url: impl Into<String>,
        supabase_anon_key: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            supabase_url: supabase_url.into(),
            supabase_anon_key: supabase_anon_key.into(),
        }
    }

    /// Create a config from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: std::env::var("STUDIO_API_BASE_URL")
                .map_err(|_| ConfigError::MissingVar("STUDIO_API_BASE_URL"))?,
            supabase_url: std::env::var("SUPABASE_URL")
                .map_err(|_| ConfigError::MissingVar("SUPABASE_URL"))?,
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY")
                .map_err(|_| ConfigError::MissingVar("SUPABASE_ANON_KEY"))?,
        })
    }

    /// URL for a table read on the hosted Postgres REST endpoint
    pub fn table_url(&self, table_and_query: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.supabase_url.trim_end_matches('/'),
            table_and_query
        )
    }

    /// URL for a path on the studio REST API
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
