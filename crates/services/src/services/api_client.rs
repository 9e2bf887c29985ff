//! HTTP client for the studio REST API and the hosted Postgres REST upstream.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use models::models::{
    calendar::CalendarEntry,
    class::{ClassSession, DanceClass, SessionClass},
    contact::ContactMessage,
    overview::OverviewStats,
    profile::Profile,
    registration::Registration,
    shop::{Order, Product},
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use super::config::Config;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("unauthorized")]
    Unauthorized,
    #[error("json error: {0}")]
    Serde(String),
}

impl ApiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Read surface of both upstreams, one method per sub-resource.
///
/// The coordinator depends on this trait rather than on the concrete client
/// so its cache semantics can be exercised without a network.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn overview(&self, token: &str) -> Result<OverviewStats, ApiError>;
    async fn classes(&self, token: &str) -> Result<Vec<DanceClass>, ApiError>;
    async fn registrations(&self, token: &str) -> Result<Vec<Registration>, ApiError>;
    async fn sessions(&self, token: &str) -> Result<Vec<ClassSession>, ApiError>;
    async fn session_classes(&self, token: &str) -> Result<Vec<SessionClass>, ApiError>;
    async fn products(&self, token: &str) -> Result<Vec<Product>, ApiError>;
    async fn orders(&self, token: &str) -> Result<Vec<Order>, ApiError>;
    async fn messages(&self, token: &str) -> Result<Vec<ContactMessage>, ApiError>;
    async fn calendar(&self, token: &str) -> Result<Vec<CalendarEntry>, ApiError>;
    async fn profiles(&self, token: &str) -> Result<Vec<Profile>, ApiError>;
}

/// HTTP implementation of [`AdminApi`]
#[derive(Debug, Clone)]
pub struct AdminApiClient {
    http: Client,
    config: Config,
}

impl AdminApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(config: Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("studio-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Transient server overload backs off 1s, 2s, 4s before giving up.
    fn retry_policy() -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(8))
            .with_max_times(3)
            .with_jitter()
    }

    /// GET a JSON resource with the uniform retry policy applied
    async fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T, ApiError> {
        (|| async { self.send_get(url, token).await })
            .retry(&Self::retry_policy())
            .when(|e: &ApiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "upstream call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn send_get<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T, ApiError> {
        let mut request = self
            .http
            .get(url)
            .bearer_auth(token)
            .header("accept", "application/json");

        // The hosted Postgres REST endpoint wants the anon key alongside the
        // user's bearer token.
        if url.starts_with(self.config.supabase_url.trim_end_matches('/')) {
            request = request.header("apikey", &self.config.supabase_anon_key);
        }

        let res = request.send().await.map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ApiError::Http { status, body })
            }
        }
    }

    async fn get_table<T: DeserializeOwned>(
        &self,
        table_and_query: &str,
        token: &str,
    ) -> Result<T, ApiError> {
        let url = self.config.table_url(table_and_query);
        self.get_json(&url, token).await
    }
}

#[async_trait]
impl AdminApi for AdminApiClient {
    async fn overview(&self, token: &str) -> Result<OverviewStats, ApiError> {
        let url = self.config.api_url("admin/overview");
        self.get_json(&url, token).await
    }

    async fn classes(&self, token: &str) -> Result<Vec<DanceClass>, ApiError> {
        self.get_table("classes?select=*&order=name.asc", token)
            .await
    }

    async fn registrations(&self, token: &str) -> Result<Vec<Registration>, ApiError> {
        self.get_table("registrations?select=*&order=created_at.desc", token)
            .await
    }

    async fn sessions(&self, token: &str) -> Result<Vec<ClassSession>, ApiError> {
        self.get_table("sessions?select=*&order=created_at.asc", token)
            .await
    }

    async fn session_classes(&self, token: &str) -> Result<Vec<SessionClass>, ApiError> {
        self.get_table("session_classes?select=*", token).await
    }

    async fn products(&self, token: &str) -> Result<Vec<Product>, ApiError> {
        self.get_table("products?select=*&order=name.asc", token)
            .await
    }

    async fn orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        self.get_table("orders?select=*&order=created_at.desc", token)
            .await
    }

    async fn messages(&self, token: &str) -> Result<Vec<ContactMessage>, ApiError> {
        self.get_table("contact_messages?select=*&order=created_at.desc", token)
            .await
    }

    async fn calendar(&self, token: &str) -> Result<Vec<CalendarEntry>, ApiError> {
        self.get_table("calendar_entries?select=*&order=entry_date.asc", token)
            .await
    }

    async fn profiles(&self, token: &str) -> Result<Vec<Profile>, ApiError> {
        self.get_table("profiles?select=*&order=created_at.desc", token)
            .await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retried() {
        assert!(ApiError::RateLimited.should_retry());
        assert!(ApiError::Timeout.should_retry());
        assert!(ApiError::Transport("connection reset".into()).should_retry());
        assert!(
            ApiError::Http {
                status: 503,
                body: String::new()
            }
            .should_retry()
        );
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        assert!(!ApiError::Unauthorized.should_retry());
        assert!(!ApiError::Serde("bad json".into()).should_retry());
        assert!(
            !ApiError::Http {
                status: 404,
                body: String::new()
            }
            .should_retry()
        );
    }
}
