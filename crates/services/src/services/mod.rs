pub mod api_client;
pub mod config;
pub mod coordinator;
pub mod freshness;
pub mod rate_limiter;
pub mod reports;
pub mod store;

pub use api_client::{AdminApi, AdminApiClient, ApiError};
pub use config::Config;
pub use coordinator::{AdminDataService, AuthSession};
pub use store::{AdminData, AdminSnapshot, InitState};
