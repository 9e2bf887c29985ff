use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A customer profile attached to an authenticated account
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Profile {
    pub id: String,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Best available human-readable name for this profile, if any
    pub fn name(&self) -> Option<String> {
        if let Some(display) = self.display_name.as_deref() {
            let display = display.trim();
            if !display.is_empty() {
                return Some(display.to_string());
            }
        }
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.trim().is_empty() => {
                Some(format!("{} {}", first.trim(), last.trim()))
            }
            (Some(first), None) if !first.trim().is_empty() => Some(first.trim().to_string()),
            _ => None,
        }
    }
}
