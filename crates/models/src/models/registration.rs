use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Status of a class registration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Active,
    Cancelled,
}

/// A customer's registration for a class occurrence.
///
/// Row ids arrive as opaque strings from the hosted Postgres REST upstream;
/// `selected_time` is zero-padded `HH:MM` as stored by the booking form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Registration {
    pub id: String,
    pub user_id: Option<String>,
    pub class_id: Option<String>,
    pub session_id: Option<String>,
    pub session_class_id: Option<String>,
    pub status: RegistrationStatus,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Active
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RegistrationStatus::Cancelled
    }
}
