use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A dance class offered by the studio
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DanceClass {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A recurring session (weekly slot) classes are scheduled into
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ClassSession {
    pub id: String,
    pub name: Option<String>,
    pub max_capacity: Option<u32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Link row assigning a class to a session slot
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SessionClass {
    pub id: String,
    pub session_id: String,
    pub class_id: String,
    pub is_active: bool,
}
