use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Aggregate counters shown on the admin dashboard's overview tab
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct OverviewStats {
    pub total_registrations: i64,
    pub active_registrations: i64,
    pub upcoming_sessions: i64,
    pub unread_messages: i64,
    pub pending_orders: i64,
    pub total_profiles: i64,
    pub generated_at: DateTime<Utc>,
}
