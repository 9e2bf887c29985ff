use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// An entry on the studio calendar (class occurrence, event, or closure)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub entry_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
