//! State tree for all cached admin datasets.

use models::models::{
    calendar::CalendarEntry,
    class::{ClassSession, DanceClass, SessionClass},
    contact::ContactMessage,
    overview::OverviewStats,
    profile::Profile,
    registration::Registration,
    shop::{Order, Product},
};
use serde::Serialize;
use ts_rs::TS;

/// Lifecycle of the coordinator's one-time initial load.
///
/// Owned by the coordinator so a stale "already fetched" flag cannot leak
/// across instances in tests or hot reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Error,
}

/// Every cached admin collection, replaced wholesale on each successful fetch
#[derive(Debug, Clone, Default, Serialize, TS)]
pub struct AdminData {
    pub overview: Option<OverviewStats>,
    pub classes: Vec<DanceClass>,
    pub registrations: Vec<Registration>,
    pub sessions: Vec<ClassSession>,
    pub session_classes: Vec<SessionClass>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub messages: Vec<ContactMessage>,
    pub calendar: Vec<CalendarEntry>,
    pub profiles: Vec<Profile>,
}

/// Read-only view handed to consumers; they never see the write side
#[derive(Debug, Clone, Serialize, TS)]
pub struct AdminSnapshot {
    pub data: AdminData,
    pub init_state: InitState,
    pub is_fetching: bool,
    pub error: Option<String>,
}

/// The mutable state behind the coordinator's lock
#[derive(Debug, Default)]
pub struct AdminStore {
    pub data: AdminData,
    pub init_state: InitState,
    pub error: Option<String>,
}

impl AdminStore {
    /// Reset every dataset and flag to its empty default
    pub fn clear(&mut self) {
        self.data = AdminData::default();
        self.init_state = InitState::Uninitialized;
        self.error = None;
    }

    pub fn snapshot(&self, is_fetching: bool) -> AdminSnapshot {
        AdminSnapshot {
            data: self.data.clone(),
            init_state: self.init_state,
            is_fetching,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_resets_to_defaults() {
        let mut store = AdminStore::default();
        store.init_state = InitState::Ready;
        store.error = Some("boom".into());
        store.clear();
        assert_eq!(store.init_state, InitState::Uninitialized);
        assert!(store.error.is_none());
        assert!(store.data.overview.is_none());
        assert!(store.data.classes.is_empty());
    }
}
