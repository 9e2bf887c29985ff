//! Per-dataset freshness bookkeeping for the cache coordinator.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use strum_macros::{Display, EnumString};

/// How long a successful fetch keeps a dataset fresh
pub const TTL: Duration = Duration::from_secs(5 * 60);

/// The logical dataset groups the coordinator caches.
///
/// `Classes` covers the whole reporting working set: classes, registrations,
/// sessions, and session-class links are fetched and replaced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Dataset {
    Overview,
    Classes,
    Shop,
    Contact,
    Calendar,
    Profiles,
}

/// Records the last successful fetch per dataset and answers TTL checks.
///
/// An entry exists only after a successful merge, so `is_fresh` doubles as
/// the "dataset already has data" check.
#[derive(Debug, Default)]
pub struct FreshnessTracker {
    fetched_at: HashMap<Dataset, Instant>,
}

impl FreshnessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fresh(&self, dataset: Dataset, now: Instant) -> bool {
        self.fetched_at
            .get(&dataset)
            .is_some_and(|fetched| now.duration_since(*fetched) < TTL)
    }

    pub fn mark(&mut self, dataset: Dataset, now: Instant) {
        self.fetched_at.insert(dataset, now);
    }

    pub fn clear(&mut self) {
        self.fetched_at.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfetched_dataset_is_stale() {
        let tracker = FreshnessTracker::new();
        assert!(!tracker.is_fresh(Dataset::Classes, Instant::now()));
    }

    #[test]
    fn test_marked_dataset_is_fresh_within_ttl() {
        let mut tracker = FreshnessTracker::new();
        let now = Instant::now();
        tracker.mark(Dataset::Classes, now);
        assert!(tracker.is_fresh(Dataset::Classes, now));
        assert!(tracker.is_fresh(Dataset::Classes, now + TTL - Duration::from_secs(1)));
        assert!(!tracker.is_fresh(Dataset::Classes, now + TTL));
    }

    #[test]
    fn test_datasets_are_tracked_independently() {
        let mut tracker = FreshnessTracker::new();
        let now = Instant::now();
        tracker.mark(Dataset::Classes, now);
        assert!(!tracker.is_fresh(Dataset::Shop, now));
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut tracker = FreshnessTracker::new();
        let now = Instant::now();
        tracker.mark(Dataset::Classes, now);
        tracker.clear();
        assert!(!tracker.is_fresh(Dataset::Classes, now));
    }
}
