//! Registration enrichment, grouping, and filtering for the reporting tabs.
//!
//! Everything here is pure data shaping over the cached collections; "today"
//! is passed in explicitly so classification is deterministic.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use models::models::{
    class::{ClassSession, DanceClass},
    profile::Profile,
    registration::Registration,
};
use serde::Serialize;
use ts_rs::TS;

/// Display-name fallback of last resort
const UNNAMED: &str = "ללא שם";

/// A registration joined with everything the reporting tabs display
#[derive(Debug, Clone, Serialize, TS)]
pub struct RegistrationView {
    pub registration: Registration,
    pub class_name: Option<String>,
    pub session_name: Option<String>,
    pub display_name: String,
    pub is_future: bool,
    pub is_past: bool,
}

/// Registrations sharing one `(date, time, session)` slot, split by status
#[derive(Debug, Clone, Serialize, TS)]
pub struct SessionBucket {
    pub key: String,
    pub date: NaiveDate,
    pub time: String,
    pub session_id: String,
    pub active: Vec<RegistrationView>,
    pub cancelled: Vec<RegistrationView>,
    /// Active count over session capacity, when the capacity is known
    pub occupancy_rate: Option<f32>,
}

/// Join registrations with class, session, and profile lookups and derive the
/// future/past flags.
///
/// Display name preference: attached profile's name, then inline first+last,
/// then email. A record without `selected_date` is neither future nor past.
pub fn enrich_registrations(
    registrations: &[Registration],
    classes: &[DanceClass],
    sessions: &[ClassSession],
    profiles: &[Profile],
    today: NaiveDate,
) -> Vec<RegistrationView> {
    let class_names: HashMap<&str, &str> = classes
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();
    let session_names: HashMap<&str, Option<&str>> = sessions
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_deref()))
        .collect();
    let profiles_by_user: HashMap<&str, &Profile> = profiles
        .iter()
        .filter_map(|p| p.user_id.as_deref().map(|uid| (uid, p)))
        .collect();

    registrations
        .iter()
        .map(|registration| {
            let class_name = registration
                .class_id
                .as_deref()
                .and_then(|id| class_names.get(id))
                .map(|name| name.to_string());
            let session_name = registration
                .session_id
                .as_deref()
                .and_then(|id| session_names.get(id).copied())
                .and_then(|name| name.map(str::to_string));
            let display_name = resolve_display_name(registration, &profiles_by_user);
            let (is_future, is_past) = match registration.selected_date {
                Some(date) => (date >= today, date < today),
                None => (false, false),
            };
            RegistrationView {
                registration: registration.clone(),
                class_name,
                session_name,
                display_name,
                is_future,
                is_past,
            }
        })
        .collect()
}

fn resolve_display_name(
    registration: &Registration,
    profiles_by_user: &HashMap<&str, &Profile>,
) -> String {
    if let Some(name) = registration
        .user_id
        .as_deref()
        .and_then(|uid| profiles_by_user.get(uid))
        .and_then(|profile| profile.name())
    {
        return name;
    }

    let first = registration.first_name.as_deref().unwrap_or("").trim();
    let last = registration.last_name.as_deref().unwrap_or("").trim();
    if !first.is_empty() || !last.is_empty() {
        return format!("{first} {last}").trim().to_string();
    }

    registration
        .email
        .clone()
        .unwrap_or_else(|| UNNAMED.to_string())
}

/// Bucket enriched registrations by `{date}_{time}_{session_id}`.
///
/// Records missing any component of the key are left out. Buckets come back
/// ascending by date then time; the lexicographic time compare is safe
/// because times are zero-padded `HH:MM`.
pub fn group_by_session(
    views: Vec<RegistrationView>,
    sessions: &[ClassSession],
) -> Vec<SessionBucket> {
    let capacities: HashMap<&str, u32> = sessions
        .iter()
        .filter_map(|s| s.max_capacity.map(|cap| (s.id.as_str(), cap)))
        .collect();

    let mut buckets: BTreeMap<(NaiveDate, String, String), (Vec<RegistrationView>, Vec<RegistrationView>)> =
        BTreeMap::new();

    for view in views {
        let (Some(date), Some(time), Some(session_id)) = (
            view.registration.selected_date,
            view.registration.selected_time.clone(),
            view.registration.session_id.clone(),
        ) else {
            continue;
        };
        let slot = buckets.entry((date, time, session_id)).or_default();
        if view.registration.is_cancelled() {
            slot.1.push(view);
        } else {
            slot.0.push(view);
        }
    }

    buckets
        .into_iter()
        .map(|((date, time, session_id), (active, cancelled))| {
            let occupancy_rate = capacities
                .get(session_id.as_str())
                .filter(|cap| **cap > 0)
                .map(|cap| active.len() as f32 / *cap as f32);
            SessionBucket {
                key: format!("{date}_{time}_{session_id}"),
                date,
                time,
                session_id,
                active,
                cancelled,
                occupancy_rate,
            }
        })
        .collect()
}

/// Sort a flat list ascending by date, then time, then display name; records
/// without a date sort last
pub fn sort_flat(views: &mut [RegistrationView]) {
    views.sort_by(|a, b| {
        let date_order = match (a.registration.selected_date, b.registration.selected_date) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        date_order
            .then_with(|| a.registration.selected_time.cmp(&b.registration.selected_time))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
}

/// Split enriched registrations into future and past lists; records with no
/// selected date belong to neither and are dropped
pub fn partition_by_time(views: Vec<RegistrationView>) -> (Vec<RegistrationView>, Vec<RegistrationView>) {
    let mut future = Vec::new();
    let mut past = Vec::new();
    for view in views {
        if view.is_future {
            future.push(view);
        } else if view.is_past {
            past.push(view);
        }
    }
    (future, past)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use models::models::registration::RegistrationStatus;

    use super::*;

    fn registration(id: &str, status: RegistrationStatus) -> Registration {
        Registration {
            id: id.into(),
            user_id: None,
            class_id: Some("c1".into()),
            session_id: Some("s1".into()),
            session_class_id: None,
            status,
            first_name: Some("דנה".into()),
            last_name: Some("לוי".into()),
            email: Some("dana@example.com".into()),
            phone: None,
            selected_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            selected_time: Some("18:00".into()),
            created_at: Utc::now(),
        }
    }

    fn class() -> DanceClass {
        DanceClass {
            id: "c1".into(),
            name: "בלט קלאסי".into(),
            slug: None,
            description: None,
            price: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn session(capacity: Option<u32>) -> ClassSession {
        ClassSession {
            id: "s1".into(),
            name: Some("אולם ראשי".into()),
            max_capacity: capacity,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn profile(user_id: &str, display_name: &str) -> Profile {
        Profile {
            id: "p1".into(),
            user_id: Some(user_id.into()),
            display_name: Some(display_name.into()),
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_grouping_key_and_status_partition() {
        let regs = vec![
            registration("r1", RegistrationStatus::Active),
            registration("r2", RegistrationStatus::Active),
            registration("r3", RegistrationStatus::Cancelled),
        ];
        let sessions = vec![session(Some(10))];
        let views = enrich_registrations(&regs, &[class()], &sessions, &[], today());
        let buckets = group_by_session(views, &sessions);

        assert_eq!(buckets.len(), 1);
        let bucket = &buckets[0];
        assert_eq!(bucket.key, "2024-05-01_18:00_s1");
        assert_eq!(bucket.active.len(), 2);
        assert_eq!(bucket.cancelled.len(), 1);
        assert_eq!(bucket.occupancy_rate, Some(0.2));
    }

    #[test]
    fn test_today_is_future_yesterday_is_past() {
        let mut yesterday = registration("r1", RegistrationStatus::Active);
        yesterday.selected_date = NaiveDate::from_ymd_opt(2024, 4, 30);
        let on_the_day = registration("r2", RegistrationStatus::Active);

        let views = enrich_registrations(&[yesterday, on_the_day], &[], &[], &[], today());
        assert!(views[0].is_past);
        assert!(!views[0].is_future);
        assert!(views[1].is_future);
        assert!(!views[1].is_past);
    }

    #[test]
    fn test_record_without_date_is_neither_future_nor_past() {
        let mut reg = registration("r1", RegistrationStatus::Active);
        reg.selected_date = None;
        let views = enrich_registrations(&[reg], &[], &[], &[], today());
        assert!(!views[0].is_future);
        assert!(!views[0].is_past);

        let (future, past) = partition_by_time(views);
        assert!(future.is_empty());
        assert!(past.is_empty());
    }

    #[test]
    fn test_display_name_prefers_profile_then_inline_then_email() {
        let mut with_profile = registration("r1", RegistrationStatus::Active);
        with_profile.user_id = Some("u1".into());

        let inline_only = registration("r2", RegistrationStatus::Active);

        let mut email_only = registration("r3", RegistrationStatus::Active);
        email_only.first_name = None;
        email_only.last_name = None;

        let profiles = vec![profile("u1", "דנה לוי-כהן")];
        let views = enrich_registrations(
            &[with_profile, inline_only, email_only],
            &[],
            &[],
            &profiles,
            today(),
        );

        assert_eq!(views[0].display_name, "דנה לוי-כהן");
        assert_eq!(views[1].display_name, "דנה לוי");
        assert_eq!(views[2].display_name, "dana@example.com");
    }

    #[test]
    fn test_class_and_session_names_are_resolved() {
        let regs = vec![registration("r1", RegistrationStatus::Active)];
        let sessions = vec![session(None)];
        let views = enrich_registrations(&regs, &[class()], &sessions, &[], today());
        assert_eq!(views[0].class_name.as_deref(), Some("בלט קלאסי"));
        assert_eq!(views[0].session_name.as_deref(), Some("אולם ראשי"));
    }

    #[test]
    fn test_flat_sort_orders_by_date_time_then_name() {
        let mut later_day = registration("r1", RegistrationStatus::Active);
        later_day.selected_date = NaiveDate::from_ymd_opt(2024, 5, 2);

        let mut evening = registration("r2", RegistrationStatus::Active);
        evening.selected_time = Some("19:30".into());

        let mut dateless = registration("r3", RegistrationStatus::Active);
        dateless.selected_date = None;

        let morning = registration("r4", RegistrationStatus::Active);

        let mut views = enrich_registrations(
            &[later_day, evening, dateless, morning],
            &[],
            &[],
            &[],
            today(),
        );
        sort_flat(&mut views);

        let ids: Vec<&str> = views.iter().map(|v| v.registration.id.as_str()).collect();
        assert_eq!(ids, vec!["r4", "r2", "r1", "r3"]);
    }

    #[test]
    fn test_buckets_sort_by_date_then_time() {
        let mut early = registration("r1", RegistrationStatus::Active);
        early.selected_time = Some("09:00".into());
        let mut late = registration("r2", RegistrationStatus::Active);
        late.selected_time = Some("18:00".into());
        let mut next_day = registration("r3", RegistrationStatus::Active);
        next_day.selected_date = NaiveDate::from_ymd_opt(2024, 5, 2);
        next_day.selected_time = Some("08:00".into());

        let sessions = vec![session(Some(10))];
        let views = enrich_registrations(&[late, next_day, early], &[], &sessions, &[], today());
        let buckets = group_by_session(views, &sessions);

        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "2024-05-01_09:00_s1",
                "2024-05-01_18:00_s1",
                "2024-05-02_08:00_s1"
            ]
        );
    }
}
