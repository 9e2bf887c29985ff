//! Cache coordinator mediating all reads of admin collections.
//!
//! One instance per signed-in admin surface. Consumers trigger `fetch_*`
//! operations fire-and-forget and re-read state through [`snapshot`];
//! failures become state, never panics or propagated errors.
//!
//! [`snapshot`]: AdminDataService::snapshot

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api_client::{AdminApi, AdminApiClient, ApiError};
use super::config::Config;
use super::freshness::{Dataset, FreshnessTracker};
use super::rate_limiter::RateLimiter;
use super::store::{AdminSnapshot, AdminStore, InitState};

/// User-facing message stored in the error state when the limiter blocks a
/// fetch. The product ships in Hebrew.
pub const RATE_LIMIT_ERROR: &str = "יותר מדי בקשות. המתינו דקה ונסו שוב, או אפסו את המגבלה.";

/// The authenticated principal whose credentials gate access to admin data
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub principal: Uuid,
    pub access_token: String,
}

/// Permission to run one group fetch, handed out by `begin`
struct FetchTicket {
    token: String,
    seq: u64,
}

/// Process-wide holder of all cached admin datasets.
///
/// Guarantees: a non-forced fetch inside the freshness window is a no-op,
/// concurrent duplicate fetches of one group collapse to a single network
/// round trip, and a principal change clears every dataset before any fetch
/// for the new principal merges.
pub struct AdminDataService {
    api: Arc<dyn AdminApi>,
    store: RwLock<AdminStore>,
    session: RwLock<Option<AuthSession>>,
    freshness: Mutex<FreshnessTracker>,
    rate_limiter: Mutex<RateLimiter>,
    in_flight: DashMap<Dataset, ()>,
    // Latest sequence issued per group; merges carrying an older sequence
    // are discarded so a slow response cannot overwrite newer data.
    latest_seq: DashMap<Dataset, u64>,
    next_seq: AtomicU64,
}

impl AdminDataService {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            store: RwLock::new(AdminStore::default()),
            session: RwLock::new(None),
            freshness: Mutex::new(FreshnessTracker::new()),
            rate_limiter: Mutex::new(RateLimiter::new()),
            in_flight: DashMap::new(),
            latest_seq: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Build a coordinator backed by the real HTTP client
    pub fn from_config(config: Config) -> Result<Self, ApiError> {
        Ok(Self::new(Arc::new(AdminApiClient::new(config)?)))
    }

    /// Observe the authenticated principal.
    ///
    /// Clears all cached data when the identity actually changes, including
    /// sign-out after a signed-in principal. Re-authentication of the same
    /// principal keeps the cache.
    pub async fn set_session(&self, session: Option<AuthSession>) {
        let changed = {
            let mut current = self.session.write().await;
            let changed = match (current.as_ref(), session.as_ref()) {
                (Some(old), Some(new)) => old.principal != new.principal,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if changed {
                info!("principal changed, clearing admin cache");
            }
            *current = session;
            changed
        };
        if changed {
            self.clear_cache().await;
        }
    }

    /// One-time initial load for the admin surface.
    ///
    /// Subsequent calls are no-ops until the cache is cleared or the
    /// principal changes.
    pub async fn initialize(&self) {
        // Without credentials the fetches below would all no-op and the
        // Loading state would stick; stay Uninitialized until sign-in.
        if self.session.read().await.is_none() {
            debug!("no authenticated session, deferring initialization");
            return;
        }
        {
            let mut store = self.store.write().await;
            if store.init_state != InitState::Uninitialized {
                debug!("coordinator already initialized, skipping");
                return;
            }
            store.init_state = InitState::Loading;
        }
        self.fetch_overview(false).await;
        self.fetch_classes(false).await;
    }

    pub async fn fetch_overview(&self, force_refresh: bool) {
        let Some(ticket) = self.begin(Dataset::Overview, force_refresh).await else {
            return;
        };
        match self.api.overview(&ticket.token).await {
            Ok(stats) => {
                self.finish(Dataset::Overview, ticket.seq, |store| {
                    store.data.overview = Some(stats);
                    store.init_state = InitState::Ready;
                })
                .await;
            }
            Err(e) => self.fail(Dataset::Overview, ticket.seq, &e).await,
        }
    }

    /// Refresh the whole reporting working set: classes, registrations,
    /// sessions, and session-class links, fetched concurrently and merged as
    /// one atomic replacement.
    pub async fn fetch_classes(&self, force_refresh: bool) {
        let Some(ticket) = self.begin(Dataset::Classes, force_refresh).await else {
            return;
        };
        let (classes, registrations, sessions, session_classes) = tokio::join!(
            self.api.classes(&ticket.token),
            self.api.registrations(&ticket.token),
            self.api.sessions(&ticket.token),
            self.api.session_classes(&ticket.token),
        );
        let classes = or_empty(Dataset::Classes, "classes", classes);
        let registrations = or_empty(Dataset::Classes, "registrations", registrations);
        let sessions = or_empty(Dataset::Classes, "sessions", sessions);
        let session_classes = or_empty(Dataset::Classes, "session_classes", session_classes);

        self.finish(Dataset::Classes, ticket.seq, |store| {
            store.data.classes = classes;
            store.data.registrations = registrations;
            store.data.sessions = sessions;
            store.data.session_classes = session_classes;
        })
        .await;
    }

    pub async fn fetch_shop(&self, force_refresh: bool) {
        let Some(ticket) = self.begin(Dataset::Shop, force_refresh).await else {
            return;
        };
        let (products, orders) = tokio::join!(
            self.api.products(&ticket.token),
            self.api.orders(&ticket.token),
        );
        let products = or_empty(Dataset::Shop, "products", products);
        let orders = or_empty(Dataset::Shop, "orders", orders);

        self.finish(Dataset::Shop, ticket.seq, |store| {
            store.data.products = products;
            store.data.orders = orders;
        })
        .await;
    }

    pub async fn fetch_contact(&self, force_refresh: bool) {
        let Some(ticket) = self.begin(Dataset::Contact, force_refresh).await else {
            return;
        };
        match self.api.messages(&ticket.token).await {
            Ok(messages) => {
                self.finish(Dataset::Contact, ticket.seq, |store| {
                    store.data.messages = messages;
                })
                .await;
            }
            Err(e) => self.fail(Dataset::Contact, ticket.seq, &e).await,
        }
    }

    pub async fn fetch_calendar(&self, force_refresh: bool) {
        let Some(ticket) = self.begin(Dataset::Calendar, force_refresh).await else {
            return;
        };
        match self.api.calendar(&ticket.token).await {
            Ok(entries) => {
                self.finish(Dataset::Calendar, ticket.seq, |store| {
                    store.data.calendar = entries;
                })
                .await;
            }
            Err(e) => self.fail(Dataset::Calendar, ticket.seq, &e).await,
        }
    }

    pub async fn fetch_profiles(&self, force_refresh: bool) {
        let Some(ticket) = self.begin(Dataset::Profiles, force_refresh).await else {
            return;
        };
        match self.api.profiles(&ticket.token).await {
            Ok(profiles) => {
                self.finish(Dataset::Profiles, ticket.seq, |store| {
                    store.data.profiles = profiles;
                })
                .await;
            }
            Err(e) => self.fail(Dataset::Profiles, ticket.seq, &e).await,
        }
    }

    /// Reset every dataset, the freshness timestamps, the rate limiter, and
    /// the initialization state
    pub async fn clear_cache(&self) {
        self.store.write().await.clear();
        self.freshness.lock().unwrap().clear();
        self.rate_limiter.lock().unwrap().reset();
        // Outstanding fetches lose their sequence and their merges are
        // discarded on completion.
        self.latest_seq.clear();
        self.in_flight.clear();
        info!("admin cache cleared");
    }

    /// Manual "reset limit" action exposed next to the rate-limit banner
    pub async fn reset_rate_limit(&self) {
        self.rate_limiter.lock().unwrap().reset();
        let mut store = self.store.write().await;
        if store.error.as_deref() == Some(RATE_LIMIT_ERROR) {
            store.error = None;
        }
    }

    /// Cheap cloned view of the datasets and status fields
    pub async fn snapshot(&self) -> AdminSnapshot {
        let store = self.store.read().await;
        store.snapshot(!self.in_flight.is_empty())
    }

    /// Run the common guards for one group fetch, in order: authenticated
    /// session, rate window, freshness, in-flight flag.
    ///
    /// The rate window counts every attempt, including ones that end up
    /// served from cache.
    async fn begin(&self, dataset: Dataset, force_refresh: bool) -> Option<FetchTicket> {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => {
                debug!(dataset = %dataset, "no authenticated session, skipping fetch");
                return None;
            }
        };

        let limited = self.rate_limiter.lock().unwrap().check(Instant::now());
        if limited {
            warn!(dataset = %dataset, "fetch blocked by rate limiter");
            self.store.write().await.error = Some(RATE_LIMIT_ERROR.to_string());
            return None;
        }

        if !force_refresh && self.freshness.lock().unwrap().is_fresh(dataset, Instant::now()) {
            debug!(dataset = %dataset, "cache hit, skipping fetch");
            return None;
        }

        if self.in_flight.insert(dataset, ()).is_some() {
            debug!(dataset = %dataset, "fetch already in flight, skipping");
            return None;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest_seq.insert(dataset, seq);
        Some(FetchTicket { token, seq })
    }

    /// True when the ticket's sequence is still the latest issued for the
    /// group. A superseded fetch must not touch the store, and must leave the
    /// in-flight flag alone: the flag now belongs to the superseding fetch
    /// (or was already cleared with the cache).
    fn is_latest(&self, dataset: Dataset, seq: u64) -> bool {
        self.latest_seq.get(&dataset).map(|e| *e).unwrap_or(0) == seq
    }

    /// Merge a completed group fetch unless a newer fetch or a cache clear
    /// superseded it
    async fn finish(&self, dataset: Dataset, seq: u64, apply: impl FnOnce(&mut AdminStore)) {
        if !self.is_latest(dataset, seq) {
            info!(dataset = %dataset, "discarding superseded fetch result");
            return;
        }
        self.in_flight.remove(&dataset);

        {
            let mut store = self.store.write().await;
            apply(&mut store);
            store.error = None;
        }
        self.freshness.lock().unwrap().mark(dataset, Instant::now());
        debug!(dataset = %dataset, "dataset refreshed");
    }

    /// Record a group-level failure as user-visible state, unless the fetch
    /// was superseded in flight
    async fn fail(&self, dataset: Dataset, seq: u64, error: &ApiError) {
        if !self.is_latest(dataset, seq) {
            info!(dataset = %dataset, "discarding superseded fetch failure");
            return;
        }
        self.in_flight.remove(&dataset);
        warn!(dataset = %dataset, error = %error, "group fetch failed");

        let mut store = self.store.write().await;
        store.error = Some(format!("טעינת הנתונים נכשלה: {error}"));
        if store.init_state == InitState::Loading {
            store.init_state = InitState::Error;
        }
    }
}

/// Substitute an empty collection for a failed sub-resource; siblings and the
/// group merge proceed regardless
fn or_empty<T>(dataset: Dataset, resource: &str, result: Result<Vec<T>, ApiError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(
            dataset = %dataset,
            resource = resource,
            error = %e,
            "sub-resource fetch failed, substituting empty result"
        );
        Vec::new()
    })
}
