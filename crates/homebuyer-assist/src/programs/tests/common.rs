use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::programs::clock::Clock;
use crate::programs::domain::{ObservedProgram, ProgramDraft, ProgramId, ProgramRecord};
use crate::programs::eligibility::{
    ApplicantProfile, CreditScoreBand, IncomeLimits, ProgramEligibility,
};
use crate::programs::reconcile::{FeedError, FeedSnapshot, ProgramFeed, Reconciler};
use crate::programs::router::{program_router, ProgramsApi};
use crate::programs::store::{CatalogStore, MemoryStore, StoreError};
use crate::programs::ProgramCatalog;

/// Clock pinned to a settable instant.
pub(super) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex")
    }
}

pub(super) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn catalog() -> (
    Arc<ProgramCatalog<MemoryStore>>,
    Arc<MemoryStore>,
    Arc<FixedClock>,
) {
    let store = Arc::new(MemoryStore::default());
    let clock = Arc::new(FixedClock::at(start_time()));
    let catalog = Arc::new(ProgramCatalog::with_clock(store.clone(), clock.clone()));
    (catalog, store, clock)
}

pub(super) fn counties(values: &[&str]) -> Option<BTreeSet<String>> {
    Some(values.iter().map(|value| value.to_string()).collect())
}

pub(super) fn montgomery_limits() -> IncomeLimits {
    IncomeLimits::from_tiers([
        (1, 109_500),
        (2, 125_000),
        (3, 140_500),
        (4, 156_000),
        (5, 168_500),
    ])
}

/// Montgomery County HOC style rules.
pub(super) fn montgomery_eligibility() -> ProgramEligibility {
    ProgramEligibility {
        first_time_buyer_required: true,
        min_credit_score: 640,
        eligible_counties: counties(&["montgomery"]),
        eligible_cities: counties(&["any"]),
        income_limits: Some(montgomery_limits()),
        ..ProgramEligibility::default()
    }
}

pub(super) fn montgomery_profile() -> ApplicantProfile {
    let mut profile = ApplicantProfile::new(100_000.0, 2).expect("valid profile");
    profile.county = "montgomery".to_string();
    profile.first_time_buyer = true;
    profile.credit_score = CreditScoreBand::From640To659;
    profile
}

pub(super) fn draft(id: &str, name: &str, eligibility: ProgramEligibility) -> ProgramDraft {
    ProgramDraft {
        id: Some(ProgramId::from(id)),
        name: name.to_string(),
        description: format!("{name} description"),
        savings: "Up to $10,000".to_string(),
        eligibility: Some(eligibility),
        benefits: vec!["Down payment assistance".to_string()],
        requirements: vec!["Primary residence".to_string()],
        links: Vec::new(),
    }
}

pub(super) fn observed(id: &str, name: &str) -> ObservedProgram {
    ObservedProgram {
        id: Some(ProgramId::from(id)),
        name: name.to_string(),
        description: format!("{name} description"),
        savings: Some("Up to $5,000".to_string()),
        eligibility: montgomery_eligibility(),
        benefits: vec!["Deferred loan".to_string()],
        requirements: vec!["Homebuyer education".to_string()],
        links: None,
    }
}

pub(super) fn record<'a>(records: &'a [ProgramRecord], id: &str) -> &'a ProgramRecord {
    records
        .iter()
        .find(|record| record.id.as_str() == id)
        .unwrap_or_else(|| panic!("record {id} present"))
}

/// Store whose every call fails, standing in for a broken disk.
pub(super) struct UnavailableStore;

impl CatalogStore for UnavailableStore {
    fn load(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn save(&self, _records: &[ProgramRecord]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }
}

/// Store that loads but refuses to persist.
#[derive(Default)]
pub(super) struct ReadOnlyStore {
    pub(super) inner: MemoryStore,
}

impl CatalogStore for ReadOnlyStore {
    fn load(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        self.inner.load()
    }

    fn save(&self, _records: &[ProgramRecord]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }
}

/// Feed returning a canned answer.
pub(super) struct StaticFeed {
    pub(super) source_id: &'static str,
    pub(super) answer: fn() -> Result<FeedSnapshot, FeedError>,
}

impl ProgramFeed for StaticFeed {
    fn source_id(&self) -> &str {
        self.source_id
    }

    fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        (self.answer)()
    }
}

pub(super) fn router_for(
    catalog: Arc<ProgramCatalog<MemoryStore>>,
    feeds: Vec<Arc<dyn ProgramFeed>>,
) -> axum::Router {
    let reconciler = Reconciler::new(catalog.clone(), feeds);
    program_router(Arc::new(ProgramsApi::new(catalog, reconciler)))
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
