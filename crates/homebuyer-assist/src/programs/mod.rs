//! Homebuyer assistance programs: eligibility matching, the versioned catalog, and
//! reconciliation of scraped observations into it.

pub mod catalog;
pub mod clock;
pub mod domain;
pub mod eligibility;
pub mod export;
pub mod reconcile;
pub mod router;
pub mod search;
pub mod seed;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, ProgramCatalog, Visibility};
pub use clock::{Clock, SystemClock};
pub use domain::{
    ChangeEntry, ChangeKind, ObservedProgram, ProgramDraft, ProgramId, ProgramLink,
    ProgramMetadata, ProgramPatch, ProgramRecord, ProgramSource, ProgramStatus, RecordError,
};
pub use eligibility::{
    evaluate, ApplicantProfile, CreditScoreBand, DisqualificationReason, IncomeLimits,
    ProfileError, ProfileSubmission, ProgramEligibility, QualificationResult, RawCreditScore,
    StayDuration,
};
pub use export::{export_catalog_csv, write_catalog_csv, ExportError};
pub use reconcile::{
    FeedError, FeedSnapshot, JsonFileFeed, ProgramFeed, ReconcileSummary, Reconciler,
    RunSummary, SourceOutcome,
};
pub use router::{program_router, ProgramsApi};
pub use search::{ProgramVerdict, SearchIndex};
pub use seed::seed_programs;
pub use stats::CatalogStats;
pub use store::{CatalogStore, JsonFileStore, MemoryStore, StoreError};
