//! Merging freshly observed programs into the catalog without losing history.
//!
//! Rules applied per source:
//! - unseen ids are inserted as `pending_review` scraped records;
//! - manual entries are never modified;
//! - scraped records whose content changed are overwritten, and an `outdated` record that
//!   shows up again goes back to `pending_review` rather than `active`;
//! - scraped records owned by the source that were not observed are marked `outdated`.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::catalog::{CatalogError, ProgramCatalog};
use super::domain::{
    slugify, ChangeKind, ObservedProgram, ProgramFields, ProgramId, ProgramRecord,
    ProgramSource, ProgramStatus,
};
use super::store::CatalogStore;

/// Counters produced by reconciling one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub outdated: usize,
    /// Observations dropped because they had no usable name.
    pub rejected: usize,
}

impl ReconcileSummary {
    fn absorb(&mut self, other: ReconcileSummary) {
        self.new += other.new;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.outdated += other.outdated;
        self.rejected += other.rejected;
    }
}

/// Apply one source's observations to `records` in place.
pub(crate) fn merge_observations(
    records: &mut Vec<ProgramRecord>,
    source_id: &str,
    observed: Vec<ObservedProgram>,
    now: DateTime<Utc>,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();
    let mut seen: HashSet<ProgramId> = HashSet::new();

    for observation in observed {
        let Some(observation) = Observation::normalize(observation, source_id) else {
            warn!(source_id, "dropping observed program without a name");
            summary.rejected += 1;
            continue;
        };
        if !seen.insert(observation.fields.id.clone()) {
            continue;
        }

        match records
            .iter_mut()
            .find(|record| record.id == observation.fields.id)
        {
            None => {
                records.push(ProgramRecord::created(
                    observation.fields,
                    ProgramStatus::PendingReview,
                    ProgramSource::Scraped,
                    Some(source_id.to_string()),
                    format!("Scraped from {source_id}"),
                    now,
                ));
                summary.new += 1;
            }
            Some(existing) if existing.source == ProgramSource::ManualEntry => {
                summary.unchanged += 1;
            }
            Some(existing) => {
                if observation.refresh(existing, source_id, now) {
                    summary.updated += 1;
                } else {
                    summary.unchanged += 1;
                }
            }
        }
    }

    for record in records.iter_mut() {
        if record.source == ProgramSource::ManualEntry
            || record.status == ProgramStatus::Outdated
            || !belongs_to(record, source_id)
            || seen.contains(&record.id)
        {
            continue;
        }

        record.status = ProgramStatus::Outdated;
        record.expires_at.get_or_insert(now);
        record.record_change(
            ChangeKind::Outdated,
            format!("No longer found on {source_id}"),
            now,
        );
        summary.outdated += 1;
    }

    summary
}

/// Records tagged with the source, or legacy untagged ids carrying its prefix.
fn belongs_to(record: &ProgramRecord, source_id: &str) -> bool {
    match &record.origin {
        Some(origin) => origin == source_id,
        None => record.id.as_str().starts_with(source_id),
    }
}

/// An observation with a resolved id, ready to merge.
struct Observation {
    fields: ProgramFields,
    savings_provided: bool,
    links_provided: bool,
}

impl Observation {
    fn normalize(observed: ObservedProgram, source_id: &str) -> Option<Self> {
        let ObservedProgram {
            id,
            name,
            description,
            savings,
            eligibility,
            benefits,
            requirements,
            links,
        } = observed;

        let name = name.trim().to_string();
        if name.is_empty() {
            return None;
        }

        let id = match id.filter(|id| !id.0.trim().is_empty()) {
            Some(id) => ProgramId(id.0.trim().to_string()),
            None => ProgramId(format!("{source_id}-{}", slugify(&name))),
        };

        Some(Self {
            savings_provided: savings.is_some(),
            links_provided: links.is_some(),
            fields: ProgramFields {
                id,
                name,
                description: description.trim().to_string(),
                savings: savings.unwrap_or_default(),
                eligibility: eligibility.normalized(),
                benefits,
                requirements,
                links: links.unwrap_or_default(),
            },
        })
    }

    /// Returns true when the record was mutated (new version written).
    fn refresh(self, existing: &mut ProgramRecord, source_id: &str, now: DateTime<Utc>) -> bool {
        existing.last_validated_at = now;

        if existing.same_content(&self.fields) {
            if existing.status != ProgramStatus::Outdated {
                return false;
            }
            existing.origin = Some(source_id.to_string());
            existing.transition(
                ProgramStatus::PendingReview,
                ChangeKind::StatusChange,
                format!("Reappeared on {source_id}; awaiting review"),
                now,
            );
            return true;
        }

        let Self {
            fields,
            savings_provided,
            links_provided,
        } = self;
        existing.name = fields.name;
        existing.description = fields.description;
        existing.eligibility = fields.eligibility;
        existing.benefits = fields.benefits;
        existing.requirements = fields.requirements;
        if savings_provided {
            existing.savings = fields.savings;
        }
        if links_provided {
            existing.links = fields.links;
        }
        existing.source = ProgramSource::Scraped;
        existing.origin = Some(source_id.to_string());

        let details = format!("Updated from {source_id}");
        if existing.status == ProgramStatus::Outdated {
            existing.transition(
                ProgramStatus::PendingReview,
                ChangeKind::Updated,
                details,
                now,
            );
        } else {
            existing.record_change(ChangeKind::Updated, details, now);
        }
        true
    }
}

/// What a feed saw on its latest pass.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSnapshot {
    /// The source answered; an empty list means it genuinely lists no programs.
    Programs(Vec<ObservedProgram>),
    /// The source produced no usable data this time; nothing should be outdated.
    Unavailable,
}

/// A failed fetch or parse for one source.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed {source_id} could not be read: {source}")]
    Io {
        source_id: String,
        #[source]
        source: io::Error,
    },
    #[error("feed {source_id} returned malformed data: {source}")]
    Malformed {
        source_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("feed {source_id} failed: {message}")]
    Upstream { source_id: String, message: String },
}

/// Anything that can report the programs a source currently lists.
pub trait ProgramFeed: Send + Sync {
    fn source_id(&self) -> &str;
    fn fetch(&self) -> Result<FeedSnapshot, FeedError>;
}

/// Feed backed by a JSON array of observed programs written by an external scraper.
#[derive(Debug, Clone)]
pub struct JsonFileFeed {
    source_id: String,
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(source_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source_id: source_id.into(),
            path: path.into(),
        }
    }
}

impl ProgramFeed for JsonFileFeed {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(FeedSnapshot::Unavailable)
            }
            Err(source) => {
                return Err(FeedError::Io {
                    source_id: self.source_id.clone(),
                    source,
                })
            }
        };

        let programs =
            serde_json::from_slice(&bytes).map_err(|source| FeedError::Malformed {
                source_id: self.source_id.clone(),
                source,
            })?;
        Ok(FeedSnapshot::Programs(programs))
    }
}

/// Per-source line of a run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SourceOutcome {
    Reconciled {
        source_id: String,
        summary: ReconcileSummary,
    },
    Unavailable {
        source_id: String,
    },
    Failed {
        source_id: String,
        error: String,
    },
}

/// Totals across every feed in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub outdated: usize,
    pub rejected: usize,
    pub errors: usize,
    pub unavailable: usize,
    pub sources: Vec<SourceOutcome>,
}

/// Drives every configured feed through the catalog, one source at a time.
pub struct Reconciler<S> {
    catalog: Arc<ProgramCatalog<S>>,
    feeds: Vec<Arc<dyn ProgramFeed>>,
}

impl<S> Reconciler<S>
where
    S: CatalogStore + 'static,
{
    pub fn new(catalog: Arc<ProgramCatalog<S>>, feeds: Vec<Arc<dyn ProgramFeed>>) -> Self {
        Self { catalog, feeds }
    }

    pub fn feeds(&self) -> &[Arc<dyn ProgramFeed>] {
        &self.feeds
    }

    /// Feed failures are counted and skipped; a persistence failure aborts the run, but
    /// sources already merged stay saved.
    pub fn run(&self) -> Result<RunSummary, CatalogError> {
        let mut totals = ReconcileSummary::default();
        let mut report = RunSummary::default();

        for feed in &self.feeds {
            let source_id = feed.source_id().to_string();
            match feed.fetch() {
                Ok(FeedSnapshot::Programs(programs)) => {
                    let summary = self.catalog.reconcile(&source_id, programs)?;
                    info!(
                        source_id = %source_id,
                        new = summary.new,
                        updated = summary.updated,
                        unchanged = summary.unchanged,
                        outdated = summary.outdated,
                        "source reconciled"
                    );
                    totals.absorb(summary);
                    report
                        .sources
                        .push(SourceOutcome::Reconciled { source_id, summary });
                }
                Ok(FeedSnapshot::Unavailable) => {
                    warn!(source_id = %source_id, "source returned no data; leaving its programs untouched");
                    report.unavailable += 1;
                    report.sources.push(SourceOutcome::Unavailable { source_id });
                }
                Err(err) => {
                    warn!(source_id = %source_id, error = %err, "source fetch failed");
                    report.errors += 1;
                    report.sources.push(SourceOutcome::Failed {
                        source_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        report.new = totals.new;
        report.updated = totals.updated;
        report.unchanged = totals.unchanged;
        report.outdated = totals.outdated;
        report.rejected = totals.rejected;

        info!(
            new = report.new,
            updated = report.updated,
            unchanged = report.unchanged,
            outdated = report.outdated,
            errors = report.errors,
            unavailable = report.unavailable,
            "reconciliation run complete"
        );
        Ok(report)
    }
}
