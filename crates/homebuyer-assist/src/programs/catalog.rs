use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::info;

use super::clock::{Clock, SystemClock};
use super::domain::{
    ChangeKind, ObservedProgram, ProgramDraft, ProgramFields, ProgramId, ProgramPatch,
    ProgramRecord, ProgramSource, ProgramStatus, RecordError,
};
use super::eligibility::ProgramEligibility;
use super::reconcile::{merge_observations, ReconcileSummary};
use super::stats::CatalogStats;
use super::store::{CatalogStore, StoreError};

/// Which lifecycle states a listing exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Publicly visible programs only.
    #[default]
    Active,
    IncludeOutdated,
    All,
}

impl Visibility {
    pub fn from_flags(include_outdated: bool, include_all: bool) -> Self {
        match (include_all, include_outdated) {
            (true, _) => Self::All,
            (false, true) => Self::IncludeOutdated,
            (false, false) => Self::Active,
        }
    }

    pub fn admits(self, status: ProgramStatus) -> bool {
        match self {
            Visibility::All => true,
            Visibility::IncludeOutdated => status != ProgramStatus::PendingReview,
            Visibility::Active => status == ProgramStatus::Active,
        }
    }
}

/// Error raised by catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] RecordError),
    #[error("program {0} not found")]
    NotFound(ProgramId),
    #[error("program {0} already exists")]
    Conflict(ProgramId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Keyed collection of programs with versioned history.
///
/// Every mutation runs load, mutate, save under one lock, so concurrent writers never
/// interleave on a record's version or history.
pub struct ProgramCatalog<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl<S> ProgramCatalog<S>
where
    S: CatalogStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn get(&self, id: &ProgramId) -> Result<ProgramRecord, CatalogError> {
        self.store
            .load()?
            .into_iter()
            .find(|record| &record.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// Records admitted by `visibility`, active first and outdated last.
    pub fn list(&self, visibility: Visibility) -> Result<Vec<ProgramRecord>, CatalogError> {
        let mut records: Vec<ProgramRecord> = self
            .store
            .load()?
            .into_iter()
            .filter(|record| visibility.admits(record.status))
            .collect();
        records.sort_by_key(|record| record.status.rank());
        Ok(records)
    }

    /// Insert an administrator-curated program as active.
    pub fn create(&self, draft: ProgramDraft) -> Result<ProgramRecord, CatalogError> {
        let fields = validate_draft(draft)?;

        self.mutate(|records, now| {
            if records.iter().any(|record| record.id == fields.id) {
                return Err(CatalogError::Conflict(fields.id.clone()));
            }

            let record = ProgramRecord::created(
                fields,
                ProgramStatus::Active,
                ProgramSource::ManualEntry,
                None,
                "Created by manual entry".to_string(),
                now,
            );
            records.push(record.clone());
            Ok(record)
        })
        .inspect(|record| info!(program_id = %record.id, "program created"))
    }

    /// Merge `patch` over an existing record, keeping its id and source.
    pub fn update(
        &self,
        id: &ProgramId,
        patch: ProgramPatch,
    ) -> Result<ProgramRecord, CatalogError> {
        validate_patch(&patch)?;

        self.mutate(|records, now| {
            let record = find_mut(records, id)?;
            let changed = apply_patch(record, patch);
            record.last_validated_at = now;
            record.record_change(
                ChangeKind::Updated,
                format!("Manual edit ({})", changed.join(", ")),
                now,
            );
            Ok(record.clone())
        })
        .inspect(|record| {
            info!(program_id = %record.id, version = record.version(), "program updated")
        })
    }

    pub fn set_status(
        &self,
        id: &ProgramId,
        status: ProgramStatus,
        reason: Option<&str>,
    ) -> Result<ProgramRecord, CatalogError> {
        self.mutate(|records, now| {
            let record = find_mut(records, id)?;
            let mut details = format!("Status changed from {} to {}", record.status, status);
            if let Some(reason) = reason.map(str::trim).filter(|reason| !reason.is_empty()) {
                details.push_str(": ");
                details.push_str(reason);
            }
            record.transition(status, ChangeKind::StatusChange, details, now);
            Ok(record.clone())
        })
        .inspect(|record| info!(program_id = %record.id, status = %record.status, "program status changed"))
    }

    /// Default deletion: mark outdated and stamp the expiry with the current time.
    pub fn soft_delete(&self, id: &ProgramId) -> Result<ProgramRecord, CatalogError> {
        self.mutate(|records, now| {
            let record = find_mut(records, id)?;
            let details = format!("Soft-deleted (was {})", record.status);
            record.transition(ProgramStatus::Outdated, ChangeKind::StatusChange, details, now);
            record.expires_at = Some(now);
            Ok(record.clone())
        })
        .inspect(|record| info!(program_id = %record.id, "program soft-deleted"))
    }

    /// Remove the record entirely. Administrative correction only; history is lost.
    pub fn hard_delete(&self, id: &ProgramId) -> Result<ProgramRecord, CatalogError> {
        self.mutate(|records, _| {
            let index = records
                .iter()
                .position(|record| &record.id == id)
                .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
            Ok(records.remove(index))
        })
        .inspect(|record| tracing::warn!(program_id = %record.id, "program hard-deleted"))
    }

    /// Merge one source's observations; see [`merge_observations`].
    pub fn reconcile(
        &self,
        source_id: &str,
        observed: Vec<ObservedProgram>,
    ) -> Result<ReconcileSummary, CatalogError> {
        self.mutate(|records, now| Ok(merge_observations(records, source_id, observed, now)))
    }

    /// Insert `drafts` as manual entries when the catalog holds no records at all.
    pub fn seed_if_empty(&self, drafts: Vec<ProgramDraft>) -> Result<usize, CatalogError> {
        let fields = drafts
            .into_iter()
            .map(validate_draft)
            .collect::<Result<Vec<_>, _>>()?;

        self.mutate(|records, now| {
            if !records.is_empty() {
                return Ok(0);
            }

            records.extend(fields.into_iter().map(|fields| {
                ProgramRecord::created(
                    fields,
                    ProgramStatus::Active,
                    ProgramSource::ManualEntry,
                    None,
                    "Seeded from bundled sample programs".to_string(),
                    now,
                )
            }));
            Ok(records.len())
        })
    }

    pub fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let records = self.store.load()?;
        Ok(CatalogStats::summarize(&records, self.clock.now()))
    }

    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Vec<ProgramRecord>, DateTime<Utc>) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut records = self.store.load()?;
        let outcome = op(&mut records, self.clock.now())?;
        self.store.save(&records)?;
        Ok(outcome)
    }
}

fn find_mut<'a>(
    records: &'a mut [ProgramRecord],
    id: &ProgramId,
) -> Result<&'a mut ProgramRecord, CatalogError> {
    records
        .iter_mut()
        .find(|record| &record.id == id)
        .ok_or_else(|| CatalogError::NotFound(id.clone()))
}

fn validate_draft(draft: ProgramDraft) -> Result<ProgramFields, RecordError> {
    let ProgramDraft {
        id,
        name,
        description,
        savings,
        eligibility,
        benefits,
        requirements,
        links,
    } = draft;

    let name = required_text(name, "name")?;
    let description = required_text(description, "description")?;
    let eligibility = eligibility
        .ok_or(RecordError::MissingField("eligibility"))?
        .normalized();
    validate_eligibility(&eligibility)?;

    let id = match id {
        Some(id) if id.0.trim().is_empty() => return Err(RecordError::BlankId),
        Some(id) => ProgramId(id.0.trim().to_string()),
        None => ProgramId(uuid::Uuid::new_v4().to_string()),
    };

    Ok(ProgramFields {
        id,
        name,
        description,
        savings,
        eligibility,
        benefits,
        requirements,
        links,
    })
}

fn validate_patch(patch: &ProgramPatch) -> Result<(), RecordError> {
    if patch.is_empty() {
        return Err(RecordError::EmptyPatch);
    }
    if let Some(name) = &patch.name {
        required_text(name.clone(), "name")?;
    }
    if let Some(description) = &patch.description {
        required_text(description.clone(), "description")?;
    }
    if let Some(eligibility) = &patch.eligibility {
        validate_eligibility(eligibility)?;
    }
    Ok(())
}

fn validate_eligibility(eligibility: &ProgramEligibility) -> Result<(), RecordError> {
    match eligibility
        .income_limits
        .as_ref()
        .and_then(|limits| limits.first_missing_tier())
    {
        Some(tier) => Err(RecordError::IncompleteIncomeLimits(tier)),
        None => Ok(()),
    }
}

fn required_text(value: String, field: &'static str) -> Result<String, RecordError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RecordError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Returns the names of the fields that were supplied.
fn apply_patch(record: &mut ProgramRecord, patch: ProgramPatch) -> Vec<&'static str> {
    let ProgramPatch {
        name,
        description,
        savings,
        eligibility,
        benefits,
        requirements,
        links,
    } = patch;
    let mut changed = Vec::new();

    if let Some(name) = name {
        record.name = name.trim().to_string();
        changed.push("name");
    }
    if let Some(description) = description {
        record.description = description.trim().to_string();
        changed.push("description");
    }
    if let Some(savings) = savings {
        record.savings = savings;
        changed.push("savings");
    }
    if let Some(eligibility) = eligibility {
        record.eligibility = eligibility.normalized();
        changed.push("eligibility");
    }
    if let Some(benefits) = benefits {
        record.benefits = benefits;
        changed.push("benefits");
    }
    if let Some(requirements) = requirements {
        record.requirements = requirements;
        changed.push("requirements");
    }
    if let Some(links) = links {
        record.links = links;
        changed.push("links");
    }

    changed
}
