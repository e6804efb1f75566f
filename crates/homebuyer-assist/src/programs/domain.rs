use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::eligibility::ProgramEligibility;

/// Stable identifier for a catalog program.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProgramId(pub String);

impl ProgramId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProgramId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Publication lifecycle of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
    Active,
    PendingReview,
    Outdated,
}

impl ProgramStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProgramStatus::Active => "active",
            ProgramStatus::PendingReview => "pending_review",
            ProgramStatus::Outdated => "outdated",
        }
    }

    /// Sort key used when listing: active first, outdated last.
    pub(crate) const fn rank(self) -> u8 {
        match self {
            ProgramStatus::Active => 0,
            ProgramStatus::PendingReview => 1,
            ProgramStatus::Outdated => 2,
        }
    }
}

impl fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a record entered the catalog. Manual entries are never touched by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramSource {
    ManualEntry,
    Scraped,
}

impl ProgramSource {
    pub const fn label(self) -> &'static str {
        match self {
            ProgramSource::ManualEntry => "manual-entry",
            ProgramSource::Scraped => "scraped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    StatusChange,
    Outdated,
}

/// One entry of a record's append-only change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramMetadata {
    pub version: u32,
    pub change_history: Vec<ChangeEntry>,
}

/// A persisted assistance program together with its lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRecord {
    pub id: ProgramId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub savings: String,
    pub eligibility: ProgramEligibility,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub links: Vec<ProgramLink>,
    pub status: ProgramStatus,
    pub source: ProgramSource,
    /// Feed that created or last refreshed a scraped record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_validated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: ProgramMetadata,
}

impl ProgramRecord {
    pub fn version(&self) -> u32 {
        self.metadata.version
    }

    pub fn history(&self) -> &[ChangeEntry] {
        &self.metadata.change_history
    }

    /// Start a record at version 1 with a single `created` entry.
    pub(crate) fn created(
        fields: ProgramFields,
        status: ProgramStatus,
        source: ProgramSource,
        origin: Option<String>,
        details: String,
        now: DateTime<Utc>,
    ) -> Self {
        let ProgramFields {
            id,
            name,
            description,
            savings,
            eligibility,
            benefits,
            requirements,
            links,
        } = fields;

        Self {
            id,
            name,
            description,
            savings,
            eligibility,
            benefits,
            requirements,
            links,
            status,
            source,
            origin,
            created_at: now,
            updated_at: now,
            last_validated_at: now,
            expires_at: None,
            metadata: ProgramMetadata {
                version: 1,
                change_history: vec![ChangeEntry {
                    date: now,
                    kind: ChangeKind::Created,
                    details,
                }],
            },
        }
    }

    /// Every mutation funnels through here so version and history move in lockstep.
    pub(crate) fn record_change(&mut self, kind: ChangeKind, details: String, now: DateTime<Utc>) {
        self.metadata.version += 1;
        self.metadata.change_history.push(ChangeEntry {
            date: now,
            kind,
            details,
        });
        self.updated_at = now;
    }

    pub(crate) fn transition(
        &mut self,
        status: ProgramStatus,
        kind: ChangeKind,
        details: String,
        now: DateTime<Utc>,
    ) {
        let previous = self.status;
        self.status = status;
        match status {
            ProgramStatus::Outdated => {
                self.expires_at.get_or_insert(now);
            }
            _ if previous == ProgramStatus::Outdated => self.expires_at = None,
            _ => {}
        }
        self.record_change(kind, details, now);
    }

    /// Fields the reconciler compares when deciding whether a sighting changed anything.
    pub(crate) fn same_content(&self, fields: &ProgramFields) -> bool {
        self.name == fields.name
            && self.description == fields.description
            && self.eligibility == fields.eligibility
            && self.benefits == fields.benefits
            && self.requirements == fields.requirements
    }
}

/// The descriptive part of a program, shared by manual and scraped inputs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProgramFields {
    pub id: ProgramId,
    pub name: String,
    pub description: String,
    pub savings: String,
    pub eligibility: ProgramEligibility,
    pub benefits: Vec<String>,
    pub requirements: Vec<String>,
    pub links: Vec<ProgramLink>,
}

/// Administrator-submitted program. Missing ids are assigned on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDraft {
    #[serde(default)]
    pub id: Option<ProgramId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub savings: String,
    #[serde(default)]
    pub eligibility: Option<ProgramEligibility>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub links: Vec<ProgramLink>,
}

/// Partial update applied over an existing record; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub savings: Option<String>,
    #[serde(default)]
    pub eligibility: Option<ProgramEligibility>,
    #[serde(default)]
    pub benefits: Option<Vec<String>>,
    #[serde(default)]
    pub requirements: Option<Vec<String>>,
    #[serde(default)]
    pub links: Option<Vec<ProgramLink>>,
}

impl ProgramPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A program as seen by a feed on its latest pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservedProgram {
    #[serde(default)]
    pub id: Option<ProgramId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub savings: Option<String>,
    #[serde(default)]
    pub eligibility: ProgramEligibility,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub links: Option<Vec<ProgramLink>>,
}

/// Input validation failures for program payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("program {0} is required")]
    MissingField(&'static str),
    #[error("program id must not be blank")]
    BlankId,
    #[error("update must change at least one field")]
    EmptyPatch,
    #[error("income limits must define household tiers 1 through 5 (missing tier {0})")]
    IncompleteIncomeLimits(u8),
}

/// Lowercase, hyphen-separated slug used when deriving ids from names.
pub(crate) fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
