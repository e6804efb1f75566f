use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::domain::{ProgramRecord, ProgramSource, ProgramStatus};

const RECENT_WINDOW_DAYS: i64 = 30;

/// Aggregate counts over the whole catalog, regardless of visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total: usize,
    pub active: usize,
    pub pending_review: usize,
    pub outdated: usize,
    pub manual_entry: usize,
    pub scraped: usize,
    pub updated_last_30_days: usize,
}

impl CatalogStats {
    pub fn summarize(records: &[ProgramRecord], now: DateTime<Utc>) -> Self {
        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);

        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            match record.status {
                ProgramStatus::Active => stats.active += 1,
                ProgramStatus::PendingReview => stats.pending_review += 1,
                ProgramStatus::Outdated => stats.outdated += 1,
            }
            match record.source {
                ProgramSource::ManualEntry => stats.manual_entry += 1,
                ProgramSource::Scraped => stats.scraped += 1,
            }
            if record.updated_at > cutoff {
                stats.updated_last_30_days += 1;
            }
            stats
        })
    }
}
