use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::domain::ProgramRecord;

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "failed to write catalog export: {}", err),
            ExportError::Csv(err) => write!(f, "could not encode catalog export: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Serialize)]
struct ReviewRow<'a> {
    #[serde(rename = "Program ID")]
    id: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Source")]
    source: &'static str,
    #[serde(rename = "Version")]
    version: u32,
    #[serde(rename = "Updated At")]
    updated_at: String,
    #[serde(rename = "Last Validated At")]
    last_validated_at: String,
    #[serde(rename = "Expires At")]
    expires_at: String,
}

impl<'a> From<&'a ProgramRecord> for ReviewRow<'a> {
    fn from(record: &'a ProgramRecord) -> Self {
        Self {
            id: record.id.as_str(),
            name: &record.name,
            status: record.status.label(),
            source: record.source.label(),
            version: record.version(),
            updated_at: record.updated_at.to_rfc3339(),
            last_validated_at: record.last_validated_at.to_rfc3339(),
            expires_at: record
                .expires_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// Write one review row per record, with a header line, to `writer`.
pub fn write_catalog_csv<W: Write>(
    records: &[ProgramRecord],
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(ReviewRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_catalog_csv<P: AsRef<Path>>(
    records: &[ProgramRecord],
    path: P,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_catalog_csv(records, file)
}
