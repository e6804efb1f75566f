use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::domain::ProgramRecord;

/// Durable home of the catalog. `save` must replace the whole set atomically.
pub trait CatalogStore: Send + Sync {
    fn load(&self) -> Result<Vec<ProgramRecord>, StoreError>;
    fn save(&self, records: &[ProgramRecord]) -> Result<(), StoreError>;
}

/// Persistence failures surfaced to callers; a mutation is only reported after `save` succeeds.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("catalog file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("catalog file {path} is not valid catalog JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog could not be encoded for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Serialize)]
struct CatalogDocumentRef<'a> {
    programs: &'a [ProgramRecord],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Wrapped { programs: Vec<ProgramRecord> },
    Bare(Vec<ProgramRecord>),
}

/// JSON document on disk, written via temp file + rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "catalog".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CatalogStore for JsonFileStore {
    fn load(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };

        let document: CatalogDocument =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        Ok(match document {
            CatalogDocument::Wrapped { programs } => programs,
            CatalogDocument::Bare(programs) => programs,
        })
    }

    fn save(&self, records: &[ProgramRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let payload = serde_json::to_vec_pretty(&CatalogDocumentRef { programs: records })
            .map_err(|source| StoreError::Encode {
                path: self.path.clone(),
                source,
            })?;

        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).map_err(|err| self.io_error(err))?;
        file.write_all(&payload)
            .and_then(|_| file.sync_all())
            .map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))?;
        Ok(())
    }
}

/// Process-local store for tests and ephemeral runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<ProgramRecord>>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<ProgramRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    pub fn snapshot(&self) -> Vec<ProgramRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CatalogStore for MemoryStore {
    fn load(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, records: &[ProgramRecord]) -> Result<(), StoreError> {
        *self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = records.to_vec();
        Ok(())
    }
}
