use homebuyer_assist::config::{AppConfig, ReconciliationConfig};
use homebuyer_assist::error::AppError;
use homebuyer_assist::programs::{
    seed_programs, JsonFileFeed, JsonFileStore, ProgramCatalog, ProgramFeed, Reconciler,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type FileCatalog = ProgramCatalog<JsonFileStore>;

/// Open the catalog file named by `config`, seeding sample programs into an empty one when
/// enabled.
pub(crate) fn open_catalog(config: &AppConfig) -> Result<Arc<FileCatalog>, AppError> {
    let store = Arc::new(JsonFileStore::new(config.catalog.data_path.clone()));
    let catalog = Arc::new(ProgramCatalog::new(store));

    if config.catalog.seed_when_empty {
        let drafts = seed_programs().map_err(std::io::Error::from)?;
        let inserted = catalog.seed_if_empty(drafts)?;
        if inserted > 0 {
            info!(
                inserted,
                path = %config.catalog.data_path.display(),
                "seeded empty catalog with sample programs"
            );
        }
    }

    Ok(catalog)
}

pub(crate) fn configured_feeds(config: &ReconciliationConfig) -> Vec<Arc<dyn ProgramFeed>> {
    if config.feeds.is_empty() {
        warn!("no reconciliation feeds configured; scheduled runs will be no-ops");
    }

    config
        .feeds
        .iter()
        .map(|feed| {
            Arc::new(JsonFileFeed::new(feed.source_id.clone(), feed.path.clone()))
                as Arc<dyn ProgramFeed>
        })
        .collect()
}

pub(crate) fn reconciler_for(
    catalog: Arc<FileCatalog>,
    config: &ReconciliationConfig,
) -> Reconciler<JsonFileStore> {
    Reconciler::new(catalog, configured_feeds(config))
}

/// Apply a `--catalog` override on top of the loaded configuration.
pub(crate) fn override_catalog_path(config: &mut AppConfig, catalog: Option<PathBuf>) {
    if let Some(path) = catalog {
        config.catalog.data_path = path;
    }
}
