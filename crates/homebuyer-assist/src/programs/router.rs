use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::catalog::{CatalogError, ProgramCatalog, Visibility};
use super::domain::{ObservedProgram, ProgramDraft, ProgramId, ProgramPatch, ProgramStatus};
use super::eligibility::{ApplicantProfile, ProfileSubmission};
use super::reconcile::Reconciler;
use super::search::SearchIndex;
use super::store::CatalogStore;

/// Shared state behind the program endpoints.
pub struct ProgramsApi<S> {
    pub catalog: Arc<ProgramCatalog<S>>,
    pub reconciler: Reconciler<S>,
}

impl<S> ProgramsApi<S>
where
    S: CatalogStore + 'static,
{
    pub fn new(catalog: Arc<ProgramCatalog<S>>, reconciler: Reconciler<S>) -> Self {
        Self {
            catalog,
            reconciler,
        }
    }
}

type ApiState<S> = State<Arc<ProgramsApi<S>>>;

/// Router builder exposing catalog, search, and reconciliation endpoints.
pub fn program_router<S>(api: Arc<ProgramsApi<S>>) -> Router
where
    S: CatalogStore + 'static,
{
    Router::new()
        .route(
            "/api/programs",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route("/api/programs/search", post(search_handler::<S>))
        .route("/api/programs/evaluate", post(evaluate_handler::<S>))
        .route(
            "/api/programs/:program_id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route("/api/programs/:program_id/status", put(status_handler::<S>))
        .route("/api/counties", get(counties_handler::<S>))
        .route("/api/counties/:county/cities", get(cities_handler::<S>))
        .route("/api/reconcile", post(reconcile_handler::<S>))
        .route("/api/reconcile/run", post(reconcile_run_handler::<S>))
        .route("/api/stats", get(stats_handler::<S>))
        .with_state(api)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) include_outdated: bool,
    #[serde(default)]
    pub(crate) include_all: bool,
}

impl ListQuery {
    fn visibility(&self) -> Visibility {
        Visibility::from_flags(self.include_outdated, self.include_all)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeleteQuery {
    #[serde(default)]
    pub(crate) hard: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChangeRequest {
    pub(crate) status: ProgramStatus,
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReconcileRequest {
    pub(crate) source_id: String,
    /// Required: an absent list is not the same as a source listing zero programs.
    pub(crate) programs: Vec<ObservedProgram>,
}

pub(crate) async fn list_handler<S>(
    State(api): ApiState<S>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: CatalogStore + 'static,
{
    match api.catalog.list(query.visibility()) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn get_handler<S>(
    State(api): ApiState<S>,
    Path(program_id): Path<String>,
) -> Response
where
    S: CatalogStore + 'static,
{
    match api.catalog.get(&ProgramId(program_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn create_handler<S>(
    State(api): ApiState<S>,
    axum::Json(draft): axum::Json<ProgramDraft>,
) -> Response
where
    S: CatalogStore + 'static,
{
    match api.catalog.create(draft) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn update_handler<S>(
    State(api): ApiState<S>,
    Path(program_id): Path<String>,
    axum::Json(patch): axum::Json<ProgramPatch>,
) -> Response
where
    S: CatalogStore + 'static,
{
    match api.catalog.update(&ProgramId(program_id), patch) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn delete_handler<S>(
    State(api): ApiState<S>,
    Path(program_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response
where
    S: CatalogStore + 'static,
{
    let id = ProgramId(program_id);
    if query.hard {
        return match api.catalog.hard_delete(&id) {
            Ok(record) => (
                StatusCode::OK,
                axum::Json(json!({ "deleted": record.id, "hard": true })),
            )
                .into_response(),
            Err(err) => catalog_error_response(err),
        };
    }

    match api.catalog.soft_delete(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn status_handler<S>(
    State(api): ApiState<S>,
    Path(program_id): Path<String>,
    axum::Json(request): axum::Json<StatusChangeRequest>,
) -> Response
where
    S: CatalogStore + 'static,
{
    let id = ProgramId(program_id);
    match api
        .catalog
        .set_status(&id, request.status, request.reason.as_deref())
    {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn search_handler<S>(
    State(api): ApiState<S>,
    Query(query): Query<ListQuery>,
    axum::Json(submission): axum::Json<ProfileSubmission>,
) -> Response
where
    S: CatalogStore + 'static,
{
    let profile = match ApplicantProfile::try_from(submission) {
        Ok(profile) => profile,
        Err(err) => return unprocessable(err.to_string()),
    };

    match SearchIndex::new(&api.catalog).search(&profile, query.visibility()) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn evaluate_handler<S>(
    State(api): ApiState<S>,
    Query(query): Query<ListQuery>,
    axum::Json(submission): axum::Json<ProfileSubmission>,
) -> Response
where
    S: CatalogStore + 'static,
{
    let profile = match ApplicantProfile::try_from(submission) {
        Ok(profile) => profile,
        Err(err) => return unprocessable(err.to_string()),
    };

    match SearchIndex::new(&api.catalog).explain(&profile, query.visibility()) {
        Ok(verdicts) => (StatusCode::OK, axum::Json(verdicts)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn counties_handler<S>(State(api): ApiState<S>) -> Response
where
    S: CatalogStore + 'static,
{
    match SearchIndex::new(&api.catalog).counties() {
        Ok(counties) => (StatusCode::OK, axum::Json(counties)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn cities_handler<S>(
    State(api): ApiState<S>,
    Path(county): Path<String>,
) -> Response
where
    S: CatalogStore + 'static,
{
    match SearchIndex::new(&api.catalog).cities_for_county(&county) {
        Ok(cities) => (StatusCode::OK, axum::Json(cities)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn reconcile_handler<S>(
    State(api): ApiState<S>,
    axum::Json(request): axum::Json<ReconcileRequest>,
) -> Response
where
    S: CatalogStore + 'static,
{
    let source_id = request.source_id.trim();
    if source_id.is_empty() {
        return unprocessable("sourceId is required".to_string());
    }

    match api.catalog.reconcile(source_id, request.programs) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn reconcile_run_handler<S>(State(api): ApiState<S>) -> Response
where
    S: CatalogStore + 'static,
{
    match api.reconciler.run() {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn stats_handler<S>(State(api): ApiState<S>) -> Response
where
    S: CatalogStore + 'static,
{
    match api.catalog.stats() {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) fn catalog_error_response(err: CatalogError) -> Response {
    let status = match &err {
        CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Conflict(_) => StatusCode::CONFLICT,
        CatalogError::Store(store_error) => {
            error!(error = %store_error, "catalog persistence failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn unprocessable(message: String) -> Response {
    let payload = json!({
        "error": message,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}
