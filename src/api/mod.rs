use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::parse_wire_date;
use crate::error::AppError;
use crate::models::*;
use crate::services::classifier::{self, ClassifiedCv, Page, PoolSummary};
use crate::services::{AssignmentHistory, MutationOutcome};
use crate::state::AppState;

#[derive(Deserialize)]
struct ViewParams {
    #[serde(default)]
    view: CvView,
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    view: CvView,
    #[serde(default)]
    q: String,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_per_page")]
    per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

const MAX_PER_PAGE: usize = 100;

#[derive(Deserialize)]
struct EndDateParams {
    station_id: Option<String>,
    start_date: Option<String>,
}

#[derive(Deserialize)]
struct RemoveParams {
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    view: CvView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RotationsResponse {
    view: CvView,
    stations: Vec<Station>,
    summary: PoolSummary,
    cvs: Page<ClassifiedCv>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EndDateResponse {
    #[serde(with = "crate::dates::wire_date")]
    end_date: Option<NaiveDate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stations", get(list_stations))
        .route("/rotations", get(list_rotations))
        .route("/rotations/end-date", get(preview_end_date))
        .route("/rotations/assign", post(assign))
        .route("/rotations/assign-multiple", post(assign_multiple))
        .route("/rotations/rotate", post(rotate))
        .route("/rotations/{cv_id}/station", delete(remove_from_station))
        .route("/rotations/{cv_id}/history", get(history))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.orchestrator.catalog().stations().await?;
    Ok(StatusCode::OK)
}

async fn list_stations(State(state): State<AppState>) -> Result<Json<Vec<Station>>, AppError> {
    let stations = state.orchestrator.catalog().stations().await?;
    Ok(Json(stations))
}

async fn list_rotations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<RotationsResponse>, AppError> {
    let snapshot = state.orchestrator.load_view(params.view).await?;
    let classified = classifier::classify_all(snapshot.cvs);
    let summary = classifier::summarize(&classified);
    let filtered = classifier::filter(&classified, params.view, &params.q);

    Ok(Json(RotationsResponse {
        view: params.view,
        stations: snapshot.stations,
        summary,
        cvs: classifier::paginate(&filtered, params.page, params.per_page.min(MAX_PER_PAGE)),
    }))
}

async fn preview_end_date(
    State(state): State<AppState>,
    Query(params): Query<EndDateParams>,
) -> Result<Json<EndDateResponse>, AppError> {
    let start = match params.start_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse_wire_date(raw)
                .ok_or_else(|| AppError::Validation(format!("Invalid start date: {}", raw)))?,
        ),
    };
    let end = state
        .orchestrator
        .preview_end_date(params.station_id.as_deref(), start)
        .await?;
    Ok(Json(EndDateResponse { end_date: Some(end) }))
}

async fn assign(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<MutationOutcome>, AppError> {
    let outcome = state.orchestrator.assign(req, params.view).await?;
    Ok(Json(outcome))
}

async fn assign_multiple(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
    Json(req): Json<AssignMultipleRequest>,
) -> Result<Json<MutationOutcome>, AppError> {
    let outcome = state.orchestrator.assign_multiple(req, params.view).await?;
    Ok(Json(outcome))
}

async fn rotate(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
    Json(req): Json<RotateRequest>,
) -> Result<Json<MutationOutcome>, AppError> {
    let outcome = state.orchestrator.rotate(req, params.view).await?;
    Ok(Json(outcome))
}

async fn remove_from_station(
    State(state): State<AppState>,
    Path(cv_id): Path<String>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<MutationOutcome>, AppError> {
    let req = RemoveRequest {
        confirmed: params.confirmed,
    };
    let outcome = state.orchestrator.remove(&cv_id, req, params.view).await?;
    Ok(Json(outcome))
}

async fn history(
    State(state): State<AppState>,
    Path(cv_id): Path<String>,
) -> Result<Json<AssignmentHistory>, AppError> {
    let history = state.orchestrator.history(&cv_id).await?;
    Ok(Json(history))
}
