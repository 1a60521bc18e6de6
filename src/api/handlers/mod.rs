use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::dashboard::Dashboard;
use crate::extract::ExtractionMethod;
use crate::models::*;
use crate::scoring::RankedTask;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Validation failures raised by the database layer ("Assignee is required")
/// are passed through as BAD_REQUEST.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("required") || msg.contains("not found") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn task_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Task not found".to_string())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>, (StatusCode, String)> {
    state.db.list_tasks(&filter).map(Json).map_err(internal_error)
}

/// Manual entry. The body is normalized the same way extracted items are.
pub async fn create_task(
    State(state): State<AppState>,
    Json(item): Json<RawItem>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    let input = state
        .extractor
        .normalizer()
        .normalize_item(&item)
        .ok_or((StatusCode::BAD_REQUEST, "Title is required".to_string()))?;

    state
        .db
        .create_task(&input, false)
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(internal_error)
}

/// Open work, most urgent first. Done and archived tasks are left out.
pub async fn ranked_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<RankedTask>>, (StatusCode, String)> {
    let tasks = state
        .db
        .list_tasks(&TaskFilter::default())
        .map_err(internal_error)?;
    Ok(Json(state.scorer.rank_open(tasks, today())))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, (StatusCode, String)> {
    state
        .db
        .get_task(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(task_not_found)
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTaskInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    state
        .db
        .update_task(id, input)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(task_not_found)
}

pub async fn delegate_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<DelegateTaskInput>,
) -> Result<Json<Task>, (StatusCode, String)> {
    state
        .db
        .delegate_task(id, &input.assignee)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(task_not_found)
}

pub async fn archive_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.db.archive_task(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(task_not_found())
    }
}

// ============================================================
// Extraction
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    /// Store the extracted tasks instead of only previewing them.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub method: ExtractionMethod,
    pub tasks: Vec<NewTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<Vec<Task>>,
}

pub async fn extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<(StatusCode, Json<ExtractResponse>), (StatusCode, String)> {
    let extraction = state.extractor.extract(&req.text, today()).await;

    if !req.save {
        return Ok((
            StatusCode::OK,
            Json(ExtractResponse {
                method: extraction.method,
                tasks: extraction.tasks,
                created: None,
            }),
        ));
    }

    let created = state
        .db
        .create_tasks(&extraction.tasks, true)
        .map_err(internal_error)?;
    tracing::info!("Saved {} extracted tasks", created.len());

    Ok((
        StatusCode::CREATED,
        Json(ExtractResponse {
            method: extraction.method,
            tasks: extraction.tasks,
            created: Some(created),
        }),
    ))
}

// ============================================================
// Reporting
// ============================================================

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<TaskStats>, (StatusCode, String)> {
    state.db.get_stats().map(Json).map_err(internal_error)
}

pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<Dashboard>, (StatusCode, String)> {
    let tasks = state
        .db
        .list_tasks(&TaskFilter::default())
        .map_err(internal_error)?;
    Ok(Json(Dashboard::build(tasks, &state.scorer, today())))
}
