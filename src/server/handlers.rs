//! Control server handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::JobSpec;
use crate::server::state::ControlState;
use crate::state::{ProgressSnapshot, RunStatus};
use crate::LumiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body of every successful mutation
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSnapshot>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Rejected jobs are the caller's fault; anything else is ours
fn error_status(error: &LumiError) -> StatusCode {
    match error {
        LumiError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Starts a crawl in the background
pub async fn launch(
    State(state): State<Arc<ControlState>>,
    Json(spec): Json<JobSpec>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let job = spec.into_job();

    let mut slot = state.slot();
    if slot.status().is_running() {
        return Err(api_error(
            StatusCode::CONFLICT,
            "A crawl is already running",
        ));
    }

    let project = job.project.clone();
    let handle = state.coordinator().launch(job).map_err(|e| {
        tracing::warn!("Rejected crawl for project '{}': {}", project, e);
        api_error(error_status(&e), e.to_string())
    })?;
    slot.start(handle);

    tracing::info!("Crawl launched for project '{}'", project);
    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: format!("Lumi process started for project '{}'", project),
        }),
    ))
}

pub async fn status(State(state): State<Arc<ControlState>>) -> Json<StatusResponse> {
    let slot = state.slot();
    Json(StatusResponse {
        status: slot.status(),
        progress: slot.snapshot(),
    })
}

/// Deletes a project's output directory
pub async fn delete_project(
    State(state): State<Arc<ControlState>>,
    Path(project): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let slot = state.slot();
    if slot.status().is_running() {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Cannot delete projects while a crawl is running",
        ));
    }

    match state.coordinator().layout().clean_project(&project) {
        Ok(true) => {
            tracing::info!("Deleted project '{}'", project);
            Ok(Json(MessageResponse {
                message: format!("Deleted project '{}'", project),
            }))
        }
        Ok(false) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Project not found: {}", project),
        )),
        Err(e) => Err(api_error(error_status(&e), e.to_string())),
    }
}
