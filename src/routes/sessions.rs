use std::path::PathBuf;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::dashboard_service::{self, AnalyzeRequest, ThemeRequest};
use crate::services::session_store::SessionView;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/analyze", post(analyze))
        .route("/:id/refresh", post(refresh))
        .route("/:id/theme", put(change_theme))
        .route("/:id/export", post(export))
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub file: Option<String>,
    pub session: SessionView,
}

fn log_action_error(action: &str, id: Uuid, e: &AppError) {
    match e {
        AppError::EmptyInput
        | AppError::InvalidTicker(_)
        | AppError::InvalidPeriod(_)
        | AppError::UnknownTheme(_)
        | AppError::NoData(_) => warn!("{} for session {} rejected: {}", action, id, e),
        _ => error!("{} for session {} failed: {}", action, id, e),
    }
}

pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let view = state.sessions.create(state.config.default_theme);
    info!("POST /api/sessions - Created session {}", view.id);
    (StatusCode::CREATED, Json(view))
}

pub async fn get_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    info!("GET /api/sessions/{} - Getting session", id);
    let session = state.sessions.get(id)?;
    let mut guard = session.lock().await;
    guard.touch();
    Ok(Json(guard.view()))
}

pub async fn delete_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /api/sessions/{} - Closing session", id);
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound)
    }
}

/// Runs an analysis; on failure the error body is returned and the session's
/// status log records the message for the next `GET`.
pub async fn analyze(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<SessionView>, AppError> {
    info!("POST /api/sessions/{}/analyze - Analyzing {:?}", id, request.ticker);
    let session = state.sessions.get(id)?;
    let mut guard = session.lock().await;

    dashboard_service::analyze(
        &mut guard,
        state.price_provider.as_ref(),
        state.config.fetch_timeout,
        request,
    )
    .await
    .map_err(|e| {
        log_action_error("Analysis", id, &e);
        e
    })?;
    Ok(Json(guard.view()))
}

pub async fn refresh(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    info!("POST /api/sessions/{}/refresh - Refreshing analysis", id);
    let session = state.sessions.get(id)?;
    let mut guard = session.lock().await;

    dashboard_service::refresh(&mut guard, state.price_provider.as_ref(), state.config.fetch_timeout)
        .await
        .map_err(|e| {
            log_action_error("Refresh", id, &e);
            e
        })?;
    Ok(Json(guard.view()))
}

pub async fn change_theme(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<ThemeRequest>,
) -> Result<Json<SessionView>, AppError> {
    info!("PUT /api/sessions/{}/theme - Switching to {:?}", id, request.theme);
    let session = state.sessions.get(id)?;
    let mut guard = session.lock().await;

    dashboard_service::change_theme(&mut guard, &request.theme).map_err(|e| {
        log_action_error("Theme change", id, &e);
        e
    })?;
    Ok(Json(guard.view()))
}

pub async fn export(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ExportResponse>, AppError> {
    info!("POST /api/sessions/{}/export - Exporting analysis", id);
    let session = state.sessions.get(id)?;
    let mut guard = session.lock().await;

    let written: Option<PathBuf> = dashboard_service::export(&mut guard, &state.config.export_dir)
        .await
        .map_err(|e| {
            log_action_error("Export", id, &e);
            e
        })?;
    Ok(Json(ExportResponse {
        file: written.map(|p| p.display().to_string()),
        session: guard.view(),
    }))
}
