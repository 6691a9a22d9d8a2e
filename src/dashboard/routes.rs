//! HTTP API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.
//! Failures surface as HTTP 500 with a `detail` message.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::auth::{password_matches, SessionStore};
use crate::engine::cycle::{CycleOrchestrator, LineupReport, LineupStatus, RunMode};
use crate::engine::machine::CycleState;
use crate::strategy::Suggestions;
use crate::types::{FantasyError, TrackingState};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub orchestrator: CycleOrchestrator,
    /// Held for the whole of any state-changing cycle.
    pub cycle_lock: Mutex<()>,
    pub sessions: SessionStore,
    pub password: Option<SecretString>,
    pub started_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn new(orchestrator: CycleOrchestrator, password: Option<String>) -> Self {
        Self {
            orchestrator,
            cycle_lock: Mutex::new(()),
            sessions: SessionStore::new(),
            password: password.filter(|p| !p.is_empty()).map(SecretString::new),
            started_at: Utc::now(),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ExecuteBody {
    #[serde(default)]
    pub confirm: bool,
    #[serde(default)]
    pub generate_new: bool,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<CycleState>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthBody {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: i64,
}

/// Error wrapper rendered as `500 {"detail": ...}`.
pub struct ApiError(pub FantasyError);

impl From<FantasyError> for ApiError {
    fn from(e: FantasyError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": self.0.to_string()})),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /analyze. Suggestions only, no side effects.
pub async fn analyze(State(state): State<AppState>) -> Result<Json<Suggestions>, ApiError> {
    Ok(Json(state.orchestrator.analyze().await?))
}

/// POST /execute
pub async fn execute(
    State(state): State<AppState>,
    Json(body): Json<ExecuteBody>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    if body.confirm {
        let _guard = state.cycle_lock.lock().await;
        info!("Confirmed execution requested over HTTP");
        let report = state
            .orchestrator
            .run_cycle(RunMode::Programmatic { confirm: true })
            .await?;
        return Ok(Json(ExecuteResponse {
            executed: true,
            actions: Some(report.actions),
            suggestions: None,
            state: Some(report.state),
        }));
    }
    if body.generate_new {
        let suggestions = state.orchestrator.analyze().await?;
        return Ok(Json(ExecuteResponse {
            executed: false,
            actions: None,
            suggestions: Some(suggestions),
            state: None,
        }));
    }
    Ok(Json(ExecuteResponse {
        executed: false,
        actions: Some(Vec::new()),
        suggestions: None,
        state: None,
    }))
}

/// GET /lineup-status
pub async fn lineup_status(State(state): State<AppState>) -> Result<Json<LineupStatus>, ApiError> {
    Ok(Json(state.orchestrator.lineup_status().await?))
}

/// POST /execute-lineup
pub async fn execute_lineup(State(state): State<AppState>) -> Result<Json<LineupReport>, ApiError> {
    let _guard = state.cycle_lock.lock().await;
    Ok(Json(state.orchestrator.execute_lineup().await?))
}

/// GET /last-run
pub async fn last_run(State(state): State<AppState>) -> Result<Json<TrackingState>, ApiError> {
    Ok(Json(state.orchestrator.last_run()?))
}

/// POST /auth
pub async fn login(State(state): State<AppState>, Json(body): Json<AuthBody>) -> Response {
    if let Some(password) = &state.password {
        if !password_matches(password, &body.password) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Invalid password"})),
            )
                .into_response();
        }
    }
    let token = state.sessions.issue().await;
    Json(AuthResponse { token }).into_response()
}
