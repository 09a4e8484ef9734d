//! HTTP route handlers for the control server.
//!
//! The message surface for external callers (settings UI, manual trigger):
//! reschedule, run-now, plus status and the settings record itself.

use std::sync::Arc;

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::settings::Settings;
use crate::AppState;

/// Build the API router with all endpoints.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/config", get(get_config).post(set_config))
        .route("/status", get(get_status))
        .route("/reschedule", post(reschedule))
        .route("/run-now", post(run_now))
        // Auth middleware (only if REWARDS_RUNNER_WEB_PASS is set)
        .layer(middleware::from_fn(super::auth::basic_auth_middleware))
        .layer(Extension(state))
}

// ========== Config Handlers ==========

async fn get_config(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.settings())
}

async fn set_config(
    Extension(state): Extension<Arc<AppState>>,
    Json(settings): Json<Settings>,
) -> impl IntoResponse {
    info!("Updating settings via web API");
    // The change notification re-arms the scheduler.
    state.store.update_settings(settings);
    StatusCode::OK
}

// ========== Status Handler ==========

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    enabled: bool,
    running: bool,
    browser_alive: bool,
    next_run_at: Option<DateTime<Utc>>,
    next_open_at: Option<DateTime<Utc>>,
    badge: Option<String>,
}

async fn get_status(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let settings = state.store.settings();
    let run_state = state.store.run_state();

    Json(StatusResponse {
        enabled: settings.enabled,
        running: run_state.running,
        browser_alive: state.session.is_alive(),
        next_run_at: run_state.next_run_at,
        next_open_at: run_state.next_open_at,
        // Last value published by the run ticker or a schedule change.
        badge: state.badge.current(),
    })
}

// ========== Trigger Handlers ==========

async fn reschedule(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    info!("Reschedule requested via web API");
    state.scheduler.schedule_next();
    StatusCode::OK
}

/// Manual trigger. Runs regardless of the enabled flag (manual override)
/// and returns immediately; a run already in progress stays untouched.
async fn run_now(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    info!("Run-now requested via web API");
    let executor = state.executor.clone();
    tokio::spawn(async move {
        executor.run_task(true).await;
    });
    StatusCode::ACCEPTED
}
