use axum::{
    routing::{get, post},
    Router,
};

use crate::api::{auth, health, sessions, torque};
use crate::ingest::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Torque issues GETs by default but can be configured to POST.
        .route("/torque/upload", get(torque::upload).post(torque::upload))
        .route("/torque/csv", post(torque::import_csv))
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/:id", get(sessions::get_session))
        .route("/sessions/:id/readings", get(sessions::get_readings))
        .route("/sessions/:id/gps", get(sessions::get_gps_track))
        .with_state(state)
}
