//! Dashboard read API: sessions, sensor series, GPS tracks.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    auth::{AuthBearer, Claims},
    domain::{GpsPoint, ReadingPoint, SensorKind, SensorSeries, SessionSummary},
    ingest::AppState,
    repo::pg::sessions::SessionRow,
};

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub started_at: DateTime<Utc>,
}

impl From<&SessionRow> for SessionInfo {
    fn from(row: &SessionRow) -> Self {
        Self {
            id: row.id.clone(),
            started_at: row.started_at,
        }
    }
}

/// Fetch a session and enforce ownership. Foreign sessions are reported as
/// missing so ids cannot be probed.
async fn owned_session(
    st: &AppState,
    claims: &Claims,
    id: &str,
) -> Result<SessionRow, ApiError> {
    st.repos
        .db
        .sessions()
        .find_by_id(id)
        .await?
        .filter(|session| session.user_id == claims.sub)
        .ok_or_else(|| ApiError::NotFound(format!("session {}", id)))
}

pub async fn list_sessions(
    State(st): State<AppState>,
    AuthBearer(claims): AuthBearer,
) -> Result<impl IntoResponse, ApiError> {
    let rows = st.repos.db.sessions().list_for_user(claims.sub).await?;
    let total = rows.len();
    let sessions: Vec<SessionInfo> = rows.iter().map(SessionInfo::from).collect();

    Ok(ApiResponse::success(sessions).with_count(total))
}

pub async fn get_session(
    State(st): State<AppState>,
    AuthBearer(claims): AuthBearer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&st, &claims, &id).await?;

    let readings = st.repos.db.readings();
    let summary = SessionSummary {
        id: session.id.clone(),
        started_at: session.started_at,
        reading_count: readings.count_for_session(&session.id).await?,
        gps_count: readings.gps_count_for_session(&session.id).await?,
    };

    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    pub kind: Option<SensorKind>,
}

pub async fn get_readings(
    State(st): State<AppState>,
    AuthBearer(claims): AuthBearer,
    Path(id): Path<String>,
    Query(q): Query<ReadingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&st, &claims, &id).await?;
    let readings = st.repos.db.readings();

    match q.kind {
        Some(kind) => {
            let points: Vec<ReadingPoint> = readings
                .series_for_session(&session.id, kind)
                .await?
                .into_iter()
                .map(|row| ReadingPoint {
                    value: row.value,
                    recorded_at: row.recorded_at,
                })
                .collect();
            Ok(Json(SensorSeries { kind, points }).into_response())
        }
        None => {
            let mut grouped: HashMap<SensorKind, Vec<ReadingPoint>> = HashMap::new();
            for row in readings.all_for_session(&session.id).await? {
                if let Some(kind) = row.sensor_kind() {
                    grouped.entry(kind).or_default().push(ReadingPoint {
                        value: row.value,
                        recorded_at: row.recorded_at,
                    });
                }
            }
            // Canonical kind order keeps the chart legend stable.
            let series: Vec<SensorSeries> = SensorKind::ALL
                .into_iter()
                .filter_map(|kind| {
                    grouped
                        .remove(&kind)
                        .map(|points| SensorSeries { kind, points })
                })
                .collect();
            Ok(Json(series).into_response())
        }
    }
}

pub async fn get_gps_track(
    State(st): State<AppState>,
    AuthBearer(claims): AuthBearer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = owned_session(&st, &claims, &id).await?;

    let track: Vec<GpsPoint> = st
        .repos
        .db
        .readings()
        .gps_for_session(&session.id)
        .await?
        .into_iter()
        .map(|row| GpsPoint {
            latitude: row.latitude,
            longitude: row.longitude,
            recorded_at: row.recorded_at,
        })
        .collect();

    Ok(Json(track))
}
