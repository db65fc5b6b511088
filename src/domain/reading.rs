use chrono::{DateTime, Utc};
use serde::Serialize;

use super::sensor::SensorKind;

/// A single scalar sensor sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingPoint {
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

/// A single GPS fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

/// A time-ordered series for one sensor, as charted by the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SensorSeries {
    pub kind: SensorKind,
    pub points: Vec<ReadingPoint>,
}

/// Per-session overview shown in the session list drill-down.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub reading_count: i64,
    pub gps_count: i64,
}
