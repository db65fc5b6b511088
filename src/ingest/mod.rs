//! Telemetry ingestion pipeline.
//!
//! Two entry paths feed the same storage: live uploads from the Torque app
//! (bare query parameters, resolved by email) and exported trip logs (CSV,
//! imported by an authenticated user). Parsing is pure and lives in
//! [`torque`] and [`csv`]; this module orchestrates persistence.

pub mod csv;
pub mod torque;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::repo::pg::readings::{GpsReadingRow, ReadingRow};
use crate::repo::pg::users::UserRow;
use crate::repo::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub ingestor: Arc<Ingestor>,
    pub repos: Arc<Repositories>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let repos = Arc::new(Repositories::new(&cfg).await?);
        let ingestor = Arc::new(Ingestor::new(repos.clone()));
        Ok(Self {
            cfg,
            ingestor,
            repos,
        })
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("user email not found in upload")]
    MissingEmail,
    #[error("no user registered for {0}")]
    UnknownUser(String),
    #[error("session id not found in upload")]
    MissingSession,
    #[error("trip log rejected: {0}")]
    Csv(#[from] csv::CsvParseError),
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

/// Result of one live Torque upload.
#[derive(Debug, PartialEq)]
pub enum IngestOutcome {
    /// Upload carried sensor metadata only; acknowledged, nothing stored.
    MetadataIgnored,
    Stored {
        session_id: String,
        readings: usize,
        gps: bool,
    },
}

/// Result of a trip-log import.
#[derive(Debug, Serialize)]
pub struct CsvImportOutcome {
    pub session_id: String,
    pub imported: bool,
    pub readings: u64,
    pub gps_points: u64,
}

pub struct Ingestor {
    repos: Arc<Repositories>,
}

impl Ingestor {
    pub fn new(repos: Arc<Repositories>) -> Self {
        Self { repos }
    }

    /// Live upload path. Metadata uploads short-circuit; everything else
    /// needs a registered user (`eml`) and a session id.
    pub async fn process_upload(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<IngestOutcome, IngestError> {
        if torque::is_sensor_metadata(params) {
            info!("ignoring sensor metadata upload");
            return Ok(IngestOutcome::MetadataIgnored);
        }

        let upload = torque::parse_upload(params);

        let email = upload.email.ok_or(IngestError::MissingEmail)?;
        let user = self
            .repos
            .db
            .users()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| IngestError::UnknownUser(email.clone()))?;
        info!(user_id = %user.id, "resolved upload user");

        let session_id = upload.session.ok_or(IngestError::MissingSession)?;
        // Live readings are stamped with server receive time, not device time.
        let now = Utc::now();
        let session = self
            .repos
            .db
            .sessions()
            .get_or_create(&session_id, user.id, now)
            .await?;

        let readings_repo = self.repos.db.readings();
        let mut gps = false;
        if let Some((latitude, longitude)) = upload.gps {
            readings_repo
                .insert_gps(&session.id, latitude, longitude, now)
                .await?;
            gps = true;
        }
        for (kind, value) in &upload.readings {
            readings_repo.insert(&session.id, *kind, *value, now).await?;
        }

        info!(
            session_id = %session.id,
            readings = upload.readings.len(),
            gps,
            "stored torque upload"
        );
        Ok(IngestOutcome::Stored {
            session_id: session.id,
            readings: upload.readings.len(),
            gps,
        })
    }

    /// Trip-log import path. Idempotent on the derived session id: a log that
    /// was already imported is acknowledged without touching storage.
    pub async fn import_csv(
        &self,
        user: &UserRow,
        bytes: &[u8],
    ) -> Result<CsvImportOutcome, IngestError> {
        let records = csv::parse_torque_csv(bytes)?;
        let started_at = records
            .first()
            .ok_or(IngestError::Csv(csv::CsvParseError::Empty))?
            .recorded_at;
        let session_id = csv::derive_session_id(started_at);

        if self.repos.db.sessions().exists(&session_id).await? {
            info!(%session_id, "trip log already imported");
            return Ok(CsvImportOutcome {
                session_id,
                imported: false,
                readings: 0,
                gps_points: 0,
            });
        }

        let session = self
            .repos
            .db
            .sessions()
            .get_or_create(&session_id, user.id, started_at)
            .await?;

        let mut reading_rows = Vec::new();
        let mut gps_rows = Vec::new();
        for record in &records {
            if let Some((latitude, longitude)) = record.gps {
                gps_rows.push(GpsReadingRow {
                    session_id: session.id.clone(),
                    latitude,
                    longitude,
                    recorded_at: record.recorded_at,
                });
            }
            for (kind, value) in &record.values {
                reading_rows.push(ReadingRow {
                    session_id: session.id.clone(),
                    kind: kind.to_string(),
                    value: *value,
                    recorded_at: record.recorded_at,
                });
            }
        }

        let readings_repo = self.repos.db.readings();
        let readings = readings_repo.insert_batch(&reading_rows).await?;
        let gps_points = readings_repo.insert_gps_batch(&gps_rows).await?;

        info!(%session_id, readings, gps_points, "imported trip log");
        Ok(CsvImportOutcome {
            session_id,
            imported: true,
            readings,
            gps_points,
        })
    }
}
