//! Ingestion endpoints: live Torque uploads and trip-log imports.

use axum::{
    extract::{Multipart, Query, State},
    response::IntoResponse,
};
use std::collections::HashMap;
use std::time::Instant;

use crate::{
    api::{error::ApiError, response::ApiResponse},
    auth::AuthBearer,
    ingest::{AppState, IngestOutcome},
};

/// Live upload from the Torque app. The app appends everything as query
/// parameters and retries until it sees the literal acknowledgment `OK!`,
/// so both GET and POST land here and the success body is fixed.
pub async fn upload(
    State(st): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    match st.ingestor.process_upload(&params).await? {
        IngestOutcome::MetadataIgnored => {}
        IngestOutcome::Stored {
            session_id,
            readings,
            gps,
        } => {
            tracing::debug!(%session_id, readings, gps, "upload acknowledged");
        }
    }
    Ok("OK!")
}

/// Trip-log import. Multipart with a single `file` field; the authenticated
/// caller owns the resulting session.
pub async fn import_csv(
    State(st): State<AppState>,
    AuthBearer(claims): AuthBearer,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let user = st
        .repos
        .db
        .users()
        .find_by_id(claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            data = Some(field.bytes().await.map_err(|e| {
                ApiError::BadRequest(format!("failed to read uploaded file: {}", e))
            })?);
        }
    }
    let data = data.ok_or_else(|| ApiError::BadRequest("missing \"file\" field".to_string()))?;

    let start = Instant::now();
    let outcome = st.ingestor.import_csv(&user, &data[..]).await?;

    Ok(ApiResponse::success(outcome).with_duration(start.elapsed().as_millis() as u64))
}
