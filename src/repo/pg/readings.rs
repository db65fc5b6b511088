use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::SensorKind;

/// Rows are inserted in chunks below the Postgres bind limit (65535 / 4
/// binds per row).
const INSERT_CHUNK: usize = 1000;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReadingRow {
    pub session_id: String,
    pub kind: String,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

impl ReadingRow {
    /// The sensor kind as an enum; `None` for rows written by a newer schema.
    pub fn sensor_kind(&self) -> Option<SensorKind> {
        self.kind.parse().ok()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GpsReadingRow {
    pub session_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

pub struct ReadingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReadingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        session_id: &str,
        kind: SensorKind,
        value: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO readings (session_id, kind, value, recorded_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session_id)
        .bind(kind.to_string())
        .bind(value)
        .bind(recorded_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_batch(&self, rows: &[ReadingRow]) -> Result<u64> {
        let mut inserted = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO readings (session_id, kind, value, recorded_at) ");
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(&row.session_id)
                    .push_bind(&row.kind)
                    .push_bind(row.value)
                    .push_bind(row.recorded_at);
            });
            inserted += qb.build().execute(self.pool).await?.rows_affected();
        }
        Ok(inserted)
    }

    pub async fn insert_gps(
        &self,
        session_id: &str,
        latitude: f64,
        longitude: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO gps_readings (session_id, latitude, longitude, recorded_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session_id)
        .bind(latitude)
        .bind(longitude)
        .bind(recorded_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_gps_batch(&self, rows: &[GpsReadingRow]) -> Result<u64> {
        let mut inserted = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO gps_readings (session_id, latitude, longitude, recorded_at) ",
            );
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(&row.session_id)
                    .push_bind(row.latitude)
                    .push_bind(row.longitude)
                    .push_bind(row.recorded_at);
            });
            inserted += qb.build().execute(self.pool).await?.rows_affected();
        }
        Ok(inserted)
    }

    pub async fn series_for_session(
        &self,
        session_id: &str,
        kind: SensorKind,
    ) -> Result<Vec<ReadingRow>> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT session_id, kind, value, recorded_at
            FROM readings
            WHERE session_id = $1 AND kind = $2
            ORDER BY recorded_at
            "#,
        )
        .bind(session_id)
        .bind(kind.to_string())
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn all_for_session(&self, session_id: &str) -> Result<Vec<ReadingRow>> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT session_id, kind, value, recorded_at
            FROM readings
            WHERE session_id = $1
            ORDER BY recorded_at
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn gps_for_session(&self, session_id: &str) -> Result<Vec<GpsReadingRow>> {
        let rows = sqlx::query_as::<_, GpsReadingRow>(
            r#"
            SELECT session_id, latitude, longitude, recorded_at
            FROM gps_readings
            WHERE session_id = $1
            ORDER BY recorded_at
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_for_session(&self, session_id: &str) -> Result<i64> {
        let rec: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM readings WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_one(self.pool)
        .await?;

        Ok(rec.0)
    }

    pub async fn gps_count_for_session(&self, session_id: &str) -> Result<i64> {
        let rec: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM gps_readings WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_one(self.pool)
        .await?;

        Ok(rec.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_row_sensor_kind() {
        let row = ReadingRow {
            session_id: "146651809518".to_string(),
            kind: "engine_rpm".to_string(),
            value: 2450.0,
            recorded_at: Utc::now(),
        };
        assert_eq!(row.sensor_kind(), Some(SensorKind::EngineRpm));

        let unknown = ReadingRow {
            kind: "boost_pressure".to_string(),
            ..row
        };
        assert_eq!(unknown.sensor_kind(), None);
    }
}
