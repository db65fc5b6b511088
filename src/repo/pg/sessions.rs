use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: String,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
}

pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert-if-absent, then read back. Safe against concurrent uploads for
    /// the same session id.
    pub async fn get_or_create(
        &self,
        id: &str,
        user_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<SessionRow> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, started_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(started_at)
        .execute(self.pool)
        .await?;

        let session = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, started_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(session)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<SessionRow>> {
        let session = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, started_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(session)
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        let rec: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (SELECT 1 FROM sessions WHERE id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(rec.0)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SessionRow>> {
        let sessions = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, started_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY started_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(sessions)
    }
}
