use async_trait::async_trait;

use crate::{
    error::Result,
    models::{
        new_object_id,
        sessions::{Session, SessionQuery, SessionUpdate},
    },
    queries::{PgStore, SessionStore},
};

const SESSION_COLUMNS: &str = "id, user_id, valid, user_agent, created_at, updated_at";

// Unset filters bind NULL and match every row.
const SESSION_FILTER: &str = r#"
    ($1::TEXT IS NULL OR id = $1)
    AND ($2::TEXT IS NULL OR user_id = $2)
    AND ($3::BOOLEAN IS NULL OR valid = $3)
"#;

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, user_id: &str, user_agent: &str) -> Result<Session> {
        let sql = format!(
            r#"
            INSERT INTO sessions (id, user_id, user_agent)
            VALUES ($1, $2, $3)
            RETURNING {SESSION_COLUMNS}
            "#
        );

        let session = sqlx::query_as::<_, Session>(&sql)
            .bind(new_object_id())
            .bind(user_id)
            .bind(user_agent)
            .fetch_one(self.pool())
            .await?;

        Ok(session)
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        let session = sqlx::query_as::<_, Session>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(session)
    }

    async fn find_sessions(&self, query: SessionQuery) -> Result<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE {SESSION_FILTER} ORDER BY created_at DESC"
        );
        let sessions = sqlx::query_as::<_, Session>(&sql)
            .bind(query.id)
            .bind(query.user_id)
            .bind(query.valid)
            .fetch_all(self.pool())
            .await?;

        Ok(sessions)
    }

    async fn update_sessions(&self, query: SessionQuery, update: SessionUpdate) -> Result<u64> {
        let sql = format!(
            "UPDATE sessions SET valid = COALESCE($4, valid), updated_at = now() WHERE {SESSION_FILTER}"
        );
        let rows_affected = sqlx::query(&sql)
            .bind(query.id)
            .bind(query.user_id)
            .bind(query.valid)
            .bind(update.valid)
            .execute(self.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn purge_session(&self, id: &str) -> Result<u64> {
        let rows_affected = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
