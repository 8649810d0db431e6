use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use crate::{config::DatabaseConfig, error::Result};

/// Database connection pool type
pub type DbPool = sqlx::PgPool;

/// Opens the pool and, when configured, applies `migrations/`.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.connection_string().expose_secret())
        .await?;
    tracing::info!(host = %config.host, database = %config.database, "Database connection pool created");

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| crate::error::Error::Internal(format!("Failed to run migrations: {}", e)))?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}
