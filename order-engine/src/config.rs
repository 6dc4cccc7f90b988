//! Engine configuration

use shared::{EngineError, EngineResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Connection pool size
    pub max_connections: u32,
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> EngineResult<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| EngineError::configuration("DATABASE_URL must be set"))?,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        })
    }

    /// Open the connection pool and apply pending migrations.
    pub async fn connect(&self) -> EngineResult<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| EngineError::storage(format!("migration failed: {e}")))?;

        tracing::info!(max_connections = self.max_connections, "database pool ready");
        Ok(pool)
    }
}
