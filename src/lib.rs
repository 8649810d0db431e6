pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod queries;
pub mod router;
pub mod services;
pub mod state;
pub mod validation;

use std::sync::Arc;

pub use config::Config;
pub use error::{Error, Result};
pub use router::build_router;
pub use state::AppState;

use config::StorageBackend;
use queries::{MemoryStore, PgStore, Store};

/// Load configuration from environment variables
pub fn load_config() -> Result<Config> {
    Ok(Config::load()?)
}

/// Opens the store selected by `database.backend`.
pub async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.database.backend {
        StorageBackend::Postgres => {
            let pool = database::connect(&config.database).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
