use crate::{
    cache::{Cache, CacheConfig},
    config::Config,
    error::Result,
    models::users::User,
    queries::Store,
    services::jwt::JwtKeys,
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers
///
/// Everything a handler needs is constructed once at startup and injected
/// here; nothing is read from globals.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// Persistence, either Postgres or in-memory
    pub store: Arc<dyn Store>,
    /// Users looked up at login, keyed by email and by id
    pub login_cache: Cache<User>,
    /// Token signing and verification keys
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    /// Create a new AppState instance
    ///
    /// # Arguments
    /// * `config` - Loaded configuration
    /// * `store` - Store backing the services
    /// * `jwt` - Keys built from `config.jwt`
    ///
    /// Must be called inside a tokio runtime (the login cache spawns its sweeper).
    pub fn new(config: Config, store: Arc<dyn Store>, jwt: JwtKeys) -> Self {
        let login_cache = Cache::new_local(CacheConfig {
            cleanup_interval_seconds: config.cache.cleanup_interval_seconds,
            default_ttl_seconds: Some(config.cache.login_cache_ttl_seconds),
        });

        Self {
            config: Arc::new(config),
            store,
            login_cache,
            jwt: Arc::new(jwt),
        }
    }

    /// Builds the state, deriving the JWT keys from the configuration.
    pub fn from_config(config: Config, store: Arc<dyn Store>) -> Result<Self> {
        let jwt = JwtKeys::from_config(&config.jwt)?;
        Ok(Self::new(config, store, jwt))
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
