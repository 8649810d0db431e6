use reqwest::{redirect::Policy, Client};
use shiftdesk::{
    build_router,
    config::{Config, StorageBackend},
    queries::MemoryStore,
    services::jwt::JwtKeys,
    AppState,
};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const PRIVATE_PEM: &str = include_str!("../fixtures/jwt_private.pem");
pub const PUBLIC_PEM: &str = include_str!("../fixtures/jwt_public.pem");

/// HTTP test application wrapper
///
/// Runs the real router over an in-memory store on a random port, so every
/// test gets an isolated server and can run in parallel.
pub struct TestApp {
    /// Server base URL (e.g., "http://127.0.0.1:54321")
    pub address: String,
    /// HTTP client with a cookie store
    pub client: Client,
    /// Same data the server sees
    pub store: MemoryStore,
    /// Keys the server signs with
    pub keys: JwtKeys,
    pub config: Config,
}

impl TestApp {
    /// Create a new HTTP test app with server on random port
    ///
    /// # Example
    /// ```rust
    /// #[tokio::test]
    /// async fn test_health_endpoint() {
    ///     let app = TestApp::new().await;
    ///     let response = app.client.get(app.url("/api/v1/health")).send().await.unwrap();
    ///     assert_eq!(response.status(), 200);
    /// }
    /// ```
    pub async fn new() -> Self {
        let mut config = Config::default();
        config.database.backend = StorageBackend::Memory;
        config.logging.request_logging = false;
        config.jwt.private_key = PRIVATE_PEM.to_string().into();
        config.jwt.public_key = PUBLIC_PEM.to_string();

        let keys = JwtKeys::from_config(&config.jwt).expect("Failed to load fixture keys");
        let store = MemoryStore::new();
        let state = AppState::new(config.clone(), Arc::new(store.clone()), keys.clone());
        let app = build_router(state).expect("Failed to build router");

        // Bind to random port (port 0 tells OS to assign available port)
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give server time to start
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let client = Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address,
            client,
            store,
            keys,
            config,
        }
    }

    /// Get the full URL for an API endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// A client that keeps no cookies, for header-only flows
    pub fn bare_client(&self) -> Client {
        Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }
}
