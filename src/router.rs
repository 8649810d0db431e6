use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::ServerConfig,
    error::{Error, Result},
    handlers::{auth, health, sessions, shifts, users},
    middleware::{deserialize_user, log_request_body, require_bearer, ACCESS_TOKEN_HEADER},
    services::cookies::REFRESH_TOKEN_HEADER,
    state::AppState,
};

/// Builds the full application router.
///
/// Every `/api/v1` route runs behind the identity middleware; `/goodbye` is
/// additionally gated by the login bearer token.
pub fn build_router(state: AppState) -> Result<Router> {
    let cors = build_cors_layer(&state.config.server)?;

    let greeting_routes = Router::new()
        .route("/goodbye", get(auth::goodbye))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let api_routes = Router::new()
        // Users
        .route("/user", post(users::create_user).get(users::get_users))
        .route(
            "/user/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/login", post(auth::login))
        .route("/hello", get(auth::hello))
        .merge(greeting_routes)
        // Shifts
        .route("/shift", post(shifts::create_shift).get(shifts::get_shifts))
        .route("/shift/summary", post(shifts::shift_summary))
        .route(
            "/shift/{id}",
            get(shifts::get_shift)
                .patch(shifts::update_shift)
                .delete(shifts::delete_shift),
        )
        // Sessions
        .route(
            "/session",
            post(sessions::create_session)
                .get(sessions::get_sessions)
                .delete(sessions::delete_session),
        )
        .route("/health", get(health::health_check))
        .layer(middleware::from_fn_with_state(state.clone(), deserialize_user));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/api-docs/openapi.yml", get(health::openapi_spec))
        .layer(middleware::from_fn_with_state(state.clone(), log_request_body));

    if state.config.logging.request_logging {
        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );
    }

    Ok(router.layer(cors).with_state(state))
}

/// CORS for the configured front-end origin, with credentials so cookies flow.
fn build_cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(&config.cors_origin)
        .map_err(|e| Error::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e)))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REFRESH_TOKEN_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static(ACCESS_TOKEN_HEADER),
            auth::EXPIRES_AFTER_HEADER,
        ]))
}
