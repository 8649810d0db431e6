use axum::{
    extract::{Extension, Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use chrono::SecondsFormat;
use serde::Deserialize;

use crate::{
    error::Result,
    extract::ValidJson,
    models::users::{AuthResult, LoginUser},
    services::users,
    state::AppState,
};

/// Response header with the login token's expiry (RFC 3339)
pub const EXPIRES_AFTER_HEADER: HeaderName = HeaderName::from_static("x-expires-after");

/// Body of `POST /login` plus the `X-Expires-After` header
pub struct LoginResponse {
    user_id: String,
    token: String,
    expires_after: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        let mut response = Json(serde_json::json!({
            "userId": self.user_id,
            "token": self.token,
        }))
        .into_response();

        if let Ok(value) = HeaderValue::from_str(&self.expires_after) {
            response.headers_mut().insert(EXPIRES_AFTER_HEADER, value);
        }
        response
    }
}

/// POST /api/v1/login
///
/// Authenticates a user with email and password.
///
/// # Returns
/// `{"userId", "token"}` with the token's expiry in `X-Expires-After`. The
/// token is sent back as `Authorization: Bearer <token>` to `/goodbye`.
///
/// # HTTP Status Codes
/// - `200 OK`: authenticated
/// - `400 BAD_REQUEST`: malformed body
/// - `404 NOT_FOUND`: `invalid_credentials` for unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginUser>,
) -> Result<LoginResponse> {
    let result = users::login(state.store(), &state.login_cache, &state.jwt, request).await?;

    Ok(LoginResponse {
        user_id: result.user_id,
        token: result.token,
        expires_after: result.expire_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[derive(Debug, Deserialize)]
pub struct HelloQuery {
    pub name: Option<String>,
}

/// GET /api/v1/hello?name=
pub async fn hello(Query(query): Query<HelloQuery>) -> Json<serde_json::Value> {
    let name = query
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "stranger".to_string());

    Json(serde_json::json!({ "message": format!("Hello, {}!", name) }))
}

/// GET /api/v1/goodbye
///
/// Requires the bearer token from `/login`; see `middleware::require_bearer`.
pub async fn goodbye(Extension(auth): Extension<AuthResult>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": format!("Goodbye, {}!", auth.user_id) }))
}
