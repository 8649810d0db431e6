use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};

use crate::{
    error::{Error, Result},
    extract::ValidJson,
    middleware::CurrentUser,
    models::sessions::{CreateSession, SessionQuery, SessionTokens, SessionUpdate},
    services::{
        cookies::{
            build_access_token_cookie, build_clear_cookie, build_refresh_token_cookie,
            ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
        },
        sessions, users,
    },
    state::AppState,
};

/// Session tokens as JSON plus one Set-Cookie header per token
pub struct SessionResponse {
    status: StatusCode,
    tokens: SessionTokens,
    cookies: Vec<String>,
}

impl IntoResponse for SessionResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.tokens)).into_response();
        for cookie in self.cookies {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

/// POST /api/v1/session
///
/// Logs in with email and password and opens a session.
///
/// # Returns
/// `201 CREATED` with `{"accessToken", "refreshToken"}`. Both tokens are also
/// set as HttpOnly cookies (`accessToken`, `refreshToken`).
///
/// # HTTP Status Codes
/// - `401 UNAUTHORIZED`: wrong email or password
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(request): ValidJson<CreateSession>,
) -> Result<SessionResponse> {
    let user = users::validate_password(state.store(), &request.email, &request.password)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid email or password".to_string()))?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let session = sessions::create_session(state.store(), &user.id, user_agent).await?;
    let tokens = sessions::issue_tokens(&state.jwt, &user, &session)?;

    let settings = &state.config.cookies;
    let mut cookies = Vec::with_capacity(2);
    if let Some(access) = &tokens.access_token {
        cookies.push(build_access_token_cookie(access, state.jwt.access_token_ttl(), settings));
    }
    if let Some(refresh) = &tokens.refresh_token {
        cookies.push(build_refresh_token_cookie(refresh, state.jwt.refresh_token_ttl(), settings));
    }

    Ok(SessionResponse {
        status: StatusCode::CREATED,
        tokens,
        cookies,
    })
}

/// GET /api/v1/session
///
/// Valid sessions of the caller.
pub async fn get_sessions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let sessions = sessions::find_sessions(state.store(), SessionQuery::active_for_user(&user.id)).await?;
    Ok(Json(serde_json::json!({ "sessions": sessions })))
}

/// DELETE /api/v1/session
///
/// Logout: invalidates the caller's current session and clears the cookies.
pub async fn delete_session(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<SessionResponse> {
    let session_id = user
        .session_id
        .ok_or_else(|| Error::Unauthorized("Not authorized".to_string()))?;

    sessions::update_session(state.store(), SessionQuery::by_id(&session_id), SessionUpdate::invalidate())
        .await?;
    tracing::info!(session_id = %session_id, user_id = %user.id, "Session invalidated");

    let settings = &state.config.cookies;
    Ok(SessionResponse {
        status: StatusCode::OK,
        tokens: SessionTokens {
            access_token: None,
            refresh_token: None,
        },
        cookies: vec![
            build_clear_cookie(ACCESS_TOKEN_COOKIE, settings),
            build_clear_cookie(REFRESH_TOKEN_COOKIE, settings),
        ],
    })
}
