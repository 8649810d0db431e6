//! Identity deserialization middleware
//!
//! Runs in front of every route. It reads the session access token, attaches
//! the caller's identity to the request when the token checks out and silently
//! swaps an expired access token for a new one when a refresh token is
//! available. It never rejects a request; handlers that need an identity ask
//! for a [`CurrentUser`] and get a 401 when there is none.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::{
    error::Error,
    models::users::UserType,
    services::{
        cookies::{build_access_token_cookie, extract_access_token, extract_refresh_token, REFRESH_TOKEN_HEADER},
        jwt::{SessionClaims, TokenStatus},
        sessions::reissue_access_token,
    },
    state::AppState,
};

/// Response header carrying a reissued access token
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Identity of the caller, taken from a verified session access token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub session_id: Option<String>,
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            user_type: claims.user_type,
            session_id: claims.session,
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| Error::Unauthorized("Unauthorized".to_string()))
    }
}

pub async fn deserialize_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let refresh_header = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    let access_token = extract_access_token(auth_header, &jar);
    let refresh_token = extract_refresh_token(refresh_header, &jar);

    let Some(access_token) = access_token else {
        return next.run(request).await;
    };

    match state.jwt.verify::<SessionClaims>(&access_token) {
        TokenStatus::Valid(claims) => {
            request.extensions_mut().insert(CurrentUser::from(claims));
            next.run(request).await
        }
        TokenStatus::Expired => {
            let Some(refresh_token) = refresh_token else {
                return next.run(request).await;
            };

            let reissued = reissue_access_token(
                state.store(),
                &state.login_cache,
                &state.jwt,
                &refresh_token,
            )
            .await;

            let new_token = match reissued {
                Ok(Some(token)) => token,
                Ok(None) => return next.run(request).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Access token reissue failed");
                    return next.run(request).await;
                }
            };

            if let Some(claims) = state.jwt.verify::<SessionClaims>(&new_token).valid() {
                request.extensions_mut().insert(CurrentUser::from(claims));
            }

            let mut response = next.run(request).await;
            attach_reissued_token(&state, &mut response, &new_token);
            response
        }
        TokenStatus::Invalid => next.run(request).await,
    }
}

fn attach_reissued_token(state: &AppState, response: &mut Response, token: &str) {
    let cookie = build_access_token_cookie(token, state.jwt.access_token_ttl(), &state.config.cookies);

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(token) {
        headers.insert(ACCESS_TOKEN_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(header::SET_COOKIE, value);
    }
}
