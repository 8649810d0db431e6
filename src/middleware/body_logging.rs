use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::Error, state::AppState};

/// Largest body that gets buffered for logging
const MAX_LOGGED_BODY_BYTES: usize = 64 * 1024;

/// Logs method, uri and body of each request at debug level when
/// `logging.body_logging` is on. Passwords are not masked, so keep it off in
/// production.
pub async fn log_request_body(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    if !state.config.logging.body_logging {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_LOGGED_BODY_BYTES)
        .await
        .map_err(|_| Error::validation("body", "must NOT be larger than 64KiB"))?;

    tracing::debug!(
        method = %parts.method,
        uri = %parts.uri,
        body = %String::from_utf8_lossy(&bytes),
        "Request body"
    );

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}
