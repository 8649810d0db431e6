use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::Result, services::users, state::AppState};

/// Gate for routes that take the token issued by `POST /login`.
///
/// Accepts the token with or without a `Bearer ` prefix. On success the
/// `AuthResult` is added to request extensions; otherwise the request is
/// rejected with 401 "Authentication Failed".
///
/// ```ignore
/// Router::new()
///     .route("/goodbye", get(goodbye))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
/// ```
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let auth = users::auth(&state.jwt, token)?;
    tracing::debug!(user_id = %auth.user_id, "Bearer token accepted");

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}
