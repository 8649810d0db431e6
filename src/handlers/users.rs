use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use crate::{
    error::Result,
    extract::{ObjectIdPath, ValidJson},
    models::users::{CreateUser, CreatedUser, UpdateUser},
    services::users,
    state::AppState,
};

/// POST /api/v1/user
///
/// Creates a user account.
///
/// # Request Body
/// - `email`: must be unique, compared case-insensitively
/// - `password`: at least 8 characters, stored hashed
/// - `name`: display name
/// - `phone`, `address`, `deposit`: optional
/// - `type`: `client` (default), `cleaner` or `admin`
///
/// # HTTP Status Codes
/// - `201 CREATED`: `{"userId": "..."}`
/// - `400 BAD_REQUEST`: validation error
/// - `409 CONFLICT`: email already exists
pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateUser>,
) -> Result<(StatusCode, Json<CreatedUser>)> {
    let created = users::create_user(state.store(), request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/user
///
/// Lists active users, admins excluded.
pub async fn get_users(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let users = users::get_all_users(state.store()).await?;
    Ok(Json(serde_json::json!({ "users": users })))
}

/// GET /api/v1/user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Json<serde_json::Value>> {
    let user = users::get_single_user(state.store(), &id).await?;
    Ok(Json(serde_json::json!({ "user": user })))
}

/// PATCH /api/v1/user/{id}
///
/// Partial update; returns the updated user. A new password is re-hashed and
/// any cached login lookup for the user is dropped.
pub async fn update_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
    ValidJson(request): ValidJson<UpdateUser>,
) -> Result<Json<serde_json::Value>> {
    let user = users::update_user(state.store(), &state.login_cache, &id, request).await?;
    Ok(Json(serde_json::json!({ "user": user })))
}

/// DELETE /api/v1/user/{id}
///
/// Deactivates the user. Repeating the call is harmless.
pub async fn delete_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<StatusCode> {
    users::delete_user(state.store(), &state.login_cache, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
