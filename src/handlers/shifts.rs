use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use crate::{
    error::Result,
    extract::{ObjectIdPath, ValidJson},
    models::shifts::{CreatedShift, NewShift, ShiftSummaryRequest, UpdateShift},
    services::shifts,
    state::AppState,
};

/// Literal body returned by the summary when no shift matches
pub const NONE_FOUND: &str = "none_found";

/// POST /api/v1/shift
///
/// Books a shift. The client and cleaner snapshots are stored with the shift
/// and the new id is appended to both users' `shifts`.
///
/// # HTTP Status Codes
/// - `201 CREATED`: `{"shiftId": "..."}`
/// - `400 BAD_REQUEST`: validation error
/// - `404 NOT_FOUND`: `no_user_found` when a participant does not exist
pub async fn create_shift(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewShift>,
) -> Result<(StatusCode, Json<CreatedShift>)> {
    let created = shifts::create_shift(state.store(), request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/shift
pub async fn get_shifts(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let shifts = shifts::get_all_shifts(state.store()).await?;
    Ok(Json(serde_json::json!({ "shifts": shifts })))
}

/// GET /api/v1/shift/{id}
pub async fn get_shift(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Json<serde_json::Value>> {
    let shift = shifts::get_single_shift(state.store(), &id).await?;
    Ok(Json(serde_json::json!({ "shift": shift })))
}

/// PATCH /api/v1/shift/{id}
pub async fn update_shift(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
    ValidJson(request): ValidJson<UpdateShift>,
) -> Result<Json<serde_json::Value>> {
    let shift = shifts::update_shift(state.store(), &id, request).await?;
    Ok(Json(serde_json::json!({ "shift": shift })))
}

/// DELETE /api/v1/shift/{id}
pub async fn delete_shift(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<StatusCode> {
    shifts::delete_shift(state.store(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/shift/summary
///
/// # Request Body
/// - `from`, `to`: ISO 8601 bounds, inclusive; each defaults to now
/// - `client`, `cleaner`: optional user ids to narrow the range
///
/// # Returns
/// `{"summary": {"num", "commission", "amount", "outstanding", "range"}}`, or
/// the JSON string `"none_found"` when nothing matches.
pub async fn shift_summary(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ShiftSummaryRequest>,
) -> Result<Json<serde_json::Value>> {
    let body = match shifts::shift_summary(state.store(), request).await? {
        Some(summary) => serde_json::json!({ "summary": summary }),
        None => serde_json::Value::String(NONE_FOUND.to_string()),
    };
    Ok(Json(body))
}
