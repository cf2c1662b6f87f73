use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use bloodlink_types::api::{DonorResponseEnvelope, NearbyRequests};
use bloodlink_types::models::Principal;

use crate::error::ApiError;
use crate::extract::{RequestId, ResponseId};
use crate::state::{AppState, run_db};

/// GET /api/donor/requests/nearby: open requests ranked by distance from the
/// donor's saved location. 400 `location_not_set` until a location is saved.
pub async fn nearby_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = run_db(&state, move |db| db.find_nearby_requests(&principal)).await?;
    Ok(Json(NearbyRequests { requests }))
}

/// POST /api/donor/requests/{id}/respond
///
/// Besides creating the response this may move the request to Partially
/// Filled or Closed.
pub async fn respond(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let response = run_db(&state, move |db| db.respond_to_request(&principal, request_id)).await?;
    Ok((StatusCode::CREATED, Json(DonorResponseEnvelope { response })))
}

/// GET /api/donor/responses
pub async fn list_responses(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let overview = run_db(&state, move |db| db.list_donor_responses(&principal)).await?;
    Ok(Json(overview))
}

/// POST /api/donor/responses/{id}/donated
pub async fn mark_donated(
    State(state): State<AppState>,
    ResponseId(response_id): ResponseId,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let response = run_db(&state, move |db| db.mark_donated(&principal, response_id)).await?;
    Ok(Json(DonorResponseEnvelope { response }))
}

/// DELETE /api/donor/responses/{id}
pub async fn withdraw(
    State(state): State<AppState>,
    ResponseId(response_id): ResponseId,
    Extension(principal): Extension<Principal>,
) -> Result<StatusCode, ApiError> {
    run_db(&state, move |db| db.withdraw_response(&principal, response_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
