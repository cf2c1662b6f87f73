use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use bloodlink_types::api::{BloodRequestList, BloodRequestResponse, CreateBloodRequest};
use bloodlink_types::models::{NewBloodRequest, Principal};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, run_db};

/// GET /api/hospital/requests: the caller's requests, newest first.
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = run_db(&state, move |db| db.list_hospital_requests(&principal)).await?;
    Ok(Json(BloodRequestList { requests }))
}

/// POST /api/hospital/requests
pub async fn create_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<CreateBloodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(blood_type), Some(persons)) = (req.blood_type, req.persons) else {
        return Err(ApiError::bad_request("bloodType and persons are required"));
    };

    let new_request = NewBloodRequest {
        blood_type,
        persons,
        notes: req.notes,
    };
    let request = run_db(&state, move |db| db.create_request(&principal, new_request)).await?;

    Ok((StatusCode::CREATED, Json(BloodRequestResponse { request })))
}
