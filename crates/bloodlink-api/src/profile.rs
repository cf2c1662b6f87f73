use axum::{Extension, Json, extract::State, response::IntoResponse};

use bloodlink_types::Coordinate;
use bloodlink_types::api::{ProfileResponse, UpdateProfileRequest};
use bloodlink_types::models::Principal;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, run_db};

/// GET /api/{donor,hospital}/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = run_db(&state, move |db| db.get_profile(&principal)).await?;
    Ok(Json(ProfileResponse { profile }))
}

/// PATCH /api/{donor,hospital}/profile: update email and/or `[lat, lng]`.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    let location = req.location.map(|[lat, lng]| Coordinate::new(lat, lng));

    let profile = run_db(&state, move |db| {
        db.update_profile(&principal, email.as_deref(), location)
    })
    .await?;

    Ok(Json(ProfileResponse { profile }))
}
