use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use bloodlink_types::Role;
use bloodlink_types::api::Claims;
use bloodlink_types::models::Principal;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate the JWT from the Authorization header, then expose
/// the caller to handlers as a `Principal` extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(token_data.claims.principal());
    Ok(next.run(req).await)
}

pub async fn require_donor(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(Role::Donor, req, next).await
}

pub async fn require_hospital(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(Role::Hospital, req, next).await
}

/// Must run after `require_auth`.
async fn require_role(role: Role, req: Request, next: Next) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or(ApiError::Unauthorized)?;

    if principal.role != role {
        return Err(ApiError::WrongRole(role));
    }
    Ok(next.run(req).await)
}
