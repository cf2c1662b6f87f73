use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{error, warn};
use uuid::Uuid;

use bloodlink_db::models::NewUser;
use bloodlink_db::queries::validate_email;
use bloodlink_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use bloodlink_types::{Coordinate, Role};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::{AppState, run_db};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    let email = req.email.trim().to_string();
    validate_email(&email)?;
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("password must be at least 8 characters"));
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let blood_group = req
        .blood_group
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty());

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })?
        .to_string();

    let new_user = NewUser {
        email,
        password_hash,
        role: req.role,
        name,
        blood_group,
        location: req.location.map(|[lat, lng]| Coordinate::new(lat, lng)),
    };
    let user = run_db(&state, move |db| db.create_user(&new_user)).await?;

    let token = create_token(&state, user.id, user.role)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user, token })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_string();
    let role = req.role;
    let user = run_db(&state, move |db| db.get_user_for_login(&email, role))
        .await?
        .ok_or_else(|| {
            warn!("Login rejected: no {} account for {}", req.role, req.email.trim());
            ApiError::InvalidCredentials
        })?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
        error!("Stored password hash for {} is unreadable: {}", user.id, e);
        ApiError::Internal
    })?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            warn!("Login rejected: bad password for {}", user.id);
            ApiError::InvalidCredentials
        })?;

    let profile = user.to_profile()?;
    let token = create_token(&state, profile.id, profile.role)?;

    Ok(Json(LoginResponse {
        token,
        role: profile.role,
        user: profile,
    }))
}

fn create_token(state: &AppState, user_id: Uuid, role: Role) -> Result<String, ApiError> {
    let expires_at = chrono::TimeDelta::try_days(state.token_ttl_days)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| {
            error!("Token TTL of {} days is out of range", state.token_ttl_days);
            ApiError::Internal
        })?;
    let claims = Claims {
        sub: user_id,
        role,
        exp: expires_at.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Token encoding failed: {}", e);
        ApiError::Internal
    })
}
