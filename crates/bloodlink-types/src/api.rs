use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BloodRequest, DonorResponse, Principal, RequestMatch, UserProfile};
use crate::status::Role;

// -- JWT Claims --

/// Claims carried in every bearer token. Issued at login/registration and
/// checked by the REST middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.sub,
            role: self.role,
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub name: String,
    #[serde(default)]
    pub blood_group: Option<String>,
    /// `[lat, lng]`
    #[serde(default)]
    pub location: Option<[f64; 2]>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub user: UserProfile,
}

// -- Profile --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    /// `[lat, lng]`
    #[serde(default)]
    pub location: Option<[f64; 2]>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: UserProfile,
}

// -- Hospital requests --

/// `persons` is optional here so a missing value is reported as a validation
/// error rather than a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBloodRequest {
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub persons: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BloodRequestResponse {
    pub request: BloodRequest,
}

#[derive(Debug, Serialize)]
pub struct BloodRequestList {
    pub requests: Vec<BloodRequest>,
}

// -- Donor --

#[derive(Debug, Serialize)]
pub struct NearbyRequests {
    pub requests: Vec<RequestMatch>,
}

/// Wraps a single response record. Note that creating a response may also
/// advance the request's status (Open -> Partially Filled -> Closed).
#[derive(Debug, Serialize)]
pub struct DonorResponseEnvelope {
    pub response: DonorResponse,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}
