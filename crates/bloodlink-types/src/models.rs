use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{Coordinate, Urgency};
use crate::status::{RequestStatus, ResponseStatus, Role};

/// The authenticated caller, as established by the auth middleware.
/// Store operations take this instead of raw credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

/// Public view of a user account. The password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub blood_group: Option<String>,
    pub role: Role,
    pub donation_count: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl UserProfile {
    pub fn location(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub blood_type: String,
    pub persons: i64,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for a new blood request, already validated by the caller.
#[derive(Debug, Clone)]
pub struct NewBloodRequest {
    pub blood_type: String,
    pub persons: i64,
    pub notes: Option<String>,
}

/// A donor's commitment to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorResponse {
    pub id: Uuid,
    pub request_id: Uuid,
    pub donor_id: Uuid,
    pub status: ResponseStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// An open request as seen from a donor's location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatch {
    pub id: Uuid,
    pub hospital_name: String,
    pub contact: String,
    pub blood_type: String,
    pub persons: i64,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub hospital_lat: Option<f64>,
    pub hospital_lng: Option<f64>,
    pub created_at: DateTime<Utc>,
    /// `None` when the hospital has no location on file.
    pub distance_km: Option<f64>,
    pub urgency: Urgency,
}

/// One row of a donor's response history, joined with its request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorResponseDetail {
    pub response_id: Uuid,
    pub request_id: Uuid,
    pub hospital_name: String,
    pub blood_type: String,
    pub persons: i64,
    pub request_status: RequestStatus,
    pub response_status: ResponseStatus,
    pub hospital_lat: Option<f64>,
    pub hospital_lng: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub responded_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummary {
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub donation_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorResponsesOverview {
    pub responses: Vec<DonorResponseDetail>,
    pub donor: DonorSummary,
}
