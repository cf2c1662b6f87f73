//! Row types that map directly to SQLite rows, plus the conversions into the
//! shared models. Kept separate from bloodlink-types so the schema can move
//! independently of the API.

use bloodlink_types::models::{BloodRequest, DonorResponse, UserProfile};
use bloodlink_types::{Coordinate, RequestStatus, ResponseStatus, Role};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::error::{DbError, Result};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub blood_group: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub donation_count: i64,
}

pub(crate) const USER_COLUMNS: &str =
    "id, email, password_hash, role, name, blood_group, location_lat, location_lng, donation_count";

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            role: row.get(3)?,
            name: row.get(4)?,
            blood_group: row.get(5)?,
            location_lat: row.get(6)?,
            location_lng: row.get(7)?,
            donation_count: row.get(8)?,
        })
    }

    pub fn role(&self) -> Result<Role> {
        self.role.parse().map_err(corrupt)
    }

    pub fn to_profile(&self) -> Result<UserProfile> {
        Ok(UserProfile {
            id: parse_id(&self.id)?,
            name: self.name.clone(),
            email: self.email.clone(),
            blood_group: self.blood_group.clone(),
            role: self.role()?,
            donation_count: self.donation_count,
            latitude: self.location_lat,
            longitude: self.location_lng,
        })
    }
}

pub struct BloodRequestRow {
    pub id: String,
    pub hospital_id: String,
    pub blood_type: String,
    pub persons: i64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
}

pub(crate) const REQUEST_COLUMNS: &str =
    "id, hospital_id, blood_type, persons, status, notes, created_at";

impl BloodRequestRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            hospital_id: row.get(1)?,
            blood_type: row.get(2)?,
            persons: row.get(3)?,
            status: row.get(4)?,
            notes: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    pub fn into_request(self) -> Result<BloodRequest> {
        Ok(BloodRequest {
            id: parse_id(&self.id)?,
            hospital_id: parse_id(&self.hospital_id)?,
            blood_type: self.blood_type,
            persons: self.persons,
            status: parse_request_status(&self.status)?,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct DonorResponseRow {
    pub id: String,
    pub request_id: String,
    pub donor_id: String,
    pub status: String,
    pub created_at: String,
    pub last_updated_at: String,
}

pub(crate) const RESPONSE_COLUMNS: &str =
    "id, request_id, donor_id, status, created_at, last_updated_at";

impl DonorResponseRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            request_id: row.get(1)?,
            donor_id: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            last_updated_at: row.get(5)?,
        })
    }

    pub fn status(&self) -> Result<ResponseStatus> {
        parse_response_status(&self.status)
    }

    pub fn into_response(self) -> Result<DonorResponse> {
        Ok(DonorResponse {
            status: self.status()?,
            id: parse_id(&self.id)?,
            request_id: parse_id(&self.request_id)?,
            donor_id: parse_id(&self.donor_id)?,
            created_at: parse_timestamp(&self.created_at)?,
            last_updated_at: parse_timestamp(&self.last_updated_at)?,
        })
    }
}

/// Timestamp format used for every stored time. Fixed-width RFC 3339 in UTC,
/// so string order is chronological order.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("timestamp '{}': {}", s, e)))
}

pub(crate) fn parse_id(s: &str) -> Result<Uuid> {
    s.parse().map_err(|e| DbError::Corrupt(format!("id '{}': {}", s, e)))
}

pub(crate) fn parse_request_status(s: &str) -> Result<RequestStatus> {
    s.parse().map_err(corrupt)
}

pub(crate) fn parse_response_status(s: &str) -> Result<ResponseStatus> {
    s.parse().map_err(corrupt)
}

fn corrupt(e: impl std::fmt::Display) -> DbError {
    DbError::Corrupt(e.to_string())
}

/// Input for a new account. The password is already hashed.
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub blood_group: Option<String>,
    pub location: Option<Coordinate>,
}
