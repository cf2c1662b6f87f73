use bloodlink_types::models::{BloodRequest, NewBloodRequest, Principal, UserProfile};
use bloodlink_types::{Coordinate, RequestStatus, Role};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::error::{DbError, Result, is_unique_violation};
use crate::models::{
    BloodRequestRow, NewUser, REQUEST_COLUMNS, USER_COLUMNS, UserRow, now_timestamp,
};

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser) -> Result<UserProfile> {
        if let Some(loc) = user.location {
            validate_location(loc)?;
        }

        let id = Uuid::new_v4();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users
                    (id, email, password_hash, role, name, blood_group,
                     location_lat, location_lng, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id.to_string(),
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    user.name,
                    user.blood_group,
                    user.location.map(|l| l.lat),
                    user.location.map(|l| l.lng),
                    now_timestamp(),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::EmailTaken
                } else {
                    DbError::from(e)
                }
            })?;
            Ok(())
        })?;

        info!("Registered {} {}", user.role, id);
        Ok(UserProfile {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            blood_group: user.blood_group.clone(),
            role: user.role,
            donation_count: 0,
            latitude: user.location.map(|l| l.lat),
            longitude: user.location.map(|l| l.lng),
        })
    }

    /// Login lookup: the role is part of the key, so a donor account can't
    /// sign in through the hospital form and vice versa.
    pub fn get_user_for_login(&self, email: &str, role: Role) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND role = ?2");
            let row = conn
                .query_row(&sql, params![email, role.as_str()], UserRow::from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_profile(&self, principal: &Principal) -> Result<UserProfile> {
        self.with_conn(|conn| {
            query_user_by_id(conn, principal.user_id)?
                .ok_or(DbError::UserNotFound)?
                .to_profile()
        })
    }

    /// Update email and/or location. At least one must be given.
    pub fn update_profile(
        &self,
        principal: &Principal,
        email: Option<&str>,
        location: Option<Coordinate>,
    ) -> Result<UserProfile> {
        if email.is_none() && location.is_none() {
            return Err(DbError::validation("nothing to update"));
        }
        if let Some(email) = email {
            validate_email(email)?;
        }
        if let Some(loc) = location {
            validate_location(loc)?;
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(email) = email {
                tx.execute(
                    "UPDATE users SET email = ?1 WHERE id = ?2",
                    params![email, principal.user_id.to_string()],
                )
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        DbError::EmailTaken
                    } else {
                        DbError::from(e)
                    }
                })?;
            }
            if let Some(loc) = location {
                tx.execute(
                    "UPDATE users SET location_lat = ?1, location_lng = ?2 WHERE id = ?3",
                    params![loc.lat, loc.lng, principal.user_id.to_string()],
                )?;
            }

            let profile = query_user_by_id(&tx, principal.user_id)?
                .ok_or(DbError::UserNotFound)?
                .to_profile()?;
            tx.commit()?;
            Ok(profile)
        })
    }

    // -- Blood requests --

    pub fn create_request(
        &self,
        principal: &Principal,
        req: NewBloodRequest,
    ) -> Result<BloodRequest> {
        ensure_role(principal, Role::Hospital)?;

        let blood_type = req.blood_type.trim();
        if blood_type.is_empty() {
            return Err(DbError::validation("blood type is required"));
        }
        if req.persons < 1 {
            return Err(DbError::validation("persons must be at least 1"));
        }
        let notes = req
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let id = Uuid::new_v4();
        let created_at = now_timestamp();
        let row = BloodRequestRow {
            id: id.to_string(),
            hospital_id: principal.user_id.to_string(),
            blood_type: blood_type.to_string(),
            persons: req.persons,
            status: RequestStatus::Open.as_str().to_string(),
            notes,
            created_at,
        };

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO blood_requests
                    (id, hospital_id, blood_type, persons, status, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id,
                    row.hospital_id,
                    row.blood_type,
                    row.persons,
                    row.status,
                    row.notes,
                    row.created_at,
                ],
            )?;
            Ok(())
        })?;

        info!(
            "Hospital {} opened request {} for {} x {}",
            principal.user_id, id, row.persons, row.blood_type
        );
        row.into_request()
    }

    /// The hospital's own requests, newest first.
    pub fn list_hospital_requests(&self, principal: &Principal) -> Result<Vec<BloodRequest>> {
        ensure_role(principal, Role::Hospital)?;

        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {REQUEST_COLUMNS} FROM blood_requests
                 WHERE hospital_id = ?1
                 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([principal.user_id.to_string()], BloodRequestRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(BloodRequestRow::into_request).collect()
    }

    pub fn get_request(&self, id: Uuid) -> Result<Option<BloodRequest>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {REQUEST_COLUMNS} FROM blood_requests WHERE id = ?1");
            conn.query_row(&sql, [id.to_string()], BloodRequestRow::from_row)
                .optional()?
                .map(BloodRequestRow::into_request)
                .transpose()
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: Uuid) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let row = conn
        .query_row(&sql, [id.to_string()], UserRow::from_row)
        .optional()?;
    Ok(row)
}

/// Capability check repeated at the store boundary so a mis-wired route can't
/// let one role act as the other.
pub(crate) fn ensure_role(principal: &Principal, role: Role) -> Result<()> {
    if principal.role == role {
        Ok(())
    } else {
        Err(DbError::Forbidden)
    }
}

pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(DbError::validation("a valid email is required"));
    }
    Ok(())
}

pub fn validate_location(loc: Coordinate) -> Result<()> {
    if !loc.is_valid() {
        return Err(DbError::validation(
            "location must be numeric [lat, lng] within valid ranges",
        ));
    }
    Ok(())
}
