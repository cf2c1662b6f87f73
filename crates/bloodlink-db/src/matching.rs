//! Read-side queries for donors: nearby open requests and response history.

use std::cmp::Ordering;

use bloodlink_types::geo::haversine_km;
use bloodlink_types::models::{
    DonorResponseDetail, DonorResponsesOverview, DonorSummary, Principal, RequestMatch,
};
use bloodlink_types::{Coordinate, Role, Urgency};
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::error::{DbError, Result};
use crate::models::{parse_id, parse_request_status, parse_response_status, parse_timestamp};
use crate::queries::ensure_role;

impl Database {
    /// Open requests the donor hasn't responded to yet, nearest first.
    ///
    /// Only requests with status Open are listed; Partially Filled requests
    /// are left out even though they still accept responses.
    pub fn find_nearby_requests(&self, principal: &Principal) -> Result<Vec<RequestMatch>> {
        ensure_role(principal, Role::Donor)?;
        let donor_id = principal.user_id.to_string();

        self.with_conn(|conn| {
            let origin = donor_location(conn, &donor_id)?;

            let mut stmt = conn.prepare(
                "SELECT br.id, u.name, u.email, br.blood_type, br.persons, br.status, br.notes,
                        u.location_lat, u.location_lng, br.created_at
                 FROM blood_requests br
                 JOIN users u ON u.id = br.hospital_id
                 WHERE br.status = 'Open'
                   AND br.id NOT IN (
                       SELECT request_id FROM donor_responses WHERE donor_id = ?1
                   )",
            )?;

            let rows = stmt
                .query_map([&donor_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, Option<f64>>(7)?,
                        row.get::<_, Option<f64>>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut matches = rows
                .into_iter()
                .map(|row| {
                    let (
                        id,
                        hospital_name,
                        contact,
                        blood_type,
                        persons,
                        status,
                        notes,
                        lat,
                        lng,
                        created_at,
                    ) = row;
                    let distance_km = Coordinate::from_parts(lat, lng)
                        .map(|hospital| haversine_km(origin, hospital));
                    Ok(RequestMatch {
                        id: parse_id(&id)?,
                        hospital_name,
                        contact,
                        blood_type,
                        persons,
                        status: parse_request_status(&status)?,
                        notes,
                        hospital_lat: lat,
                        hospital_lng: lng,
                        created_at: parse_timestamp(&created_at)?,
                        distance_km,
                        urgency: Urgency::from_distance(distance_km),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            matches.sort_by(rank);
            Ok(matches)
        })
    }

    /// The donor's responses joined with their requests, newest first, plus
    /// the donor's location and donation count.
    pub fn list_donor_responses(&self, principal: &Principal) -> Result<DonorResponsesOverview> {
        ensure_role(principal, Role::Donor)?;
        let donor_id = principal.user_id.to_string();

        self.with_conn(|conn| {
            let donor = conn
                .query_row(
                    "SELECT location_lat, location_lng, donation_count FROM users WHERE id = ?1",
                    [&donor_id],
                    |row| {
                        Ok(DonorSummary {
                            location_lat: row.get(0)?,
                            location_lng: row.get(1)?,
                            donation_count: row.get(2)?,
                        })
                    },
                )
                .optional()?
                .ok_or(DbError::DonorNotFound)?;

            let mut stmt = conn.prepare(
                "SELECT dr.id, br.id, u.name, br.blood_type, br.persons, br.status, dr.status,
                        u.location_lat, u.location_lng,
                        br.created_at, dr.created_at, dr.last_updated_at
                 FROM donor_responses dr
                 JOIN blood_requests br ON br.id = dr.request_id
                 JOIN users u ON u.id = br.hospital_id
                 WHERE dr.donor_id = ?1
                 ORDER BY dr.created_at DESC",
            )?;

            let rows = stmt
                .query_map([&donor_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<f64>>(7)?,
                        row.get::<_, Option<f64>>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, String>(10)?,
                        row.get::<_, String>(11)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let responses = rows
                .into_iter()
                .map(|r| {
                    Ok(DonorResponseDetail {
                        response_id: parse_id(&r.0)?,
                        request_id: parse_id(&r.1)?,
                        hospital_name: r.2,
                        blood_type: r.3,
                        persons: r.4,
                        request_status: parse_request_status(&r.5)?,
                        response_status: parse_response_status(&r.6)?,
                        hospital_lat: r.7,
                        hospital_lng: r.8,
                        created_at: parse_timestamp(&r.9)?,
                        responded_at: parse_timestamp(&r.10)?,
                        last_updated_at: parse_timestamp(&r.11)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(DonorResponsesOverview { responses, donor })
        })
    }
}

fn donor_location(conn: &Connection, donor_id: &str) -> Result<Coordinate> {
    let (lat, lng): (Option<f64>, Option<f64>) = conn
        .query_row(
            "SELECT location_lat, location_lng FROM users WHERE id = ?1",
            [donor_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(DbError::DonorNotFound)?;

    Coordinate::from_parts(lat, lng).ok_or(DbError::LocationNotSet)
}

/// Nearest first, hospitals without a location last, then newest first.
fn rank(a: &RequestMatch, b: &RequestMatch) -> Ordering {
    let by_distance = match (a.distance_km, b.distance_km) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_distance.then_with(|| b.created_at.cmp(&a.created_at))
}
