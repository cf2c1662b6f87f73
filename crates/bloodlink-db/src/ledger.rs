//! Donor response ledger.
//!
//! Every mutation here runs in a `BEGIN IMMEDIATE` transaction on the writer
//! connection. The write lock is taken before the first read, so the
//! check-capacity / insert / recount / update sequence for a request is atomic
//! relative to every other responder. Returning early with an error drops the
//! transaction, which rolls it back.

use bloodlink_types::models::{DonorResponse, Principal};
use bloodlink_types::{RequestStatus, ResponseStatus, Role};
use rusqlite::{OptionalExtension, Transaction, TransactionBehavior, params};
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::error::{DbError, Result, is_unique_violation};
use crate::models::{DonorResponseRow, RESPONSE_COLUMNS, now_timestamp, parse_request_status};
use crate::queries::ensure_role;

impl Database {
    /// Record the donor's commitment to a request.
    ///
    /// As a side effect the request's status is advanced: Open becomes
    /// Partially Filled, and once the number of responses reaches `persons`
    /// the request is Closed and stops accepting responses.
    pub fn respond_to_request(
        &self,
        principal: &Principal,
        request_id: Uuid,
    ) -> Result<DonorResponse> {
        ensure_role(principal, Role::Donor)?;
        let donor_id = principal.user_id.to_string();
        let request_id = request_id.to_string();

        let (response, status) = self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let request: Option<(i64, String)> = tx
                .query_row(
                    "SELECT persons, status FROM blood_requests WHERE id = ?1",
                    [&request_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (persons, current) = match request {
                Some((persons, status)) => (persons, parse_request_status(&status)?),
                None => return Err(DbError::RequestNotFoundOrClosed),
            };
            if !current.accepts_responses() {
                return Err(DbError::RequestNotFoundOrClosed);
            }

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM donor_responses WHERE request_id = ?1 AND donor_id = ?2",
                    [&request_id, &donor_id],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(DbError::AlreadyResponded);
            }

            let now = now_timestamp();
            let row = DonorResponseRow {
                id: Uuid::new_v4().to_string(),
                request_id: request_id.clone(),
                donor_id: donor_id.clone(),
                status: ResponseStatus::Pending.as_str().to_string(),
                created_at: now.clone(),
                last_updated_at: now,
            };
            tx.execute(
                "INSERT INTO donor_responses
                    (id, request_id, donor_id, status, created_at, last_updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    row.request_id,
                    row.donor_id,
                    row.status,
                    row.created_at,
                    row.last_updated_at,
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::AlreadyResponded
                } else {
                    DbError::from(e)
                }
            })?;

            let next = apply_fulfillment(&tx, &request_id, current, persons)?;
            tx.commit()?;
            Ok((row.into_response()?, next))
        })?;

        info!(
            "Donor {} responded to request {} (now {})",
            donor_id, request_id, status
        );
        Ok(response)
    }

    /// Mark a pending response as donated and credit the donor.
    ///
    /// Fails with `AlreadyDonated` on a second call, so the donation count is
    /// only ever incremented once per response.
    pub fn mark_donated(&self, principal: &Principal, response_id: Uuid) -> Result<DonorResponse> {
        ensure_role(principal, Role::Donor)?;
        let donor_id = principal.user_id.to_string();

        let response = self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let row = owned_response(&tx, response_id, &donor_id)?;
            if row.status()? == ResponseStatus::Donated {
                return Err(DbError::AlreadyDonated);
            }

            let now = now_timestamp();
            tx.execute(
                "UPDATE donor_responses SET status = ?1, last_updated_at = ?2 WHERE id = ?3",
                params![ResponseStatus::Donated.as_str(), now, row.id],
            )?;
            let credited = tx.execute(
                "UPDATE users SET donation_count = donation_count + 1 WHERE id = ?1",
                [&donor_id],
            )?;
            if credited != 1 {
                return Err(DbError::DonorNotFound);
            }

            tx.commit()?;
            Ok(DonorResponseRow {
                status: ResponseStatus::Donated.as_str().to_string(),
                last_updated_at: now,
                ..row
            })
        })?;

        info!("Donor {} donated for response {}", donor_id, response_id);
        response.into_response()
    }

    /// Delete a pending response. Donated responses are permanent.
    ///
    /// The request's status is left as it is: a request that was closed by
    /// this response stays closed.
    pub fn withdraw_response(&self, principal: &Principal, response_id: Uuid) -> Result<()> {
        ensure_role(principal, Role::Donor)?;
        let donor_id = principal.user_id.to_string();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let row = owned_response(&tx, response_id, &donor_id)?;
            if row.status()? == ResponseStatus::Donated {
                return Err(DbError::CannotWithdrawDonated);
            }

            tx.execute("DELETE FROM donor_responses WHERE id = ?1", [&row.id])?;
            tx.commit()?;
            Ok(())
        })?;

        info!("Donor {} withdrew response {}", donor_id, response_id);
        Ok(())
    }
}

/// Load a response only if it belongs to `donor_id`. Someone else's response
/// is reported exactly like a missing one.
fn owned_response(
    tx: &Transaction<'_>,
    response_id: Uuid,
    donor_id: &str,
) -> Result<DonorResponseRow> {
    let sql =
        format!("SELECT {RESPONSE_COLUMNS} FROM donor_responses WHERE id = ?1 AND donor_id = ?2");
    tx.query_row(
        &sql,
        params![response_id.to_string(), donor_id],
        DonorResponseRow::from_row,
    )
    .optional()?
        .ok_or(DbError::ResponseNotFound)
}

/// Recount responses for the request and store the resulting status.
fn apply_fulfillment(
    tx: &Transaction<'_>,
    request_id: &str,
    current: RequestStatus,
    persons: i64,
) -> Result<RequestStatus> {
    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM donor_responses WHERE request_id = ?1",
        [request_id],
        |row| row.get(0),
    )?;

    let next = current.advance(count, persons);
    if next != current {
        tx.execute(
            "UPDATE blood_requests SET status = ?1 WHERE id = ?2",
            params![next.as_str(), request_id],
        )?;
    }
    Ok(next)
}
