//! Store-level error taxonomy.
//!
//! These errors are transport agnostic; the HTTP layer maps them to status
//! codes. Ownership mismatches are reported as the matching not-found
//! variant so callers can't probe for other users' records.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Validation(String),

    #[error("email already in use")]
    EmailTaken,

    #[error("request not found or already closed")]
    RequestNotFoundOrClosed,

    #[error("you have already responded to this request")]
    AlreadyResponded,

    #[error("response not found")]
    ResponseNotFound,

    #[error("response already marked as donated")]
    AlreadyDonated,

    #[error("cannot withdraw a donated response")]
    CannotWithdrawDonated,

    #[error("donor not found")]
    DonorNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("donor does not have a location set")]
    LocationNotSet,

    #[error("operation not permitted for this role")]
    Forbidden,

    /// Lock timeout or busy store; safe for the caller to retry.
    #[error("store temporarily unavailable")]
    Transient(#[source] rusqlite::Error),

    #[error("store error: {0}")]
    Store(#[source] rusqlite::Error),

    #[error("corrupt stored value: {0}")]
    Corrupt(String),

    #[error("connection lock poisoned")]
    Poisoned,
}

impl DbError {
    /// Stable machine-readable code for clients to branch on.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::EmailTaken => "email_taken",
            Self::RequestNotFoundOrClosed => "request_not_found_or_closed",
            Self::AlreadyResponded => "already_responded",
            Self::ResponseNotFound => "response_not_found",
            Self::AlreadyDonated => "already_donated",
            Self::CannotWithdrawDonated => "cannot_withdraw_donated",
            Self::DonorNotFound => "donor_not_found",
            Self::UserNotFound => "user_not_found",
            Self::LocationNotSet => "location_not_set",
            Self::Forbidden => "forbidden",
            Self::Transient(_) => "transient",
            Self::Store(_) | Self::Corrupt(_) | Self::Poisoned => "internal_error",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::Transient(e),
            _ => Self::Store(e),
        }
    }
}

/// True when `e` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => {
            err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
