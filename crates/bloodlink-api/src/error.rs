use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use bloodlink_db::DbError;
use bloodlink_types::Role;
use bloodlink_types::api::ErrorBody;

/// Every failure a handler can return. Rendered as
/// `{ "error": message, "code": code }` with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("this route requires the {0} role")]
    WrongRole(Role),

    #[error("{0}")]
    BadRequest(String),

    /// Well-formed JSON that doesn't fit the expected body.
    #[error("{0}")]
    InvalidBody(String),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Db(e) => match e {
                DbError::Validation(_) | DbError::LocationNotSet => StatusCode::BAD_REQUEST,
                DbError::EmailTaken
                | DbError::AlreadyResponded
                | DbError::AlreadyDonated
                | DbError::CannotWithdrawDonated => StatusCode::CONFLICT,
                DbError::RequestNotFoundOrClosed
                | DbError::ResponseNotFound
                | DbError::DonorNotFound
                | DbError::UserNotFound => StatusCode::NOT_FOUND,
                DbError::Forbidden => StatusCode::FORBIDDEN,
                DbError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
                DbError::Store(_) | DbError::Corrupt(_) | DbError::Poisoned => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::WrongRole(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(e) => e.code(),
            Self::Unauthorized => "unauthorized",
            Self::InvalidCredentials => "invalid_credentials",
            Self::WrongRole(_) => "forbidden",
            Self::BadRequest(_) => "bad_request",
            Self::InvalidBody(_) => "validation_error",
            Self::Internal => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if matches!(&self, Self::Db(e) if e.is_transient()) {
            warn!("Store busy, client may retry: {}", self);
        }

        // Don't leak store internals to clients.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: message,
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
