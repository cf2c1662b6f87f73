use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::error;
use uuid::Uuid;

use bloodlink_db::DbError;

use crate::error::ApiError;

/// `Json<T>` whose rejections render as `ApiError`.
///
/// A body that parses but has the wrong shape (a string where a number
/// belongs, an unknown field) is a `validation_error`. Anything that isn't
/// JSON at all is a `bad_request`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(e) => ApiError::InvalidBody(e.body_text()),
        other => ApiError::bad_request(other.body_text()),
    }
}

/// The `{id}` segment of a `/requests/{id}/...` route. An id that isn't a
/// UUID can't name a request, so it is reported as one that doesn't exist.
pub struct RequestId(pub Uuid);

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_uuid(parts, state)
            .await?
            .map(Self)
            .ok_or(ApiError::Db(DbError::RequestNotFoundOrClosed))
    }
}

/// The `{id}` segment of a `/responses/{id}` route.
pub struct ResponseId(pub Uuid);

impl<S> FromRequestParts<S> for ResponseId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_uuid(parts, state)
            .await?
            .map(Self)
            .ok_or(ApiError::Db(DbError::ResponseNotFound))
    }
}

async fn path_uuid<S>(parts: &mut Parts, state: &S) -> Result<Option<Uuid>, ApiError>
where
    S: Send + Sync,
{
    // Only fails if the route was registered without an `{id}` segment.
    let Path(raw) = Path::<String>::from_request_parts(parts, state)
        .await
        .map_err(|e| {
            error!("Path extraction failed: {}", e);
            ApiError::Internal
        })?;
    Ok(Uuid::parse_str(&raw).ok())
}
