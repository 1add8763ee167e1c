//! Request body extraction.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::ApiError;

/// JSON body that has been deserialized and validated.
///
/// Every failure is reported through [`ApiError`], so a missing field or a
/// malformed document gets the same `{"detail", "code"}` body as any other
/// rejected request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(rejection)?;
        value.validate()?;
        Ok(Self(value))
    }
}

fn rejection(e: JsonRejection) -> ApiError {
    match e {
        JsonRejection::JsonDataError(e) => ApiError::validation(e.body_text()),
        JsonRejection::MissingJsonContentType(e) => ApiError::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, e.body_text(), "UNSUPPORTED_MEDIA_TYPE"),
        other => ApiError::bad_request(other.body_text()),
    }
}
