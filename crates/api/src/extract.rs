//! Request body extractor with declarative validation.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use assessment_core::error::CoreError;

use crate::error::AppError;

/// JSON body that has passed [`Validate`].
///
/// Malformed JSON is rejected with 400 `BAD_REQUEST`; a body that parses
/// but fails validation is rejected with 400 `VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::BadRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
        Ok(ValidatedJson(value))
    }
}
