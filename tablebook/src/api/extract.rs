//! Request extractors with `{ message }` rejections.
//!
//! Axum's own extractors reject with plain-text bodies. These wrappers keep the same parsing but
//! reject with [`Error::BadRequest`], so every client error has the same JSON shape.

use crate::errors::{Error, Result};
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

/// JSON body that is deserialized and then checked with [`Validate`].
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::bad_request(rejection.body_text()))?;

        value.validate().map_err(|errors| Error::bad_request(first_validation_message(&errors)))?;

        Ok(Self(value))
    }
}

/// Query string extractor.
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path parameter extractor.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// The message of the first failing field, by field name. Errors without a message fall back to
/// naming the field.
fn first_validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, field_errors)| {
            let field = field.to_string();
            let message = field_errors.first().map(|error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for {field}"),
            })?;
            Some((field, message))
        })
        .collect();
    fields.sort();

    fields
        .into_iter()
        .next()
        .map(|(_, message)| message)
        .unwrap_or_else(|| "Invalid request".to_string())
}
