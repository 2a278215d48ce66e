/// Request extractors that reject with `ApiError`
///
/// axum's stock `Json` and `Query` extractors answer malformed input with
/// plain-text bodies and a mix of 400/415/422. These wrappers funnel every
/// rejection into the JSON error format with status 400.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};

/// JSON request body
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Raw query string parameters
///
/// Kept as strings so each handler can report exactly which parameter is
/// malformed.
pub struct QueryParams(pub HashMap<String, String>);

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::from_request_parts(parts, state).await?;
        Ok(QueryParams(params))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Parses a resource ID taken from the path
///
/// A malformed ID can't name an existing resource, so it is reported the same
/// way as a missing one.
pub fn parse_id(raw: &str, resource: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} not found", resource)))
}

/// Deserializes a partial update after checking it against an allow-list
///
/// The whole body is rejected with a 404 if it names any field outside
/// `allowed`; no field of a rejected update is applied.
pub fn parse_update<T>(body: Map<String, Value>, allowed: &[&str]) -> ApiResult<T>
where
    T: DeserializeOwned,
{
    let mut disallowed: Vec<&String> = body
        .keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .collect();

    if !disallowed.is_empty() {
        disallowed.sort();
        return Err(ApiError::UnknownFields(
            disallowed
                .into_iter()
                .map(|field| ValidationErrorDetail::new(field.as_str(), "Invalid update"))
                .collect(),
        ));
    }

    serde_json::from_value(Value::Object(body)).map_err(|e| ApiError::BadRequest(e.to_string()))
}
