/// Request extractors with API-shaped rejections
///
/// Axum's stock `Json`, `Path` and `Query` extractors reject malformed input
/// with plain-text bodies. These wrappers convert the rejection into
/// [`ApiError`] so every failure uses the JSON error format.
///
/// # Example
///
/// ```
/// use taskboard_api::extract::{ApiJson, ApiPath};
/// use uuid::Uuid;
///
/// async fn handler(ApiPath(id): ApiPath<Uuid>, ApiJson(body): ApiJson<serde_json::Value>) {
///     let _ = (id, body);
/// }
/// ```

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
