//! Request handling.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) unless the client sent one, and echo it back
//! - Record per-request metrics keyed by the matched route
//! - Decode optional JSON object bodies
//! - Query and path extractors whose rejections render as `ApiError` JSON
//!
//! # Design Decisions
//! - Request ID added as early as possible so the trace span carries it
//! - Metrics use the route template, never the raw path, to bound cardinality

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, MatchedPath, Path, Query},
    http::{request::Parts, HeaderName, Request},
    middleware::Next,
    response::Response,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::api::ApiError;
use crate::observability::metrics;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer assigning `x-request-id` to incoming requests.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer copying `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Request ID of `request`, or `"unknown"`.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Middleware recording request count and latency.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

/// Decode a request body that must be a JSON object. An empty body is an empty object.
pub fn json_fields(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::InvalidBody("expected a JSON object".to_string())),
        Err(e) => Err(ApiError::InvalidBody(e.to_string())),
    }
}

/// `Query<T>` whose rejection is a `400 BadRequestError` JSON body.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(ApiError::InvalidRequest(rejection.body_text())),
        }
    }
}

/// `Path<T>` whose rejection is a `400 BadRequestError` JSON body.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(ApiError::InvalidRequest(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_empty_object() {
        assert!(json_fields(&Bytes::new()).unwrap().is_empty());
        assert!(json_fields(&Bytes::from_static(b"  \n")).unwrap().is_empty());
    }

    #[test]
    fn object_body_decodes() {
        let fields = json_fields(&Bytes::from_static(br#"{"title":"bar"}"#)).unwrap();
        assert_eq!(fields.get("title"), Some(&Value::String("bar".into())));
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(matches!(
            json_fields(&Bytes::from_static(b"[1,2]")),
            Err(ApiError::InvalidBody(_))
        ));
        assert!(matches!(
            json_fields(&Bytes::from_static(b"{nope")),
            Err(ApiError::InvalidBody(_))
        ));
    }

    #[tokio::test]
    async fn bad_query_is_an_api_error() {
        use crate::api::TimerQuery;

        let request = Request::builder().uri("/timers?since=yesterday").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let result = ApiQuery::<TimerQuery>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));

        let request = Request::builder()
            .uri("/timers?title=report&since=2024-03-01T09:00:00Z")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let ApiQuery(query) = ApiQuery::<TimerQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(query.title.as_deref(), Some("report"));
        assert!(query.since.is_some());
    }

    #[test]
    fn request_id_falls_back() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(request_id(&request), "unknown");

        let request = Request::builder()
            .header("x-request-id", "abc")
            .body(())
            .unwrap();
        assert_eq!(request_id(&request), "abc");
    }
}
