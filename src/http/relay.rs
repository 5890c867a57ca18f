//! Response relay back to the caller.
//!
//! # Responsibilities
//! - Copy backend status verbatim
//! - Copy backend headers minus hop-by-hop headers
//! - Stream the backend body without buffering it
//!
//! # Design Decisions
//! - Once the head is sent the status cannot change; a body error truncates
//!   the response and is only logged
//! - Dropping the relayed body (caller gone) drops the backend response

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::BoxError;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};

use crate::http::headers::strip_hop_by_hop;
use crate::observability::metrics;

/// Backend response head plus its unread body.
pub struct RelayResult {
    status: StatusCode,
    headers: HeaderMap,
    body: BoxStream<'static, Result<Bytes, BoxError>>,
}

impl RelayResult {
    pub fn new(status: StatusCode, headers: HeaderMap, body: BoxStream<'static, Result<Bytes, BoxError>>) -> Self {
        Self { status, headers, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Build the caller-facing response. `target` and `route` label
    /// transfer errors in logs and metrics.
    pub fn into_response(self, target: String, route: String) -> Response {
        let RelayResult { status, mut headers, body } = self;
        strip_hop_by_hop(&mut headers);

        let body = body.inspect_err(move |e| {
            tracing::warn!(url = %target, route = %route, error = %e, "Backend body transfer failed, truncating response");
            metrics::record_relay_error(&route);
        });

        let mut response = Response::new(Body::from_stream(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl From<reqwest::Response> for RelayResult {
    fn from(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map_err(BoxError::from).boxed();
        Self::new(status, headers, body)
    }
}

impl std::fmt::Debug for RelayResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayResult")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use futures_util::stream;

    fn chunks(parts: Vec<Result<&'static str, &'static str>>) -> BoxStream<'static, Result<Bytes, BoxError>> {
        stream::iter(parts.into_iter().map(|part| part.map(Bytes::from).map_err(BoxError::from))).boxed()
    }

    #[tokio::test]
    async fn relays_status_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));

        let result = RelayResult::new(StatusCode::CREATED, headers, chunks(vec![Ok("{\"a\":"), Ok("1}")]));
        let response = result.into_response("http://backend/x".into(), "/x".into());

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert!(response.headers().get(header::CONNECTION).is_none());
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
        assert!(response.headers().get("keep-alive").is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"{\"a\":1}");
    }

    #[tokio::test]
    async fn body_error_keeps_status_and_fails_the_stream() {
        let result = RelayResult::new(
            StatusCode::OK,
            HeaderMap::new(),
            chunks(vec![Ok("partial"), Err("connection reset")]),
        );
        let response = result.into_response("http://backend/x".into(), "/x".into());
        assert_eq!(response.status(), StatusCode::OK);
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());
    }
}
