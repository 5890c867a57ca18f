//! Fixed-content test backend ("endpoint mode").
//!
//! Logs every request it receives and answers with the configured content,
//! which makes it a convenient stand-in backend when trying out routes.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Value of the `X-Served-By` header.
pub const SERVED_BY: &str = "edge-gateway";

/// Body bytes logged per request.
const BODY_PREVIEW_BYTES: usize = 1024;

/// Largest request body read before answering.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct EndpointState {
    content: Arc<str>,
    content_type: &'static str,
}

/// `application/json` for JSON content, `text/html` otherwise.
pub fn content_type_for(content: &str) -> &'static str {
    if serde_json::from_str::<serde::de::IgnoredAny>(content).is_ok() {
        "application/json"
    } else {
        "text/html"
    }
}

pub fn endpoint_router(content: impl Into<String>) -> Router {
    let content: String = content.into();
    let state = EndpointState {
        content_type: content_type_for(&content),
        content: Arc::from(content),
    };
    Router::new().fallback(serve_content).with_state(state)
}

/// Serve `content` on `listener` until `shutdown` fires.
pub async fn run_endpoint(
    listener: TcpListener,
    content: String,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Endpoint mode listening");
    axum::serve(listener, endpoint_router(content))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

async fn serve_content(State(state): State<EndpointState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    tracing::info!(method = %parts.method, uri = %parts.uri, "Request received");
    for (name, value) in &parts.headers {
        tracing::info!(header = %name, value = ?value, "Request header");
    }

    match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) if !bytes.is_empty() => {
            let preview = &bytes[..bytes.len().min(BODY_PREVIEW_BYTES)];
            tracing::info!(len = bytes.len(), data = %String::from_utf8_lossy(preview), "Request body");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read request body"),
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(state.content_type)),
            (header::HeaderName::from_static("x-served-by"), HeaderValue::from_static(SERVED_BY)),
        ],
        state.content.to_string(),
    )
        .into_response()
}
