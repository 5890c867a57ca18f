//! Header manipulation for forwarded requests and relayed responses.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Extend the X-Forwarded-For chain with the caller address

use std::net::IpAddr;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that only apply to a single transport connection.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Remove every hop-by-hop header, all values included.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// Append `client` to the forwarding chain, or start one.
///
/// Multiple existing header lines collapse into one comma-separated value.
/// Prior values are joined as raw bytes, so non-ASCII entries are kept.
pub fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let mut chain = Vec::new();
    for value in headers.get_all(&X_FORWARDED_FOR) {
        chain.extend_from_slice(value.as_bytes());
        chain.extend_from_slice(b", ");
    }
    chain.extend_from_slice(client.to_string().as_bytes());

    let value = HeaderValue::from_bytes(&chain).unwrap_or_else(|_| {
        tracing::warn!(chain = %String::from_utf8_lossy(&chain), "Unrepresentable X-Forwarded-For chain, restarting it");
        HeaderValue::from_str(&client.to_string()).unwrap_or(HeaderValue::from_static("unknown"))
    });
    headers.insert(X_FORWARDED_FOR, value);
}
