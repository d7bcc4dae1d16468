use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL};
use crate::rate_limit::{Admission, RateLimiter};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// Per-request id, available to handlers as an extension
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Tags each request with a fresh id, echoes it in `x-request-id` and
/// stamps it into JSON error bodies.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    REQUEST_TOTAL.inc();

    let id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;

    if let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() {
        body.request_id = Some(id.clone());
        if let Ok(json) = serde_json::to_vec(&body) {
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(header::CONTENT_LENGTH);
            response = Response::from_parts(parts, Body::from(json));
        }
    }

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

// Response headers every answer carries, including errors and 404s
const SECURITY_HEADERS: [(&str, &str); 7] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-permitted-cross-domain-policies", "none"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
];

pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers
            .entry(name)
            .or_insert_with(|| HeaderValue::from_static(value));
    }
    response
}

// Rate limit key: last X-Forwarded-For hop (the one our proxy appended), then the peer address
pub fn client_key(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next_back())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Admission gate in front of a route group. Each group gets its own limiter.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&request);
    let now = Utc::now();

    match limiter.admit(&key, now) {
        Admission::Admitted { count } => {
            debug!(limiter = limiter.name(), key = %key, count, "Request admitted");
            Ok(next.run(request).await)
        }
        Admission::Rejected { reset_at } => {
            RATE_LIMITED_TOTAL.with_label_values(&[limiter.name()]).inc();

            let wait_ms = (reset_at - now).num_milliseconds().max(0) as u64;
            Err(AppError::RateLimitExceeded {
                message: limiter.rejection_message(reset_at),
                retry_after_secs: wait_ms.div_ceil(1000),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_last_forwarded_hop() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "10.0.0.1");
    }

    #[test]
    fn forged_leading_hops_do_not_change_key() {
        for forged in ["1.2.3.4", "5.6.7.8, 9.9.9.9"] {
            let request = Request::builder()
                .header("x-forwarded-for", format!("{forged}, 198.51.100.7"))
                .body(Body::empty())
                .unwrap();
            assert_eq!(client_key(&request), "198.51.100.7");
        }
    }

    #[test]
    fn key_falls_back_to_peer_address() {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        let addr: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_key(&request), "192.0.2.10");
    }

    #[test]
    fn key_unknown_without_any_source() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), "unknown");
    }
}
