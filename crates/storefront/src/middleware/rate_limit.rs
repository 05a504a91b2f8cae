//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: strict limits for login, registration and password
//!   reset (~10/min per client)
//! - `api_rate_limiter`: relaxed limits for the JSON API (~100/min per client)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{extract::ConnectInfo, http::Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor that prefers proxy headers and falls back to the peer address.
///
/// Header order: `X-Forwarded-For` (first hop), then `X-Real-IP`. Without a
/// proxy the socket address from `ConnectInfo` is used, which requires the
/// server to be started with `into_make_service_with_connect_info`.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req).ok_or(GovernorError::UnableToExtractKey)
    }
}

fn client_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    let headers = req.headers();

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    let peer = || {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };

    forwarded.or_else(real_ip).or_else(peer)
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// Never panics: `per_second(6)` and `burst_size(5)` are always accepted by
/// `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for the JSON API: ~100 requests per minute per IP.
///
/// Search-as-you-type fires a request per keystroke, hence the large burst.
///
/// # Panics
///
/// Never panics: `per_second(1)` and `burst_size(50)` are always accepted by
/// `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> axum::http::request::Builder {
        Request::builder().uri("/auth/login")
    }

    #[test]
    fn test_forwarded_for_wins() {
        let req = request()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&req), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_real_ip_fallback() {
        let req = request()
            .header("x-forwarded-for", "garbage")
            .header("x-real-ip", "198.51.100.2")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&req), Some("198.51.100.2".parse().unwrap()));
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut req = request().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_ip(&req), Some("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_no_source() {
        let req = request().body(()).unwrap();
        assert_eq!(client_ip(&req), None);
    }
}
