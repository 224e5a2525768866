//! Client IP resolution from proxy headers.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Resolves the client address of a request.
///
/// Checks `X-Forwarded-For` (first entry), then `X-Real-IP`, then
/// `CF-Connecting-IP`, and falls back to the peer address.
#[must_use]
pub fn resolve_client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for")
        && let Some(first) = forwarded.split(',').next().map(str::trim)
        && !first.is_empty()
    {
        tracing::debug!(ip = first, "client ip from x-forwarded-for");
        return first.to_string();
    }
    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }
    if let Some(cf_ip) = header("cf-connecting-ip") {
        return cf_ip.to_string();
    }
    peer.ip().to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn peer() -> SocketAddr {
        SocketAddr::from(([192, 168, 1, 10], 40000))
    }

    #[test]
    fn falls_back_to_peer() {
        assert_eq!(resolve_client_ip(&HeaderMap::new(), peer()), "192.168.1.10");
    }

    #[test]
    fn forwarded_for_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(resolve_client_ip(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn real_ip_before_cloudflare() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("192.0.2.4"));
        assert_eq!(resolve_client_ip(&headers, peer()), "198.51.100.2");
    }

    #[test]
    fn cloudflare_header_used_last() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("192.0.2.4"));
        assert_eq!(resolve_client_ip(&headers, peer()), "192.0.2.4");
    }
}
