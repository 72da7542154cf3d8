//! Caller identity resolution.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Identity shared by clients that cannot be attributed.
pub const UNKNOWN_IDENTITY: &str = "unknown";

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Derive the identity a quota is tracked against.
///
/// An authenticated user id always wins, so a user switching networks
/// keeps a single bucket. Anonymous callers are keyed by the client IP
/// reported by the proxy chain. Header values that are not IP addresses
/// are skipped, so a client cannot pick a key in another caller's namespace.
pub fn resolve_identity(headers: &HeaderMap, user_id: Option<&str>) -> String {
    if let Some(id) = user_id.map(str::trim).filter(|id| !id.is_empty()) {
        return format!("user:{}", id);
    }

    let forwarded = header_str(headers, FORWARDED_FOR).and_then(|value| value.split(',').next());
    if let Some(ip) = forwarded.and_then(parse_ip) {
        return ip.to_string();
    }

    if let Some(ip) = header_str(headers, REAL_IP).and_then(parse_ip) {
        return ip.to_string();
    }

    UNKNOWN_IDENTITY.to_string()
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_user_id_preferred_over_ip() {
        let map = headers(&[("x-forwarded-for", "203.0.113.7")]);
        assert_eq!(resolve_identity(&map, Some("42")), "user:42");
    }

    #[test]
    fn test_first_forwarded_entry_is_used() {
        let map = headers(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(resolve_identity(&map, None), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let map = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(resolve_identity(&map, None), "198.51.100.4");
    }

    #[test]
    fn test_blank_values_fall_through() {
        let map = headers(&[("x-forwarded-for", " , 10.0.0.1"), ("x-real-ip", "10.0.0.2")]);
        assert_eq!(resolve_identity(&map, Some("  ")), "10.0.0.2");
    }

    #[test]
    fn test_non_ip_values_fall_through() {
        let map = headers(&[("x-forwarded-for", "user:42"), ("x-real-ip", "10.0.0.2")]);
        assert_eq!(resolve_identity(&map, None), "10.0.0.2");

        let map = headers(&[("x-forwarded-for", "user:42"), ("x-real-ip", "not-an-ip")]);
        assert_eq!(resolve_identity(&map, None), UNKNOWN_IDENTITY);
    }

    #[test]
    fn test_ipv6_is_normalized() {
        let map = headers(&[("x-forwarded-for", "2001:DB8:0:0::1, 10.0.0.1")]);
        assert_eq!(resolve_identity(&map, None), "2001:db8::1");
    }

    #[test]
    fn test_unknown_sentinel() {
        assert_eq!(resolve_identity(&HeaderMap::new(), None), UNKNOWN_IDENTITY);
    }
}
