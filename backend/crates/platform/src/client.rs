//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers, including
//! the device id used by the per-account device registry.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Header carrying a client-chosen stable device identifier
pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// Client identity derived from request headers
///
/// `device_id` is either the value of the `x-device-id` header or a
/// synthesized fallback (see [`synthesize_device_id`]).
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Stable device identifier for the device registry
    pub device_id: String,
    /// Whether the device id was synthesized (not client-supplied)
    pub synthesized: bool,
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// Original User-Agent string (for logging/display)
    pub user_agent: Option<String>,
}

/// Resolve the client identity from request headers
///
/// Prefers the `x-device-id` header. When the header is absent, falls
/// back to a device id synthesized from the User-Agent and the server
/// hostname. The fallback is weak (different clients behind the same
/// browser/OS combination collide); it exists for clients that do not
/// send the header and should be treated as best-effort.
pub fn resolve_client_identity(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> ClientIdentity {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let supplied = headers
        .get(DEVICE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let (device_id, synthesized) = match supplied {
        Some(id) => (id, false),
        None => (synthesize_device_id(user_agent.as_deref()), true),
    };

    ClientIdentity {
        device_id,
        synthesized,
        ip: extract_client_ip(headers, direct_ip),
        user_agent,
    }
}

/// Synthesize a device id as `{vendor}-{type}-{hostname}`
///
/// Vendor and device type are parsed heuristically from the User-Agent;
/// the hostname is the server's, not the client's.
pub fn synthesize_device_id(user_agent: Option<&str>) -> String {
    let (vendor, device_type) = parse_user_agent(user_agent);
    let hostname = gethostname::gethostname()
        .into_string()
        .unwrap_or_else(|_| "unknown-host".to_string());
    format!("{}-{}-{}", vendor, device_type, hostname)
}

/// Heuristic vendor/type classification from a User-Agent string
fn parse_user_agent(user_agent: Option<&str>) -> (&'static str, &'static str) {
    let Some(ua) = user_agent else {
        return ("unknown", "unknown");
    };
    let ua_lower = ua.to_lowercase();

    let vendor = if ua_lower.contains("iphone")
        || ua_lower.contains("ipad")
        || ua_lower.contains("macintosh")
        || ua_lower.contains("mac os")
    {
        "apple"
    } else if ua_lower.contains("android") {
        "android"
    } else if ua_lower.contains("windows") {
        "microsoft"
    } else if ua_lower.contains("linux") {
        "linux"
    } else {
        "unknown"
    };

    let device_type = if ua_lower.contains("ipad") || ua_lower.contains("tablet") {
        "tablet"
    } else if ua_lower.contains("mobile")
        || ua_lower.contains("iphone")
        || ua_lower.contains("android")
    {
        "mobile"
    } else if ua_lower.contains("mozilla") {
        "desktop"
    } else {
        "unknown"
    };

    (vendor, device_type)
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    // X-Forwarded-For: first IP in the list is the original client
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_supplied_device_id_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(DEVICE_ID_HEADER, HeaderValue::from_static("my-laptop-01"));
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0)"),
        );

        let identity = resolve_client_identity(&headers, None);
        assert_eq!(identity.device_id, "my-laptop-01");
        assert!(!identity.synthesized);
    }

    #[test]
    fn test_blank_device_id_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert(DEVICE_ID_HEADER, HeaderValue::from_static("   "));

        let identity = resolve_client_identity(&headers, None);
        assert!(identity.synthesized);
    }

    #[test]
    fn test_synthesized_id_shape() {
        let id = synthesize_device_id(Some(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)",
        ));
        assert!(id.starts_with("apple-mobile-"));
        assert!(id.matches('-').count() >= 2);
    }

    #[test]
    fn test_parse_user_agent_variants() {
        assert_eq!(
            parse_user_agent(Some("Mozilla/5.0 (Windows NT 10.0; Win64)")),
            ("microsoft", "desktop")
        );
        assert_eq!(
            parse_user_agent(Some("Mozilla/5.0 (Linux; Android 14; Pixel 8) Mobile")),
            ("android", "mobile")
        );
        assert_eq!(
            parse_user_agent(Some("Mozilla/5.0 (iPad; CPU OS 17_0)")),
            ("apple", "tablet")
        );
        assert_eq!(parse_user_agent(None), ("unknown", "unknown"));
    }

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }
}
