// Pre-crawl safety gates: request validation, SSRF checks, message sanitizing

use crate::error::SecurityError;
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::LazyLock;
use tracing::debug;
use url::{Host, Url};

pub const MAX_URL_LENGTH: usize = 2048;

/// Hostnames that are refused regardless of what they resolve to.
pub const DENIED_HOSTS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "0.0.0.0",
    "::1",
    "[::1]",
    "metadata.google.internal",
    "metadata.goog",
    "169.254.169.254",
    "kubernetes.default.svc",
    "host.docker.internal",
];

pub const DENIED_PORTS: &[u16] = &[22, 23, 25, 110, 143, 445, 3306, 5432, 6379, 27017];

const MAX_ERROR_LENGTH: usize = 200;

/// Clean up a user-supplied scan target: trim, default to https, bound length.
pub fn normalize_scan_url(raw: &str) -> Result<String, SecurityError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SecurityError::EmptyUrl);
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let length = candidate.chars().count();
    if length > MAX_URL_LENGTH {
        return Err(SecurityError::UrlTooLong(length));
    }

    let parsed = Url::parse(&candidate).map_err(|_| SecurityError::InvalidUrl)?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(SecurityError::InvalidUrl);
    }

    Ok(candidate)
}

/// True for loopback, private, link-local, multicast, reserved and
/// unspecified addresses. Strings that are not IP literals are not private.
pub fn is_private_ip(ip: &str) -> bool {
    let trimmed = ip.trim_start_matches('[').trim_end_matches(']');
    trimmed.parse::<IpAddr>().is_ok_and(is_private_addr)
}

pub fn is_private_addr(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(addr: Ipv4Addr) -> bool {
    let [a, b, c, _] = addr.octets();
    addr.is_private()
        || addr.is_loopback()
        || addr.is_link_local()
        || addr.is_multicast()
        || addr.is_unspecified()
        || addr.is_broadcast()
        || addr.is_documentation()
        // 0.0.0.0/8 "this network"
        || a == 0
        // 192.0.0.0/24 IETF protocol assignments
        || (a == 192 && b == 0 && c == 0)
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (64..=127).contains(&b))
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b == 18 || b == 19))
        // 240.0.0.0/4 reserved
        || a >= 240
}

fn is_private_v6(addr: Ipv6Addr) -> bool {
    if let Some(v4) = addr.to_ipv4_mapped() {
        return is_private_v4(v4);
    }
    let segments = addr.segments();
    let first = segments[0];
    addr.is_loopback()
        || addr.is_unspecified()
        || addr.is_multicast()
        // ::/8 reserved, including IPv4-compatible addresses
        || (first & 0xff00) == 0
        // 100::/64 discard only
        || (first == 0x0100 && segments[1..4] == [0, 0, 0])
        // 2001::/23 IETF protocol assignments
        || (first == 0x2001 && segments[1] < 0x0200)
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
        // 2001:db8::/32 documentation
        || (first == 0x2001 && segments[1] == 0x0db8)
}

/// Checks that need no network access: scheme, host, denylists, IP literals.
pub fn check_target(url: &Url) -> Result<(), SecurityError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SecurityError::UnsupportedScheme);
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(SecurityError::MissingHost),
    };

    if DENIED_HOSTS.contains(&host.as_str()) {
        return Err(SecurityError::DeniedHost);
    }

    let literal = match url.host() {
        Some(Host::Ipv4(v4)) => Some(IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => Some(IpAddr::V6(v6)),
        _ => None,
    };
    if let Some(addr) = literal
        && is_private_addr(addr)
    {
        return Err(SecurityError::PrivateAddress);
    }

    if let Some(port) = url.port()
        && DENIED_PORTS.contains(&port)
    {
        return Err(SecurityError::DeniedPort(port));
    }

    Ok(())
}

/// Every address a hostname resolves to must be public.
pub fn check_resolved_addrs<I>(addrs: I) -> Result<(), SecurityError>
where
    I: IntoIterator<Item = SocketAddr>,
{
    let mut seen_any = false;
    for addr in addrs {
        seen_any = true;
        if is_private_addr(addr.ip()) {
            debug!("Resolved address {} is not public", addr.ip());
            return Err(SecurityError::ResolvesToPrivate);
        }
    }
    if !seen_any {
        return Err(SecurityError::Unresolvable);
    }
    Ok(())
}

/// Full SSRF gate. Domain names are resolved and every address checked.
pub async fn validate_url_safety(url: &str) -> Result<Url, SecurityError> {
    let parsed = Url::parse(url).map_err(|_| SecurityError::InvalidUrl)?;
    check_target(&parsed)?;

    if let Some(Host::Domain(domain)) = parsed.host() {
        let port = parsed.port_or_known_default().unwrap_or(80);
        let addrs = tokio::net::lookup_host((domain, port))
            .await
            .map_err(|_| SecurityError::Unresolvable)?;
        check_resolved_addrs(addrs)?;
    }

    Ok(parsed)
}

/// Strip credentials, query and fragment before showing a URL to anyone.
pub fn sanitize_url_for_display(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return "[invalid URL]".to_string();
    };

    let mut display = format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or(""));
    if let Some(port) = parsed.port() {
        display.push_str(&format!(":{}", port));
    }
    display.push_str(parsed.path());
    display
}

static SENSITIVE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r#"/(?:home|var|etc|usr|tmp|root)/[^\s'":,)]*"#, "[path]"),
        (
            r"\b(?:10\.\d{1,3}\.\d{1,3}\.\d{1,3}|192\.168\.\d{1,3}\.\d{1,3}|172\.(?:1[6-9]|2\d|3[01])\.\d{1,3}\.\d{1,3})\b",
            "[internal-ip]",
        ),
        (r"\b127\.\d{1,3}\.\d{1,3}\.\d{1,3}\b", "[localhost]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Redact file paths and internal addresses, then cap the length.
pub fn sanitize_error_message(message: &str) -> String {
    let mut cleaned = message.to_string();
    for (re, replacement) in SENSITIVE_PATTERNS.iter() {
        cleaned = re.replace_all(&cleaned, *replacement).into_owned();
    }

    if cleaned.chars().count() > MAX_ERROR_LENGTH {
        let truncated: String = cleaned.chars().take(MAX_ERROR_LENGTH).collect();
        return format!("{}...", truncated);
    }
    cleaned
}
