use crate::error::{Result, ScanError};
use url::Url;

/// The crawl boundary: scheme, host and explicit port of the start URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        Self::from_url(&parsed)
    }

    pub fn from_url(url: &Url) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| ScanError::InvalidUrl(format!("{} has no host", url)))?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port: url.port(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `scheme://host[:port]`, without a trailing slash.
    pub fn as_string(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    pub fn robots_url(&self) -> String {
        format!("{}/robots.txt", self.as_string())
    }

    /// Resolve `href` against `base` and canonicalize it.
    ///
    /// Returns `None` for non-http(s) schemes, cross-origin targets and
    /// anything that fails to parse. Query and fragment are dropped, a single
    /// trailing slash is stripped, and the origin root renders as the bare
    /// origin. The origin's scheme is always used in the output.
    pub fn normalize(&self, href: &str, base: &str) -> Option<String> {
        let base = Url::parse(base).ok()?;
        let resolved = base.join(href.trim()).ok()?;

        if !matches!(resolved.scheme(), "http" | "https") {
            return None;
        }
        if resolved.host_str() != Some(self.host.as_str()) || resolved.port() != self.port {
            return None;
        }

        Some(self.render(resolved.path()))
    }

    fn render(&self, path: &str) -> String {
        let path = if path == "/" {
            ""
        } else {
            path.strip_suffix('/').unwrap_or(path)
        };
        format!("{}{}", self.as_string(), path)
    }
}

/// Canonicalize `href` relative to `base`, using `base`'s origin as the
/// crawl boundary.
pub fn normalize_url(href: &str, base: &str) -> Option<String> {
    Origin::parse(base).ok()?.normalize(href, base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_slash_collapses_to_origin() {
        assert_eq!(
            normalize_url("/", "https://example.com"),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn test_path_without_trailing_slash_unchanged() {
        assert_eq!(
            normalize_url("/page", "https://example.com"),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn test_trailing_slash_removed() {
        assert_eq!(
            normalize_url("/page/", "https://example.com"),
            Some("https://example.com/page".to_string())
        );
        assert_eq!(
            normalize_url("/a/b/c/", "https://example.com"),
            Some("https://example.com/a/b/c".to_string())
        );
    }

    #[test]
    fn test_relative_href_resolved_against_base() {
        assert_eq!(
            normalize_url("about", "https://example.com/page/"),
            Some("https://example.com/page/about".to_string())
        );
        assert_eq!(
            normalize_url("../up", "https://example.com/a/b/"),
            Some("https://example.com/a/up".to_string())
        );
    }

    #[test]
    fn test_cross_origin_rejected() {
        assert_eq!(normalize_url("https://other.com/page", "https://example.com"), None);
        assert_eq!(normalize_url("https://sub.example.com/", "https://example.com"), None);
    }

    #[test]
    fn test_different_port_rejected() {
        assert_eq!(normalize_url("https://example.com:8443/x", "https://example.com"), None);
    }

    #[test]
    fn test_non_http_schemes_rejected() {
        assert_eq!(normalize_url("javascript:void(0)", "https://example.com"), None);
        assert_eq!(normalize_url("mailto:test@example.com", "https://example.com"), None);
        assert_eq!(normalize_url("tel:+123456", "https://example.com"), None);
        assert_eq!(normalize_url("ftp://example.com/file", "https://example.com"), None);
    }

    #[test]
    fn test_fragment_and_query_removed() {
        let normalized = normalize_url("/page#section", "https://example.com").unwrap();
        assert_eq!(normalized, "https://example.com/page");
        assert!(!normalized.contains('#'));

        let normalized = normalize_url("/search?q=rust&page=2", "https://example.com").unwrap();
        assert_eq!(normalized, "https://example.com/search");
    }

    #[test]
    fn test_origin_scheme_is_forced() {
        let origin = Origin::parse("https://example.com").unwrap();
        assert_eq!(
            origin.normalize("http://example.com/plain", "https://example.com"),
            Some("https://example.com/plain".to_string())
        );
    }

    #[test]
    fn test_host_comparison_is_case_insensitive() {
        assert_eq!(
            normalize_url("https://EXAMPLE.com/Page", "https://example.com"),
            Some("https://example.com/Page".to_string())
        );
    }

    #[test]
    fn test_origin_with_explicit_port() {
        let origin = Origin::parse("http://127.0.0.1:8080/start").unwrap();
        assert_eq!(origin.as_string(), "http://127.0.0.1:8080");
        assert_eq!(origin.robots_url(), "http://127.0.0.1:8080/robots.txt");
        assert_eq!(
            origin.normalize("/next/", "http://127.0.0.1:8080/start"),
            Some("http://127.0.0.1:8080/next".to_string())
        );
    }

    #[test]
    fn test_origin_rejects_unsupported_scheme() {
        assert!(Origin::parse("ftp://example.com").is_err());
        assert!(Origin::parse("not a url").is_err());
    }
}
