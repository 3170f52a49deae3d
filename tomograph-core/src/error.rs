use thiserror::Error;
use tomograph_scanner::ScanError;

/// Why a target was refused before any request was made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("URL is too long ({0} characters, limit 2048)")]
    UrlTooLong(usize),

    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Only HTTP and HTTPS are supported")]
    UnsupportedScheme,

    #[error("URL has no host")]
    MissingHost,

    #[error("Scanning this host is not allowed")]
    DeniedHost,

    #[error("Scanning private or reserved IP addresses is not allowed")]
    PrivateAddress,

    #[error("Host resolves to a private or reserved address")]
    ResolvesToPrivate,

    #[error("Could not resolve host")]
    Unresolvable,

    #[error("Scanning port {0} is not allowed")]
    DeniedPort(u16),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("Server busy, try again later")]
    Busy,

    #[error("Too many requests, retry in {retry_after_secs} seconds")]
    TooManyRequests { retry_after_secs: u64 },
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error("Crawl failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Crawl task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
