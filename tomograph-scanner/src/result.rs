use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health classification of a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    /// Responded successfully within the latency threshold
    Healthy,
    /// Responded successfully but slower than the latency threshold
    Blockage,
    /// Error status or transport failure
    Necrosis,
}

impl Health {
    /// Classify a response. Status takes precedence over latency.
    pub fn classify(status_code: u16, latency: Duration, threshold: Duration) -> Self {
        if status_code >= 400 {
            Health::Necrosis
        } else if latency > threshold {
            Health::Blockage
        } else {
            Health::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Healthy => "healthy",
            Health::Blockage => "blockage",
            Health::Necrosis => "necrosis",
        }
    }

    /// Sort key placing the worst problems first.
    pub fn priority(&self) -> u8 {
        match self {
            Health::Necrosis => 0,
            Health::Blockage => 1,
            Health::Healthy => 2,
        }
    }
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of fetching a single page, including every retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    pub status_code: u16,
    pub latency_ms: u64,
    pub health: Health,
    pub links: Vec<String>,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn new(url: String, status_code: u16, latency: Duration, threshold: Duration) -> Self {
        Self {
            url,
            status_code,
            latency_ms: latency.as_millis() as u64,
            health: Health::classify(status_code, latency, threshold),
            links: Vec::new(),
            error: None,
        }
    }

    /// Transport failure: status 0, no latency, no links.
    pub fn with_error(url: String, error: String) -> Self {
        Self {
            url,
            status_code: 0,
            latency_ms: 0,
            health: Health::Necrosis,
            links: Vec::new(),
            error: Some(error),
        }
    }

    /// Request timed out; recorded as a 408.
    pub fn timed_out(url: String, latency: Duration) -> Self {
        Self {
            url,
            status_code: 408,
            latency_ms: latency.as_millis() as u64,
            health: Health::Necrosis,
            links: Vec::new(),
            error: Some("request timed out".to_string()),
        }
    }
}
