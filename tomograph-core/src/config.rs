//! Configuration file handling

use crate::error::Result;
use crate::rate_limit::{DEFAULT_MAX_ACTIVE_SCANS, DEFAULT_REQUESTS_PER_WINDOW, RateLimiter};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tomograph_scanner::CrawlConfig;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/tomograph/config.toml";

/// Upper bound on in-flight requests accepted from the file or the command line.
pub const MAX_CONCURRENT_FETCHES: usize = 64;

/// Raw shape of the TOML file; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    crawl: Option<CrawlSection>,
    limits: Option<LimitsSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CrawlSection {
    max_depth: Option<usize>,
    max_pages: Option<usize>,
    max_concurrent: Option<usize>,
    latency_threshold_ms: Option<u64>,
    step_delay_ms: Option<u64>,
    max_retries: Option<u32>,
    respect_robots: Option<bool>,
    request_timeout_secs: Option<u64>,
    robots_timeout_secs: Option<u64>,
    retry_base_delay_ms: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitsSection {
    requests_per_minute: Option<usize>,
    max_active_scans: Option<usize>,
}

/// Crawl settings with every default filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    pub max_depth: usize,
    pub max_pages: usize,
    pub max_concurrent: usize,
    pub latency_threshold: Duration,
    pub step_delay: Duration,
    pub max_retries: u32,
    pub respect_robots: bool,
    pub request_timeout: Duration,
    pub robots_timeout: Duration,
    pub retry_base_delay: Duration,
    pub user_agent: Option<String>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        let defaults = CrawlConfig::new("");
        Self {
            max_depth: defaults.max_depth,
            max_pages: defaults.max_pages,
            max_concurrent: defaults.max_concurrent,
            latency_threshold: defaults.latency_threshold,
            step_delay: defaults.step_delay,
            max_retries: defaults.max_retries,
            respect_robots: defaults.respect_robots,
            request_timeout: defaults.request_timeout,
            robots_timeout: defaults.robots_timeout,
            retry_base_delay: defaults.retry_base_delay,
            user_agent: None,
        }
    }
}

impl CrawlSettings {
    /// Engine configuration for a crawl starting at `start_url`.
    pub fn to_crawl_config(&self, start_url: &str) -> CrawlConfig {
        let config = CrawlConfig::new(start_url)
            .with_max_depth(self.max_depth)
            .with_max_pages(self.max_pages)
            .with_max_concurrent(self.max_concurrent)
            .with_latency_threshold(self.latency_threshold)
            .with_step_delay(self.step_delay)
            .with_max_retries(self.max_retries)
            .with_respect_robots(self.respect_robots)
            .with_request_timeout(self.request_timeout)
            .with_robots_timeout(self.robots_timeout)
            .with_retry_base_delay(self.retry_base_delay);

        match &self.user_agent {
            Some(ua) => config.with_user_agent(ua.clone()),
            None => config,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitSettings {
    pub requests_per_minute: usize,
    pub max_active_scans: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_WINDOW,
            max_active_scans: DEFAULT_MAX_ACTIVE_SCANS,
        }
    }
}

impl LimitSettings {
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.requests_per_minute, self.max_active_scans)
    }

    /// Limiter for one local run over `batch_size` targets, all under the same
    /// client id. The window is widened so the run cannot throttle itself.
    pub fn batch_rate_limiter(&self, batch_size: usize) -> RateLimiter {
        RateLimiter::new(
            self.requests_per_minute.max(batch_size),
            self.max_active_scans,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TomographConfig {
    pub crawl: CrawlSettings,
    pub limits: LimitSettings,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct CrawlOverrides {
    pub max_depth: Option<usize>,
    pub max_pages: Option<usize>,
    pub max_concurrent: Option<usize>,
    pub latency_threshold_ms: Option<u64>,
    pub step_delay_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub ignore_robots: bool,
}

impl CrawlOverrides {
    pub fn apply(&self, settings: &mut CrawlSettings) {
        if let Some(depth) = self.max_depth {
            settings.max_depth = depth;
        }
        if let Some(pages) = self.max_pages {
            settings.max_pages = pages;
        }
        if let Some(concurrent) = self.max_concurrent {
            settings.max_concurrent = concurrent.clamp(1, MAX_CONCURRENT_FETCHES);
        }
        if let Some(ms) = self.latency_threshold_ms {
            settings.latency_threshold = Duration::from_millis(ms);
        }
        if let Some(ms) = self.step_delay_ms {
            settings.step_delay = Duration::from_millis(ms);
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if self.ignore_robots {
            settings.respect_robots = false;
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

/// Parse configuration text, layering it over the defaults.
pub fn parse_config(content: &str) -> Result<TomographConfig> {
    let file_config: FileConfig = toml::from_str(content)?;
    let mut config = TomographConfig::default();

    if let Some(crawl) = file_config.crawl {
        let settings = &mut config.crawl;
        if let Some(depth) = crawl.max_depth {
            settings.max_depth = depth;
        }
        if let Some(pages) = crawl.max_pages {
            settings.max_pages = pages;
        }
        if let Some(concurrent) = crawl.max_concurrent {
            settings.max_concurrent = concurrent.clamp(1, MAX_CONCURRENT_FETCHES);
        }
        if let Some(ms) = crawl.latency_threshold_ms {
            settings.latency_threshold = Duration::from_millis(ms);
        }
        if let Some(ms) = crawl.step_delay_ms {
            settings.step_delay = Duration::from_millis(ms);
        }
        if let Some(retries) = crawl.max_retries {
            settings.max_retries = retries;
        }
        if let Some(respect) = crawl.respect_robots {
            settings.respect_robots = respect;
        }
        if let Some(secs) = crawl.request_timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = crawl.robots_timeout_secs {
            settings.robots_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = crawl.retry_base_delay_ms {
            settings.retry_base_delay = Duration::from_millis(ms);
        }
        if crawl.user_agent.is_some() {
            settings.user_agent = crawl.user_agent;
        }
    }

    if let Some(limits) = file_config.limits {
        if let Some(rpm) = limits.requests_per_minute {
            config.limits.requests_per_minute = rpm;
        }
        if let Some(active) = limits.max_active_scans {
            config.limits.max_active_scans = active;
        }
    }

    Ok(config)
}

pub fn load_config(path: &Path) -> Result<TomographConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// An explicitly named file must exist. Without one, the default location is
/// used when present and built-in defaults otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> Result<TomographConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    let path = default_config_path();
    if path.is_file() {
        debug!("Loading config from {}", path.display());
        load_config(&path)
    } else {
        Ok(TomographConfig::default())
    }
}
