use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("SiteTomograph/", env!("CARGO_PKG_VERSION"));

/// Everything a single crawl needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlConfig {
    pub start_url: String,
    pub max_depth: usize,
    pub max_pages: usize,
    pub max_concurrent: usize,
    /// Responses slower than this are classified as blockages
    pub latency_threshold: Duration,
    /// Pause after each processed URL
    pub step_delay: Duration,
    /// Total attempts per page, including the first
    pub max_retries: u32,
    pub respect_robots: bool,
    pub request_timeout: Duration,
    pub robots_timeout: Duration,
    pub retry_base_delay: Duration,
    pub user_agent: String,
}

impl CrawlConfig {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth: 3,
            max_pages: 50,
            max_concurrent: 3,
            latency_threshold: Duration::from_millis(2000),
            step_delay: Duration::from_millis(500),
            max_retries: 3,
            respect_robots: true,
            request_timeout: Duration::from_secs(10),
            robots_timeout: Duration::from_secs(5),
            retry_base_delay: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    pub fn with_max_concurrent(mut self, permits: usize) -> Self {
        self.max_concurrent = permits;
        self
    }

    pub fn with_latency_threshold(mut self, threshold: Duration) -> Self {
        self.latency_threshold = threshold;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = attempts;
        self
    }

    pub fn with_respect_robots(mut self, respect: bool) -> Self {
        self.respect_robots = respect;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_robots_timeout(mut self, timeout: Duration) -> Self {
        self.robots_timeout = timeout;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CrawlConfig::new("https://example.com");
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.max_concurrent, 3);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.latency_threshold, Duration::from_millis(2000));
        assert_eq!(config.step_delay, Duration::from_millis(500));
        assert!(config.respect_robots);
        assert!(config.user_agent.starts_with("SiteTomograph/"));
    }

    #[test]
    fn test_custom_values() {
        let config = CrawlConfig::new("https://example.com")
            .with_max_depth(5)
            .with_max_pages(100)
            .with_max_retries(5)
            .with_respect_robots(false);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.max_retries, 5);
        assert!(!config.respect_robots);
    }
}
