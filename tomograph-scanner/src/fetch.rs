use crate::backoff::ExponentialBackoff;
use crate::extract::extract_hrefs;
use crate::normalize::Origin;
use crate::result::FetchResult;
use reqwest::Client;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One attempt's outcome, before retry policy is applied.
enum Attempt {
    Response(FetchResult),
    TimedOut { latency: Duration },
    Failed { error: String },
}

impl Attempt {
    fn is_retryable(&self) -> bool {
        match self {
            Attempt::Response(result) => is_retryable_status(result.status_code),
            Attempt::TimedOut { .. } | Attempt::Failed { .. } => true,
        }
    }

    fn into_result(self, url: &str) -> FetchResult {
        match self {
            Attempt::Response(result) => result,
            Attempt::TimedOut { latency } => FetchResult::timed_out(url.to_string(), latency),
            Attempt::Failed { error } => FetchResult::with_error(url.to_string(), error),
        }
    }
}

/// Server errors worth another attempt. Everything else is final.
pub fn is_retryable_status(status_code: u16) -> bool {
    matches!(status_code, 500 | 502 | 503 | 504)
}

/// Single-page fetch with latency classification and retry/backoff.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    latency_threshold: Duration,
    max_attempts: u32,
    backoff: ExponentialBackoff,
}

impl Fetcher {
    pub fn new(client: Client, latency_threshold: Duration) -> Self {
        Self {
            client,
            latency_threshold,
            max_attempts: 3,
            backoff: ExponentialBackoff::default(),
        }
    }

    /// Total attempts including the first one. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetch `url`, retrying 5xx responses and transport failures.
    pub async fn fetch(&self, url: &str, origin: &Origin) -> FetchResult {
        let mut attempt = 0;
        loop {
            let outcome = self.fetch_once(url, origin).await;

            if !outcome.is_retryable() || attempt + 1 >= self.max_attempts {
                return outcome.into_result(url);
            }

            let delay = self.backoff.delay(attempt);
            warn!(
                "Attempt {}/{} for {} failed; retrying in {}ms",
                attempt + 1,
                self.max_attempts,
                url,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch_once(&self, url: &str, origin: &Origin) -> Attempt {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Attempt::TimedOut {
                    latency: start.elapsed(),
                };
            }
            Err(e) => {
                return Attempt::Failed {
                    error: e.to_string(),
                };
            }
        };
        let latency = start.elapsed();

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let mut result = FetchResult::new(url.to_string(), status_code, latency, self.latency_threshold);

        if status_code == 200 {
            match response.text().await {
                Ok(body) => result.links = collect_links(&body, &final_url, url, origin),
                Err(e) => debug!("Could not read body of {}: {}", url, e),
            }
        }

        Attempt::Response(result)
    }
}

/// Normalized, deduplicated same-origin links of a page, minus self-links.
/// Hrefs resolve against `base` (the post-redirect URL); `page_url` is the
/// canonical URL of the page itself.
pub fn collect_links(body: &str, base: &str, page_url: &str, origin: &Origin) -> Vec<String> {
    let hrefs = match extract_hrefs(body) {
        Ok(hrefs) => hrefs,
        Err(e) => {
            debug!("Link extraction failed for {}: {}", page_url, e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    hrefs
        .iter()
        .filter_map(|href| origin.normalize(href, base))
        .filter(|link| link != page_url)
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
