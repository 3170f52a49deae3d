use crate::config::CrawlSettings;
use crate::error::CoreError;
use crate::rate_limit::RateLimiter;
use crate::security::{
    normalize_scan_url, sanitize_error_message, sanitize_url_for_display, validate_url_safety,
};
use std::sync::Arc;
use tomograph_scanner::{
    CrawlConfig, CrawlEvent, CrawlReport, Crawler, EventSender, Termination, generate_report,
};
use tracing::{info, warn};
use url::Url;

/// Options for a single crawl session
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Target as typed by the user; validated before use
    pub url: String,
    /// Identifies the requester to the rate limiter
    pub client_id: String,
    pub settings: CrawlSettings,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_id: "local".to_string(),
            settings: CrawlSettings::default(),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_settings(mut self, settings: CrawlSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Run one crawl session end to end.
///
/// The target is validated, checked against the SSRF rules and admitted by
/// the rate limiter before anything is fetched. Every session ends with
/// exactly one terminal event on `events` (`scan_complete` or `error`),
/// unless the consumer went away first, in which case `Ok(None)` is returned.
pub async fn execute_crawl(
    options: CrawlOptions,
    limiter: Arc<RateLimiter>,
    events: EventSender,
) -> Result<Option<CrawlReport>, CoreError> {
    let CrawlOptions {
        url,
        client_id,
        settings,
    } = options;

    let admitted = async {
        let target = normalize_scan_url(&url)?;
        let target = validate_url_safety(&target).await?;
        let permit = limiter.acquire(&client_id)?;
        Ok::<_, CoreError>((target, permit))
    }
    .await;

    let (target, _permit) = match admitted {
        Ok(admitted) => admitted,
        Err(e) => {
            warn!("Refused crawl of {}: {}", sanitize_url_for_display(&url), e);
            let _ = events.send(CrawlEvent::Error {
                message: e.to_string(),
            });
            return Err(e);
        }
    };

    run_admitted_crawl(settings.to_crawl_config(target.as_str()), events).await
}

/// Crawl a target that has already passed the safety and admission gates.
///
/// The engine runs on its own task so that a panic inside it is contained
/// and reported as an `error` event like any other fault.
pub async fn run_admitted_crawl(
    config: CrawlConfig,
    events: EventSender,
) -> Result<Option<CrawlReport>, CoreError> {
    let latency_threshold = config.latency_threshold;
    info!("Starting crawl of {}", sanitize_url_for_display(&config.start_url));

    let task_events = events.clone();
    let handle = tokio::spawn(async move {
        let crawler = Crawler::new(config)?;
        crawler.crawl(&task_events).await
    });

    let failure = match handle.await {
        Ok(Ok(outcome)) => {
            if outcome.termination == Termination::Cancelled {
                return Ok(None);
            }
            let report = generate_report(&outcome.graph, latency_threshold);
            let _ = events.send(CrawlEvent::ScanComplete {
                report: report.clone(),
            });
            return Ok(Some(report));
        }
        Ok(Err(e)) => CoreError::Scan(e),
        Err(e) => CoreError::Join(e),
    };

    let message = sanitize_error_message(&failure.to_string());
    warn!("Crawl failed: {}", message);
    let _ = events.send(CrawlEvent::Error { message });
    Err(failure)
}
