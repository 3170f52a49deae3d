use crate::backoff::ExponentialBackoff;
use crate::config::CrawlConfig;
use crate::error::{Result, ScanError};
use crate::event::CrawlEvent;
use crate::fetch::Fetcher;
use crate::graph::CrawlGraph;
use crate::normalize::Origin;
use crate::result::FetchResult;
use crate::robots::{RobotsGate, agent_token};
use reqwest::Client;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// Event stream sender handed to [`Crawler::crawl`].
pub type EventSender = UnboundedSender<CrawlEvent>;

/// How a crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The queue ran dry
    Completed,
    /// The page cap was hit with work still queued
    LimitReached,
    /// The event consumer went away
    Cancelled,
}

#[derive(Debug)]
pub struct CrawlOutcome {
    pub graph: CrawlGraph,
    pub termination: Termination,
}

struct QueueEntry {
    url: String,
    depth: usize,
    parent: Option<String>,
}

/// Breadth-first, same-origin crawl scheduler.
pub struct Crawler {
    config: CrawlConfig,
    origin: Origin,
    start_url: String,
    fetcher: Fetcher,
    permits: Arc<Semaphore>,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let origin = Origin::parse(&config.start_url)?;
        let start_url = origin
            .normalize(&config.start_url, &config.start_url)
            .ok_or_else(|| ScanError::InvalidUrl(config.start_url.clone()))?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout / 2)
            .pool_max_idle_per_host(config.max_concurrent.max(1))
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        let fetcher = Fetcher::new(client, config.latency_threshold)
            .with_max_attempts(config.max_retries)
            .with_backoff(ExponentialBackoff::new(config.retry_base_delay));

        Ok(Self {
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            config,
            origin,
            start_url,
            fetcher,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Canonical form of the configured start URL.
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// Run the crawl, streaming events into `events`.
    ///
    /// Dropping the receiving half cancels the crawl at the next suspension
    /// point; the outcome is then [`Termination::Cancelled`].
    pub async fn crawl(&self, events: &EventSender) -> Result<CrawlOutcome> {
        info!(
            "Starting crawl of {} (depth {}, max {} pages)",
            self.start_url, self.config.max_depth, self.config.max_pages
        );

        let mut graph = CrawlGraph::new(self.start_url.clone());

        let mut robots = if self.config.respect_robots {
            RobotsGate::new()
        } else {
            RobotsGate::disabled()
        }
        .with_agent(agent_token(&self.config.user_agent));
        let loaded = tokio::select! {
            _ = robots.load(self.fetcher.client(), &self.origin, self.config.robots_timeout) => true,
            _ = events.closed() => false,
        };
        if !loaded {
            return Ok(Self::cancelled(graph));
        }

        let mut queue = VecDeque::from([QueueEntry {
            url: self.start_url.clone(),
            depth: 0,
            parent: None,
        }]);

        let termination = loop {
            if queue.is_empty() {
                break Termination::Completed;
            }
            if graph.total_fetched() >= self.config.max_pages {
                let message = format!(
                    "Reached the limit of {} pages; {} queued URL(s) were not crawled",
                    self.config.max_pages,
                    queue.len()
                );
                info!("{}", message);
                if !emit(events, CrawlEvent::LimitReached { message }) {
                    break Termination::Cancelled;
                }
                break Termination::LimitReached;
            }
            let Some(entry) = queue.pop_front() else {
                break Termination::Completed;
            };

            if graph.is_visited(&entry.url) {
                continue;
            }
            if !robots.can_fetch(&entry.url) {
                debug!("robots.txt disallows {}", entry.url);
                continue;
            }
            let Some(id) = graph.discover(&entry.url, entry.depth) else {
                continue;
            };

            let discovered = CrawlEvent::NodeDiscovered {
                id,
                url: entry.url.clone(),
                depth: entry.depth,
            };
            if !emit(events, discovered) {
                break Termination::Cancelled;
            }

            if let Some(parent_id) = entry.parent.as_deref().and_then(|p| graph.id_of(p))
                && graph.node(parent_id).is_some_and(|n| n.is_recorded())
                && graph.link(parent_id, id)
                && !emit(events, CrawlEvent::LinkDiscovered { source: parent_id, target: id })
            {
                break Termination::Cancelled;
            }

            let fetched = tokio::select! {
                result = self.fetch_with_permit(&entry.url) => Some(result),
                _ = events.closed() => None,
            };
            let Some(result) = fetched else {
                break Termination::Cancelled;
            };
            let result = result?;

            let update = CrawlEvent::DiagnosisUpdate {
                id,
                url: entry.url.clone(),
                status_code: result.status_code,
                latency: result.latency_ms,
                status: result.health,
            };
            let links = if entry.depth < self.config.max_depth {
                result.links.clone()
            } else {
                Vec::new()
            };
            graph.record(id, result);
            if !emit(events, update) {
                break Termination::Cancelled;
            }

            for link in links {
                if !graph.is_visited(&link) {
                    queue.push_back(QueueEntry {
                        url: link,
                        depth: entry.depth + 1,
                        parent: Some(entry.url.clone()),
                    });
                }
            }

            if !self.pause(events).await {
                break Termination::Cancelled;
            }
        };

        match termination {
            Termination::Cancelled => info!("Crawl of {} cancelled", self.start_url),
            _ => info!(
                "Crawl of {} finished ({:?}). Visited {} pages",
                self.start_url,
                termination,
                graph.total_fetched()
            ),
        }

        if termination == Termination::Cancelled {
            return Ok(Self::cancelled(graph));
        }
        Ok(CrawlOutcome { graph, termination })
    }

    async fn fetch_with_permit(&self, url: &str) -> Result<FetchResult> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ScanError::PermitPoolClosed)?;
        Ok(self.fetcher.fetch(url, &self.origin).await)
    }

    /// Inter-step delay. Returns false if the consumer went away meanwhile.
    async fn pause(&self, events: &EventSender) -> bool {
        if self.config.step_delay.is_zero() {
            return !events.is_closed();
        }
        tokio::select! {
            _ = tokio::time::sleep(self.config.step_delay) => true,
            _ = events.closed() => false,
        }
    }

    /// Partial state of a cancelled crawl is not reported.
    fn cancelled(graph: CrawlGraph) -> CrawlOutcome {
        CrawlOutcome {
            graph: CrawlGraph::new(graph.start_url()),
            termination: Termination::Cancelled,
        }
    }
}

fn emit(events: &EventSender, event: CrawlEvent) -> bool {
    events.send(event).is_ok()
}
