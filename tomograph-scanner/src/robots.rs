use crate::normalize::Origin;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Product token matched against `User-agent` groups in robots.txt.
pub const ROBOTS_AGENT: &str = "SiteTomograph";

/// Product token of a `User-Agent` header: the text before the first `/` or
/// space. Falls back to [`ROBOTS_AGENT`] when there is none.
pub fn agent_token(user_agent: &str) -> &str {
    let token = user_agent
        .trim()
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    if token.is_empty() { ROBOTS_AGENT } else { token }
}

/// The policy a loaded gate applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsPolicy {
    /// Compliance switched off by configuration.
    Disabled,
    /// robots.txt could not be obtained; everything is allowed.
    AllowAll { reason: String },
    /// robots.txt body to evaluate per URL.
    Rules { body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsState {
    Unloaded,
    Loaded(RobotsPolicy),
}

/// Loads robots.txt once per crawl and answers `can_fetch` afterwards.
#[derive(Debug, Clone)]
pub struct RobotsGate {
    state: RobotsState,
    agent: String,
}

impl RobotsGate {
    pub fn new() -> Self {
        Self {
            state: RobotsState::Unloaded,
            agent: ROBOTS_AGENT.to_string(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            state: RobotsState::Loaded(RobotsPolicy::Disabled),
            agent: ROBOTS_AGENT.to_string(),
        }
    }

    /// Build a gate directly from a robots.txt body.
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            state: RobotsState::Loaded(RobotsPolicy::Rules { body: body.into() }),
            agent: ROBOTS_AGENT.to_string(),
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }

    pub fn state(&self) -> &RobotsState {
        &self.state
    }

    pub fn policy(&self) -> Option<&RobotsPolicy> {
        match &self.state {
            RobotsState::Loaded(policy) => Some(policy),
            RobotsState::Unloaded => None,
        }
    }

    /// Fetch `{origin}/robots.txt`. Any failure falls back to allow-all.
    /// Loading an already-loaded gate is a no-op.
    pub async fn load(&mut self, client: &Client, origin: &Origin, timeout: Duration) {
        if let RobotsState::Loaded(_) = self.state {
            return;
        }

        let robots_url = origin.robots_url();
        debug!("Loading {}", robots_url);

        let policy = match client.get(&robots_url).timeout(timeout).send().await {
            Ok(response) if response.status().as_u16() == 200 => match response.text().await {
                Ok(body) => RobotsPolicy::Rules { body },
                Err(e) => RobotsPolicy::AllowAll {
                    reason: format!("failed to read robots.txt body: {}", e),
                },
            },
            Ok(response) => RobotsPolicy::AllowAll {
                reason: format!("robots.txt returned status {}", response.status().as_u16()),
            },
            Err(e) if e.is_timeout() => RobotsPolicy::AllowAll {
                reason: "robots.txt request timed out".to_string(),
            },
            Err(e) => RobotsPolicy::AllowAll {
                reason: format!("robots.txt request failed: {}", e),
            },
        };

        match &policy {
            RobotsPolicy::Rules { .. } => info!("Loaded robots.txt from {}", robots_url),
            RobotsPolicy::AllowAll { reason } => {
                warn!("Allowing all URLs: {}", reason)
            }
            RobotsPolicy::Disabled => {}
        }

        self.state = RobotsState::Loaded(policy);
    }

    pub fn can_fetch(&self, url: &str) -> bool {
        match &self.state {
            RobotsState::Loaded(RobotsPolicy::Rules { body }) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, &self.agent, url)
            }
            RobotsState::Loaded(RobotsPolicy::Disabled | RobotsPolicy::AllowAll { .. }) => true,
            RobotsState::Unloaded => {
                debug!("robots.txt consulted before loading; allowing {}", url);
                true
            }
        }
    }
}

impl Default for RobotsGate {
    fn default() -> Self {
        Self::new()
    }
}
