use crate::analysis::CrawlReport;
use crate::result::Health;
use serde::{Deserialize, Serialize};

/// Records streamed to the consumer while a crawl runs.
///
/// The engine emits the first four variants; `ScanComplete` and `Error`
/// close a session and are emitted by whoever drives the crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    NodeDiscovered {
        id: usize,
        url: String,
        depth: usize,
    },
    LinkDiscovered {
        source: usize,
        target: usize,
    },
    DiagnosisUpdate {
        id: usize,
        url: String,
        status_code: u16,
        latency: u64,
        status: Health,
    },
    LimitReached {
        message: String,
    },
    ScanComplete {
        report: CrawlReport,
    },
    Error {
        message: String,
    },
}

impl CrawlEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            CrawlEvent::NodeDiscovered { .. } => "node_discovered",
            CrawlEvent::LinkDiscovered { .. } => "link_discovered",
            CrawlEvent::DiagnosisUpdate { .. } => "diagnosis_update",
            CrawlEvent::LimitReached { .. } => "limit_reached",
            CrawlEvent::ScanComplete { .. } => "scan_complete",
            CrawlEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CrawlEvent::ScanComplete { .. } | CrawlEvent::Error { .. })
    }
}
