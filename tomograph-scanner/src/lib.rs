pub mod analysis;
pub mod backoff;
pub mod config;
pub mod crawler;
pub mod error;
pub mod event;
pub mod extract;
pub mod fetch;
pub mod graph;
pub mod normalize;
pub mod result;
pub mod robots;

pub use analysis::{CrawlReport, PageRecord, generate_report};
pub use config::CrawlConfig;
pub use crawler::{CrawlOutcome, Crawler, EventSender, Termination};
pub use error::ScanError;
pub use event::CrawlEvent;
pub use graph::{CrawlGraph, CrawlStats};
pub use normalize::{Origin, normalize_url};
pub use result::{FetchResult, Health};
