pub mod config;
pub mod crawl;
pub mod error;
pub mod rate_limit;
pub mod report;
pub mod security;

pub use crawl::{CrawlOptions, execute_crawl, run_admitted_crawl};
pub use error::{CoreError, RateLimitError, SecurityError};
pub use rate_limit::{RateLimiter, ScanPermit};

const BANNER: &str = r#"
    ╔══════════════════════════════════════════════════════════╗
    ║   ▀█▀ █▀█ █▀▄▀█ █▀█ █▀▀ █▀█ ▄▀█ █▀█ █░█                  ║
    ║   ░█░ █▄█ █░▀░█ █▄█ █▄█ █▀▄ █▀█ █▀▀ █▀█                  ║
    ║                                                          ║
    ║        site structure & link health diagnostics          ║
    ╚══════════════════════════════════════════════════════════╝
"#;

/// Printed to stderr so reports on stdout stay machine-readable.
pub fn print_banner() {
    eprintln!("{}", BANNER);
    eprintln!("    v{}\n", env!("CARGO_PKG_VERSION"));
}
