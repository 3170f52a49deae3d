use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tomograph_core::config::{CrawlOverrides, CrawlSettings, resolve_config};
use tomograph_core::crawl::{CrawlOptions, execute_crawl, extract_url_path};
use tomograph_core::rate_limit::RateLimiter;
use tomograph_core::report::{ReportFormat, ScanInfo, render_report, save_report};
use tomograph_core::security::{normalize_scan_url, sanitize_url_for_display, validate_url_safety};
use tomograph_scanner::{CrawlEvent, CrawlReport, Health};

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&String>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        parse_url_line(url)
            .map(|u| vec![u])
            .ok_or_else(|| format!("Invalid URL '{}'", url))
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file. Blank lines and `#` comments are skipped.
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a crawl target, assuming https:// when no scheme is given
pub fn parse_url_line(line: &str) -> Option<String> {
    match normalize_scan_url(line) {
        Ok(url) => Some(url),
        Err(e) => {
            eprintln!("{} Skipping invalid URL '{}': {}", "⚠".yellow(), line, e);
            None
        }
    }
}

/// Command-line flags that override config file values
pub fn crawl_overrides(args: &ArgMatches) -> CrawlOverrides {
    CrawlOverrides {
        max_depth: args.get_one::<usize>("max-depth").copied(),
        max_pages: args.get_one::<usize>("max-pages").copied(),
        max_concurrent: args.get_one::<usize>("concurrency").copied(),
        latency_threshold_ms: args.get_one::<u64>("latency-threshold").copied(),
        step_delay_ms: args.get_one::<u64>("delay").copied(),
        max_retries: args.get_one::<u32>("retries").copied(),
        ignore_robots: args.get_flag("ignore-robots"),
    }
}

/// One human-readable line per finished page
pub fn format_diagnosis_line(event: &CrawlEvent) -> Option<String> {
    let CrawlEvent::DiagnosisUpdate {
        url,
        status_code,
        latency,
        status,
        ..
    } = event
    else {
        return None;
    };

    let code = match status_code {
        0 => "---".to_string(),
        code => code.to_string(),
    };
    let path = extract_url_path(url);
    let line = match status {
        Health::Healthy => format!("{} {} {:>6}ms  {}", "✓".green(), code.green(), latency, path),
        Health::Blockage => format!(
            "{} {} {:>6}ms  {}",
            "◷".yellow(),
            code.yellow(),
            latency.to_string().yellow().bold(),
            path
        ),
        Health::Necrosis => format!("{} {} {:>6}ms  {}", "✗".red(), code.red().bold(), latency, path),
    };
    Some(line)
}

pub fn format_event_json(event: &CrawlEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

fn new_spinner(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Drive one crawl session, rendering its events as they arrive.
///
/// Returns `Ok(None)` if the user interrupted the crawl.
async fn run_session(
    url: &str,
    settings: &CrawlSettings,
    limiter: &Arc<RateLimiter>,
    stream_events: bool,
    quiet: bool,
) -> anyhow::Result<Option<CrawlReport>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = CrawlOptions::new(url).with_settings(settings.clone());
    let session = tokio::spawn(execute_crawl(options, Arc::clone(limiter), tx));

    let spinner = new_spinner(quiet || stream_events);
    spinner.set_message(format!("Crawling {}", sanitize_url_for_display(url)));
    let mut diagnosed = 0usize;
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                if stream_events {
                    spinner.suspend(|| match format_event_json(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => eprintln!("Could not encode event: {}", e),
                    });
                } else if let Some(line) = format_diagnosis_line(&event) {
                    diagnosed += 1;
                    spinner.println(line);
                    spinner.set_message(format!("Crawling... {} pages diagnosed", diagnosed));
                } else if let CrawlEvent::LimitReached { message } = &event {
                    spinner.println(format!("{} {}", "⚠".yellow(), message));
                }
                if event.is_terminal() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                interrupted = true;
                break;
            }
        }
    }

    // Dropping the receiver is what stops the engine
    drop(rx);
    let outcome = session.await.context("crawl session task failed")?;
    spinner.finish_and_clear();

    if interrupted {
        eprintln!("{} Crawl interrupted", "⚠".yellow());
        return Ok(None);
    }
    Ok(outcome?)
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let urls = load_urls_from_source(
        sub_matches.get_one::<String>("url"),
        sub_matches.get_one::<PathBuf>("hosts-file"),
    )
    .map_err(|e| anyhow!(e))?;

    let config_path = sub_matches.get_one::<PathBuf>("config");
    let mut config = resolve_config(config_path.map(PathBuf::as_path))
        .context("failed to load configuration")?;
    crawl_overrides(sub_matches).apply(&mut config.crawl);

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = sub_matches.get_one::<PathBuf>("output");
    let stream_events = sub_matches.get_flag("events");
    let limiter = Arc::new(config.limits.batch_rate_limiter(urls.len()));

    let mut rendered = Vec::new();
    let mut failures = 0usize;

    for (idx, url) in urls.iter().enumerate() {
        if urls.len() > 1 && !quiet {
            eprintln!(
                "{} Crawling host {}/{}: {}",
                "→".blue(),
                idx + 1,
                urls.len(),
                sanitize_url_for_display(url).bright_white()
            );
        }

        let mut info = ScanInfo::start(sanitize_url_for_display(url));
        match run_session(url, &config.crawl, &limiter, stream_events, quiet).await {
            Ok(Some(report)) => {
                info.finish();
                if !stream_events {
                    rendered.push(render_report(&report, &info, format)?);
                }
            }
            Ok(None) => break,
            Err(e) => {
                failures += 1;
                eprintln!("{} Failed to crawl {}: {:#}", "✗".red().bold(), sanitize_url_for_display(url), e);
            }
        }
    }

    if !rendered.is_empty() {
        let content = rendered.join("\n");
        match output {
            Some(path) => {
                save_report(&content, path)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                if !quiet {
                    eprintln!("{} Report saved to {}", "✓".green().bold(), path.display());
                }
            }
            None => print!("{}", content),
        }
    }

    if failures == urls.len() {
        return Err(anyhow!("no crawl completed"));
    }
    Ok(())
}

pub async fn handle_check(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    let raw = sub_matches
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("--url is required"))?;

    let url = normalize_scan_url(raw)?;
    match validate_url_safety(&url).await {
        Ok(parsed) => {
            println!(
                "{} {} may be crawled",
                "✓".green().bold(),
                sanitize_url_for_display(parsed.as_str())
            );
            Ok(())
        }
        Err(e) => Err(anyhow!("{} refused: {}", sanitize_url_for_display(&url), e)),
    }
}
