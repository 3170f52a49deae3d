// Rendering of finished crawl reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tomograph_scanner::{CrawlReport, Health};
use uuid::Uuid;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Session metadata printed alongside a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanInfo {
    pub session_id: String,
    pub target: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanInfo {
    pub fn start(target: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            target: target.into(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}

fn section(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push('\n');
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push_str("\n\n");
}

fn health_label(health: Health) -> &'static str {
    match health {
        Health::Necrosis => "[NECROSIS]",
        Health::Blockage => "[BLOCKAGE]",
        Health::Healthy => "[HEALTHY] ",
    }
}

pub fn render_text_report(report: &CrawlReport, info: &ScanInfo) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push('\n');
    out.push_str("                        SITE TOMOGRAPH DIAGNOSTIC REPORT\n");
    out.push_str(RULE);
    out.push_str("\n\n");

    out.push_str(&format!("Session ID:   {}\n", info.session_id));
    out.push_str(&format!("Target:       {}\n", info.target));
    out.push_str(&format!(
        "Scan Date:    {}\n",
        info.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(duration) = info.duration_seconds() {
        out.push_str(&format!("Duration:     {} seconds\n", duration));
    }
    out.push('\n');

    section(&mut out, "SUMMARY");
    let summary = &report.summary;
    out.push_str(&format!("  Pages crawled:  {}\n", summary.total_pages));
    out.push_str(&format!("  Dead links:     {}\n", summary.dead_links));
    out.push_str(&format!("  Slow pages:     {}\n", summary.slow_pages));
    out.push_str(&format!("  Orphan pages:   {}\n", summary.orphan_pages));
    out.push('\n');

    if !report.pages.is_empty() {
        section(&mut out, "PAGES");
        for page in &report.pages {
            let status = match page.status_code {
                0 => "---".to_string(),
                code => code.to_string(),
            };
            out.push_str(&format!(
                "  {} {} {:>6}ms  depth {}  {}\n",
                health_label(page.status),
                status,
                page.latency,
                page.depth,
                page.url
            ));
            if let Some(ref error) = page.error {
                out.push_str(&wrap_text(error, 80, "        "));
            }
        }
        out.push('\n');
    }

    if !report.orphan_nodes.is_empty() {
        section(&mut out, "ORPHAN PAGES");
        for url in &report.orphan_nodes {
            out.push_str(&format!("  {}\n", url));
        }
        out.push('\n');
    }

    section(&mut out, "RECOMMENDATIONS");
    for (idx, advice) in report.recommendations.iter().enumerate() {
        let wrapped = wrap_text(advice, 80, "     ");
        out.push_str(&format!("  {}. {}", idx + 1, wrapped.trim_start()));
    }
    out.push('\n');

    out.push_str(RULE);
    out.push('\n');
    out.push_str("                                End of Report\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str("\nGenerated by Site Tomograph\n\n");

    out
}

pub fn render_json_report(report: &CrawlReport, info: &ScanInfo) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "metadata": {
            "generator": "Site Tomograph",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": Utc::now().to_rfc3339(),
            "format": "json"
        },
        "session": {
            "id": info.session_id,
            "target": info.target,
            "start_time": info.started_at.to_rfc3339(),
            "end_time": info.finished_at.map(|t| t.to_rfc3339()),
            "duration_seconds": info.duration_seconds()
        },
        "report": report
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn render_report(
    report: &CrawlReport,
    info: &ScanInfo,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(render_text_report(report, info)),
        ReportFormat::Json => render_json_report(report, info),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Greedy word wrap; every emitted line starts with `indent`.
pub fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();
    let usable = width.saturating_sub(indent.len()).max(1);

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.len() + word.len() + 1 > usable {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
