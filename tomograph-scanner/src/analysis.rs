// Post-crawl graph analysis: orphans, page ordering, recommendations

use crate::graph::{CrawlGraph, CrawlStats};
use crate::result::Health;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: usize,
    pub url: String,
    pub depth: usize,
    pub status_code: u16,
    pub latency: u64,
    pub status: Health,
    pub outbound_links: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub summary: CrawlStats,
    pub pages: Vec<PageRecord>,
    pub orphan_nodes: Vec<String>,
    pub recommendations: Vec<String>,
}

impl CrawlReport {
    pub fn pages_with(&self, health: Health) -> impl Iterator<Item = &PageRecord> {
        self.pages.iter().filter(move |p| p.status == health)
    }
}

/// Summarize a finished crawl.
pub fn generate_report(graph: &CrawlGraph, latency_threshold: Duration) -> CrawlReport {
    let orphan_nodes = find_orphans(graph);

    let mut summary = graph.stats().clone();
    summary.orphan_pages = orphan_nodes.len();

    let mut pages: Vec<PageRecord> = graph
        .recorded()
        .filter_map(|node| {
            let result = node.result.as_ref()?;
            Some(PageRecord {
                id: node.id,
                url: node.url.clone(),
                depth: node.depth,
                status_code: result.status_code,
                latency: result.latency_ms,
                status: result.health,
                outbound_links: result.links.len(),
                error: result.error.clone(),
            })
        })
        .collect();
    pages.sort_by_key(|p| (p.status.priority(), p.depth, p.id));

    let recommendations = recommendations(&summary, latency_threshold);

    CrawlReport {
        summary,
        pages,
        orphan_nodes,
        recommendations,
    }
}

/// Recorded nodes, other than the start page, that no recorded edge points at.
pub fn find_orphans(graph: &CrawlGraph) -> Vec<String> {
    let mut in_degree: HashMap<usize, usize> = graph.recorded().map(|n| (n.id, 0)).collect();
    for edge in graph.edges() {
        if let Some(count) = in_degree.get_mut(&edge.target) {
            *count += 1;
        }
    }

    graph
        .recorded()
        .filter(|n| n.url != graph.start_url())
        .filter(|n| in_degree.get(&n.id).copied().unwrap_or(0) == 0)
        .map(|n| n.url.clone())
        .collect()
}

pub fn recommendations(summary: &CrawlStats, latency_threshold: Duration) -> Vec<String> {
    let mut advice = Vec::new();

    if summary.dead_links > 0 {
        advice.push(format!(
            "Found {} dead link(s); repair or remove them.",
            summary.dead_links
        ));
    }

    if summary.slow_pages > 0 {
        advice.push(format!(
            "Found {} slow page(s) (> {}ms); optimize their response time.",
            summary.slow_pages,
            latency_threshold.as_millis()
        ));
    }

    if summary.orphan_pages > 0 {
        advice.push(format!(
            "Found {} orphan page(s); add internal links pointing to them.",
            summary.orphan_pages
        ));
    }

    if advice.is_empty() {
        advice.push("Site structure is healthy; no significant problems found.".to_string());
    }

    advice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::FetchResult;

    const THRESHOLD: Duration = Duration::from_millis(2000);

    fn record(graph: &mut CrawlGraph, url: &str, depth: usize, status: u16, latency_ms: u64) -> usize {
        let id = graph.discover(url, depth).unwrap();
        graph.record(
            id,
            FetchResult::new(url.to_string(), status, Duration::from_millis(latency_ms), THRESHOLD),
        );
        id
    }

    #[test]
    fn test_empty_crawl_is_healthy() {
        let graph = CrawlGraph::new("https://example.com");
        let report = generate_report(&graph, THRESHOLD);

        assert_eq!(report.summary, CrawlStats::default());
        assert!(report.pages.is_empty());
        assert!(report.orphan_nodes.is_empty());
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("healthy"));
    }

    #[test]
    fn test_pages_sorted_worst_first_then_shallow_first() {
        let mut graph = CrawlGraph::new("https://example.com");
        let root = record(&mut graph, "https://example.com", 0, 200, 10);
        let ok = record(&mut graph, "https://example.com/ok", 1, 200, 10);
        let slow_deep = record(&mut graph, "https://example.com/a/slow", 2, 200, 3000);
        let dead_deep = record(&mut graph, "https://example.com/a/dead", 2, 404, 10);
        let dead_shallow = record(&mut graph, "https://example.com/gone", 1, 500, 10);
        for target in [ok, dead_shallow] {
            graph.link(root, target);
        }
        graph.link(ok, slow_deep);
        graph.link(ok, dead_deep);

        let report = generate_report(&graph, THRESHOLD);
        let order: Vec<usize> = report.pages.iter().map(|p| p.id).collect();
        assert_eq!(order, vec![dead_shallow, dead_deep, slow_deep, root, ok]);
        assert_eq!(report.pages_with(Health::Necrosis).count(), 2);
    }

    #[test]
    fn test_orphans_exclude_start_node() {
        let mut graph = CrawlGraph::new("https://example.com");
        let root = record(&mut graph, "https://example.com", 0, 200, 10);
        let linked = record(&mut graph, "https://example.com/linked", 1, 200, 10);
        record(&mut graph, "https://example.com/island", 1, 200, 10);
        graph.link(root, linked);

        assert_eq!(find_orphans(&graph), vec!["https://example.com/island".to_string()]);

        let report = generate_report(&graph, THRESHOLD);
        assert_eq!(report.summary.orphan_pages, 1);
        assert!(report.recommendations.iter().any(|r| r.contains("orphan")));
    }

    #[test]
    fn test_recommendation_order() {
        let summary = CrawlStats {
            total_pages: 10,
            dead_links: 3,
            slow_pages: 2,
            orphan_pages: 1,
        };
        let advice = recommendations(&summary, THRESHOLD);

        assert_eq!(advice.len(), 3);
        assert!(advice[0].contains("3 dead"));
        assert!(advice[1].contains("2 slow") && advice[1].contains("2000ms"));
        assert!(advice[2].contains("1 orphan"));
    }

    #[test]
    fn test_only_nonzero_categories_fire() {
        let summary = CrawlStats {
            total_pages: 4,
            dead_links: 0,
            slow_pages: 2,
            orphan_pages: 0,
        };
        let advice = recommendations(&summary, THRESHOLD);
        assert_eq!(advice.len(), 1);
        assert!(advice[0].contains("slow"));
    }
}
