use crate::result::{FetchResult, Health};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A page discovered during the crawl. `result` is filled exactly once,
/// when its fetch completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageNode {
    pub id: usize,
    pub url: String,
    pub depth: usize,
    pub result: Option<FetchResult>,
}

impl PageNode {
    pub fn is_recorded(&self) -> bool {
        self.result.is_some()
    }

    pub fn health(&self) -> Option<Health> {
        self.result.as_ref().map(|r| r.health)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub total_pages: usize,
    pub dead_links: usize,
    pub slow_pages: usize,
    pub orphan_pages: usize,
}

/// Per-crawl state: nodes in an arena indexed by id, edges as id pairs.
#[derive(Debug, Clone, Default)]
pub struct CrawlGraph {
    start_url: String,
    nodes: Vec<PageNode>,
    edges: Vec<LinkEdge>,
    /// URL to node id; holding a key means the URL was visited.
    index: HashMap<String, usize>,
    stats: CrawlStats,
}

impl CrawlGraph {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            ..Default::default()
        }
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Mark `url` visited and create its node. Returns `None` if it was
    /// already visited.
    pub fn discover(&mut self, url: &str, depth: usize) -> Option<usize> {
        if self.index.contains_key(url) {
            return None;
        }

        let id = self.nodes.len();
        self.nodes.push(PageNode {
            id,
            url: url.to_string(),
            depth,
            result: None,
        });
        self.index.insert(url.to_string(), id);
        Some(id)
    }

    pub fn id_of(&self, url: &str) -> Option<usize> {
        self.index.get(url).copied()
    }

    pub fn node(&self, id: usize) -> Option<&PageNode> {
        self.nodes.get(id)
    }

    /// Record an edge between two existing nodes. Duplicate and dangling
    /// edges are refused.
    pub fn link(&mut self, source: usize, target: usize) -> bool {
        if source >= self.nodes.len() || target >= self.nodes.len() {
            return false;
        }
        let edge = LinkEdge { source, target };
        if self.edges.contains(&edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Store the fetch outcome for `id` and update the counters. A node is
    /// only recorded once; later calls are ignored.
    pub fn record(&mut self, id: usize, result: FetchResult) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if node.result.is_some() {
            return false;
        }

        self.stats.total_pages += 1;
        match result.health {
            Health::Necrosis => self.stats.dead_links += 1,
            Health::Blockage => self.stats.slow_pages += 1,
            Health::Healthy => {}
        }
        node.result = Some(result);
        true
    }

    pub fn nodes(&self) -> &[PageNode] {
        &self.nodes
    }

    pub fn recorded(&self) -> impl Iterator<Item = &PageNode> {
        self.nodes.iter().filter(|n| n.is_recorded())
    }

    pub fn edges(&self) -> &[LinkEdge] {
        &self.edges
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn total_fetched(&self) -> usize {
        self.stats.total_pages
    }
}
