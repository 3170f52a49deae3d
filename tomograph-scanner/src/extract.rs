use crate::error::{Result, ScanError};
use scraper::{Html, Selector};

/// Raw `href` values of every anchor in `html`, in document order.
pub fn extract_hrefs(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]")
        .map_err(|e| ScanError::ParseError(format!("anchor selector: {}", e)))?;

    Ok(document
        .select(&link_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect())
}
