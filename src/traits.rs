//! Traits and configuration for site-agnostic show extraction

use async_trait::async_trait;

use crate::fetcher::FetchError;

/// A named selector tried during the anchor cascade
#[derive(Debug, Clone)]
pub struct SelectorRule {
    /// Short label used in logs
    pub name: &'static str,
    /// CSS selector, may contain a `{marker}` placeholder
    pub pattern: String,
}

impl SelectorRule {
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: pattern.to_string(),
        }
    }
}

/// Selector heuristics for locating show cards and their fields.
///
/// Every list is ordered by priority. Keeping the cascade as data means new
/// strategies are added here, not in the extractor's control flow.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    /// Anchor selectors tried in order, first non-empty match wins
    pub anchor_rules: Vec<SelectorRule>,
    /// Fallback scan over every anchor
    pub all_anchors: String,
    /// Card-like containers scanned when no anchor matched
    pub card_scan: String,
    /// Link looked up inside each scanned card
    pub card_link: String,
    /// Nearest enclosing card of an anchor
    pub card_container: String,
    pub title: String,
    pub image: String,
    pub date: String,
    pub status: String,
}

impl ExtractionRules {
    /// Substitute the configured path marker into every anchor rule
    pub fn for_marker(mut self, marker: &str) -> Self {
        for rule in &mut self.anchor_rules {
            rule.pattern = rule.pattern.replace("{marker}", marker);
        }
        self.card_scan = self.card_scan.replace("{marker}", marker);
        self
    }
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            anchor_rules: vec![
                SelectorRule::new("testid-anchor", r#"a[data-testid*="{marker}"]"#),
                SelectorRule::new("testid-container", r#"[data-testid*="{marker}"] a"#),
                SelectorRule::new("show-class", r#"[class*="show"] a, [class*="Show"] a"#),
                SelectorRule::new("marker-class", r#"[class*="{marker}"] a"#),
                SelectorRule::new("article", r#"article a, [role="article"] a"#),
                SelectorRule::new("card-class", r#"[class*="card"] a, [class*="Card"] a"#),
            ],
            all_anchors: "a[href]".to_string(),
            card_scan: r#"article, [role="article"], [class*="card"], [class*="Card"], [class*="show"], [class*="Show"], [class*="{marker}"], [class*="item"]"#.to_string(),
            card_link: "a[href]".to_string(),
            card_container: r#"article, [role="article"], [class*="card"], [class*="Card"], [class*="item"]"#.to_string(),
            title: r#"h2, h3, h4, [class*="title"], [class*="name"]"#.to_string(),
            image: "img".to_string(),
            date: r#"[class*="date"], [class*="time"], time, [datetime]"#.to_string(),
            status: r#"[class*="status"], [class*="badge"], [class*="label"]"#.to_string(),
        }
    }
}

/// Source of an HTML document for a target URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Display name for logs
    fn name(&self) -> &str;

    /// Obtain the document for `url`
    ///
    /// # Returns
    /// * `Result<String, FetchError>` - The raw HTML or the reason it could not be obtained
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
