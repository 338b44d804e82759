use regex::Regex;
use url::Url;

/// Recognises show detail pages by path: `/<marker>/<id>` where `<id>` is a
/// single segment. Query and fragment never take part. User listing pages
/// never match.
#[derive(Debug, Clone)]
pub struct ShowUrlPattern {
    detail: Regex,
    listings: Vec<Regex>,
}

impl ShowUrlPattern {
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        let marker = marker.trim_matches('/');
        let detail = Regex::new(&format!("/{}/([^/]+)", regex::escape(marker)))?;
        let listings = vec![
            Regex::new(r"/shows/?$")?,
            Regex::new(r"/user/[^/]+/shows")?,
        ];

        Ok(Self { detail, listings })
    }

    /// The show identifier captured from a detail-page URL
    pub fn identifier<'u>(&self, url: &'u Url) -> Option<&'u str> {
        let path = url.path();
        if self.is_listing(path) {
            return None;
        }

        self.detail
            .captures(path)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.identifier(url).is_some()
    }

    fn is_listing(&self, path: &str) -> bool {
        self.listings.iter().any(|re| re.is_match(path))
    }
}
