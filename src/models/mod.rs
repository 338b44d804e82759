//! Data models for scraped shows and storefront metafield payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A live show listing scraped from a Whatnot user page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: String,
    pub title: String,
    /// Absolute detail-page URL, the identity of a show
    pub url: String,
    pub image: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl Show {
    /// Column order used by the CSV export
    pub const CSV_HEADER: [&'static str; 7] =
        ["id", "title", "url", "image", "date", "status", "scrapedAt"];

    pub fn to_csv_record(&self) -> [String; 7] {
        [
            self.id.clone(),
            self.title.clone(),
            self.url.clone(),
            self.image.clone().unwrap_or_default(),
            self.date.clone().unwrap_or_default(),
            self.status.clone().unwrap_or_default(),
            self.scraped_at
                .to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
        ]
    }
}

/// Shopify metafield envelope wrapping the JSON-encoded show list
#[derive(Debug, Serialize, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    /// JSON array of shows, encoded as a string
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}
