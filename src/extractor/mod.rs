//! Turns a parsed page into show records.
//!
//! Candidate anchors are located with a prioritized selector cascade:
//!
//! 1. each rule of [`ExtractionRules::anchor_rules`] in order, stopping at the
//!    first rule that yields at least one detail-page link
//! 2. every anchor on the page
//! 3. card-like containers, taking the first detail-page link inside each
//!
//! Fields are then read from the anchor's nearest card. A link whose href
//! cannot be resolved is logged and skipped; it never aborts the pass.

mod url_shape;

pub use url_shape::ShowUrlPattern;

use anyhow::Result;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::models::Show;
use crate::traits::ExtractionRules;

const CARD_TEXT_LIMIT: usize = 100;

pub struct Extractor {
    base: Url,
    pattern: ShowUrlPattern,
    anchor_rules: Vec<(&'static str, Selector)>,
    all_anchors: Selector,
    card_scan: Selector,
    card_link: Selector,
    card_container: Selector,
    title: Selector,
    image: Selector,
    date: Selector,
    status: Selector,
}

fn parse_selector(kind: &str, pattern: &str) -> Result<Selector> {
    Selector::parse(pattern)
        .map_err(|e| anyhow::anyhow!("Failed to parse {} selector {:?}: {:?}", kind, pattern, e))
}

impl Extractor {
    /// Compile the rules for `marker`, resolving relative links against `base_origin`
    pub fn new(rules: ExtractionRules, marker: &str, base_origin: &str) -> Result<Self> {
        let rules = rules.for_marker(marker);

        let base = Url::parse(base_origin)
            .map_err(|e| anyhow::anyhow!("Invalid base origin {:?}: {}", base_origin, e))?;
        let pattern = ShowUrlPattern::new(marker)?;

        let anchor_rules = rules
            .anchor_rules
            .iter()
            .map(|rule| Ok((rule.name, parse_selector(rule.name, &rule.pattern)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base,
            pattern,
            anchor_rules,
            all_anchors: parse_selector("anchor", &rules.all_anchors)?,
            card_scan: parse_selector("card scan", &rules.card_scan)?,
            card_link: parse_selector("card link", &rules.card_link)?,
            card_container: parse_selector("card container", &rules.card_container)?,
            title: parse_selector("title", &rules.title)?,
            image: parse_selector("image", &rules.image)?,
            date: parse_selector("date", &rules.date)?,
            status: parse_selector("status", &rules.status)?,
        })
    }

    /// Extract shows in document order. Duplicates are kept; see [`crate::dedupe`].
    pub fn extract(&self, document: &Html) -> Vec<Show> {
        let candidates = self.select_candidates(document);

        candidates
            .into_iter()
            .enumerate()
            .map(|(index, (link, url))| self.extract_show(link, url, index))
            .collect()
    }

    fn select_candidates<'a>(&self, document: &'a Html) -> Vec<(ElementRef<'a>, Url)> {
        for (name, selector) in &self.anchor_rules {
            let found: Vec<_> = document
                .select(selector)
                .filter_map(|link| Some((link, self.detail_url(link)?)))
                .collect();

            if !found.is_empty() {
                info!("Found {} show links with rule '{}'", found.len(), name);
                return found;
            }
            debug!("Rule '{}' matched no show links", name);
        }

        let found: Vec<_> = document
            .select(&self.all_anchors)
            .filter_map(|link| Some((link, self.detail_url(link)?)))
            .collect();
        if !found.is_empty() {
            info!("Found {} show links by scanning all anchors", found.len());
            return found;
        }

        let found: Vec<_> = document
            .select(&self.card_scan)
            .filter_map(|card| {
                card.select(&self.card_link)
                    .find_map(|link| Some((link, self.detail_url(link)?)))
            })
            .collect();
        if found.is_empty() {
            info!("No show links found on page");
        } else {
            info!("Found {} show links inside card containers", found.len());
        }
        found
    }

    /// Absolute URL of `link` if it points at a show detail page. The
    /// fragment is dropped so in-page anchors of one show share a url.
    fn detail_url(&self, link: ElementRef) -> Option<Url> {
        let href = link.value().attr("href")?.trim();
        if href.is_empty() {
            return None;
        }

        let mut url = match self.base.join(href) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping link with unresolvable href {:?}: {}", href, e);
                return None;
            }
        };
        url.set_fragment(None);

        self.pattern.matches(&url).then_some(url)
    }

    fn extract_show(&self, link: ElementRef, url: Url, index: usize) -> Show {
        let card = self.card_for(link);

        let title = card
            .select(&self.title)
            .next()
            .and_then(|el| non_empty(normalized_text(el)))
            .or_else(|| non_empty(normalized_text(link)))
            .or_else(|| {
                non_empty(normalized_text(card).chars().take(CARD_TEXT_LIMIT).collect())
            })
            .unwrap_or_else(|| format!("Show {}", index + 1));

        let image = card
            .select(&self.image)
            .next()
            .or_else(|| link.select(&self.image).next())
            .and_then(image_source)
            .map(|src| self.resolve(src));

        let date = card.select(&self.date).next().and_then(|el| {
            non_empty(normalized_text(el)).or_else(|| {
                el.value()
                    .attr("datetime")
                    .and_then(|dt| non_empty(dt.trim().to_string()))
            })
        });

        let status = card
            .select(&self.status)
            .next()
            .and_then(|el| non_empty(normalized_text(el).to_lowercase()));

        let id = self
            .pattern
            .identifier(&url)
            .map_or_else(|| format!("show-{index}"), str::to_string);

        Show {
            id,
            title,
            url: url.into(),
            image,
            date,
            status,
            scraped_at: Utc::now(),
        }
    }

    /// Closest card around `link` (the link itself included), else its
    /// parent element, else the link alone
    fn card_for<'a>(&self, link: ElementRef<'a>) -> ElementRef<'a> {
        if self.card_container.matches(&link) {
            return link;
        }

        link.ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| self.card_container.matches(el))
            .or_else(|| link.parent().and_then(ElementRef::wrap))
            .unwrap_or(link)
    }

    fn resolve(&self, src: &str) -> String {
        self.base
            .join(src)
            .map_or_else(|_| src.to_string(), |u| u.to_string())
    }
}

/// `src`, then lazy-load `data-src`, then the first `srcset` candidate
fn image_source<'a>(img: ElementRef<'a>) -> Option<&'a str> {
    let attr = |name: &str| {
        img.value()
            .attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    attr("src").or_else(|| attr("data-src")).or_else(|| {
        attr("srcset")
            .and_then(|set| set.split(',').next())
            .and_then(|entry| entry.split_whitespace().next())
    })
}

fn normalized_text(el: ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
