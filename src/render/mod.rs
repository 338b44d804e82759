//! # Storefront Rendering
//!
//! Turns a previously saved `shows.json` into content for a Shopify store:
//!
//! - **`shopify-html.html`**: standalone page with one card per show
//! - **`shopify-shows.liquid`**: theme section with the show list inlined as JSON
//! - **`shopify-metafields.json`**: metafield envelope for the Admin API
//!
//! Every artefact is rendered in memory before the first file is written, so
//! bad input never produces any output. A write failure part way through can
//! still leave the earlier files on disk.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::models::{Metafield, Show};
use crate::persist::JSON_FILE;

pub const HTML_FILE: &str = "shopify-html.html";
pub const LIQUID_FILE: &str = "shopify-shows.liquid";
pub const METAFIELD_FILE: &str = "shopify-metafields.json";

const METAFIELD_NAMESPACE: &str = "whatnot";
const METAFIELD_KEY: &str = "shows";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no input available: {} not found, run the scraper first", .0.display())]
    NoInput(PathBuf),

    #[error("no shows in input, run the scraper first")]
    NoShows,

    #[error("invalid show data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The three storefront artefacts for one show list
#[derive(Debug)]
pub struct Rendered {
    pub html: String,
    pub liquid: String,
    pub metafield: String,
}

impl Rendered {
    pub fn from_shows(shows: &[Show]) -> Result<Self, RenderError> {
        let metafield = serde_json::to_string_pretty(&metafield(shows)?)?;

        Ok(Self {
            html: html_page(shows),
            liquid: liquid_section(shows)?,
            metafield,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Renderer {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Load the saved shows. A missing file is [`RenderError::NoInput`].
    pub async fn load(&self) -> Result<Vec<Show>, RenderError> {
        let path = self.input_dir.join(JSON_FILE);

        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::NoInput(path));
            }
            Err(source) => return Err(RenderError::Io { path, source }),
        };

        Ok(serde_json::from_str(&data)?)
    }

    /// Render every artefact, then write them all
    pub async fn run(&self) -> Result<Vec<PathBuf>, RenderError> {
        let shows = self.load().await?;
        if shows.is_empty() {
            return Err(RenderError::NoShows);
        }

        info!("Generating Shopify content for {} shows", shows.len());
        let rendered = Rendered::from_shows(&shows)?;

        let outputs = [
            (HTML_FILE, rendered.html),
            (LIQUID_FILE, rendered.liquid),
            (METAFIELD_FILE, rendered.metafield),
        ];

        let mut written = Vec::with_capacity(outputs.len());
        for (name, contents) in outputs {
            let path = self.output_dir.join(name);
            write(&path, &contents).await?;
            info!("Generated {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

async fn write(path: &Path, contents: &str) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| RenderError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(path, contents)
        .await
        .map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// CSS class suffix derived from a status such as "live" or "upcoming"
fn status_class(status: &str) -> String {
    status
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

const PAGE_STYLE: &str = r"        .shows-container {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(300px, 1fr));
            gap: 2rem;
            padding: 2rem;
            max-width: 1200px;
            margin: 0 auto;
        }
        .show-card {
            border: 1px solid #e0e0e0;
            border-radius: 8px;
            overflow: hidden;
            transition: transform 0.2s, box-shadow 0.2s;
            background: white;
        }
        .show-card:hover {
            transform: translateY(-4px);
            box-shadow: 0 4px 12px rgba(0,0,0,0.1);
        }
        .show-image {
            width: 100%;
            height: 200px;
            object-fit: cover;
            background: #f5f5f5;
        }
        .show-content { padding: 1.5rem; }
        .show-title { font-size: 1.25rem; font-weight: 600; margin: 0 0 0.5rem 0; color: #333; }
        .show-date { color: #666; font-size: 0.9rem; margin-bottom: 1rem; }
        .show-status {
            display: inline-block;
            padding: 0.25rem 0.75rem;
            border-radius: 12px;
            font-size: 0.85rem;
            font-weight: 500;
            margin-bottom: 1rem;
        }
        .show-status.upcoming { background: #e3f2fd; color: #1976d2; }
        .show-status.live { background: #ffebee; color: #d32f2f; }
        .show-status.past { background: #f5f5f5; color: #757575; }
        .show-link {
            display: inline-block;
            padding: 0.75rem 1.5rem;
            background: #000;
            color: white;
            text-decoration: none;
            border-radius: 4px;
            font-weight: 500;
        }
        .show-link:hover { background: #333; }
";

fn html_card(show: &Show) -> String {
    let title = escape_html(&show.title);
    let mut card = String::from("        <div class=\"show-card\">\n");

    if let Some(image) = &show.image {
        card.push_str(&format!(
            "            <img src=\"{}\" alt=\"{title}\" class=\"show-image\" loading=\"lazy\">\n",
            escape_html(image)
        ));
    }

    card.push_str("            <div class=\"show-content\">\n");
    card.push_str(&format!("                <h3 class=\"show-title\">{title}</h3>\n"));

    if let Some(date) = &show.date {
        card.push_str(&format!(
            "                <div class=\"show-date\">{}</div>\n",
            escape_html(date)
        ));
    }

    if let Some(status) = &show.status {
        card.push_str(&format!(
            "                <span class=\"show-status {}\">{}</span>\n",
            status_class(status),
            escape_html(status)
        ));
    }

    card.push_str(&format!(
        "                <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"show-link\">View Show</a>\n",
        escape_html(&show.url)
    ));
    card.push_str("            </div>\n        </div>\n");
    card
}

/// Standalone HTML page listing every show as a card
pub fn html_page(shows: &[Show]) -> String {
    let cards: String = shows.iter().map(html_card).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Whatnot Shows</title>
    <style>
{PAGE_STYLE}    </style>
</head>
<body>
    <div class="shows-container">
{cards}    </div>
</body>
</html>
"#
    )
}

/// Liquid theme section: the show list inlined as JSON for scripts, and a card
/// loop over the `whatnot.shows` metafield holding the same data
pub fn liquid_section(shows: &[Show]) -> Result<String, RenderError> {
    // `</` would close the script element early
    let json = serde_json::to_string(shows)?.replace("</", "<\\/");
    let namespace = METAFIELD_NAMESPACE;
    let key = METAFIELD_KEY;

    Ok(format!(
        r#"{{% comment %}}
  Whatnot Shows Section
  Add this to your Shopify theme as a section or include it in a page template
{{% endcomment %}}

<script type="application/json" id="whatnot-shows-data">{json}</script>

{{% comment %}} Populated from {namespace}.{key} once the metafield has been created {{% endcomment %}}
{{% assign shows = shop.metafields.{namespace}.{key}.value %}}

<div class="whatnot-shows-container" style="display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 2rem; padding: 2rem; max-width: 1200px; margin: 0 auto;">
  {{% for show in shows %}}
    <div class="show-card" style="border: 1px solid #e0e0e0; border-radius: 8px; overflow: hidden; background: white;">
      {{% if show.image %}}
        <img src="{{{{ show.image | escape }}}}" alt="{{{{ show.title | escape }}}}" style="width: 100%; height: 200px; object-fit: cover;">
      {{% endif %}}
      <div style="padding: 1.5rem;">
        <h3 style="font-size: 1.25rem; font-weight: 600; margin: 0 0 0.5rem 0;">{{{{ show.title | escape }}}}</h3>
        {{% if show.date %}}
          <div style="color: #666; font-size: 0.9rem; margin-bottom: 1rem;">{{{{ show.date | escape }}}}</div>
        {{% endif %}}
        {{% if show.status %}}
          <span class="show-status show-status-{{{{ show.status | handleize }}}}" style="display: inline-block; padding: 0.25rem 0.75rem; border-radius: 12px; font-size: 0.85rem; margin-bottom: 1rem;">
            {{{{ show.status | escape }}}}
          </span>
        {{% endif %}}
        <a href="{{{{ show.url | escape }}}}" target="_blank" rel="noopener noreferrer" style="display: inline-block; padding: 0.75rem 1.5rem; background: #000; color: white; text-decoration: none; border-radius: 4px;">
          View Show
        </a>
      </div>
    </div>
  {{% endfor %}}
</div>

<style>
  .show-card:hover {{
    transform: translateY(-4px);
    box-shadow: 0 4px 12px rgba(0,0,0,0.1);
    transition: transform 0.2s, box-shadow 0.2s;
  }}
  .show-status-upcoming {{ background: #e3f2fd; color: #1976d2; }}
  .show-status-live {{ background: #ffebee; color: #d32f2f; }}
  .show-status-past {{ background: #f5f5f5; color: #757575; }}
</style>
"#
    ))
}

/// Metafield envelope holding the show list as a JSON string
pub fn metafield(shows: &[Show]) -> Result<Metafield, RenderError> {
    Ok(Metafield {
        namespace: METAFIELD_NAMESPACE.to_string(),
        key: METAFIELD_KEY.to_string(),
        value: serde_json::to_string(shows)?,
        kind: "json".to_string(),
        description: "Whatnot shows data scraped from user page".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn show(id: &str) -> Show {
        Show {
            id: id.to_string(),
            title: format!("Show {id}"),
            url: format!("https://www.whatnot.com/live/{id}"),
            image: None,
            date: None,
            status: None,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn html_escapes_free_text() {
        let mut s = show("A");
        s.title = "<script>alert('x')</script>".to_string();
        s.date = Some("Fri & Sat".to_string());

        let html = html_page(&[s]);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;"));
        assert!(html.contains("Fri &amp; Sat"));
    }

    #[test]
    fn html_omits_absent_fields() {
        let html = html_page(&[show("A")]);

        assert!(!html.contains("<img"));
        assert!(!html.contains("show-date\">"));
        assert!(!html.contains("<span class=\"show-status"));
        assert!(html.contains("href=\"https://www.whatnot.com/live/A\""));
    }

    #[test]
    fn html_includes_present_fields() {
        let mut s = show("A");
        s.image = Some("https://cdn.x/1.jpg".to_string());
        s.date = Some("Jan 5".to_string());
        s.status = Some("live".to_string());

        let html = html_page(&[s, show("B")]);
        assert!(html.contains("<img src=\"https://cdn.x/1.jpg\""));
        assert!(html.contains("<div class=\"show-date\">Jan 5</div>"));
        assert!(html.contains("<span class=\"show-status live\">live</span>"));
        assert_eq!(html.matches("class=\"show-card\"").count(), 2);
    }

    #[test]
    fn rendering_is_deterministic() {
        let shows = vec![show("A"), show("B")];
        let first = Rendered::from_shows(&shows).unwrap();
        let second = Rendered::from_shows(&shows).unwrap();

        assert_eq!(first.html, second.html);
        assert_eq!(first.liquid, second.liquid);
        assert_eq!(first.metafield, second.metafield);
    }

    #[test]
    fn liquid_embeds_json_inline() {
        let mut s = show("A");
        s.title = "</script> trick".to_string();

        let liquid = liquid_section(&[s]).unwrap();
        assert!(liquid.contains("{% for show in shows %}"));
        assert!(liquid.contains("shop.metafields.whatnot.shows.value"));
        assert!(liquid.contains("{{ show.title | escape }}"));
        assert!(liquid.contains(r#""id":"A""#));
        assert!(!liquid.contains("</script> trick"));
    }

    #[test]
    fn metafield_wraps_json_string() {
        let shows = vec![show("A")];
        let field = metafield(&shows).unwrap();

        assert_eq!(field.namespace, "whatnot");
        assert_eq!(field.key, "shows");
        assert_eq!(field.kind, "json");
        let decoded: Vec<Show> = serde_json::from_str(&field.value).unwrap();
        assert_eq!(decoded, shows);

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "json");
    }

    #[tokio::test]
    async fn missing_input_is_reported_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path(), dir.path());

        let err = renderer.run().await.unwrap_err();
        assert!(matches!(err, RenderError::NoInput(_)));
        assert!(!dir.path().join(HTML_FILE).exists());
        assert!(!dir.path().join(METAFIELD_FILE).exists());
    }

    #[tokio::test]
    async fn empty_input_is_reported_without_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(JSON_FILE), "[]").unwrap();
        let renderer = Renderer::new(dir.path(), dir.path());

        let err = renderer.run().await.unwrap_err();
        assert!(matches!(err, RenderError::NoShows));
        assert!(!dir.path().join(LIQUID_FILE).exists());
    }

    #[tokio::test]
    async fn corrupt_input_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(JSON_FILE), "{not json").unwrap();
        let renderer = Renderer::new(dir.path(), dir.path());

        let err = renderer.run().await.unwrap_err();
        assert!(matches!(err, RenderError::Parse(_)));
        assert!(!dir.path().join(HTML_FILE).exists());
    }

    #[tokio::test]
    async fn run_writes_all_artefacts() {
        let dir = tempfile::tempdir().unwrap();
        let shows = vec![show("A")];
        std::fs::write(
            dir.path().join(JSON_FILE),
            serde_json::to_string_pretty(&shows).unwrap(),
        )
        .unwrap();
        let renderer = Renderer::new(dir.path(), dir.path().join("shopify"));

        let written = renderer.run().await.unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn write_failure_keeps_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(JSON_FILE),
            serde_json::to_string_pretty(&[show("A")]).unwrap(),
        )
        .unwrap();
        std::fs::create_dir(dir.path().join(LIQUID_FILE)).unwrap();
        let renderer = Renderer::new(dir.path(), dir.path());

        let err = renderer.run().await.unwrap_err();
        assert!(matches!(err, RenderError::Io { ref path, .. } if path.ends_with(LIQUID_FILE)));
        assert!(dir.path().join(HTML_FILE).exists());
        assert!(!dir.path().join(METAFIELD_FILE).exists());
    }
}
