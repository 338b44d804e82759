//! Command line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_TARGET_URL: &str = "https://www.whatnot.com/en-GB/user/poke__queen_1/shows";
pub const DEFAULT_BASE_ORIGIN: &str = "https://www.whatnot.com";

#[derive(Parser, Debug)]
#[command(name = "show-finder", version)]
#[command(about = "Scrape Whatnot live shows and render them for a Shopify store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fetch the target page and write shows.json and shows.csv (default)
    Scrape,
    /// Generate Shopify HTML, Liquid and metafield files from shows.json
    Render,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Page listing the user's shows
    #[arg(long, env = "WHATNOT_USER_URL", default_value = DEFAULT_TARGET_URL, global = true)]
    pub target_url: String,

    /// Origin that relative links are resolved against
    #[arg(long, env = "WHATNOT_BASE_ORIGIN", default_value = DEFAULT_BASE_ORIGIN, global = true)]
    pub base_origin: String,

    /// Path segment that precedes a show identifier in detail-page URLs
    #[arg(long, env = "SHOW_PATH_MARKER", default_value = "live", global = true)]
    pub marker: String,

    /// Directory holding shows.json, shows.csv and the rendered files
    #[arg(long, env = "OUTPUT_DIR", default_value = ".", global = true)]
    pub output_dir: PathBuf,

    /// Read an already rendered HTML page instead of fetching over HTTP
    #[arg(long, env = "HTML_SNAPSHOT", global = true)]
    pub snapshot: Option<PathBuf>,

    /// HTTP fetch attempts before giving up
    #[arg(long, env = "FETCH_ATTEMPTS", default_value_t = 3, global = true)]
    pub attempts: u32,

    /// Pause between failed fetch attempts, in milliseconds
    #[arg(long, env = "FETCH_RETRY_DELAY_MS", default_value_t = 2000, global = true)]
    pub retry_delay_ms: u64,

    /// Cron expression (with seconds) for repeated scrapes, e.g. "0 0 * * * *"
    #[arg(long, env = "SCRAPE_SCHEDULE", global = true)]
    pub schedule: Option<String>,
}

impl Config {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            base_origin: DEFAULT_BASE_ORIGIN.to_string(),
            marker: "live".to_string(),
            output_dir: PathBuf::from("."),
            snapshot: None,
            attempts: 3,
            retry_delay_ms: 2000,
            schedule: None,
        }
    }
}
