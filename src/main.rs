use anyhow::Result;
use clap::Parser;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod dedupe;
mod extractor;
mod fetcher;
mod models;
mod persist;
mod render;
mod show_finder;
mod traits;

use config::{Cli, Command, Config};
use render::{RenderError, Renderer};
use show_finder::ShowFinder;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Scrape) {
        Command::Scrape => scrape(&cli.config).await,
        Command::Render => render(&cli.config).await,
    }
}

async fn scrape(config: &Config) -> Result<()> {
    info!("Starting Whatnot show scraper");

    let finder = ShowFinder::new(config)?;

    let Some(schedule) = &config.schedule else {
        finder.run().await?;
        info!("Scraping completed");
        return Ok(());
    };

    // Run once immediately, then on the schedule
    if let Err(e) = finder.run().await {
        error!("Error during initial scrape: {}", e);
    }

    let sched = JobScheduler::new().await?;

    let job_finder = finder.clone();
    sched
        .add(Job::new_async(schedule.as_str(), move |_uuid, _l| {
            let finder = job_finder.clone();
            Box::pin(async move {
                if let Err(e) = finder.run().await {
                    error!("Error scraping shows: {}", e);
                }
            })
        })?)
        .await?;

    info!("Scheduler started with schedule '{}'", schedule);
    sched.start().await?;

    // Keep the program running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    }
}

async fn render(config: &Config) -> Result<()> {
    let renderer = Renderer::new(&config.output_dir, &config.output_dir);

    match renderer.run().await {
        Ok(paths) => {
            info!("Shopify content generation complete ({} files)", paths.len());
            Ok(())
        }
        Err(e @ (RenderError::NoInput(_) | RenderError::NoShows)) => {
            warn!("{}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
