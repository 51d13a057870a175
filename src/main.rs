//! # Wandering Science
//!
//! A batch job that publishes one science feature per run. It finds a fresh
//! news story, has a generative model write it up as long-form HTML, and posts
//! the result to a WordPress site.
//!
//! ## Usage
//!
//! ```sh
//! NEWS_API_KEY=... LLM_API_KEY=... WP_USER=... WP_PASSWORD=... wandering_science
//! ```
//!
//! ## Architecture
//!
//! The run is a strictly sequential pipeline:
//! 1. **Scout**: search recent science news and pick the newest illustrated
//!    story that the site has not published yet
//! 2. **Media**: re-host the story image in the site's media library (best-effort)
//! 3. **Category**: map the story onto a site category by keyword rules
//! 4. **Author**: generate the HTML feature, falling back through a model cascade
//! 5. **Publish**: create the post, retrying only on transport failures
//!
//! Missing credentials halt the job before any network call.

use clap::Parser;
use std::error::Error;
use tracing::{error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod author;
mod cascade;
mod category;
mod cli;
mod config;
mod errors;
mod media;
mod models;
mod pipeline;
mod publisher;
mod scout;
mod utils;
mod wordpress;

use cli::Cli;
use config::Config;
use pipeline::RunOutcome;
use utils::build_http_client;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "wandering_science starting up");

    let config = match Config::from_cli(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration; nothing was contacted");
            return Err(e.into());
        }
    };
    info!(
        wordpress_url = %config.wordpress_url,
        models = ?config.models,
        topic = ?config.topic,
        dry_run = config.dry_run,
        "Loaded configuration"
    );

    let http = build_http_client()?;
    let outcome = match pipeline::run(&http, &config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Story search failed");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?outcome,
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    if outcome.is_failure() {
        return Err("post could not be published".into());
    }
    if let RunOutcome::Published { link } = &outcome {
        info!(%link, "Article live");
    }
    Ok(())
}
