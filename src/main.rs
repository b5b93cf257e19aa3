//! # ibge_news
//!
//! A terminal client for the IBGE news API
//! (`https://servicodados.ibge.gov.br/api/v3/noticias`): enter a search term,
//! pick a category, and read the ten most relevant news items or releases.
//!
//! ## Usage
//!
//! ```sh
//! ibge_news --busca censo --tipo noticia
//! ibge_news --interactive
//! ```
//!
//! ## Architecture
//!
//! 1. **State**: one [`view::ViewState`] changed only by [`view::update`]
//! 2. **Network**: an injectable [`api::NewsSource`], [`api::IbgeClient`] in production
//! 3. **Rendering**: [`render::render`] turns the state into a printable screen
//! 4. **Front end**: [`app`] runs a single search or an interactive loop
//!
//! Logs go to stderr (filter with `RUST_LOG`); the screen goes to stdout.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod app;
mod cli;
mod models;
mod render;
mod utils;
mod view;

use api::IbgeClient;
use app::OutputFormat;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let client = match IbgeClient::new(args.api_url.as_str()) {
        Ok(client) => client,
        Err(e) => {
            error!(api_url = %args.api_url, error = %e, "Cannot build news client");
            return Err(e.into());
        }
    };
    info!(api_url = %client.base_url(), policy = ?args.race_policy, "ibge_news starting up");

    let mut stdout = tokio::io::stdout();
    let state = if args.interactive {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        app::run_interactive(client, args.race_policy, stdin, &mut stdout).await?
    } else {
        let format = if args.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        app::run_once(
            client,
            args.race_policy,
            &args.busca,
            args.tipo,
            format,
            &mut stdout,
        )
        .await?
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        results = state.results.len(),
        searches = state.latest_seq(),
        "Execution complete"
    );
    Ok(())
}
