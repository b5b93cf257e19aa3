//! Command-line interface definitions for ibge_news.
//!
//! Arguments can be provided via command-line flags, and the deployment
//! knobs (API url, race policy) also via environment variables.

use crate::api::DEFAULT_API_URL;
use crate::models::Category;
use crate::view::RacePolicy;
use clap::Parser;

/// Command-line arguments for ibge_news.
///
/// # Examples
///
/// ```sh
/// # Latest ten items, any category
/// ibge_news
///
/// # Releases mentioning "censo", as JSON
/// ibge_news --busca censo --tipo release --json
///
/// # Interactive session
/// ibge_news -i
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Free-text search term
    #[arg(short, long, default_value = "")]
    pub busca: String,

    /// Category filter
    #[arg(short, long, value_enum, default_value_t = Category::All)]
    pub tipo: Category,

    /// Read commands from stdin instead of running a single search
    #[arg(short, long)]
    pub interactive: bool,

    /// Print results as JSON instead of the text screen (single search only)
    #[arg(long, conflicts_with = "interactive")]
    pub json: bool,

    /// Base URL of the news endpoint
    #[arg(long, env = "IBGE_NEWS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Which response wins when searches overlap
    #[arg(long, value_enum, env = "IBGE_NEWS_RACE_POLICY", default_value_t = RacePolicy::LatestWins)]
    pub race_policy: RacePolicy,
}
