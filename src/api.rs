//! Client for the IBGE news API.
//!
//! The network sits behind the [`NewsSource`] trait so the view and the
//! runtime can be driven by fakes in tests:
//! - [`NewsSource`]: "given a [`SearchQuery`], produce news items or fail"
//! - [`IbgeClient`]: the production implementation over `reqwest`
//!
//! # Request
//!
//! One `GET` against the base endpoint with up to three query parameters:
//!
//! | Parameter | Value | Sent when |
//! |-----------|-------|-----------|
//! | `busca` | free-text term | term is non-empty |
//! | `tipo` | `noticia` or `release` | category is not "all" |
//! | `qtd` | `10` | always |
//!
//! No retries are attempted; a failed request is reported once to the caller.

use crate::models::{NewsItem, NewsResponse, SearchQuery};
use crate::utils::truncate_for_log;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Default endpoint of the IBGE news service.
pub const DEFAULT_API_URL: &str = "https://servicodados.ibge.gov.br/api/v3/noticias";

/// Fixed page size requested from the API.
pub const PAGE_SIZE: u32 = 10;

/// Why a fetch failed.
///
/// All variants end up as an empty result list in the view; the distinction
/// only matters for logs.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API answered with status {0}")]
    Status(StatusCode),

    #[error("response body is not a valid news payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("search task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Something that can answer a search.
///
/// Implementors issue exactly one request per call and settle exactly once.
pub trait NewsSource {
    fn fetch(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<NewsItem>, FetchError>> + Send;
}

/// Build the request URL for `query` against `base`.
///
/// Parameters are appended to whatever query string `base` already carries.
///
/// # Arguments
///
/// * `base` - The endpoint, e.g. [`DEFAULT_API_URL`]
/// * `query` - The submitted search; supplies `busca` and `tipo` when set
///
/// # Returns
///
/// The full request URL ending in `qtd=10`, or [`FetchError::Url`] if `base`
/// does not parse.
pub fn build_url(base: &str, query: &SearchQuery) -> Result<Url, FetchError> {
    let mut url = Url::parse(base)?;
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(term) = query.search_term() {
            pairs.append_pair("busca", term);
        }
        if let Some(tipo) = query.category.api_token() {
            pairs.append_pair("tipo", tipo);
        }
        pairs.append_pair("qtd", &PAGE_SIZE.to_string());
    }
    Ok(url)
}

/// Parse a response body into news items.
///
/// A missing or `null` `items` array is an empty list; anything that is not a
/// JSON object with a well-formed `items` array is a [`FetchError::Decode`].
///
/// # Arguments
///
/// * `body` - The raw response body
///
/// # Returns
///
/// The items in response order, untouched.
pub fn parse_body(body: &str) -> Result<Vec<NewsItem>, FetchError> {
    let response: NewsResponse = serde_json::from_str(body)?;
    Ok(response.into_items())
}

/// Production [`NewsSource`] talking to the IBGE API over HTTPS.
#[derive(Debug, Clone)]
pub struct IbgeClient {
    http: reqwest::Client,
    base_url: String,
}

impl IbgeClient {
    /// Create a client for `base_url`.
    ///
    /// The URL is validated up front so a typo fails at startup rather than
    /// on every search.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The news endpoint; query parameters are appended per search
    ///
    /// # Returns
    ///
    /// The client, or [`FetchError::Url`] / [`FetchError::Transport`] if the URL
    /// is invalid or the HTTP client can't be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let base_url = base_url.into();
        Url::parse(&base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl NewsSource for IbgeClient {
    #[instrument(level = "info", skip_all, fields(term = %query.term, category = ?query.category))]
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<NewsItem>, FetchError> {
        let url = build_url(&self.base_url, query)?;
        debug!(%url, "Issuing news request");

        let t0 = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(
                %status,
                elapsed_ms = dt.as_millis(),
                body_preview = %truncate_for_log(&body, 200),
                "News API returned an error status"
            );
            return Err(FetchError::Status(status));
        }

        match parse_body(&body) {
            Ok(items) => {
                info!(count = items.len(), elapsed_ms = dt.as_millis(), "Fetched news items");
                Ok(items)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    body_preview = %truncate_for_log(&body, 200),
                    "News API returned a non-conforming body"
                );
                Err(e)
            }
        }
    }
}
