//! Data models for search queries and the news items returned by the API.
//!
//! - [`Category`]: the category filter offered by the search form
//! - [`SearchQuery`]: the term and category sent with one request
//! - [`NewsItem`]: a single article or release as returned by the API
//! - [`NewsResponse`]: the response envelope wrapping the `items` array
//!
//! Field names on the wire are Portuguese (`titulo`, `introducao`, ...) and are
//! mapped with `#[serde(rename)]` so the rest of the crate reads in English.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Category filter for a search.
///
/// `All` means "unfiltered" and is never sent to the API; the other two map
/// onto the API's `tipo` tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Category {
    /// No category filter.
    #[default]
    #[value(name = "todos", alias = "all")]
    All,
    /// News articles (`tipo=noticia`).
    #[value(name = "noticia", alias = "news")]
    News,
    /// Press releases (`tipo=release`).
    #[value(name = "release")]
    Release,
}

impl Category {
    /// The value of the `tipo` query parameter, or `None` for [`Category::All`].
    pub fn api_token(self) -> Option<&'static str> {
        match self {
            Category::All => None,
            Category::News => Some("noticia"),
            Category::Release => Some("release"),
        }
    }

    /// Label shown in the search form.
    pub fn label(self) -> &'static str {
        match self {
            Category::All => "Todos",
            Category::News => "Notícias",
            Category::Release => "Releases",
        }
    }

    /// Parse the token typed in interactive mode.
    pub fn from_input(s: &str) -> Option<Self> {
        Category::from_str(s.trim(), true).ok()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The user's search intent at submission time.
///
/// The term is stored trimmed; an empty term means "no text filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub category: Category,
}

impl SearchQuery {
    pub fn new(term: &str, category: Category) -> Self {
        Self {
            term: term.trim().to_string(),
            category,
        }
    }

    /// The term to send as `busca`, if there is one.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.term.trim();
        (!term.is_empty()).then_some(term)
    }
}

/// Identifier of a [`NewsItem`].
///
/// The API sends numbers, but string ids are kept as-is rather than failing
/// the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NewsId {
    Number(u64),
    Text(String),
}

impl From<u64> for NewsId {
    fn from(id: u64) -> Self {
        NewsId::Number(id)
    }
}

impl fmt::Display for NewsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsId::Number(id) => write!(f, "{id}"),
            NewsId::Text(id) => f.write_str(id),
        }
    }
}

/// One article or release as returned by the API.
///
/// Values are kept exactly as received; `published_at` stays the raw string
/// and is only interpreted when rendering. Text fields that are `null` or
/// missing come through as empty strings so one sparse item doesn't sink the
/// rest of the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsItem {
    pub id: NewsId,
    #[serde(rename = "titulo", default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "data_publicacao", default, deserialize_with = "null_as_default")]
    pub published_at: String,
    #[serde(rename = "introducao", default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(rename = "link", default, deserialize_with = "null_as_default")]
    pub url: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl NewsItem {
    /// Publication date parsed from the API's date string.
    ///
    /// The live API sends `dd/mm/yyyy HH:MM:SS`; ISO dates, ISO datetimes and
    /// RFC 3339 timestamps are also accepted. Returns `None` when none match.
    pub fn published_date(&self) -> Option<NaiveDate> {
        parse_publication_date(&self.published_at)
    }
}

/// Parse a publication date in any of the formats the API is known to use.
pub fn parse_publication_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    const DATETIME_FORMATS: [&str; 4] = [
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    ["%Y-%m-%d", "%d/%m/%Y"]
        .into_iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Response envelope of the news endpoint.
///
/// Other envelope fields (`count`, `page`, `totalPages`, ...) are ignored.
/// A missing or `null` `items` is an empty list.
#[derive(Debug, Default, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    items: Option<Vec<NewsItem>>,
}

impl NewsResponse {
    pub fn into_items(self) -> Vec<NewsItem> {
        self.items.unwrap_or_default()
    }
}
