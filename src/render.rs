//! Rendering of a [`ViewState`] into a UI tree.
//!
//! [`render`] is a pure function: the same state always yields the same
//! [`Screen`]. The tree is a plain value, so tests compare it directly and the
//! terminal front end prints it through its [`Display`](std::fmt::Display) impl.
//!
//! ```text
//! Portal de Notícias IBGE
//! Busca: censo | Tipo: Notícias
//! ────────────────────────────
//! • Título
//!   07/03/2024
//!   Introdução...
//!   Leia mais: https://...
//! ```

use crate::models::{Category, NewsItem};
use crate::utils::format_date_pt_br;
use crate::view::ViewState;
use std::fmt;

pub const HEADER: &str = "Portal de Notícias IBGE";
pub const LOADING_MESSAGE: &str = "Carregando...";
pub const EMPTY_MESSAGE: &str = "Nenhuma notícia encontrada.";
pub const LINK_LABEL: &str = "Leia mais";

/// The whole screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub header: &'static str,
    pub form: Form,
    pub body: Body,
}

/// The search form as currently filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub term: String,
    pub category: Category,
}

/// What sits below the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Loading,
    Empty,
    List(Vec<Entry>),
}

/// One rendered news item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    /// Localized publication date, or the raw API string when it can't be parsed.
    pub date: String,
    pub summary: String,
    pub link: String,
}

impl Entry {
    fn from_item(item: &NewsItem) -> Self {
        let date = item
            .published_date()
            .map(format_date_pt_br)
            .unwrap_or_else(|| item.published_at.clone());
        Self {
            title: item.title.clone(),
            date,
            summary: item.summary.clone(),
            link: item.url.clone(),
        }
    }
}

/// Render `state` into a [`Screen`].
pub fn render(state: &ViewState) -> Screen {
    let body = if state.is_loading {
        Body::Loading
    } else if state.results.is_empty() {
        Body::Empty
    } else {
        Body::List(state.results.iter().map(Entry::from_item).collect())
    };

    Screen {
        header: HEADER,
        form: Form {
            term: state.query.term.clone(),
            category: state.query.category,
        },
        body,
    }
}

impl Screen {
    /// Rendered entries; empty while loading or when there are no results.
    pub fn entries(&self) -> &[Entry] {
        match &self.body {
            Body::List(entries) => entries,
            Body::Loading | Body::Empty => &[],
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        writeln!(f, "Busca: {} | Tipo: {}", self.form.term, self.form.category)?;
        writeln!(f, "{}", "─".repeat(self.header.chars().count()))?;
        match &self.body {
            Body::Loading => writeln!(f, "{LOADING_MESSAGE}"),
            Body::Empty => writeln!(f, "{EMPTY_MESSAGE}"),
            Body::List(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    writeln!(f, "• {}", entry.title)?;
                    writeln!(f, "  {}", entry.date)?;
                    if !entry.summary.is_empty() {
                        writeln!(f, "  {}", entry.summary)?;
                    }
                    writeln!(f, "  {LINK_LABEL}: {}", entry.link)?;
                }
                Ok(())
            }
        }
    }
}
