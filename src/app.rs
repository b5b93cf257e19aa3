//! Terminal front end driving the search view.
//!
//! Two modes share the same state machine and renderer:
//!
//! - [`run_once`]: submit one query, wait for it to settle, print the result
//! - [`run_interactive`]: read commands line by line while requests run in
//!   the background, re-rendering after every state change
//!
//! # Interactive commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `busca <texto>` / `termo <texto>` | set the search term (empty clears it) |
//! | `tipo <todos\|noticia\|release>` | set the category |
//! | `buscar` or an empty line | submit |
//! | `mostrar` | print the current screen again |
//! | `sair` / `quit` | exit right away |
//!
//! On end of input the loop waits for requests still in flight, so piped
//! sessions (`echo buscar | ibge_news -i`) print their results.

use crate::api::{FetchError, NewsSource};
use crate::models::{Category, NewsItem};
use crate::render::render;
use crate::view::{Command, Event, RacePolicy, SearchView, ViewState, log_settle, update};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

const HELP: &str = "Comandos: busca <texto> | tipo <todos|noticia|release> | buscar | mostrar | sair";

/// How results are printed in one-shot mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One parsed line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Term(String),
    Category(Category),
    Submit,
    Show,
    Quit,
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    match cmd.to_lowercase().as_str() {
        "" | "buscar" => Input::Submit,
        "busca" | "termo" => Input::Term(arg.to_string()),
        "tipo" => match Category::from_input(arg) {
            Some(category) => Input::Category(category),
            None => Input::Invalid(format!("tipo desconhecido: {arg:?}")),
        },
        "mostrar" => Input::Show,
        "sair" | "quit" | "exit" => Input::Quit,
        other => Input::Invalid(format!("comando desconhecido: {other:?}")),
    }
}

/// Submit `term`/`category` once and print the settled view to `out`.
#[instrument(level = "info", skip(source, out))]
pub async fn run_once<S, W>(
    source: S,
    policy: RacePolicy,
    term: &str,
    category: Category,
    format: OutputFormat,
    out: &mut W,
) -> io::Result<ViewState>
where
    S: NewsSource,
    W: AsyncWrite + Unpin,
{
    let mut view = SearchView::new(source, policy);
    view.update_term(term);
    view.update_category(category);
    view.submit().await;

    let state = view.state().clone();
    let text = match format {
        OutputFormat::Text => render(&state).to_string(),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&state.results)?;
            json.push('\n');
            json
        }
    };
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    info!(count = state.results.len(), "Search finished");
    Ok(state)
}

/// Run the interactive loop until `sair` or end of input.
///
/// Each submission spawns its own fetch task; settles are collected from a
/// [`JoinSet`] and applied on this task, so the state is never shared. At end
/// of input the loop keeps running until every outstanding search settles;
/// `sair` returns at once and abandons them.
///
/// # Arguments
///
/// * `source` - Answers the searches; shared by all fetch tasks
/// * `policy` - Which settle governs when searches overlap
/// * `input` - Command lines, usually stdin
/// * `out` - Where screens are written, usually stdout
///
/// # Returns
///
/// The final [`ViewState`], or the first I/O error on `input` or `out`.
#[instrument(level = "info", skip_all)]
pub async fn run_interactive<S, R, W>(
    source: S,
    policy: RacePolicy,
    input: R,
    out: &mut W,
) -> io::Result<ViewState>
where
    S: NewsSource + Send + Sync + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let source = Arc::new(source);
    let mut searches: JoinSet<(u64, Result<Vec<NewsItem>, FetchError>)> = JoinSet::new();
    let mut lines = input.lines();
    let mut state = ViewState::new(policy);
    let mut input_open = true;

    write_screen(&state, out).await?;
    write_line(HELP, out).await?;

    while input_open || !searches.is_empty() {
        let event = tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    debug!(in_flight = searches.len(), "Input closed; waiting for outstanding searches");
                    input_open = false;
                    continue;
                };
                match parse_input(&line) {
                    Input::Term(term) => Event::TermChanged(term),
                    Input::Category(category) => Event::CategoryChanged(category),
                    Input::Submit => Event::Submitted,
                    Input::Show => {
                        write_screen(&state, out).await?;
                        continue;
                    }
                    Input::Quit => break,
                    Input::Invalid(msg) => {
                        write_line(&format!("{msg}\n{HELP}"), out).await?;
                        continue;
                    }
                }
            }
            Some(joined) = searches.join_next(), if !searches.is_empty() => {
                let (seq, outcome) = match joined {
                    Ok(settled) => settled,
                    Err(e) => {
                        error!(error = %e, "Search task ended without settling");
                        continue;
                    }
                };
                log_settle(seq, &outcome);
                Event::Settled { seq, outcome }
            }
        };

        let (next, command) = update(state, event);
        state = next;
        if let Some(Command::Fetch { seq, query }) = command {
            debug!(seq, term = %query.term, category = ?query.category, "Spawning search");
            let source = Arc::clone(&source);
            searches.spawn(async move {
                // A panicking source still settles its sequence number.
                let fetch = tokio::spawn(async move { source.fetch(&query).await });
                let outcome = fetch.await.unwrap_or_else(|e| Err(FetchError::Task(e)));
                (seq, outcome)
            });
        }
        write_screen(&state, out).await?;
    }

    info!(
        results = state.results.len(),
        abandoned = searches.len(),
        "Interactive session finished"
    );
    Ok(state)
}

async fn write_screen<W: AsyncWrite + Unpin>(state: &ViewState, out: &mut W) -> io::Result<()> {
    let text = format!("\n{}", render(state));
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}

async fn write_line<W: AsyncWrite + Unpin>(line: &str, out: &mut W) -> io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsId, SearchQuery};
    use crate::render::{EMPTY_MESSAGE, LOADING_MESSAGE};
    use reqwest::StatusCode;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers with one item titled after the query term; `"erro"` fails.
    #[derive(Default)]
    struct EchoSource {
        seen: Mutex<Vec<SearchQuery>>,
    }

    impl NewsSource for EchoSource {
        async fn fetch(&self, query: &SearchQuery) -> Result<Vec<NewsItem>, FetchError> {
            self.seen.lock().unwrap().push(query.clone());
            if query.term == "erro" {
                return Err(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR));
            }
            if query.term.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![NewsItem {
                id: NewsId::Number(1),
                title: query.term.clone(),
                published_at: "06/11/2024 10:00:00".to_string(),
                summary: format!("{:?}", query.category),
                url: "https://agenciadenoticias.ibge.gov.br/1".to_string(),
            }])
        }
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(""), Input::Submit);
        assert_eq!(parse_input("  buscar "), Input::Submit);
        assert_eq!(parse_input("busca censo 2022"), Input::Term("censo 2022".to_string()));
        assert_eq!(parse_input("termo"), Input::Term(String::new()));
        assert_eq!(parse_input("tipo release"), Input::Category(Category::Release));
        assert_eq!(parse_input("TIPO todos"), Input::Category(Category::All));
        assert_eq!(parse_input("mostrar"), Input::Show);
        assert_eq!(parse_input("sair"), Input::Quit);
        assert!(matches!(parse_input("tipo blog"), Input::Invalid(_)));
        assert!(matches!(parse_input("voar"), Input::Invalid(_)));
    }

    #[tokio::test]
    async fn test_run_once_text() {
        let mut out = Vec::new();
        let state = run_once(
            EchoSource::default(),
            RacePolicy::default(),
            "  censo ",
            Category::News,
            OutputFormat::Text,
            &mut out,
        )
        .await
        .unwrap();

        assert!(!state.is_loading);
        assert_eq!(state.results.len(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("• censo"));
        assert!(text.contains("06/11/2024"));
        assert!(!text.contains(LOADING_MESSAGE));
    }

    #[tokio::test]
    async fn test_run_once_json_uses_api_field_names() {
        let mut out = Vec::new();
        run_once(
            EchoSource::default(),
            RacePolicy::default(),
            "pib",
            Category::All,
            OutputFormat::Json,
            &mut out,
        )
        .await
        .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["titulo"], "pib");
        assert_eq!(value[0]["link"], "https://agenciadenoticias.ibge.gov.br/1");
    }

    #[tokio::test]
    async fn test_run_once_failure_renders_empty_state() {
        let mut out = Vec::new();
        let state = run_once(
            EchoSource::default(),
            RacePolicy::default(),
            "erro",
            Category::All,
            OutputFormat::Text,
            &mut out,
        )
        .await
        .unwrap();

        assert!(state.results.is_empty());
        assert!(!state.is_loading);
        assert!(String::from_utf8(out).unwrap().contains(EMPTY_MESSAGE));
    }

    #[tokio::test]
    async fn test_interactive_session_waits_for_outstanding_searches() {
        let input: &[u8] = b"busca censo\ntipo release\nbuscar\n";
        let mut out = Vec::new();
        let state = run_interactive(EchoSource::default(), RacePolicy::default(), input, &mut out)
            .await
            .unwrap();

        assert!(!state.is_loading);
        assert_eq!(state.query, SearchQuery::new("censo", Category::Release));
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].summary, "Release");

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(LOADING_MESSAGE));
        assert!(text.contains("• censo"));
    }

    #[tokio::test]
    async fn test_interactive_latest_submission_wins() {
        let input: &[u8] = b"busca primeiro\nbuscar\nbusca segundo\nbuscar\n";
        let mut out = Vec::new();
        let state = run_interactive(EchoSource::default(), RacePolicy::LatestWins, input, &mut out)
            .await
            .unwrap();

        assert!(!state.is_loading);
        assert_eq!(state.latest_seq(), 2);
        assert_eq!(state.results[0].title, "segundo");
    }

    #[tokio::test]
    async fn test_interactive_edits_without_submit_never_fetch() {
        let input: &[u8] = b"busca censo\ntipo noticia\nmostrar\n";
        let source = EchoSource::default();
        let mut out = Vec::new();
        let state = run_interactive(source, RacePolicy::default(), input, &mut out)
            .await
            .unwrap();

        assert_eq!(state.latest_seq(), 0);
        assert!(state.results.is_empty());
        assert!(String::from_utf8(out).unwrap().contains(EMPTY_MESSAGE));
    }

    #[tokio::test]
    async fn test_interactive_invalid_command_prints_help() {
        let input: &[u8] = b"tipo blog\nsair\nbuscar\n";
        let mut out = Vec::new();
        let state = run_interactive(EchoSource::default(), RacePolicy::default(), input, &mut out)
            .await
            .unwrap();

        // `sair` stops before the trailing submit is read.
        assert_eq!(state.latest_seq(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("tipo desconhecido"));
        assert!(text.matches(HELP).count() >= 2);
    }

    /// Never settles.
    struct HungSource;

    impl NewsSource for HungSource {
        async fn fetch(&self, _query: &SearchQuery) -> Result<Vec<NewsItem>, FetchError> {
            std::future::pending().await
        }
    }

    /// Panics instead of settling.
    struct PanickingSource;

    impl NewsSource for PanickingSource {
        async fn fetch(&self, _query: &SearchQuery) -> Result<Vec<NewsItem>, FetchError> {
            panic!("source blew up")
        }
    }

    #[tokio::test]
    async fn test_interactive_end_of_input_waits_for_hung_search() {
        let input: &[u8] = b"buscar\n";
        let mut out = Vec::new();
        let session = run_interactive(HungSource, RacePolicy::default(), input, &mut out);

        let finished = tokio::time::timeout(Duration::from_millis(200), session).await;
        assert!(finished.is_err(), "session must wait for the outstanding search");
    }

    #[tokio::test]
    async fn test_interactive_quit_abandons_hung_search() {
        let input: &[u8] = b"buscar\nsair\n";
        let mut out = Vec::new();
        let session = run_interactive(HungSource, RacePolicy::default(), input, &mut out);

        let state = tokio::time::timeout(Duration::from_secs(5), session)
            .await
            .expect("sair must not wait for searches")
            .unwrap();
        assert!(state.is_loading);
        assert_eq!(state.latest_seq(), 1);
    }

    #[tokio::test]
    async fn test_interactive_panicking_search_still_settles() {
        let input: &[u8] = b"busca censo\nbuscar\n";
        let mut out = Vec::new();
        let session = run_interactive(PanickingSource, RacePolicy::default(), input, &mut out);

        let state = tokio::time::timeout(Duration::from_secs(5), session)
            .await
            .expect("a panicked search must not keep the session alive")
            .unwrap();
        assert!(!state.is_loading);
        assert!(state.results.is_empty());
        assert!(String::from_utf8(out).unwrap().contains(EMPTY_MESSAGE));
    }
}
