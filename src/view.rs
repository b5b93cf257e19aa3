//! The search view's state and its transitions.
//!
//! All state lives in one [`ViewState`] value. It changes only through
//! [`update`], which takes the current state and an [`Event`] and returns the
//! next state plus, at most, one [`Command`] for the runtime to execute:
//!
//! ```text
//! ViewState + Event  →  update()  →  ViewState' (+ Command::Fetch)
//! ```
//!
//! `update` does no I/O, so sessions can be replayed event by event in tests.
//! [`SearchView`] wraps the state with a [`NewsSource`] for callers that want
//! to submit and await in one step.
//!
//! # States
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Idle | `Submitted` | Loading |
//! | Loading | `Submitted` | Loading (new request tracked) |
//! | Loading | `Settled` (governing) | Idle, results replaced |
//! | any | `TermChanged` / `CategoryChanged` | unchanged, pending query edited |

use crate::api::{FetchError, NewsSource};
use crate::models::{Category, NewsItem, SearchQuery};
use clap::ValueEnum;
use tracing::{debug, instrument, warn};

/// Which settle is allowed to overwrite the results when submissions overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RacePolicy {
    /// Only the most recent submission may settle the view; older responses
    /// are dropped and the loading flag stays up until the latest one lands.
    #[default]
    #[value(name = "latest")]
    LatestWins,
    /// Every settle overwrites the results and clears the loading flag, so
    /// whichever response arrives last wins.
    #[value(name = "last-settled")]
    LastSettledWins,
}

/// The complete observable state of the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// The pending query, edited by the form fields.
    pub query: SearchQuery,
    pub is_loading: bool,
    /// Items of the last governing response, in API order.
    pub results: Vec<NewsItem>,
    pub policy: RacePolicy,
    /// Sequence number of the most recent submission; 0 before the first.
    latest_seq: u64,
}

impl ViewState {
    pub fn new(policy: RacePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Sequence number handed to the most recent submission.
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }
}

/// Anything that can happen to the view.
#[derive(Debug)]
pub enum Event {
    /// The search term field was edited.
    TermChanged(String),
    /// The category select was changed.
    CategoryChanged(Category),
    /// The form was submitted.
    Submitted,
    /// A request issued by a previous [`Command::Fetch`] settled.
    Settled {
        seq: u64,
        outcome: Result<Vec<NewsItem>, FetchError>,
    },
}

/// Side effects requested by [`update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Issue one request for `query`; report back with `Event::Settled { seq, .. }`.
    Fetch { seq: u64, query: SearchQuery },
}

/// Apply `event` to `state`.
///
/// # Arguments
///
/// * `state` - The current view state, consumed
/// * `event` - What happened: a field edit, a submission or a settle
///
/// # Returns
///
/// The next state, and a [`Command::Fetch`] when `event` was a submission.
/// A settle that doesn't govern under the state's [`RacePolicy`] leaves the
/// state untouched.
pub fn update(mut state: ViewState, event: Event) -> (ViewState, Option<Command>) {
    match event {
        Event::TermChanged(term) => {
            state.query = SearchQuery::new(&term, state.query.category);
            (state, None)
        }
        Event::CategoryChanged(category) => {
            state.query.category = category;
            (state, None)
        }
        Event::Submitted => {
            state.latest_seq += 1;
            state.is_loading = true;
            let command = Command::Fetch {
                seq: state.latest_seq,
                query: state.query.clone(),
            };
            (state, Some(command))
        }
        Event::Settled { seq, outcome } => {
            let governs = match state.policy {
                RacePolicy::LatestWins => seq == state.latest_seq,
                RacePolicy::LastSettledWins => true,
            };
            if governs {
                state.results = outcome.unwrap_or_default();
                state.is_loading = false;
            }
            (state, None)
        }
    }
}

/// A [`ViewState`] bound to the [`NewsSource`] that answers its searches.
///
/// This is the one-request-at-a-time façade: [`SearchView::submit`] issues the
/// fetch and awaits its settle before returning.
#[derive(Debug)]
pub struct SearchView<S> {
    state: ViewState,
    source: S,
}

impl<S: NewsSource> SearchView<S> {
    pub fn new(source: S, policy: RacePolicy) -> Self {
        Self {
            state: ViewState::new(policy),
            source,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn update_term(&mut self, text: &str) {
        self.dispatch(Event::TermChanged(text.to_string()));
    }

    pub fn update_category(&mut self, category: Category) {
        self.dispatch(Event::CategoryChanged(category));
    }

    /// Submit the pending query and wait for the response to settle.
    ///
    /// Failures are logged and leave an empty result list; they never reach
    /// the caller.
    #[instrument(level = "info", skip_all)]
    pub async fn submit(&mut self) {
        let Some(Command::Fetch { seq, query }) = self.dispatch(Event::Submitted) else {
            return;
        };
        let outcome = self.source.fetch(&query).await;
        log_settle(seq, &outcome);
        self.dispatch(Event::Settled { seq, outcome });
    }

    /// Feed an event through [`update`], keeping the resulting state.
    pub fn dispatch(&mut self, event: Event) -> Option<Command> {
        let state = std::mem::take(&mut self.state);
        let (state, command) = update(state, event);
        self.state = state;
        command
    }
}

/// Log the outcome of a settled request.
pub fn log_settle(seq: u64, outcome: &Result<Vec<NewsItem>, FetchError>) {
    match outcome {
        Ok(items) => debug!(seq, count = items.len(), "Search settled"),
        Err(e) => warn!(seq, error = %e, "Search failed; showing no results"),
    }
}
