//! The guarded search state machine. Two states, Idle and Fetching; the
//! `fetching` flag is set synchronously when a ticket is issued and cleared
//! synchronously when its completion is applied, so at most one fetch is
//! outstanding no matter how many submit events arrive while one is in
//! flight.

use bookfind_api::params::BOOTSTRAP_QUERY;
use bookfind_api::volume::VolumeResult;
use bookfind_client::{CatalogClient, FetchError};

/// Why a submit was refused. Guards are checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// A fetch is already outstanding.
    InFlight,
    /// Trimmed query is empty.
    EmptyQuery,
    /// Trimmed query equals the last completed search.
    RepeatQuery,
}

/// Which event issued a ticket. Only submits record `last_query` on
/// success; the activation fetch leaves it absent, so resubmitting the
/// bootstrap query still works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Activation,
    Submit,
}

/// Permission to run exactly one fetch. Issued only while idle; consumed
/// by `complete`. Not cloneable, so a ticket cannot authorize two fetches.
#[derive(Debug, PartialEq, Eq)]
pub struct FetchTicket {
    query: String,
    origin: FetchOrigin,
    generation: u64,
}

impl FetchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Current input text, mirrored unconditionally from the UI.
    pub query: String,
    /// Last query whose submit completed successfully.
    pub last_query: Option<String>,
    pub results: Vec<VolumeResult>,
    pub fetching: bool,
}

pub struct SearchController {
    state: SearchState,
    activated: bool,
    generation: u64,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchController {
    pub fn new() -> Self {
        Self {
            state: SearchState {
                query: BOOTSTRAP_QUERY.to_string(),
                ..Default::default()
            },
            activated: false,
            generation: 0,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Replace the query text. No fetch effect.
    pub fn on_query_change(&mut self, text: &str) {
        self.state.query = text.to_string();
    }

    /// Empty the query text (the presenter's "search again" action).
    pub fn clear_query(&mut self) {
        self.state.query.clear();
    }

    /// One bootstrap fetch per controller instance; later query edits never
    /// re-run it.
    pub fn on_activate(&mut self) -> Option<FetchTicket> {
        if self.activated {
            return None;
        }
        self.activated = true;
        if self.state.fetching {
            return None;
        }
        Some(self.issue(BOOTSTRAP_QUERY.to_string(), FetchOrigin::Activation))
    }

    /// Guarded submit. On success the controller is Fetching and the
    /// returned ticket must be driven to `complete`.
    pub fn on_submit(&mut self) -> Result<FetchTicket, SubmitError> {
        if self.state.fetching {
            return Err(SubmitError::InFlight);
        }
        let trimmed = self.state.query.trim();
        if trimmed.is_empty() {
            return Err(SubmitError::EmptyQuery);
        }
        if self.state.last_query.as_deref() == Some(trimmed) {
            return Err(SubmitError::RepeatQuery);
        }
        let query = trimmed.to_string();
        Ok(self.issue(query, FetchOrigin::Submit))
    }

    fn issue(&mut self, query: String, origin: FetchOrigin) -> FetchTicket {
        self.state.fetching = true;
        self.generation += 1;
        FetchTicket {
            query,
            origin,
            generation: self.generation,
        }
    }

    /// Apply a fetch outcome. A ticket issued before the last `reset` is
    /// stale: its late response is dropped instead of applied.
    pub fn complete(&mut self, ticket: FetchTicket, outcome: Result<Vec<VolumeResult>, FetchError>) {
        if ticket.generation != self.generation {
            tracing::debug!(
                "[search] dropping late response for {:?} (stale ticket)",
                ticket.query
            );
            return;
        }
        self.state.fetching = false;
        match outcome {
            Ok(results) => {
                self.state.results = results;
                if ticket.origin == FetchOrigin::Submit {
                    self.state.last_query = Some(ticket.query);
                }
            }
            Err(err) => {
                tracing::warn!("[search] fetch for {:?} failed: {err}", ticket.query);
                self.state.results.clear();
            }
        }
    }

    /// Tear down and remount: fresh state, and any ticket still in flight
    /// becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.activated = false;
        self.state = SearchState {
            query: BOOTSTRAP_QUERY.to_string(),
            ..Default::default()
        };
    }

    /// Drive one ticket against the client and apply the outcome.
    pub async fn run(&mut self, client: &CatalogClient, ticket: FetchTicket) {
        let outcome = client.search(ticket.query()).await;
        self.complete(ticket, outcome);
    }
}
