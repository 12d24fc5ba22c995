//! Presenter boundary: derives what to draw from `SearchState` and owns
//! the input-pulse guard. Any UI layer can sit on top of this; the text
//! renderer here is what the demo binary uses.

use std::fmt::Write as _;

use bookfind_api::volume::VolumeResult;

use crate::controller::{SearchController, SearchState};

/// Mutually exclusive render decision, in priority order: loading wins,
/// then results, then the empty-state prompt.
#[derive(Debug, PartialEq)]
pub enum ViewState<'a> {
    Loading,
    Results(&'a [VolumeResult]),
    Empty { last_query: Option<&'a str> },
}

pub fn view_state(state: &SearchState) -> ViewState<'_> {
    if state.fetching {
        ViewState::Loading
    } else if !state.results.is_empty() {
        ViewState::Results(&state.results)
    } else {
        ViewState::Empty {
            last_query: state.last_query.as_deref(),
        }
    }
}

/// One-shot attention pulse on the input container. `try_start` refuses to
/// re-trigger until the UI reports the animation ended.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BounceGuard {
    animating: bool,
}

impl BounceGuard {
    /// Returns true when a new pulse may start.
    pub fn try_start(&mut self) -> bool {
        if self.animating {
            return false;
        }
        self.animating = true;
        true
    }

    pub fn on_end(&mut self) {
        self.animating = false;
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }
}

/// Effects the UI layer must apply after a "search again" click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgainEffects {
    pub focus_input: bool,
    pub start_bounce: bool,
}

/// The empty-state button: always refocus the input, clear the query only
/// once a search has completed, and pulse the input container unless a
/// pulse is already running.
pub fn on_search_again(controller: &mut SearchController, bounce: &mut BounceGuard) -> AgainEffects {
    if controller.state().last_query.is_some() {
        controller.clear_query();
    }
    AgainEffects {
        focus_input: true,
        start_bounce: bounce.try_start(),
    }
}

/// Plain-text rendering of the view, one block per state.
pub struct TextPresenter;

impl TextPresenter {
    pub fn render(state: &SearchState) -> String {
        match view_state(state) {
            ViewState::Loading => "Loading...⌛".to_string(),
            ViewState::Results(results) => {
                let mut out = String::new();
                for (i, book) in results.iter().enumerate() {
                    let _ = writeln!(
                        out,
                        "{}. {}",
                        i + 1,
                        book.title.as_deref().unwrap_or("(untitled)")
                    );
                    let _ = writeln!(out, "   by {}", book.authors.join(", "));
                    if let Some(thumb) = &book.thumbnail_url {
                        let _ = writeln!(out, "   cover: {thumb}");
                    }
                    if let Some(link) = &book.preview_url {
                        let _ = writeln!(out, "   preview: {link}");
                    }
                }
                out
            }
            ViewState::Empty { last_query } => match last_query {
                Some(q) => format!("No Books Found for \"{q}\"\n[Search again?]"),
                None => "Nothing to see here yet. 👻👀\n[Let's find a book! 🔍]".to_string(),
            },
        }
    }
}
