//! History access injected into the orchestrator.
//!
//! The orchestrator never touches a global history object. It reads the
//! initial location and writes URL updates through a [`NavigationSink`], so an
//! in-memory [`MemoryHistory`] can stand in for the browser or a terminal
//! front end.

use serde::Serialize;

use crate::state::SearchState;

/// Search context handed to the destination screen in memory, so it does not
/// have to re-derive anything from the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationContext {
    pub search: SearchState,
}

/// A new location pushed when the user activates a result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub path: String,
    pub context: NavigationContext,
}

/// Capability to read and rewrite the current location.
pub trait NavigationSink {
    /// Query string of the location the screen was opened with, without the
    /// leading `?`.
    fn initial_query(&self) -> String;

    /// Replace the current entry's query string without adding a history
    /// entry.
    fn replace_query(&mut self, query: &str);

    /// Navigate to a new entry.
    fn push(&mut self, destination: Destination);
}

/// History kept entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryHistory {
    initial: String,
    current: String,
    replacements: usize,
    pushed: Vec<Destination>,
}

impl MemoryHistory {
    /// Start at a location with the given query string. A leading `?` is
    /// accepted and stripped.
    #[must_use]
    pub fn at(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query).to_string();
        Self {
            initial: query.clone(),
            current: query,
            replacements: 0,
            pushed: Vec::new(),
        }
    }

    /// Query string of the current entry.
    #[must_use]
    pub fn current_query(&self) -> &str {
        &self.current
    }

    /// Current location rendered as `?query`, or an empty string when there
    /// are no parameters.
    #[must_use]
    pub fn location(&self) -> String {
        if self.current.is_empty() {
            String::new()
        } else {
            format!("?{}", self.current)
        }
    }

    /// How many times the current entry was rewritten in place.
    #[must_use]
    pub const fn replacements(&self) -> usize {
        self.replacements
    }

    #[must_use]
    pub fn pushed(&self) -> &[Destination] {
        &self.pushed
    }
}

impl NavigationSink for MemoryHistory {
    fn initial_query(&self) -> String {
        self.initial.clone()
    }

    fn replace_query(&mut self, query: &str) {
        self.current = query.to_string();
        self.replacements += 1;
    }

    fn push(&mut self, destination: Destination) {
        self.pushed.push(destination);
    }
}

impl<N: NavigationSink + ?Sized> NavigationSink for Box<N> {
    fn initial_query(&self) -> String {
        (**self).initial_query()
    }

    fn replace_query(&mut self, query: &str) {
        (**self).replace_query(query);
    }

    fn push(&mut self, destination: Destination) {
        (**self).push(destination);
    }
}
