use super::{FilterDimension, SearchMode, SearchState, SizeRange};

/// Why the search state changed, so subscribers can react differently to the
/// one-time load from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// State was seeded from the inbound URL while the page loads.
    Initialization,
    /// State was mutated through one of the container's operations.
    Local,
}

/// Emitted after a mutation was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub origin: ChangeOrigin,
    /// Monotonic counter of applied changes.
    pub revision: u64,
}

/// Receives every applied change, in registration order.
pub trait StateSubscriber {
    fn state_changed(&mut self, state: &SearchState, change: StateChange);
}

/// Single owner of the [`SearchState`].
///
/// Every operation applies its change and reports a [`StateChange`] when the
/// state actually differs from before; callers fan that out to subscribers.
/// No-op mutations return `None` so they never trigger a URL rewrite or a
/// new request.
#[derive(Debug, Default)]
pub struct SearchStateContainer {
    state: SearchState,
    revision: u64,
    initialized: bool,
}

impl SearchStateContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Seed the container with state decoded from the inbound URL.
    ///
    /// Only the first call is reported as [`ChangeOrigin::Initialization`];
    /// later calls behave like a local replacement.
    pub fn initialize(&mut self, state: SearchState) -> StateChange {
        let origin = if self.initialized {
            ChangeOrigin::Local
        } else {
            ChangeOrigin::Initialization
        };
        self.initialized = true;
        self.state = state;
        self.bump(origin)
    }

    pub fn set_query(&mut self, text: impl Into<String>) -> Option<StateChange> {
        let text = text.into();
        self.mutate(|state| {
            state.set_query_text(text);
            state.set_page(1);
        })
    }

    pub fn set_filter<I, S>(&mut self, dimension: FilterDimension, values: I) -> Option<StateChange>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mutate(|state| {
            state.replace_filter(dimension, values);
            state.set_page(1);
        })
    }

    pub fn set_size_range(&mut self, range: Option<SizeRange>) -> Option<StateChange> {
        self.mutate(|state| {
            state.set_size_range(range);
            state.set_page(1);
        })
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) -> Option<StateChange> {
        self.mutate(|state| {
            state.set_mode(mode);
            state.set_page(1);
        })
    }

    /// Switch to `mode`, or back to [`SearchMode::Normal`] when it is already
    /// active.
    pub fn toggle_search_mode(&mut self, mode: SearchMode) -> Option<StateChange> {
        let next = if self.state.mode() == mode {
            SearchMode::Normal
        } else {
            mode
        };
        self.set_search_mode(next)
    }

    /// Change the page without touching any other field.
    pub fn set_page(&mut self, page: u32) -> Option<StateChange> {
        self.mutate(|state| state.set_page(page))
    }

    fn mutate(&mut self, apply: impl FnOnce(&mut SearchState)) -> Option<StateChange> {
        let before = self.state.clone();
        apply(&mut self.state);
        if self.state == before {
            return None;
        }
        self.initialized = true;
        Some(self.bump(ChangeOrigin::Local))
    }

    fn bump(&mut self, origin: ChangeOrigin) -> StateChange {
        self.revision = self.revision.wrapping_add(1);
        StateChange {
            origin,
            revision: self.revision,
        }
    }
}
