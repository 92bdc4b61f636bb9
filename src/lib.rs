//! Search-state orchestration for a faceted code-search front end.
//!
//! The crate keeps one [`SearchState`] in sync with the page URL, turns it
//! into keyed backend requests, reconciles facet counts so the filter panel
//! never flickers, and drives a logarithmic file-size slider with debounced
//! commits. [`SearchOrchestrator`] wires the pieces together; the individual
//! modules are usable on their own.

pub mod app_dirs;
pub mod clock;
pub mod debounce;
pub mod facets;
pub mod fetch;
pub mod logging;
pub mod navigation;
pub mod orchestrator;
pub mod slider;
pub mod state;
pub mod url_codec;

pub use clock::{Clock, ManualClock, SystemClock};
pub use navigation::{Destination, MemoryHistory, NavigationContext, NavigationSink};
pub use orchestrator::{OrchestratorConfig, PresetView, ResultsView, SearchOrchestrator};
pub use state::{
    ChangeOrigin, FilterDimension, SearchMode, SearchState, SearchStateContainer, SizeRange,
    StateChange, StateSubscriber,
};
