//! Mapping between [`SearchState`] and the shareable query string.
//!
//! Defaults are never written, so a fresh screen has no parameters at all,
//! and decoding is total: anything malformed falls back to the unset value
//! for that field.

use tracing::debug;
use url::form_urlencoded;

use crate::navigation::NavigationSink;
use crate::state::{
    ChangeOrigin, FilterDimension, SearchMode, SearchState, SizeRange, StateChange,
    StateSubscriber,
};

pub const QUERY_KEY: &str = "q";
pub const MIN_SIZE_KEY: &str = "min_size";
pub const MAX_SIZE_KEY: &str = "max_size";
pub const FUZZY_KEY: &str = "fuzzySearch";
pub const REGEX_KEY: &str = "regexSearch";
pub const PAGE_KEY: &str = "page";

/// Serialise `state` into a query string without the leading `?`.
#[must_use]
pub fn encode(state: &SearchState) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());

    if state.has_query() {
        out.append_pair(QUERY_KEY, state.query());
    }

    for (dimension, values) in state.filters() {
        for value in values {
            out.append_pair(dimension.id(), value);
        }
    }

    if let Some(range) = state.size_range() {
        if let Some(min) = range.min() {
            out.append_pair(MIN_SIZE_KEY, &min.to_string());
        }
        if let Some(max) = range.max() {
            out.append_pair(MAX_SIZE_KEY, &max.to_string());
        }
    }

    match state.mode() {
        SearchMode::Normal => {}
        SearchMode::Fuzzy => {
            out.append_pair(FUZZY_KEY, "true");
        }
        SearchMode::Regex => {
            out.append_pair(REGEX_KEY, "true");
        }
    }

    if state.page() > 1 {
        out.append_pair(PAGE_KEY, &state.page().to_string());
    }

    out.finish()
}

/// Parse a query string (with or without a leading `?`) into a state.
#[must_use]
pub fn decode(query: &str) -> SearchState {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut text = String::new();
    let mut filters: Vec<(FilterDimension, String)> = Vec::new();
    let mut min_size = None;
    let mut max_size = None;
    let mut fuzzy = false;
    let mut regex = false;
    let mut page = 1;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            QUERY_KEY => text = value.into_owned(),
            MIN_SIZE_KEY => min_size = value.trim().parse::<u64>().ok(),
            MAX_SIZE_KEY => max_size = value.trim().parse::<u64>().ok(),
            FUZZY_KEY => fuzzy = parse_flag(&value),
            REGEX_KEY => regex = parse_flag(&value),
            PAGE_KEY => {
                page = value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|page| *page >= 1)
                    .unwrap_or(1);
            }
            other => {
                if let Some(dimension) = FilterDimension::from_id(other) {
                    filters.push((dimension, value.into_owned()));
                }
            }
        }
    }

    let mut state = SearchState::new()
        .with_query(text)
        .with_size_range(SizeRange::new(min_size, max_size))
        .with_mode(SearchMode::from_flags(fuzzy, regex))
        .with_page(page);

    for dimension in FilterDimension::all() {
        let values = filters
            .iter()
            .filter(|(candidate, _)| *candidate == dimension)
            .map(|(_, value)| value.clone());
        state = state.with_filter(dimension, values);
    }

    state
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Keeps the location in sync with the state using replace semantics.
///
/// The initial load from the URL is never written back, and unchanged
/// encodings are skipped so repeated notifications cost nothing.
#[derive(Debug)]
pub struct UrlWriter<N> {
    sink: N,
    last_written: Option<String>,
}

impl<N: NavigationSink> UrlWriter<N> {
    #[must_use]
    pub fn new(sink: N) -> Self {
        Self {
            sink,
            last_written: None,
        }
    }

    /// Decode the state the screen was opened with.
    #[must_use]
    pub fn read_initial(&self) -> SearchState {
        decode(&self.sink.initial_query())
    }

    #[must_use]
    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    pub fn into_sink(self) -> N {
        self.sink
    }
}

impl<N: NavigationSink> StateSubscriber for UrlWriter<N> {
    fn state_changed(&mut self, state: &SearchState, change: StateChange) {
        let encoded = encode(state);
        if change.origin == ChangeOrigin::Initialization {
            debug!(revision = change.revision, "skipping URL rewrite while initializing from URL");
            self.last_written = Some(encoded);
            return;
        }
        if self.last_written.as_deref() == Some(encoded.as_str()) {
            return;
        }
        debug!(revision = change.revision, query = %encoded, "replacing location");
        self.sink.replace_query(&encoded);
        self.last_written = Some(encoded);
    }
}
