use std::fmt;

use url::form_urlencoded;

use crate::state::SearchState;

/// Which backend endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Paged results plus facets for a non-empty query.
    Search,
    /// Facet counts under the current filters alone.
    FacetBaseline,
}

impl RequestKind {
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            RequestKind::Search => "search",
            RequestKind::FacetBaseline => "facets",
        }
    }
}

/// Deterministic identity of a request: the endpoint plus every parameter
/// that can change the response. Equal keys share one network call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully derived backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    pub kind: RequestKind,
    pub params: Vec<(String, String)>,
}

impl BackendRequest {
    /// Parameters rendered as a query string.
    #[must_use]
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    #[must_use]
    pub fn key(&self) -> RequestKey {
        RequestKey(format!("{}?{}", self.kind.id(), self.query_string()))
    }

    fn push(&mut self, key: &str, value: impl ToString) {
        self.params.push((key.to_string(), value.to_string()));
    }
}

/// Build the search call for `state`. An empty query yields `None`: the
/// search pipeline is disabled and nothing goes over the wire.
#[must_use]
pub fn search_request(state: &SearchState, page_size: u32) -> Option<BackendRequest> {
    if !state.has_query() {
        return None;
    }

    let mut request = BackendRequest {
        kind: RequestKind::Search,
        params: Vec::new(),
    };
    request.push("q", state.query());
    push_constraints(&mut request, state);
    request.push("fuzzy_search", state.mode().is_fuzzy());
    request.push("regex_search", state.mode().is_regex());
    request.push("page", state.page());
    request.push("limit", page_size);
    request.push("include_facets", true);
    Some(request)
}

/// Build the filter-only facet call. Query, mode and paging do not affect
/// the baseline and are left out so they share one key.
#[must_use]
pub fn facet_baseline_request(state: &SearchState) -> BackendRequest {
    let mut request = BackendRequest {
        kind: RequestKind::FacetBaseline,
        params: Vec::new(),
    };
    push_constraints(&mut request, state);
    request
}

fn push_constraints(request: &mut BackendRequest, state: &SearchState) {
    for (dimension, values) in state.filters() {
        for value in values {
            request.push(dimension.id(), value);
        }
    }
    if let Some(range) = state.size_range() {
        if let Some(min) = range.min() {
            request.push("min_size", min);
        }
        if let Some(max) = range.max() {
            request.push("max_size", max);
        }
    }
}
