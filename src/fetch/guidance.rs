//! User-facing advice attached to failed searches.

use serde::Serialize;

use super::{FetchError, FetchErrorKind};
use crate::state::SearchMode;

const LEADING_WILDCARDS: [&str; 5] = ["^.*", "^.+", ".*", ".+", "*"];

/// What the results area shows for a failed search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub kind: FetchErrorKind,
    pub message: String,
    pub hint: Option<String>,
    /// Whether a "retry" action re-issuing the same request is offered.
    pub retryable: bool,
}

impl ErrorView {
    #[must_use]
    pub fn new(error: &FetchError, query: &str, mode: SearchMode) -> Self {
        match error.kind() {
            FetchErrorKind::Timeout => Self {
                kind: FetchErrorKind::Timeout,
                message: "The search took too long to complete.".to_string(),
                hint: Some(timeout_hint(query, mode)),
                retryable: true,
            },
            FetchErrorKind::Other => Self {
                kind: FetchErrorKind::Other,
                message: error.to_string(),
                hint: None,
                retryable: true,
            },
        }
    }
}

/// Advice for a timed-out query. Regex patterns that open with a wildcard get
/// a specific suggestion to anchor on a literal.
#[must_use]
pub fn timeout_hint(query: &str, mode: SearchMode) -> String {
    if mode.is_regex() {
        if let Some(wildcard) = leading_wildcard(query) {
            let rest = query.trim_start()[wildcard.len()..].trim_start_matches(['.', '*', '+']);
            let example = if rest.is_empty() {
                "a literal word such as `fn`".to_string()
            } else {
                format!("`{rest}`")
            };
            return format!(
                "The pattern starts with `{wildcard}`, which has to be tried at every position of every file. \
                 Start the pattern with {example} instead."
            );
        }
        return "Regular expressions can be expensive on large code bases. \
                Add a literal prefix or narrow the search with filters."
            .to_string();
    }
    "Try a more specific query or narrow the search with filters.".to_string()
}

fn leading_wildcard(query: &str) -> Option<&'static str> {
    let query = query.trim_start();
    LEADING_WILDCARDS
        .into_iter()
        .find(|wildcard| query.starts_with(wildcard))
}
