use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::facets::{FacetCount, FacetSnapshot};

/// One matching document. Only the path is interpreted here; everything
/// else is passed through to the results renderer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SearchHit {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            repository: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Body returned by both the search and the facet endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<BTreeMap<String, Vec<FacetCount>>>,
}

impl SearchResponse {
    #[must_use]
    pub fn with_results(mut self, results: Vec<SearchHit>, total: u64) -> Self {
        self.results = results;
        self.total = total;
        self
    }

    #[must_use]
    pub fn with_facet(mut self, key: &str, counts: Vec<FacetCount>) -> Self {
        self.facets
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), counts);
        self
    }

    /// Facets as a snapshot, or `None` when the payload carried none.
    #[must_use]
    pub fn facet_snapshot(&self) -> Option<FacetSnapshot> {
        self.facets.as_ref().map(FacetSnapshot::from_payload)
    }
}
