use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::FilterDimension;

/// Key under which the backend reports size buckets.
pub const SIZE_RANGES_KEY: &str = "size_ranges";

/// One facet value and how many documents carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: u64,
}

impl FacetCount {
    #[must_use]
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// Facet counts for every dimension plus the optional size buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetSnapshot {
    dimensions: BTreeMap<FilterDimension, Vec<FacetCount>>,
    size_buckets: Option<Vec<FacetCount>>,
}

impl FacetSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: FilterDimension, counts: Vec<FacetCount>) -> Self {
        self.dimensions.insert(dimension, counts);
        self
    }

    #[must_use]
    pub fn with_size_buckets(mut self, buckets: Vec<FacetCount>) -> Self {
        self.size_buckets = Some(buckets);
        self
    }

    /// Build a snapshot from the backend's `facets` object. Unknown keys are
    /// ignored.
    #[must_use]
    pub fn from_payload(payload: &BTreeMap<String, Vec<FacetCount>>) -> Self {
        let mut snapshot = Self::new();
        for (key, counts) in payload {
            if key == SIZE_RANGES_KEY {
                snapshot.size_buckets = Some(counts.clone());
            } else if let Some(dimension) = FilterDimension::from_id(key) {
                snapshot.dimensions.insert(dimension, counts.clone());
            }
        }
        snapshot
    }

    #[must_use]
    pub fn counts(&self, dimension: FilterDimension) -> &[FacetCount] {
        self.dimensions
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn size_buckets(&self) -> &[FacetCount] {
        self.size_buckets.as_deref().unwrap_or(&[])
    }

    #[must_use]
    pub fn has_size_buckets(&self) -> bool {
        self.size_buckets.is_some()
    }

    #[must_use]
    pub fn count_for(&self, dimension: FilterDimension, value: &str) -> Option<u64> {
        self.counts(dimension)
            .iter()
            .find(|entry| entry.value == value)
            .map(|entry| entry.count)
    }
}
