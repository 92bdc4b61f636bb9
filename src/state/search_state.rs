use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::{FilterDimension, SearchMode};

/// Ordered, de-duplicated values selected for one filter dimension.
pub type FilterValues = IndexSet<String>;

/// A byte-size constraint where either edge may be open.
///
/// A range always has at least one bound and `min <= max` when both are set;
/// use [`SizeRange::new`] to normalise arbitrary input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SizeBounds")]
pub struct SizeRange {
    min: Option<u64>,
    max: Option<u64>,
}

impl SizeRange {
    /// Build a range from optional bounds.
    ///
    /// Returns `None` when both bounds are absent, which means the filter is
    /// inactive. Reversed bounds are swapped.
    #[must_use]
    pub fn new(min: Option<u64>, max: Option<u64>) -> Option<Self> {
        match (min, max) {
            (None, None) => None,
            (Some(low), Some(high)) if low > high => Some(Self {
                min: Some(high),
                max: Some(low),
            }),
            (min, max) => Some(Self { min, max }),
        }
    }

    #[must_use]
    pub fn between(min: u64, max: u64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    #[must_use]
    pub const fn at_least(min: u64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    #[must_use]
    pub const fn at_most(max: u64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    #[must_use]
    pub const fn min(&self) -> Option<u64> {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Option<u64> {
        self.max
    }
}

/// Raw bounds as they appear in serialized form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SizeBounds {
    min: Option<u64>,
    max: Option<u64>,
}

impl TryFrom<SizeBounds> for SizeRange {
    type Error = &'static str;

    fn try_from(bounds: SizeBounds) -> Result<Self, Self::Error> {
        SizeRange::new(bounds.min, bounds.max)
            .ok_or("size range needs at least one bound")
    }
}

/// The composite value that drives the URL, the backend request and the
/// filter panel.
///
/// Fields are private so every instance upholds the invariants: absent
/// filter keys instead of empty sets, no empty size range, and a 1-based page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SearchStateFields")]
pub struct SearchState {
    query: String,
    filters: BTreeMap<FilterDimension, FilterValues>,
    size_range: Option<SizeRange>,
    mode: SearchMode,
    page: u32,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            filters: BTreeMap::new(),
            size_range: None,
            mode: SearchMode::Normal,
            page: 1,
        }
    }
}

/// Serialized form of [`SearchState`], normalised through the builders on
/// the way in.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchStateFields {
    query: String,
    filters: BTreeMap<FilterDimension, Vec<String>>,
    size_range: Option<SizeBounds>,
    mode: SearchMode,
    page: u32,
}

impl From<SearchStateFields> for SearchState {
    fn from(fields: SearchStateFields) -> Self {
        let size_range = fields
            .size_range
            .and_then(|bounds| SizeRange::new(bounds.min, bounds.max));
        let mut state = SearchState::new()
            .with_query(fields.query)
            .with_size_range(size_range)
            .with_mode(fields.mode)
            .with_page(fields.page);
        for (dimension, values) in fields.filters {
            state.replace_filter(dimension, values);
        }
        state
    }
}

impl SearchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_filter<I, S>(mut self, dimension: FilterDimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replace_filter(dimension, values);
        self
    }

    #[must_use]
    pub fn with_size_range(mut self, range: Option<SizeRange>) -> Self {
        self.size_range = range;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether the free-text query is non-empty.
    #[must_use]
    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    #[must_use]
    pub fn filters(&self) -> &BTreeMap<FilterDimension, FilterValues> {
        &self.filters
    }

    #[must_use]
    pub fn filter(&self, dimension: FilterDimension) -> Option<&FilterValues> {
        self.filters.get(&dimension)
    }

    #[must_use]
    pub const fn size_range(&self) -> Option<SizeRange> {
        self.size_range
    }

    #[must_use]
    pub const fn mode(&self) -> SearchMode {
        self.mode
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    pub(crate) fn set_query_text(&mut self, query: String) {
        self.query = query;
    }

    /// Replace the values of one dimension, dropping empty strings and
    /// duplicates. An empty result removes the key entirely.
    pub(crate) fn replace_filter<I, S>(&mut self, dimension: FilterDimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: FilterValues = values
            .into_iter()
            .map(Into::into)
            .filter(|value| !value.is_empty())
            .collect();
        if values.is_empty() {
            self.filters.remove(&dimension);
        } else {
            self.filters.insert(dimension, values);
        }
    }

    pub(crate) fn set_size_range(&mut self, range: Option<SizeRange>) {
        self.size_range = range;
    }

    pub(crate) fn set_mode(&mut self, mode: SearchMode) {
        self.mode = mode;
    }

    pub(crate) fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }
}
