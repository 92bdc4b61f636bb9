use std::collections::BTreeMap;

use serde::Serialize;

use super::FacetSnapshot;
use crate::state::{FilterDimension, FilterValues};

/// Static option lists used when no facet data is available.
pub type FallbackOptions = BTreeMap<FilterDimension, Vec<String>>;

/// A choice rendered in a filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetOption {
    pub value: String,
    /// `None` when the count is unknown, never a made-up zero.
    pub count: Option<u64>,
    pub selected: bool,
}

/// Options for one dimension.
///
/// Live facet counts win when the snapshot has any for this dimension,
/// otherwise the static fallback list is used. Selected values are always
/// listed so they can be deselected, even when the backend no longer
/// reports them.
#[must_use]
pub fn available_options(
    dimension: FilterDimension,
    snapshot: Option<&FacetSnapshot>,
    fallback: &FallbackOptions,
    selected: Option<&FilterValues>,
) -> Vec<FacetOption> {
    let is_selected = |value: &str| selected.is_some_and(|values| values.contains(value));

    let live = snapshot.map(|snapshot| snapshot.counts(dimension)).unwrap_or_default();
    let mut options: Vec<FacetOption> = if live.is_empty() {
        fallback
            .get(&dimension)
            .into_iter()
            .flatten()
            .map(|value| FacetOption {
                value: value.clone(),
                count: None,
                selected: is_selected(value.as_str()),
            })
            .collect()
    } else {
        live.iter()
            .map(|entry| FacetOption {
                value: entry.value.clone(),
                count: Some(entry.count),
                selected: is_selected(entry.value.as_str()),
            })
            .collect()
    };

    for value in selected.into_iter().flatten() {
        if !options.iter().any(|option| &option.value == value) {
            options.push(FacetOption {
                value: value.clone(),
                count: None,
                selected: true,
            });
        }
    }

    options
}
