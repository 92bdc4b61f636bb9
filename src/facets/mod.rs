//! Facet counts: snapshots, the reconciler choosing which one is visible, and
//! the option lists rendered by the filter panel.

mod options;
mod reconciler;
mod snapshot;

pub use options::{FacetOption, FallbackOptions, available_options};
pub use reconciler::{FacetReconciler, FacetSource};
pub use snapshot::{FacetCount, FacetSnapshot, SIZE_RANGES_KEY};
