use std::sync::Arc;

use tracing::debug;

use super::FacetSnapshot;
use crate::fetch::RequestKey;

/// Where the publicly visible facet set currently comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetSource {
    /// Counts from the response to the current non-empty query.
    SearchDerived,
    /// Counts under the active filters alone; the query is empty.
    FilterBaseline,
    /// The payload for the current key has not arrived yet; the previous set
    /// stays up.
    HoldPrevious,
}

/// Decides which facet snapshot the filter panel shows.
///
/// Payloads are accepted only for the key that is current when they arrive,
/// so a slow response for an abandoned query can never replace newer data.
#[derive(Debug)]
pub struct FacetReconciler {
    source: FacetSource,
    search_key: Option<RequestKey>,
    baseline_key: Option<RequestKey>,
    visible: Option<Arc<FacetSnapshot>>,
    baseline: Option<(RequestKey, Arc<FacetSnapshot>)>,
}

impl Default for FacetReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl FacetReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: FacetSource::FilterBaseline,
            search_key: None,
            baseline_key: None,
            visible: None,
            baseline: None,
        }
    }

    #[must_use]
    pub const fn source(&self) -> FacetSource {
        self.source
    }

    /// The snapshot the filter UI should render. `None` only until the first
    /// snapshot ever arrives.
    #[must_use]
    pub fn visible(&self) -> Option<&FacetSnapshot> {
        self.visible.as_deref()
    }

    /// Track the keys that are current after a state change.
    ///
    /// `search_key` is `None` while the query is empty. Switching to a new
    /// search key holds the previous snapshot until its payload arrives. An
    /// empty query shows the stored baseline only when it was fetched for the
    /// current filters; otherwise the panel holds until that baseline lands.
    pub fn observe(&mut self, search_key: Option<&RequestKey>, baseline_key: Option<&RequestKey>) {
        if self.baseline_key.as_ref() != baseline_key {
            self.baseline_key = baseline_key.cloned();
        }

        match search_key {
            None => {
                self.search_key = None;
                match self.current_baseline() {
                    Some(baseline) => {
                        if self.source != FacetSource::FilterBaseline {
                            debug!("query empty; showing filter baseline");
                        }
                        self.visible = Some(baseline);
                        self.source = FacetSource::FilterBaseline;
                    }
                    None => {
                        if self.source != FacetSource::HoldPrevious {
                            debug!("no baseline for the current filters yet; holding facets");
                        }
                        self.source = FacetSource::HoldPrevious;
                    }
                }
            }
            Some(key) => {
                if self.search_key.as_ref() != Some(key) {
                    self.search_key = Some(key.clone());
                    self.source = FacetSource::HoldPrevious;
                }
            }
        }
    }

    /// Offer the facets from a search response. Returns whether they were
    /// adopted.
    pub fn accept_search(&mut self, key: &RequestKey, snapshot: Arc<FacetSnapshot>) -> bool {
        if self.search_key.as_ref() != Some(key) {
            debug!(%key, "discarding facets for a superseded search");
            return false;
        }
        self.visible = Some(snapshot);
        self.source = FacetSource::SearchDerived;
        true
    }

    /// Offer a filter-only facet payload. It is stored for later even while
    /// a query is active, and shown immediately when the query is empty.
    pub fn accept_baseline(&mut self, key: &RequestKey, snapshot: Arc<FacetSnapshot>) -> bool {
        if self.baseline_key.as_ref() != Some(key) {
            debug!(%key, "discarding facets for a superseded filter set");
            return false;
        }
        if self.search_key.is_none() {
            self.visible = Some(Arc::clone(&snapshot));
            self.source = FacetSource::FilterBaseline;
        }
        self.baseline = Some((key.clone(), snapshot));
        true
    }

    fn current_baseline(&self) -> Option<Arc<FacetSnapshot>> {
        let (key, snapshot) = self.baseline.as_ref()?;
        (self.baseline_key.as_ref() == Some(key)).then(|| Arc::clone(snapshot))
    }
}
