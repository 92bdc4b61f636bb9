//! Wires the search state to the URL, the fetch pipeline, the facet
//! reconciler and the size filter.
//!
//! Every mutation goes through [`SearchStateContainer`]; when it reports a
//! change, [`SearchOrchestrator`] fans it out in a fixed order: URL writer,
//! request builder, facet reconciler, size filter control, then any extra
//! subscribers. Timers and network answers are processed in
//! [`SearchOrchestrator::tick`], which the host event loop calls regularly.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::facets::{
    FacetOption, FacetReconciler, FacetSnapshot, FacetSource, FallbackOptions, available_options,
};
use crate::fetch::{
    ErrorView, FetchPipeline, FetchSettings, FetchStatus, LoadingIndicator, RequestKind,
    Resolution, SearchHit, SearchResponse, Transport,
};
use crate::navigation::{Destination, NavigationContext, NavigationSink};
use crate::slider::{DEFAULT_DEBOUNCE, SIZE_PRESETS, SizeFilterControl, SizePreset, toggle_preset};
use crate::state::{
    FilterDimension, SearchMode, SearchState, SearchStateContainer, SizeRange, StateChange,
    StateSubscriber,
};
use crate::url_codec::UrlWriter;

/// Construction parameters for [`SearchOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub fetch: FetchSettings,
    pub size_debounce: Duration,
    pub fallback: FallbackOptions,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            size_debounce: DEFAULT_DEBOUNCE,
            fallback: FallbackOptions::new(),
        }
    }
}

/// Props handed to the results renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub results: Vec<SearchHit>,
    pub query: String,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub indicator: LoadingIndicator,
    pub error: Option<ErrorView>,
    pub total_results: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub regex_search: bool,
}

/// A size preset as the filter panel renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetView {
    pub label: &'static str,
    pub selected: bool,
    /// Facet count for the preset's bucket, when the backend reported one.
    pub count: Option<u64>,
}

/// Owner and only writer of the search state.
pub struct SearchOrchestrator<T, N, C = SystemClock> {
    container: SearchStateContainer,
    url: UrlWriter<N>,
    pipeline: FetchPipeline<T>,
    facets: FacetReconciler,
    size_filter: Option<SizeFilterControl>,
    size_debounce: Duration,
    fallback: FallbackOptions,
    clock: C,
    listeners: Vec<Box<dyn StateSubscriber>>,
    displayed: Option<Arc<SearchResponse>>,
}

impl<T: Transport, N: NavigationSink, C: Clock> SearchOrchestrator<T, N, C> {
    /// Build the orchestrator and load the initial state from the
    /// navigation sink's location. The load issues the first request but
    /// never rewrites the URL.
    pub fn new(transport: T, navigation: N, clock: C, config: OrchestratorConfig) -> Self {
        let url = UrlWriter::new(navigation);
        let initial = url.read_initial();
        let mut orchestrator = Self {
            container: SearchStateContainer::new(),
            url,
            pipeline: FetchPipeline::new(transport, config.fetch),
            facets: FacetReconciler::new(),
            size_filter: Some(SizeFilterControl::new(
                initial.size_range(),
                config.size_debounce,
            )),
            size_debounce: config.size_debounce,
            fallback: config.fallback,
            clock,
            listeners: Vec::new(),
            displayed: None,
        };
        let change = orchestrator.container.initialize(initial);
        orchestrator.notify(change);
        orchestrator
    }

    #[must_use]
    pub fn state(&self) -> &SearchState {
        self.container.state()
    }

    #[must_use]
    pub fn navigation(&self) -> &N {
        self.url.sink()
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        self.pipeline.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.pipeline.transport_mut()
    }

    #[must_use]
    pub fn pipeline(&self) -> &FetchPipeline<T> {
        &self.pipeline
    }

    /// Register an extra observer, notified after the built-in ones.
    pub fn subscribe(&mut self, listener: Box<dyn StateSubscriber>) {
        self.listeners.push(listener);
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        let change = self.container.set_query(text);
        self.publish(change);
    }

    pub fn set_filter<I, S>(&mut self, dimension: FilterDimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let change = self.container.set_filter(dimension, values);
        self.publish(change);
    }

    /// Write the size range directly. A drag commit still waiting on its
    /// debounce is dropped, so the later write wins.
    pub fn set_size_range(&mut self, range: Option<SizeRange>) {
        if let Some(control) = &mut self.size_filter {
            control.supersede();
        }
        self.commit_size_range(range);
    }

    pub fn set_search_mode(&mut self, mode: SearchMode) {
        let change = self.container.set_search_mode(mode);
        self.publish(change);
    }

    pub fn toggle_search_mode(&mut self, mode: SearchMode) {
        let change = self.container.toggle_search_mode(mode);
        self.publish(change);
    }

    pub fn set_page(&mut self, page: u32) {
        let change = self.container.set_page(page);
        self.publish(change);
    }

    /// The size filter control, while it is mounted.
    #[must_use]
    pub fn size_filter(&self) -> Option<&SizeFilterControl> {
        self.size_filter.as_ref()
    }

    /// Create the size filter control from the committed range. Replaces a
    /// mounted one, discarding its uncommitted drag.
    pub fn mount_size_filter(&mut self) {
        let control = SizeFilterControl::new(self.state().size_range(), self.size_debounce);
        if let Some(previous) = self.size_filter.replace(control) {
            previous.unmount();
        }
    }

    /// Tear down the size filter control. A pending drag is dropped and will
    /// never be committed.
    pub fn unmount_size_filter(&mut self) {
        if let Some(control) = self.size_filter.take()
            && control.unmount()
        {
            debug!("discarded uncommitted size drag on unmount");
        }
    }

    pub fn begin_size_drag(&mut self) {
        if let Some(control) = &mut self.size_filter {
            control.begin_drag();
        }
    }

    /// Move the size handles. The range is committed after the debounce,
    /// during a later [`tick`](Self::tick).
    pub fn drag_size(&mut self, first: f64, second: f64) {
        let now = self.clock.now();
        if let Some(control) = &mut self.size_filter {
            control.drag_to(first, second, now);
        }
    }

    pub fn end_size_drag(&mut self) {
        if let Some(control) = &mut self.size_filter {
            control.end_drag();
        }
    }

    /// Apply a preset click: selects it, or clears the filter when it is
    /// already selected.
    pub fn select_size_preset(&mut self, preset: &SizePreset) {
        let range = match &mut self.size_filter {
            Some(control) => control.select_preset(preset),
            None => toggle_preset(preset, self.state().size_range()),
        };
        self.set_size_range(range);
    }

    pub fn clear_size_filter(&mut self) {
        let range = self.size_filter.as_mut().and_then(SizeFilterControl::clear);
        self.set_size_range(range);
    }

    /// Fire due timers and process network answers.
    pub fn tick(&mut self) {
        let now = self.clock.now();

        let committed = self
            .size_filter
            .as_mut()
            .and_then(|control| control.poll(now));
        if let Some(range) = committed {
            self.commit_size_range(range);
        }

        for resolution in self.pipeline.tick(now) {
            self.resolve(resolution);
        }
    }

    /// Re-issue the active request after a failure. With an empty query that
    /// is the facet baseline.
    pub fn retry(&mut self) -> bool {
        let now = self.clock.now();
        self.pipeline.retry(now)
    }

    /// Re-fetch the active request in the background.
    pub fn refresh(&mut self) -> bool {
        let now = self.clock.now();
        self.pipeline.refresh(now)
    }

    /// Navigate to a result, carrying the current state along in memory.
    pub fn activate_result(&mut self, hit: &SearchHit) {
        let path = match &hit.repository {
            Some(repository) => format!("/repository/{repository}/file/{}", hit.path),
            None => format!("/file/{}", hit.path),
        };
        let destination = Destination {
            path,
            context: NavigationContext {
                search: self.state().clone(),
            },
        };
        self.url.sink_mut().push(destination);
    }

    /// The facet set the filter panel should display.
    #[must_use]
    pub fn facets(&self) -> Option<&FacetSnapshot> {
        self.facets.visible()
    }

    #[must_use]
    pub fn facet_source(&self) -> FacetSource {
        self.facets.source()
    }

    /// Options for one filter dropdown.
    #[must_use]
    pub fn filter_options(&self, dimension: FilterDimension) -> Vec<FacetOption> {
        available_options(
            dimension,
            self.facets.visible(),
            &self.fallback,
            self.state().filter(dimension),
        )
    }

    /// Size presets with selection state and count badges.
    #[must_use]
    pub fn size_presets(&self) -> Vec<PresetView> {
        let buckets = self
            .facets
            .visible()
            .map(FacetSnapshot::size_buckets)
            .unwrap_or_default();
        let committed = self.state().size_range();
        SIZE_PRESETS
            .iter()
            .map(|preset| PresetView {
                label: preset.label,
                selected: preset.is_selected(committed),
                count: preset.badge(buckets),
            })
            .collect()
    }

    #[must_use]
    pub fn fetch_status(&self) -> FetchStatus {
        self.pipeline.status(self.clock.now())
    }

    /// Props for the results renderer at the current instant.
    #[must_use]
    pub fn results_view(&self) -> ResultsView {
        let state = self.state();
        let status = self.fetch_status();
        let page_size = self.pipeline.settings().page_size;

        let shown = if !status.enabled {
            None
        } else if status.data.is_some() {
            status.data.clone()
        } else if status.is_loading {
            self.displayed.clone()
        } else {
            None
        };

        let (results, total_results) = shown
            .map(|response| (response.results.clone(), response.total))
            .unwrap_or_default();
        let error = status
            .error
            .as_ref()
            .map(|error| ErrorView::new(error, state.query(), state.mode()));

        ResultsView {
            results,
            query: state.query().to_string(),
            is_loading: status.is_loading,
            is_fetching: status.is_fetching,
            indicator: status.indicator,
            error,
            total_results,
            current_page: state.page(),
            total_pages: total_pages(total_results, page_size),
            page_size,
            regex_search: state.mode().is_regex(),
        }
    }

    fn commit_size_range(&mut self, range: Option<SizeRange>) {
        let change = self.container.set_size_range(range);
        self.publish(change);
    }

    fn publish(&mut self, change: Option<StateChange>) {
        if let Some(change) = change {
            self.notify(change);
        }
    }

    fn notify(&mut self, change: StateChange) {
        let now = self.clock.now();
        let state = self.container.state();

        self.url.state_changed(state, change);
        self.pipeline.sync(state, now);
        self.facets
            .observe(self.pipeline.search_key(), self.pipeline.baseline_key());
        if !state.has_query() {
            self.displayed = None;
        }
        if let Some(control) = &mut self.size_filter {
            control.state_changed(state, change);
        }
        for listener in &mut self.listeners {
            listener.state_changed(state, change);
        }
        self.adopt_cached();
    }

    /// Feed payloads that are already cached for the current keys straight
    /// into the reconciler, so a cache hit never passes through a hold.
    fn adopt_cached(&mut self) {
        if let Some(key) = self.pipeline.search_key().cloned() {
            if let Some(response) = self.pipeline.cached(&key) {
                if let Some(snapshot) = response.facet_snapshot() {
                    self.facets.accept_search(&key, Arc::new(snapshot));
                }
                self.displayed = Some(response);
            }
        } else if let Some(key) = self.pipeline.baseline_key().cloned()
            && let Some(snapshot) = self
                .pipeline
                .cached(&key)
                .and_then(|response| response.facet_snapshot())
        {
            self.facets.accept_baseline(&key, Arc::new(snapshot));
        }
    }

    fn resolve(&mut self, resolution: Resolution) {
        let Resolution {
            key,
            kind,
            current,
            outcome,
        } = resolution;

        if !current {
            debug!(%key, "ignoring answer for a superseded request");
            return;
        }

        match (kind, outcome) {
            (RequestKind::Search, Ok(response)) => {
                if let Some(snapshot) = response.facet_snapshot() {
                    self.facets.accept_search(&key, Arc::new(snapshot));
                }
                self.displayed = Some(response);
            }
            (RequestKind::FacetBaseline, Ok(response)) => match response.facet_snapshot() {
                Some(snapshot) => {
                    self.facets.accept_baseline(&key, Arc::new(snapshot));
                }
                None => debug!(%key, "facet baseline carried no facets"),
            },
            (RequestKind::Search, Err(error)) => {
                debug!(%key, error = %error, "search failed; error surfaced to results view");
            }
            (RequestKind::FacetBaseline, Err(error)) => {
                warn!(%key, error = %error, "facet baseline unavailable; keeping last known facets");
            }
        }
    }
}

fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
