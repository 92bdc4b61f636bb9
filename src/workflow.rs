use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use codesift::facets::FacetOption;
use codesift::fetch::{HttpTransport, Transport};
use codesift::url_codec::encode;
use codesift::{
    Clock, FilterDimension, MemoryHistory, PresetView, ResultsView, SearchOrchestrator,
    SearchState, SystemClock,
};

use crate::settings::ResolvedConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything the command prints once the search has settled.
#[derive(Debug, Serialize)]
pub(crate) struct SearchReport {
    pub(crate) location: String,
    pub(crate) view: ResultsView,
    pub(crate) facets: BTreeMap<FilterDimension, Vec<FacetOption>>,
    pub(crate) size_presets: Vec<PresetView>,
}

impl SearchReport {
    fn capture<T: Transport, C: Clock>(
        orchestrator: &SearchOrchestrator<T, MemoryHistory, C>,
    ) -> Self {
        let facets = FilterDimension::all()
            .into_iter()
            .map(|dimension| (dimension, orchestrator.filter_options(dimension)))
            .filter(|(_, options)| !options.is_empty())
            .collect();
        Self {
            location: orchestrator.navigation().location(),
            view: orchestrator.results_view(),
            facets,
            size_presets: orchestrator.size_presets(),
        }
    }
}

/// Runs one search against the configured backend and waits for it to
/// settle.
pub(crate) struct SearchWorkflow {
    config: ResolvedConfig,
    state: SearchState,
}

impl SearchWorkflow {
    pub(crate) fn from_config(config: ResolvedConfig, state: SearchState) -> Self {
        Self { config, state }
    }

    pub(crate) fn run(self) -> Result<SearchReport> {
        let transport = HttpTransport::new(self.config.endpoint.clone(), self.config.timeout)
            .context("failed to build the HTTP client")?;
        let history = MemoryHistory::at(&encode(&self.state));
        let mut orchestrator = SearchOrchestrator::new(
            transport,
            history,
            SystemClock,
            self.config.orchestrator_config(),
        );
        info!(backend = %self.config.endpoint.base_url, "search started");

        while orchestrator.pipeline().in_flight_count() > 0 {
            thread::sleep(POLL_INTERVAL);
            orchestrator.tick();
        }

        Ok(SearchReport::capture(&orchestrator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesift::fetch::{FetchError, ManualTransport, RequestKind, SearchHit, SearchResponse};
    use codesift::{ManualClock, OrchestratorConfig};

    #[test]
    fn report_collects_results_and_fallback_facets() {
        let mut config = OrchestratorConfig::default();
        config
            .fallback
            .insert(FilterDimension::Language, vec!["en".into()]);
        let mut orchestrator = SearchOrchestrator::new(
            ManualTransport::new(),
            MemoryHistory::at("?q=main"),
            ManualClock::new(),
            config,
        );
        let ticket = orchestrator
            .transport()
            .last_ticket_for(RequestKind::Search)
            .unwrap();
        orchestrator.transport_mut().respond(
            ticket,
            Ok(SearchResponse::default().with_results(vec![SearchHit::new("src/main.rs")], 1)),
        );
        orchestrator.tick();

        let report = SearchReport::capture(&orchestrator);
        assert_eq!(report.location, "?q=main");
        assert_eq!(report.view.results.len(), 1);
        assert_eq!(report.facets[&FilterDimension::Language][0].value, "en");
        assert!(!report.facets.contains_key(&FilterDimension::Project));
        assert_eq!(report.size_presets.len(), 6);
    }

    #[test]
    fn failed_search_is_reported() {
        let mut orchestrator = SearchOrchestrator::new(
            ManualTransport::new(),
            MemoryHistory::at("?q=main"),
            ManualClock::new(),
            OrchestratorConfig::default(),
        );
        let ticket = orchestrator.transport().last_ticket().unwrap();
        orchestrator
            .transport_mut()
            .respond(ticket, Err(FetchError::Status { code: 502 }));
        orchestrator.tick();

        let report = SearchReport::capture(&orchestrator);
        assert!(report.view.error.is_some());
    }
}
