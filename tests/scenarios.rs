use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use codesift::facets::{FacetCount, FacetSource};
use codesift::fetch::{
    FetchError, FetchErrorKind, LoadingIndicator, ManualTransport, RequestKind, SearchHit,
    SearchResponse,
};
use codesift::slider::find_preset;
use codesift::{
    ChangeOrigin, FilterDimension, ManualClock, MemoryHistory, OrchestratorConfig,
    SearchOrchestrator, SearchState, SizeRange, StateChange, StateSubscriber,
};

type Orchestrator = SearchOrchestrator<ManualTransport, MemoryHistory, ManualClock>;

fn open(location: &str) -> (Orchestrator, ManualClock) {
    let clock = ManualClock::new();
    let orchestrator = SearchOrchestrator::new(
        ManualTransport::new(),
        MemoryHistory::at(location),
        clock.clone(),
        OrchestratorConfig::default(),
    );
    (orchestrator, clock)
}

fn respond(orchestrator: &mut Orchestrator, kind: RequestKind, response: SearchResponse) {
    let ticket = orchestrator
        .transport()
        .last_ticket_for(kind)
        .expect("a request of this kind was sent");
    orchestrator.transport_mut().respond(ticket, Ok(response));
    orchestrator.tick();
}

fn extension_facets(counts: &[(&str, u64)]) -> SearchResponse {
    SearchResponse::default().with_facet(
        "extension",
        counts
            .iter()
            .map(|(value, count)| FacetCount::new(*value, *count))
            .collect(),
    )
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<(ChangeOrigin, SearchState)>>>);

impl StateSubscriber for Recorder {
    fn state_changed(&mut self, state: &SearchState, change: StateChange) {
        self.0.borrow_mut().push((change.origin, state.clone()));
    }
}

#[test]
fn empty_search_has_clean_url_and_typing_adds_only_the_query() {
    let (mut orchestrator, _) = open("");
    assert_eq!(orchestrator.navigation().location(), "");

    orchestrator.set_query("foo bar");

    assert_eq!(orchestrator.navigation().location(), "?q=foo+bar");
    assert!(!orchestrator.navigation().current_query().contains("page"));
}

#[test]
fn filter_changes_reset_the_page() {
    let (mut orchestrator, _) = open("?q=x");
    orchestrator.set_filter(FilterDimension::Extension, ["rs", "py"]);
    orchestrator.set_page(3);
    orchestrator.set_filter(FilterDimension::Language, ["en"]);

    let state = orchestrator.state();
    assert_eq!(state.page(), 1);
    let extensions: Vec<_> = state
        .filter(FilterDimension::Extension)
        .unwrap()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(extensions, ["rs", "py"]);
    assert!(state.filter(FilterDimension::Language).unwrap().contains("en"));
    assert_eq!(state.filters().len(), 2);
}

#[test]
fn dragging_to_both_extremes_clears_the_size_filter() {
    let (mut orchestrator, clock) = open("?q=x&min_size=100&max_size=5000");
    assert!(orchestrator.state().size_range().is_some());

    orchestrator.begin_size_drag();
    orchestrator.drag_size(0.0, 100.0);
    orchestrator.end_size_drag();
    clock.advance_ms(300);
    orchestrator.tick();

    assert_eq!(orchestrator.state().size_range(), None);
    assert!(!orchestrator.navigation().current_query().contains("size"));
}

#[test]
fn external_range_deselects_preset_but_keeps_badges() {
    let (mut orchestrator, _) = open("");
    respond(
        &mut orchestrator,
        RequestKind::FacetBaseline,
        SearchResponse::default().with_facet(
            "size_ranges",
            vec![FacetCount::new("< 1 KB", 12), FacetCount::new("> 10 MB", 1)],
        ),
    );

    orchestrator.select_size_preset(find_preset("< 1 KB").unwrap());
    assert_eq!(orchestrator.state().size_range(), Some(SizeRange::at_most(1024)));
    assert!(orchestrator.size_presets()[0].selected);

    orchestrator.set_size_range(Some(SizeRange::between(500, 5_000)));

    let presets = orchestrator.size_presets();
    assert!(presets.iter().all(|preset| !preset.selected));
    assert_eq!(presets[0].count, Some(12));
    assert_eq!(presets[5].count, Some(1));
    assert_eq!(presets[1].count, None);
}

#[test]
fn facet_hold_then_adopt_even_with_zero_results() {
    let (mut orchestrator, _) = open("");
    respond(
        &mut orchestrator,
        RequestKind::FacetBaseline,
        extension_facets(&[("rs", 40), ("py", 12)]),
    );
    let baseline = orchestrator.facets().cloned();

    orchestrator.set_query("abc");
    assert_eq!(orchestrator.facets().cloned(), baseline);

    respond(
        &mut orchestrator,
        RequestKind::Search,
        extension_facets(&[("rs", 0)]).with_results(Vec::new(), 0),
    );
    assert_eq!(orchestrator.facet_source(), FacetSource::SearchDerived);
    let options = orchestrator.filter_options(FilterDimension::Extension);
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].count, Some(0));

    orchestrator.set_query("");
    assert_eq!(orchestrator.facet_source(), FacetSource::FilterBaseline);
    assert_eq!(orchestrator.facets().cloned(), baseline);
}

#[test]
fn stale_answer_never_replaces_newer_query() {
    let (mut orchestrator, _) = open("?q=first");
    let first = orchestrator.transport().last_ticket().unwrap();
    orchestrator.set_query("second");
    let second = orchestrator.transport().last_ticket().unwrap();

    orchestrator.transport_mut().respond(
        second,
        Ok(extension_facets(&[("go", 2)]).with_results(vec![SearchHit::new("b.go")], 1)),
    );
    orchestrator.transport_mut().respond(
        first,
        Ok(extension_facets(&[("c", 9)]).with_results(vec![SearchHit::new("a.c")], 1)),
    );
    orchestrator.tick();

    let view = orchestrator.results_view();
    assert_eq!(view.results[0].path, "b.go");
    let options = orchestrator.filter_options(FilterDimension::Extension);
    assert_eq!(options[0].value, "go");
}

#[test]
fn empty_query_sends_no_search() {
    let (orchestrator, _) = open("?extension=rs");
    let kinds: Vec<_> = orchestrator
        .transport()
        .submitted()
        .iter()
        .map(|(_, request)| request.kind)
        .collect();
    assert_eq!(kinds, [RequestKind::FacetBaseline]);
    let view = orchestrator.results_view();
    assert!(!view.is_loading);
    assert!(view.results.is_empty());
}

#[test]
fn grace_delay_then_full_page_spinner() {
    let (orchestrator, clock) = open("?q=slow");
    assert_eq!(orchestrator.results_view().indicator, LoadingIndicator::Pending);
    clock.advance(Duration::from_millis(999));
    assert_eq!(orchestrator.results_view().indicator, LoadingIndicator::Pending);
    clock.advance_ms(1);
    assert_eq!(orchestrator.results_view().indicator, LoadingIndicator::FullPage);
}

#[test]
fn refresh_keeps_results_on_screen() {
    let (mut orchestrator, _) = open("?q=x");
    respond(
        &mut orchestrator,
        RequestKind::Search,
        SearchResponse::default().with_results(vec![SearchHit::new("a.rs")], 1),
    );
    assert!(orchestrator.refresh());

    let view = orchestrator.results_view();
    assert!(view.is_fetching);
    assert!(!view.is_loading);
    assert_eq!(view.indicator, LoadingIndicator::RefreshBanner);
    assert_eq!(view.results.len(), 1);
}

#[test]
fn timeout_is_distinct_and_retryable() {
    let (mut orchestrator, clock) = open("?q=%5E.*foo&regexSearch=true");
    clock.advance(Duration::from_secs(30));
    orchestrator.tick();

    let error = orchestrator.results_view().error.expect("timed out");
    assert_eq!(error.kind, FetchErrorKind::Timeout);
    assert!(error.retryable);
    assert!(error.hint.unwrap().contains("^.*"));

    assert!(orchestrator.retry());
    respond(
        &mut orchestrator,
        RequestKind::Search,
        SearchResponse::default().with_results(vec![SearchHit::new("foo.rs")], 1),
    );
    let view = orchestrator.results_view();
    assert!(view.error.is_none());
    assert_eq!(view.results.len(), 1);
}

#[test]
fn subscribers_see_initialization_then_local_changes() {
    let (mut orchestrator, _) = open("?q=x");
    let recorder = Recorder::default();
    orchestrator.subscribe(Box::new(recorder.clone()));

    orchestrator.set_query("y");
    orchestrator.set_query("y");
    orchestrator.toggle_search_mode(codesift::SearchMode::Fuzzy);

    let seen = recorder.0.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|(origin, _)| *origin == ChangeOrigin::Local));
    assert!(seen[1].1.mode().is_fuzzy());
    assert_eq!(orchestrator.navigation().current_query(), "q=y&fuzzySearch=true");
}

#[test]
fn reload_reproduces_the_same_state() {
    let (mut orchestrator, _) = open("");
    orchestrator.set_query("needle");
    orchestrator.set_filter(FilterDimension::Repository, ["org/repo"]);
    orchestrator.set_size_range(Some(SizeRange::at_least(2048)));
    orchestrator.set_page(4);

    let url = orchestrator.navigation().location();
    let (reloaded, _) = open(&url);

    assert_eq!(reloaded.state(), orchestrator.state());
    assert_eq!(reloaded.navigation().replacements(), 0);
}

#[test]
fn clearing_query_after_filter_change_waits_for_matching_baseline() {
    let (mut orchestrator, _) = open("");
    respond(
        &mut orchestrator,
        RequestKind::FacetBaseline,
        extension_facets(&[("rs", 40), ("py", 12)]),
    );
    let unfiltered = orchestrator.facets().cloned();

    orchestrator.set_query("abc");
    respond(&mut orchestrator, RequestKind::Search, extension_facets(&[("py", 3)]));
    orchestrator.set_filter(FilterDimension::Extension, ["py"]);
    respond(&mut orchestrator, RequestKind::Search, extension_facets(&[("py", 2)]));

    orchestrator.set_query("");
    assert_eq!(orchestrator.facet_source(), FacetSource::HoldPrevious);
    assert_ne!(orchestrator.facets().cloned(), unfiltered);

    respond(
        &mut orchestrator,
        RequestKind::FacetBaseline,
        extension_facets(&[("py", 12)]),
    );
    assert_eq!(orchestrator.facet_source(), FacetSource::FilterBaseline);
    let options = orchestrator.filter_options(FilterDimension::Extension);
    assert_eq!(options[0].value, "py");
    assert_eq!(options[0].count, Some(12));
}

#[test]
fn failed_baseline_recovers_when_filters_come_back() {
    let (mut orchestrator, _) = open("?extension=rs");
    let ticket = orchestrator.transport().last_ticket().unwrap();
    orchestrator
        .transport_mut()
        .respond(ticket, Err(FetchError::Status { code: 503 }));
    orchestrator.tick();

    orchestrator.set_filter(FilterDimension::Extension, ["py"]);
    respond(&mut orchestrator, RequestKind::FacetBaseline, extension_facets(&[("py", 99)]));
    orchestrator.set_filter(FilterDimension::Extension, ["rs"]);

    let baselines = orchestrator
        .transport()
        .submitted()
        .iter()
        .filter(|(_, request)| request.kind == RequestKind::FacetBaseline)
        .count();
    assert_eq!(baselines, 3);
    assert_ne!(orchestrator.facet_source(), FacetSource::FilterBaseline);

    respond(&mut orchestrator, RequestKind::FacetBaseline, extension_facets(&[("rs", 8)]));
    let facets = orchestrator.facets().unwrap();
    assert_eq!(facets.count_for(FilterDimension::Extension, "rs"), Some(8));
    assert_eq!(facets.count_for(FilterDimension::Extension, "py"), None);
}

#[test]
fn direct_size_write_wins_over_pending_drag() {
    let (mut orchestrator, clock) = open("?q=x");
    orchestrator.begin_size_drag();
    orchestrator.drag_size(20.0, 60.0);
    orchestrator.end_size_drag();

    clock.advance_ms(100);
    orchestrator.set_size_range(Some(SizeRange::at_most(1024)));
    clock.advance_ms(400);
    orchestrator.tick();

    assert_eq!(orchestrator.state().size_range(), Some(SizeRange::at_most(1024)));
    assert_eq!(orchestrator.navigation().current_query(), "q=x&max_size=1024");
}
