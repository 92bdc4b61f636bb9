use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    BackendRequest, FetchError, RequestKey, RequestKind, SearchResponse, Ticket, Transport,
    facet_baseline_request, search_request,
};
use crate::state::SearchState;

/// Completed entries kept before the least recently used ones are evicted.
pub const MAX_CACHE_ENTRIES: usize = 128;

/// Tunables of the fetch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Results per page, sent as `limit`.
    pub page_size: u32,
    /// Ceiling after which an unanswered request counts as timed out.
    pub timeout: Duration,
    /// How long a first load may take before the full-page spinner shows.
    pub grace_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            timeout: Duration::from_secs(30),
            grace_delay: Duration::from_secs(1),
        }
    }
}

/// What the results area should show while data is loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingIndicator {
    Idle,
    /// First load, still inside the grace delay: show nothing yet.
    Pending,
    /// First load past the grace delay.
    FullPage,
    /// Refreshing results that stay visible.
    RefreshBanner,
}

/// Loading state of the current search key.
#[derive(Debug, Clone)]
pub struct FetchStatus {
    /// False while the query is empty.
    pub enabled: bool,
    /// No data has arrived for the current key and a request is in flight.
    pub is_loading: bool,
    /// Any request for the current key is in flight.
    pub is_fetching: bool,
    pub data: Option<Arc<SearchResponse>>,
    pub error: Option<FetchError>,
    pub indicator: LoadingIndicator,
}

/// A request that finished during a tick.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub key: RequestKey,
    pub kind: RequestKind,
    /// Whether `key` was still the current key of its kind when it arrived.
    pub current: bool,
    pub outcome: Result<Arc<SearchResponse>, FetchError>,
}

#[derive(Debug)]
struct CacheEntry {
    request: BackendRequest,
    data: Option<Arc<SearchResponse>>,
    error: Option<FetchError>,
    in_flight: Option<Ticket>,
    fetch_started: Option<Instant>,
    touched: Instant,
}

#[derive(Debug)]
struct InFlight {
    key: RequestKey,
    issued_at: Instant,
}

/// Turns search state into keyed backend calls.
///
/// Each distinct key is fetched once and its result cached. Keys are derived
/// from the state on every sync, so the call reflects the latest state at
/// issue time, and every arrival is checked against the key that is current
/// at that moment.
#[derive(Debug)]
pub struct FetchPipeline<T> {
    transport: T,
    settings: FetchSettings,
    cache: HashMap<RequestKey, CacheEntry>,
    in_flight: HashMap<Ticket, InFlight>,
    next_ticket: Ticket,
    search_key: Option<RequestKey>,
    baseline_key: Option<RequestKey>,
}

impl<T: Transport> FetchPipeline<T> {
    #[must_use]
    pub fn new(transport: T, settings: FetchSettings) -> Self {
        Self {
            transport,
            settings,
            cache: HashMap::new(),
            in_flight: HashMap::new(),
            next_ticket: 0,
            search_key: None,
            baseline_key: None,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Key of the current search, `None` while the query is empty.
    #[must_use]
    pub fn search_key(&self) -> Option<&RequestKey> {
        self.search_key.as_ref()
    }

    /// Key of the filter-only facet request for the current filters.
    #[must_use]
    pub fn baseline_key(&self) -> Option<&RequestKey> {
        self.baseline_key.as_ref()
    }

    /// Cached payload for `key`, if one has arrived.
    #[must_use]
    pub fn cached(&self, key: &RequestKey) -> Option<Arc<SearchResponse>> {
        self.cache.get(key).and_then(|entry| entry.data.clone())
    }

    /// Number of requests currently awaiting an answer.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Re-derive the current keys from `state` and issue whatever is not
    /// cached or already in flight.
    ///
    /// The search call is made only for a non-empty query; the facet
    /// baseline is fetched only while the query is empty.
    pub fn sync(&mut self, state: &SearchState, now: Instant) {
        let baseline = facet_baseline_request(state);
        self.baseline_key = Some(baseline.key());

        match search_request(state, self.settings.page_size) {
            Some(request) => {
                let key = request.key();
                self.search_key = Some(key.clone());
                self.ensure(key, request, now);
            }
            None => {
                self.search_key = None;
                let key = baseline.key();
                self.ensure(key, baseline, now);
            }
        }
    }

    /// Re-issue the active request after a failure: the search, or the facet
    /// baseline while the query is empty. Returns whether a request was sent.
    pub fn retry(&mut self, now: Instant) -> bool {
        let Some(key) = self.active_key() else {
            return false;
        };
        let failed = self
            .cache
            .get(&key)
            .is_some_and(|entry| entry.error.is_some() && entry.in_flight.is_none());
        if !failed {
            return false;
        }
        info!(%key, "retrying request");
        self.reissue(&key, now)
    }

    /// Fetch the active request again in the background, keeping whatever
    /// data is already shown.
    pub fn refresh(&mut self, now: Instant) -> bool {
        let Some(key) = self.active_key() else {
            return false;
        };
        let idle = self
            .cache
            .get(&key)
            .is_some_and(|entry| entry.in_flight.is_none());
        idle && self.reissue(&key, now)
    }

    /// Expire overdue requests and collect finished ones.
    pub fn tick(&mut self, now: Instant) -> Vec<Resolution> {
        let mut resolutions = self.expire(now);

        for completion in self.transport.drain() {
            let Some(flight) = self.in_flight.remove(&completion.ticket) else {
                debug!(ticket = completion.ticket, "dropping answer for an expired request");
                continue;
            };
            let Some(entry) = self.cache.get_mut(&flight.key) else {
                continue;
            };
            entry.in_flight = None;
            entry.fetch_started = None;
            entry.touched = now;
            let kind = entry.request.kind;

            let outcome = match completion.outcome {
                Ok(response) => {
                    let response = Arc::new(response);
                    entry.data = Some(Arc::clone(&response));
                    entry.error = None;
                    Ok(response)
                }
                Err(err) => {
                    warn!(key = %flight.key, error = %err, "request failed");
                    entry.error = Some(err.clone());
                    Err(err)
                }
            };

            let current = self.is_current(&flight.key, kind);
            if !current {
                debug!(key = %flight.key, "answer arrived for a superseded request");
            }
            resolutions.push(Resolution {
                key: flight.key,
                kind,
                current,
                outcome,
            });
        }

        resolutions
    }

    /// Loading state of the current search key at `now`.
    #[must_use]
    pub fn status(&self, now: Instant) -> FetchStatus {
        let entry = self.search_key.as_ref().and_then(|key| self.cache.get(key));
        let Some(entry) = entry else {
            return FetchStatus {
                enabled: self.search_key.is_some(),
                is_loading: false,
                is_fetching: false,
                data: None,
                error: None,
                indicator: LoadingIndicator::Idle,
            };
        };

        let is_fetching = entry.in_flight.is_some();
        let is_loading = is_fetching && entry.data.is_none();
        let indicator = if is_loading {
            let waited = entry
                .fetch_started
                .map_or(Duration::ZERO, |started| now.saturating_duration_since(started));
            if waited >= self.settings.grace_delay {
                LoadingIndicator::FullPage
            } else {
                LoadingIndicator::Pending
            }
        } else if is_fetching {
            LoadingIndicator::RefreshBanner
        } else {
            LoadingIndicator::Idle
        };

        FetchStatus {
            enabled: true,
            is_loading,
            is_fetching,
            data: entry.data.clone(),
            error: entry.error.clone(),
            indicator,
        }
    }

    fn is_current(&self, key: &RequestKey, kind: RequestKind) -> bool {
        match kind {
            RequestKind::Search => self.search_key.as_ref() == Some(key),
            RequestKind::FacetBaseline => self.baseline_key.as_ref() == Some(key),
        }
    }

    fn active_key(&self) -> Option<RequestKey> {
        self.search_key.clone().or_else(|| self.baseline_key.clone())
    }

    fn ensure(&mut self, key: RequestKey, request: BackendRequest, now: Instant) {
        if let Some(entry) = self.cache.get_mut(&key) {
            entry.touched = now;
            let failed_without_data =
                entry.error.is_some() && entry.data.is_none() && entry.in_flight.is_none();
            if !failed_without_data {
                debug!(%key, "request already cached or in flight");
                return;
            }
            debug!(%key, "returning to a key whose last attempt failed");
            self.reissue(&key, now);
            return;
        }
        self.evict(now);
        self.cache.insert(
            key.clone(),
            CacheEntry {
                request,
                data: None,
                error: None,
                in_flight: None,
                fetch_started: None,
                touched: now,
            },
        );
        self.reissue(&key, now);
    }

    fn reissue(&mut self, key: &RequestKey, now: Instant) -> bool {
        let Some(entry) = self.cache.get_mut(key) else {
            return false;
        };
        self.next_ticket = self.next_ticket.wrapping_add(1);
        let ticket = self.next_ticket;
        entry.in_flight = Some(ticket);
        entry.fetch_started = Some(now);
        entry.error = None;
        entry.touched = now;
        let request = entry.request.clone();

        self.in_flight.insert(
            ticket,
            InFlight {
                key: key.clone(),
                issued_at: now,
            },
        );
        debug!(%key, ticket, "issuing request");
        self.transport.submit(ticket, request);
        true
    }

    fn expire(&mut self, now: Instant) -> Vec<Resolution> {
        let ceiling = self.settings.timeout;
        let overdue: Vec<Ticket> = self
            .in_flight
            .iter()
            .filter(|(_, flight)| now.saturating_duration_since(flight.issued_at) >= ceiling)
            .map(|(ticket, _)| *ticket)
            .collect();

        let mut resolutions = Vec::new();
        for ticket in overdue {
            let Some(flight) = self.in_flight.remove(&ticket) else {
                continue;
            };
            let Some(entry) = self.cache.get_mut(&flight.key) else {
                continue;
            };
            let error = FetchError::Timeout { after: ceiling };
            warn!(key = %flight.key, "request timed out");
            entry.in_flight = None;
            entry.fetch_started = None;
            entry.error = Some(error.clone());
            let kind = entry.request.kind;
            let current = self.is_current(&flight.key, kind);
            resolutions.push(Resolution {
                key: flight.key,
                kind,
                current,
                outcome: Err(error),
            });
        }
        resolutions
    }

    fn evict(&mut self, now: Instant) {
        while self.cache.len() >= MAX_CACHE_ENTRIES {
            let victim = self
                .cache
                .iter()
                .filter(|(key, entry)| {
                    entry.in_flight.is_none()
                        && Some(*key) != self.search_key.as_ref()
                        && Some(*key) != self.baseline_key.as_ref()
                })
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    debug!(%key, age = ?now.saturating_duration_since(self.cache[&key].touched), "evicting cached response");
                    self.cache.remove(&key);
                }
                None => break,
            }
        }
    }
}
