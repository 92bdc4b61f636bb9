//! Blocking HTTP transport driven from a small pool of worker threads.
//!
//! `submit` queues the call and returns at once; workers post
//! [`Completion`]s back over a channel that `drain` empties without blocking.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};
use url::Url;

use super::{BackendRequest, Completion, FetchError, RequestKind, SearchResponse, Ticket, Transport};

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("codesift/", env!("CARGO_PKG_VERSION"));

/// Where the backend lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: Url,
    pub search_path: String,
    pub facets_path: String,
}

impl Endpoint {
    /// Full URL for `request`, parameters included.
    pub fn url_for(&self, request: &BackendRequest) -> Result<Url, FetchError> {
        let path = match request.kind {
            RequestKind::Search => &self.search_path,
            RequestKind::FacetBaseline => &self.facets_path,
        };
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| FetchError::Transport(format!("invalid endpoint path '{path}': {err}")))?;
        let query = request.query_string();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        Ok(url)
    }
}

/// Number of long-lived workers an [`HttpTransport`] runs.
pub const FETCH_WORKERS: usize = 4;

/// One queued GET.
struct Job {
    ticket: Ticket,
    url: Url,
}

/// Sends requests with `reqwest`'s blocking client from a fixed pool of
/// worker threads that share one job queue.
pub struct HttpTransport {
    endpoint: Endpoint,
    jobs: Sender<Job>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    workers: usize,
}

impl HttpTransport {
    /// Build a transport whose requests give up after `timeout` and start its
    /// workers. The workers exit once the transport is dropped.
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let (jobs, job_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        let queue = Arc::new(Mutex::new(job_rx));

        for index in 0..FETCH_WORKERS {
            let client = client.clone();
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            thread::Builder::new()
                .name(format!("codesift-fetch-{index}"))
                .spawn(move || worker_loop(&client, &queue, &tx, timeout))
                .map_err(|err| {
                    FetchError::Transport(format!("failed to start fetch worker: {err}"))
                })?;
        }
        debug!(workers = FETCH_WORKERS, "fetch workers started");

        Ok(Self {
            endpoint,
            jobs,
            tx,
            rx,
            workers: FETCH_WORKERS,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.workers
    }

    fn fail(&self, ticket: Ticket, error: FetchError) {
        let _ = self.tx.send(Completion {
            ticket,
            outcome: Err(error),
        });
    }
}

impl Transport for HttpTransport {
    fn submit(&mut self, ticket: Ticket, request: BackendRequest) {
        let url = match self.endpoint.url_for(&request) {
            Ok(url) => url,
            Err(err) => {
                self.fail(ticket, err);
                return;
            }
        };

        if self.jobs.send(Job { ticket, url }).is_err() {
            warn!(ticket, "fetch workers are gone");
            self.fail(ticket, FetchError::Transport("fetch workers stopped".into()));
        }
    }

    fn drain(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(completion) => completions.push(completion),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }
        completions
    }
}

fn worker_loop(
    client: &Client,
    queue: &Mutex<Receiver<Job>>,
    results: &Sender<Completion>,
    timeout: Duration,
) {
    while let Some(Job { ticket, url }) = next_job(queue) {
        let outcome = execute(client, url, timeout);
        if results.send(Completion { ticket, outcome }).is_err() {
            break;
        }
    }
}

fn next_job(queue: &Mutex<Receiver<Job>>) -> Option<Job> {
    let receiver = queue.lock().ok()?;
    receiver.recv().ok()
}

fn execute(client: &Client, url: Url, timeout: Duration) -> Result<SearchResponse, FetchError> {
    debug!(%url, "sending request");
    let response = client
        .get(url)
        .send()
        .map_err(|err| classify(&err, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            code: status.as_u16(),
        });
    }

    response.json::<SearchResponse>().map_err(|err| {
        if err.is_timeout() {
            FetchError::Timeout { after: timeout }
        } else {
            FetchError::Decode(err.to_string())
        }
    })
}

fn classify(err: &reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { after: timeout }
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{facet_baseline_request, search_request};
    use crate::state::{FilterDimension, SearchState};

    fn endpoint() -> Endpoint {
        Endpoint {
            base_url: Url::parse("http://search.local:8080/").unwrap(),
            search_path: "/api/search".into(),
            facets_path: "/api/facets".into(),
        }
    }

    #[test]
    fn search_url_carries_parameters() {
        let state = SearchState::new().with_query("foo bar");
        let request = search_request(&state, 20).unwrap();
        let url = endpoint().url_for(&request).unwrap();
        assert_eq!(url.path(), "/api/search");
        assert!(url.query().unwrap().starts_with("q=foo+bar&"));
    }

    #[test]
    fn unfiltered_baseline_has_no_query() {
        let url = endpoint()
            .url_for(&facet_baseline_request(&SearchState::new()))
            .unwrap();
        assert_eq!(url.as_str(), "http://search.local:8080/api/facets");

        let state = SearchState::new().with_filter(FilterDimension::Project, ["kernel"]);
        let url = endpoint().url_for(&facet_baseline_request(&state)).unwrap();
        assert_eq!(url.query(), Some("project=kernel"));
    }

    #[test]
    fn unreachable_backend_reports_every_queued_request() {
        let endpoint = Endpoint {
            base_url: Url::parse("http://127.0.0.1:9/").unwrap(),
            ..endpoint()
        };
        let mut transport = HttpTransport::new(endpoint, Duration::from_secs(2)).unwrap();
        assert_eq!(transport.worker_count(), FETCH_WORKERS);

        let queued = FETCH_WORKERS as u64 * 3;
        for ticket in 1..=queued {
            let state = SearchState::new().with_query(format!("q{ticket}"));
            transport.submit(ticket, search_request(&state, 20).unwrap());
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        let mut completions = Vec::new();
        while (completions.len() as u64) < queued {
            completions.extend(transport.drain());
            assert!(std::time::Instant::now() < deadline, "missing completions");
            thread::sleep(Duration::from_millis(10));
        }
        let mut tickets: Vec<_> = completions.iter().map(|completion| completion.ticket).collect();
        tickets.sort_unstable();
        assert_eq!(tickets, (1..=queued).collect::<Vec<_>>());
        assert!(completions.iter().all(|completion| completion.outcome.is_err()));
    }
}
