use std::collections::VecDeque;

use super::{BackendRequest, FetchError, SearchResponse};

/// Identifies one network call so its completion can be matched on arrival.
pub type Ticket = u64;

/// A finished network call.
#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Result<SearchResponse, FetchError>,
}

/// Carries requests to the backend without blocking the caller.
///
/// `submit` must return immediately; answers are collected later through
/// `drain`, which is called from the owner's tick.
pub trait Transport {
    fn submit(&mut self, ticket: Ticket, request: BackendRequest);

    /// Completions that arrived since the last call, in arrival order.
    fn drain(&mut self) -> Vec<Completion>;
}

/// In-process transport whose answers are supplied by hand.
///
/// Used by embedders that already hold the data, and by tests to script
/// exact response orderings.
#[derive(Debug, Default)]
pub struct ManualTransport {
    submitted: Vec<(Ticket, BackendRequest)>,
    ready: VecDeque<Completion>,
}

impl ManualTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request submitted so far, oldest first.
    #[must_use]
    pub fn submitted(&self) -> &[(Ticket, BackendRequest)] {
        &self.submitted
    }

    /// The most recently submitted ticket.
    #[must_use]
    pub fn last_ticket(&self) -> Option<Ticket> {
        self.submitted.last().map(|(ticket, _)| *ticket)
    }

    /// Ticket of the latest request of the given endpoint.
    #[must_use]
    pub fn last_ticket_for(&self, kind: super::RequestKind) -> Option<Ticket> {
        self.submitted
            .iter()
            .rev()
            .find(|(_, request)| request.kind == kind)
            .map(|(ticket, _)| *ticket)
    }

    /// Queue an answer for `ticket`; it is delivered on the next drain.
    pub fn respond(&mut self, ticket: Ticket, outcome: Result<SearchResponse, FetchError>) {
        self.ready.push_back(Completion { ticket, outcome });
    }
}

impl Transport for ManualTransport {
    fn submit(&mut self, ticket: Ticket, request: BackendRequest) {
        self.submitted.push((ticket, request));
    }

    fn drain(&mut self) -> Vec<Completion> {
        self.ready.drain(..).collect()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn submit(&mut self, ticket: Ticket, request: BackendRequest) {
        (**self).submit(ticket, request);
    }

    fn drain(&mut self) -> Vec<Completion> {
        (**self).drain()
    }
}
