//! Request building and the fetch pipeline.
//!
//! Search state goes in, keyed backend calls come out, and answers flow back
//! through [`FetchPipeline::tick`] with enough information to discard the
//! ones that no longer matter.

mod error;
pub mod guidance;
mod http;
mod pipeline;
mod request;
mod response;
mod transport;

pub use error::{FetchError, FetchErrorKind};
pub use guidance::{ErrorView, timeout_hint};
pub use http::{Endpoint, FETCH_WORKERS, HttpTransport, USER_AGENT};
pub use pipeline::{
    FetchPipeline, FetchSettings, FetchStatus, LoadingIndicator, MAX_CACHE_ENTRIES, Resolution,
};
pub use request::{BackendRequest, RequestKey, RequestKind, facet_baseline_request, search_request};
pub use response::{SearchHit, SearchResponse};
pub use transport::{Completion, ManualTransport, Ticket, Transport};
