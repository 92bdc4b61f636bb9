//! The composite search state and its single-writer container.

mod container;
mod dimension;
mod search_state;

pub use container::{ChangeOrigin, SearchStateContainer, StateChange, StateSubscriber};
pub use dimension::{FilterDimension, SearchMode, UnknownDimension};
pub use search_state::{FilterValues, SearchState, SizeRange};
