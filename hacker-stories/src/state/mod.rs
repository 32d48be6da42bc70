//! State management components
//!
//! The stories collection is owned by the [`StoriesDispatcher`] and only
//! changes through the reducer in [`stories`]. The search term lives in
//! [`SearchState`] and is persisted on every change.

pub mod dispatcher;
pub mod search;
pub mod stories;

pub use dispatcher::{DispatchRecord, StoriesDispatcher};
pub use search::{SearchState, DEFAULT_SEARCH, SEARCH_KEY};
pub use stories::{reduce, FetchStatus, StoriesAction, StoriesState};
