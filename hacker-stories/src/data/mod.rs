//! Data views over fetched stories
//!
//! Everything here is a pure function of the story collection: filtering,
//! sorting and removal never touch the collection they are given.

pub mod story_view;

pub use story_view::{derive_view, filter_stories, remove_story, sort_stories, SortKey, SortState};
