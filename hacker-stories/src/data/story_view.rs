use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::api::Story;

/// Column the story list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Server order
    #[default]
    None,
    Title,
    Author,
    Comments,
    Points,
}

impl SortKey {
    /// Counts read best largest first, text alphabetically
    pub fn descending_by_default(self) -> bool {
        matches!(self, SortKey::Comments | SortKey::Points)
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::None => "None",
            SortKey::Title => "Title",
            SortKey::Author => "Author",
            SortKey::Comments => "Comments",
            SortKey::Points => "Points",
        }
    }

    fn compare(self, a: &Story, b: &Story) -> Ordering {
        match self {
            SortKey::None => Ordering::Equal,
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Author => a.author.cmp(&b.author),
            SortKey::Comments => a.num_comments.cmp(&b.num_comments),
            SortKey::Points => a.points.cmp(&b.points),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(SortKey::None),
            "title" => Ok(SortKey::Title),
            "author" => Ok(SortKey::Author),
            "comments" | "comment" | "num_comments" => Ok(SortKey::Comments),
            "points" | "point" => Ok(SortKey::Points),
            other => Err(format!(
                "unknown sort key '{}' (expected none, title, author, comments or points)",
                other
            )),
        }
    }
}

/// Current sort selection. Only affects how the list is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub sort_key: SortKey,
    pub is_reverse: bool,
}

impl SortState {
    pub fn new(sort_key: SortKey) -> Self {
        Self {
            sort_key,
            is_reverse: false,
        }
    }

    /// Select a sort key: the same key again flips direction, a new key
    /// starts in its default direction
    pub fn select(&mut self, sort_key: SortKey) {
        self.is_reverse = self.sort_key == sort_key && !self.is_reverse;
        self.sort_key = sort_key;
    }

    /// Whether the list ends up largest/last-first for the active key
    pub fn is_descending(&self) -> bool {
        self.sort_key.descending_by_default() != self.is_reverse
    }
}

/// Stories whose title contains `filter`, ignoring case. An empty filter
/// keeps everything.
pub fn filter_stories<'a>(stories: &'a [Story], filter: &str) -> Vec<&'a Story> {
    let needle = filter.to_lowercase();
    stories
        .iter()
        .filter(|story| needle.is_empty() || story.title.to_lowercase().contains(&needle))
        .collect()
}

/// Order stories in place.
///
/// The sort is stable. Reversal (default-descending keys and the reverse
/// flag) flips the whole stably sorted list, so equal keys flip too.
pub fn sort_stories(stories: &mut [&Story], sort: &SortState) {
    let key = sort.sort_key;
    if key != SortKey::None {
        stories.sort_by(|a, b| key.compare(a, b));
    }
    if key.descending_by_default() {
        stories.reverse();
    }
    if sort.is_reverse {
        stories.reverse();
    }
}

/// The list to render: filter, then sort. The source is left untouched.
pub fn derive_view<'a>(stories: &'a [Story], filter: &str, sort: &SortState) -> Vec<&'a Story> {
    let mut view = filter_stories(stories, filter);
    sort_stories(&mut view, sort);
    view
}

/// A copy of `stories` without the story identified by `object_id`
pub fn remove_story(stories: &[Story], object_id: &str) -> Vec<Story> {
    stories
        .iter()
        .filter(|story| story.object_id != object_id)
        .cloned()
        .collect()
}
