//! Stories state and its reducer
//!
//! All changes to the fetched story collection go through
//! [`reduce`], a pure `(state, action) -> state` function.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::Story;
use crate::data::story_view::remove_story;

/// Where the current fetch stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Nothing has been requested yet
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoriesState {
    pub data: Vec<Story>,
    pub status: FetchStatus,
}

impl StoriesState {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    /// Only meaningful once the fetch has settled
    pub fn is_error(&self) -> bool {
        self.status == FetchStatus::Failed
    }
}

/// Transitions accepted by the stories reducer.
///
/// The serialized form carries the action tag in `type`; decoding an
/// unknown tag fails instead of being ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum StoriesAction {
    #[serde(rename = "STORIES_FETCH_INIT")]
    FetchInit,

    #[serde(rename = "STORIES_FETCH_SUCCESS")]
    FetchSuccess(Vec<Story>),

    #[serde(rename = "STORIES_FETCH_FAILURE")]
    FetchFailure,

    /// Carries the objectID of the story to drop
    #[serde(rename = "REMOVE_STORY")]
    RemoveStory(String),
}

impl StoriesAction {
    pub fn tag(&self) -> &'static str {
        match self {
            StoriesAction::FetchInit => "STORIES_FETCH_INIT",
            StoriesAction::FetchSuccess(_) => "STORIES_FETCH_SUCCESS",
            StoriesAction::FetchFailure => "STORIES_FETCH_FAILURE",
            StoriesAction::RemoveStory(_) => "REMOVE_STORY",
        }
    }

    /// Short description for the debug pane
    pub fn summary(&self) -> String {
        match self {
            StoriesAction::FetchSuccess(stories) => {
                format!("{} ({} stories)", self.tag(), stories.len())
            }
            StoriesAction::RemoveStory(id) => format!("{} ({})", self.tag(), id),
            _ => self.tag().to_string(),
        }
    }

    pub fn remove(story: &Story) -> Self {
        StoriesAction::RemoveStory(story.object_id.clone())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).with_context(|| format!("Unrecognised stories action: {}", json))
    }
}

/// Apply one action to the stories state
pub fn reduce(state: StoriesState, action: StoriesAction) -> StoriesState {
    match action {
        StoriesAction::FetchInit => StoriesState {
            status: FetchStatus::Loading,
            ..state
        },
        StoriesAction::FetchSuccess(data) => StoriesState {
            data,
            status: FetchStatus::Loaded,
        },
        StoriesAction::FetchFailure => StoriesState {
            status: FetchStatus::Failed,
            ..state
        },
        StoriesAction::RemoveStory(object_id) => StoriesState {
            data: remove_story(&state.data, &object_id),
            ..state
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stories() -> Vec<Story> {
        vec![
            Story::new("0", "React")
                .with_url("https://reactjs.org/")
                .with_author("Jordan Walke")
                .with_num_comments(3)
                .with_points(4),
            Story::new("1", "Redux")
                .with_url("https://redux.js.org/")
                .with_author("Dan Abramov, Andrew Clark")
                .with_num_comments(2)
                .with_points(5),
        ]
    }

    fn loaded_state() -> StoriesState {
        StoriesState {
            data: sample_stories(),
            status: FetchStatus::Loaded,
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = StoriesState::default();
        assert!(state.data.is_empty());
        assert!(!state.is_loading());
        assert!(!state.is_error());
    }

    #[test]
    fn test_fetch_init_keeps_data() {
        let state = reduce(loaded_state(), StoriesAction::FetchInit);
        assert!(state.is_loading());
        assert!(!state.is_error());
        assert_eq!(state.data, sample_stories());
    }

    #[test]
    fn test_fetch_init_clears_previous_error() {
        let failed = StoriesState {
            data: vec![],
            status: FetchStatus::Failed,
        };
        let state = reduce(failed, StoriesAction::FetchInit);
        assert!(state.is_loading());
        assert!(!state.is_error());
    }

    #[test]
    fn test_fetch_success_replaces_data() {
        let loading = reduce(loaded_state(), StoriesAction::FetchInit);
        let payload = vec![Story::new("9", "Rust")];
        let state = reduce(loading, StoriesAction::FetchSuccess(payload.clone()));
        assert!(!state.is_loading());
        assert!(!state.is_error());
        assert_eq!(state.data, payload);
    }

    #[test]
    fn test_fetch_failure_keeps_data() {
        let loading = reduce(loaded_state(), StoriesAction::FetchInit);
        let state = reduce(loading, StoriesAction::FetchFailure);
        assert!(!state.is_loading());
        assert!(state.is_error());
        assert_eq!(state.data, sample_stories());
    }

    #[test]
    fn test_remove_story() {
        let state = reduce(loaded_state(), StoriesAction::RemoveStory("0".to_string()));
        assert_eq!(state.data.len(), 1);
        assert!(state.data.iter().all(|s| s.object_id != "0"));
        assert_eq!(state.status, FetchStatus::Loaded);
    }

    #[test]
    fn test_remove_absent_story_is_noop() {
        let once = reduce(loaded_state(), StoriesAction::RemoveStory("0".to_string()));
        let twice = reduce(once.clone(), StoriesAction::RemoveStory("0".to_string()));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_action_tags_roundtrip() {
        let action = StoriesAction::remove(&sample_stories()[1]);
        let json = action.to_json().unwrap();
        assert!(json.contains("\"type\":\"REMOVE_STORY\""));
        assert_eq!(StoriesAction::from_json(&json).unwrap(), action);

        let init = StoriesAction::from_json(r#"{"type":"STORIES_FETCH_INIT"}"#).unwrap();
        assert_eq!(init, StoriesAction::FetchInit);
    }

    #[test]
    fn test_unknown_action_tag_is_rejected() {
        let result = StoriesAction::from_json(r#"{"type":"STORIES_FETCH_RETRY"}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Unrecognised stories action"));
    }
}
