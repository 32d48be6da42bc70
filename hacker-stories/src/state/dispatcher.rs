//! Stories dispatcher: single owner of the stories state

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::state::stories::{reduce, StoriesAction, StoriesState};

/// Default number of actions kept for the debug pane
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// A dispatched action as recorded in the history
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub timestamp: DateTime<Local>,
    pub summary: String,
}

impl DispatchRecord {
    pub fn format_for_display(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S%.3f"), self.summary)
    }
}

/// Owns the stories state and routes every action through the reducer
pub struct StoriesDispatcher {
    state: StoriesState,

    /// Action history for debugging
    history: VecDeque<DispatchRecord>,

    /// Maximum action history size
    max_history: usize,
}

impl StoriesDispatcher {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            state: StoriesState::default(),
            history: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Dispatch an action
    pub fn dispatch(&mut self, action: StoriesAction) {
        debug!(target: "dispatcher", "Dispatching {}", action.summary());

        if self.max_history > 0 {
            if self.history.len() >= self.max_history {
                self.history.pop_front();
            }
            self.history.push_back(DispatchRecord {
                timestamp: Local::now(),
                summary: action.summary(),
            });
        }

        let before = self.state.status;
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);

        if before != self.state.status {
            info!(
                target: "dispatcher",
                "Stories status {:?} -> {:?} ({} stories)",
                before,
                self.state.status,
                self.state.data.len()
            );
        }
    }

    pub fn state(&self) -> &StoriesState {
        &self.state
    }

    /// Get action history for debugging
    pub fn history(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.history.iter()
    }
}

impl Default for StoriesDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Story;

    #[test]
    fn test_dispatch_updates_state() {
        let mut dispatcher = StoriesDispatcher::new();
        dispatcher.dispatch(StoriesAction::FetchInit);
        assert!(dispatcher.state().is_loading());

        dispatcher.dispatch(StoriesAction::FetchSuccess(vec![Story::new("1", "Redux")]));
        assert!(!dispatcher.state().is_loading());
        assert_eq!(dispatcher.state().data.len(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut dispatcher = StoriesDispatcher::with_max_history(3);
        for _ in 0..5 {
            dispatcher.dispatch(StoriesAction::FetchInit);
        }
        dispatcher.dispatch(StoriesAction::RemoveStory("7".to_string()));

        let summaries: Vec<String> = dispatcher.history().map(|r| r.summary.clone()).collect();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries.last().unwrap(), "REMOVE_STORY (7)");
    }

    #[test]
    fn test_zero_history_records_nothing() {
        let mut dispatcher = StoriesDispatcher::with_max_history(0);
        dispatcher.dispatch(StoriesAction::FetchInit);
        assert_eq!(dispatcher.history().count(), 0);
        assert!(dispatcher.state().is_loading());
    }
}
