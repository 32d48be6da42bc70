// Action system for UI operations

use crate::data::SortKey;

/// Which part of the screen receives typed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    List,
    Filter,
}

/// All possible actions that can be triggered in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Quit,

    // Search form
    SubmitSearch,

    // Focus switching
    FocusSearch,
    FocusList,
    StartFilter,
    ApplyFilter,
    ClearFilter,

    // Navigation actions
    NextStory,
    PreviousStory,
    FirstStory,
    LastStory,
    PageDown,
    PageUp,

    // Data operations
    DismissStory,
    Sort(SortKey),

    // Overlays
    ToggleHelp,
    ToggleDebug,
}
