use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::data::SortKey;
use crate::ui::actions::{Focus, UiAction};

/// Represents a key binding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::empty(),
        }
    }

    pub fn with_ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn with_shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Maps keys to actions, per focus.
///
/// Keys with no binding in the search and filter maps are text input.
pub struct KeyDispatcher {
    search_map: HashMap<KeyBinding, UiAction>,
    list_map: HashMap<KeyBinding, UiAction>,
    filter_map: HashMap<KeyBinding, UiAction>,
    help_map: HashMap<KeyBinding, UiAction>,
}

impl KeyDispatcher {
    pub fn new() -> Self {
        let mut dispatcher = Self {
            search_map: HashMap::new(),
            list_map: HashMap::new(),
            filter_map: HashMap::new(),
            help_map: HashMap::new(),
        };
        dispatcher.setup_default_bindings();
        dispatcher
    }

    fn setup_default_bindings(&mut self) {
        // Bindings shared by every focus
        for map in [
            &mut self.search_map,
            &mut self.list_map,
            &mut self.filter_map,
        ] {
            map.insert(KeyBinding::with_ctrl(KeyCode::Char('c')), UiAction::Quit);
            map.insert(KeyBinding::new(KeyCode::F(1)), UiAction::ToggleHelp);
            map.insert(KeyBinding::new(KeyCode::F(5)), UiAction::ToggleDebug);
        }

        self.setup_search_bindings();
        self.setup_list_bindings();
        self.setup_filter_bindings();
        self.setup_help_bindings();
    }

    fn setup_search_bindings(&mut self) {
        let map = &mut self.search_map;
        map.insert(KeyBinding::new(KeyCode::Enter), UiAction::SubmitSearch);
        map.insert(KeyBinding::new(KeyCode::Tab), UiAction::FocusList);
        map.insert(KeyBinding::new(KeyCode::Down), UiAction::FocusList);
        map.insert(KeyBinding::new(KeyCode::Esc), UiAction::FocusList);
    }

    fn setup_list_bindings(&mut self) {
        let map = &mut self.list_map;
        map.insert(KeyBinding::new(KeyCode::Char('q')), UiAction::Quit);
        map.insert(KeyBinding::new(KeyCode::Esc), UiAction::Quit);

        // Navigation
        map.insert(KeyBinding::new(KeyCode::Down), UiAction::NextStory);
        map.insert(KeyBinding::new(KeyCode::Char('j')), UiAction::NextStory);
        map.insert(KeyBinding::new(KeyCode::Up), UiAction::PreviousStory);
        map.insert(KeyBinding::new(KeyCode::Char('k')), UiAction::PreviousStory);
        map.insert(KeyBinding::new(KeyCode::Home), UiAction::FirstStory);
        map.insert(KeyBinding::new(KeyCode::Char('g')), UiAction::FirstStory);
        map.insert(KeyBinding::new(KeyCode::End), UiAction::LastStory);
        map.insert(KeyBinding::with_shift(KeyCode::Char('G')), UiAction::LastStory);
        map.insert(KeyBinding::new(KeyCode::PageDown), UiAction::PageDown);
        map.insert(KeyBinding::new(KeyCode::PageUp), UiAction::PageUp);

        // Focus
        map.insert(KeyBinding::new(KeyCode::Tab), UiAction::FocusSearch);
        map.insert(KeyBinding::new(KeyCode::Char('s')), UiAction::FocusSearch);
        map.insert(KeyBinding::new(KeyCode::Char('/')), UiAction::StartFilter);

        // Data operations
        map.insert(KeyBinding::new(KeyCode::Char('d')), UiAction::DismissStory);
        map.insert(KeyBinding::new(KeyCode::Delete), UiAction::DismissStory);
        map.insert(KeyBinding::new(KeyCode::Char('r')), UiAction::SubmitSearch);

        for (digit, letter, key) in [
            ('1', 'n', SortKey::None),
            ('2', 't', SortKey::Title),
            ('3', 'a', SortKey::Author),
            ('4', 'c', SortKey::Comments),
            ('5', 'p', SortKey::Points),
        ] {
            map.insert(KeyBinding::new(KeyCode::Char(digit)), UiAction::Sort(key));
            map.insert(KeyBinding::new(KeyCode::Char(letter)), UiAction::Sort(key));
        }
    }

    fn setup_filter_bindings(&mut self) {
        let map = &mut self.filter_map;
        map.insert(KeyBinding::new(KeyCode::Enter), UiAction::ApplyFilter);
        map.insert(KeyBinding::new(KeyCode::Esc), UiAction::ClearFilter);
    }

    fn setup_help_bindings(&mut self) {
        let map = &mut self.help_map;
        map.insert(KeyBinding::new(KeyCode::F(1)), UiAction::ToggleHelp);
        map.insert(KeyBinding::new(KeyCode::Esc), UiAction::ToggleHelp);
        map.insert(KeyBinding::new(KeyCode::Char('q')), UiAction::ToggleHelp);
        map.insert(KeyBinding::with_ctrl(KeyCode::Char('c')), UiAction::Quit);
    }

    /// Get action for a key in the given focus
    pub fn get_action(&self, focus: Focus, key: &KeyEvent) -> Option<UiAction> {
        let map = match focus {
            Focus::Search => &self.search_map,
            Focus::List => &self.list_map,
            Focus::Filter => &self.filter_map,
        };
        map.get(&KeyBinding::from_event(key)).copied()
    }

    /// Get action for a key while the help overlay is open
    pub fn get_help_action(&self, key: &KeyEvent) -> Option<UiAction> {
        self.help_map.get(&KeyBinding::from_event(key)).copied()
    }
}

impl Default for KeyDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn test_search_bindings() {
        let dispatcher = KeyDispatcher::new();
        assert_eq!(
            dispatcher.get_action(Focus::Search, &key(KeyCode::Enter)),
            Some(UiAction::SubmitSearch)
        );
        // Letters are text input while searching
        assert_eq!(dispatcher.get_action(Focus::Search, &key(KeyCode::Char('q'))), None);
    }

    #[test]
    fn test_list_sort_bindings() {
        let dispatcher = KeyDispatcher::new();
        assert_eq!(
            dispatcher.get_action(Focus::List, &key(KeyCode::Char('p'))),
            Some(UiAction::Sort(SortKey::Points))
        );
        assert_eq!(
            dispatcher.get_action(Focus::List, &key(KeyCode::Char('2'))),
            Some(UiAction::Sort(SortKey::Title))
        );
        assert_eq!(
            dispatcher.get_action(Focus::List, &key(KeyCode::Char('d'))),
            Some(UiAction::DismissStory)
        );
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let dispatcher = KeyDispatcher::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for focus in [Focus::Search, Focus::List, Focus::Filter] {
            assert_eq!(dispatcher.get_action(focus, &ctrl_c), Some(UiAction::Quit));
        }
        assert_eq!(dispatcher.get_help_action(&ctrl_c), Some(UiAction::Quit));
    }
}
