use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::api::Story;
use crate::config::config::DisplayConfig;
use crate::data::{derive_view, SortKey, SortState};
use crate::services::FetchController;
use crate::state::SearchState;
use crate::ui::actions::{Focus, UiAction};
use crate::ui::key_dispatcher::KeyDispatcher;
use crate::utils::logging::LogRingBuffer;

pub const LOADING_MESSAGE: &str = "Loading ...";
pub const ERROR_MESSAGE: &str = "Something went wrong ...";

const PAGE_SIZE: usize = 10;

pub struct TuiApp {
    controller: FetchController,
    search: SearchState,
    search_input: Input,
    filter_input: Input,
    sort: SortState,
    focus: Focus,
    key_dispatcher: KeyDispatcher,
    table_state: TableState,
    show_help: bool,
    show_debug: bool,
    status_message: String,
    display: DisplayConfig,
    log_buffer: Option<LogRingBuffer>,
}

impl TuiApp {
    pub fn new(controller: FetchController, search: SearchState, display: DisplayConfig) -> Self {
        let search_input = Input::from(search.value().to_string());
        Self {
            controller,
            search,
            search_input,
            filter_input: Input::default(),
            sort: SortState::default(),
            focus: Focus::Search,
            key_dispatcher: KeyDispatcher::new(),
            table_state: TableState::default(),
            show_help: false,
            show_debug: false,
            status_message: "Ready - type a search term and press Enter".to_string(),
            display,
            log_buffer: None,
        }
    }

    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter_input = Input::from(filter.to_string());
        self
    }

    pub fn with_log_buffer(mut self, log_buffer: LogRingBuffer) -> Self {
        self.log_buffer = Some(log_buffer);
        self
    }

    pub fn controller(&self) -> &FetchController {
        &self.controller
    }

    pub fn search_term(&self) -> &str {
        self.search.value()
    }

    pub fn filter(&self) -> &str {
        self.filter_input.value()
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn selected(&self) -> Option<usize> {
        self.table_state.selected()
    }

    /// The stories as they are shown: filtered, then sorted
    pub fn visible_stories(&self) -> Vec<&Story> {
        derive_view(
            &self.controller.state().data,
            self.filter_input.value(),
            &self.sort,
        )
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.poll_fetches();
            terminal.draw(|f| self.ui(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Pick up finished fetches and refresh the status line
    pub fn poll_fetches(&mut self) {
        if self.controller.poll_outcomes() == 0 {
            return;
        }

        let state = self.controller.state();
        if state.is_error() {
            self.status_message = format!("{} Search failed", self.display.icons.error);
        } else {
            self.status_message = format!(
                "{} {} stories for '{}'",
                self.display.icons.success,
                state.data.len(),
                self.search.value()
            );
        }
        self.clamp_selection(true);
    }

    /// Handle one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let action = if self.show_help {
            // Everything else is swallowed while help is open
            match self.key_dispatcher.get_help_action(&key) {
                Some(action) => action,
                None => return false,
            }
        } else {
            match self.key_dispatcher.get_action(self.focus, &key) {
                Some(action) => action,
                None => {
                    self.handle_text_input(key);
                    return false;
                }
            }
        };

        debug!(target: "input", "Key {:?} -> {:?}", key.code, action);
        self.apply_action(action)
    }

    fn handle_text_input(&mut self, key: KeyEvent) {
        match self.focus {
            Focus::Search => {
                if self.search_input.handle_event(&Event::Key(key)).is_some() {
                    let value = self.search_input.value().to_string();
                    if let Err(e) = self.search.set(value) {
                        warn!(target: "search", "Failed to persist search term: {:#}", e);
                    }
                }
            }
            Focus::Filter => {
                if self.filter_input.handle_event(&Event::Key(key)).is_some() {
                    self.clamp_selection(true);
                }
            }
            Focus::List => {}
        }
    }

    /// Returns true when the app should exit
    pub fn apply_action(&mut self, action: UiAction) -> bool {
        match action {
            UiAction::Quit => return true,
            UiAction::SubmitSearch => self.submit_search(),
            UiAction::FocusSearch => self.focus = Focus::Search,
            UiAction::FocusList => {
                self.focus = Focus::List;
                self.clamp_selection(false);
            }
            UiAction::StartFilter => self.focus = Focus::Filter,
            UiAction::ApplyFilter => self.focus = Focus::List,
            UiAction::ClearFilter => {
                self.filter_input.reset();
                self.focus = Focus::List;
                self.clamp_selection(false);
            }
            UiAction::NextStory => self.move_selection(1),
            UiAction::PreviousStory => self.move_selection(-1),
            UiAction::PageDown => self.move_selection(PAGE_SIZE as isize),
            UiAction::PageUp => self.move_selection(-(PAGE_SIZE as isize)),
            UiAction::FirstStory => self.select_index(0),
            UiAction::LastStory => {
                let count = self.visible_stories().len();
                self.select_index(count.saturating_sub(1));
            }
            UiAction::DismissStory => self.dismiss_selected(),
            UiAction::Sort(key) => self.select_sort(key),
            UiAction::ToggleHelp => self.show_help = !self.show_help,
            UiAction::ToggleDebug => self.show_debug = !self.show_debug,
        }
        false
    }

    /// Send the current search term. Blank terms are refused, like a
    /// disabled submit button.
    pub fn submit_search(&mut self) {
        if !self.search.can_submit() {
            self.status_message = "Enter a search term first".to_string();
            return;
        }

        let term = self.search.value().to_string();
        if let Some(request_id) = self.controller.submit(&term) {
            info!(target: "ui", "Submitted '{}' as request #{}", term, request_id);
            self.status_message = format!("{} Searching for '{}'", self.display.icons.loading, term);
        }
    }

    fn select_sort(&mut self, key: SortKey) {
        self.sort.select(key);
        let direction = if key == SortKey::None {
            if self.sort.is_reverse {
                "reversed"
            } else {
                "server order"
            }
        } else if self.sort.is_descending() {
            "descending"
        } else {
            "ascending"
        };
        self.status_message = format!("Sorted by {} ({})", key, direction);
        self.clamp_selection(false);
    }

    fn dismiss_selected(&mut self) {
        // The list is not shown while loading or after a failed search
        let state = self.controller.state();
        if state.is_loading() || state.is_error() {
            return;
        }
        let Some(index) = self.table_state.selected() else {
            return;
        };
        let Some(object_id) = self
            .visible_stories()
            .get(index)
            .map(|story| story.object_id.clone())
        else {
            return;
        };

        self.controller.remove_story(&object_id);
        self.status_message = format!("Dismissed story {}", object_id);
        self.clamp_selection(false);
    }

    fn move_selection(&mut self, delta: isize) {
        let count = self.visible_stories().len();
        if count == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, count as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn select_index(&mut self, index: usize) {
        if self.visible_stories().is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(index));
            self.clamp_selection(false);
        }
    }

    /// Keep the selection inside the visible list
    fn clamp_selection(&mut self, reset: bool) {
        let count = self.visible_stories().len();
        let selected = if count == 0 {
            None
        } else if reset {
            Some(0)
        } else {
            Some(self.table_state.selected().unwrap_or(0).min(count - 1))
        };
        self.table_state.select(selected);
    }

    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(3), // Search input
                Constraint::Length(1), // Filter line
                Constraint::Min(5),    // Stories area
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        let title = Paragraph::new(Line::from(Span::styled(
            "My Hacker Stories",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        f.render_widget(title, chunks[0]);

        self.render_search(f, chunks[1]);
        self.render_filter(f, chunks[2]);

        let body = if self.show_debug {
            let split = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[3]);
            self.render_debug(f, split[1]);
            split[0]
        } else {
            chunks[3]
        };
        self.render_stories(f, body);
        self.render_status(f, chunks[4]);

        if self.show_help {
            self.render_help_popup(f);
        }
    }

    fn render_search(&self, f: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Search;
        let hint = if self.search.can_submit() {
            " Search (Enter to submit) "
        } else {
            " Search (enter a term to submit) "
        };
        let block = Block::default().borders(Borders::ALL).title(hint);
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        let paragraph = Paragraph::new(self.search_input.value())
            .block(block)
            .style(style);
        f.render_widget(paragraph, area);

        if focused {
            f.set_cursor_position((
                area.x + self.search_input.visual_cursor() as u16 + 1,
                area.y + 1,
            ));
        }
    }

    fn render_filter(&self, f: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Filter;
        if !focused && self.filter_input.value().is_empty() {
            return;
        }

        let label = "Filter: ";
        let line = Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Magenta)),
            Span::raw(self.filter_input.value()),
        ]);
        f.render_widget(Paragraph::new(line), area);

        if focused {
            f.set_cursor_position((
                area.x + label.len() as u16 + self.filter_input.visual_cursor() as u16,
                area.y,
            ));
        }
    }

    fn render_stories(&mut self, f: &mut Frame, area: Rect) {
        let state = self.controller.state();
        let block = Block::default().borders(Borders::ALL).title(" Stories ");

        if state.is_loading() {
            let loading = Paragraph::new(LOADING_MESSAGE).block(block);
            f.render_widget(loading, area);
            return;
        }
        if state.is_error() {
            let error = Paragraph::new(ERROR_MESSAGE)
                .style(Style::default().fg(Color::Red))
                .block(block);
            f.render_widget(error, area);
            return;
        }

        let stories = derive_view(&state.data, self.filter_input.value(), &self.sort);
        if stories.is_empty() {
            let empty = Paragraph::new("No stories").block(block);
            f.render_widget(empty, area);
            return;
        }

        let show_urls = self.display.show_urls;
        let mut columns = vec![(SortKey::Title, "Title")];
        if show_urls {
            columns.push((SortKey::None, "Url"));
        }
        columns.extend([
            (SortKey::Author, "Author"),
            (SortKey::Comments, "Comments"),
            (SortKey::Points, "Points"),
        ]);

        let header_cells: Vec<Cell> = columns
            .iter()
            .map(|(key, name)| {
                let label = if *key != SortKey::None && *key == self.sort.sort_key {
                    let arrow = if self.sort.is_descending() {
                        &self.display.icons.sort_descending
                    } else {
                        &self.display.icons.sort_ascending
                    };
                    format!("{} {}", name, arrow)
                } else {
                    name.to_string()
                };
                Cell::from(label).style(Style::default().fg(Color::Yellow))
            })
            .collect();
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let rows: Vec<Row> = stories
            .iter()
            .map(|story| {
                let mut cells = vec![Cell::from(story.title.clone())];
                if show_urls {
                    cells.push(
                        Cell::from(story.url.clone()).style(Style::default().fg(Color::Blue)),
                    );
                }
                cells.push(Cell::from(story.author.clone()));
                cells.push(Cell::from(story.num_comments.to_string()));
                cells.push(Cell::from(story.points.to_string()));
                Row::new(cells).height(1)
            })
            .collect();

        let mut widths = vec![Constraint::Percentage(if show_urls { 35 } else { 60 })];
        if show_urls {
            widths.push(Constraint::Percentage(30));
        }
        widths.extend([
            Constraint::Percentage(15),
            Constraint::Length(9),
            Constraint::Length(7),
        ]);

        let highlight = if self.focus == Focus::List {
            Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Stories ({}) ", stories.len())),
            )
            .row_highlight_style(highlight)
            .highlight_symbol("> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_debug(&self, f: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;

        let mut lines: Vec<Line> = self
            .controller
            .history()
            .map(|record| Line::from(record.format_for_display()))
            .collect();
        lines.push(Line::from("----"));
        if let Some(buffer) = &self.log_buffer {
            lines.extend(
                buffer
                    .get_recent(height)
                    .into_iter()
                    .map(|entry| Line::from(entry.format_for_display())),
            );
        }
        let skip = lines.len().saturating_sub(height);
        let lines: Vec<Line> = lines.into_iter().skip(skip).collect();

        let debug = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Debug (F5) "))
            .wrap(Wrap { trim: false });
        f.render_widget(debug, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let mode = match self.focus {
            Focus::Search => "SEARCH",
            Focus::List => "LIST",
            Focus::Filter => "FILTER",
        };
        let status_line = Line::from(vec![
            Span::styled(&self.status_message, Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled(
                mode,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | F1=Help | Ctrl+C=Exit"),
        ]);

        let status = Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray));
        f.render_widget(status, area);
    }

    fn render_help_popup(&self, f: &mut Frame) {
        let area = centered_rect(60, 70, f.area());
        f.render_widget(Clear, area);

        let help_text = vec![
            Line::from("Search"),
            Line::from("  Enter      - Submit search"),
            Line::from("  Tab / Esc  - Go to story list"),
            Line::from(""),
            Line::from("Story list"),
            Line::from("  j/k, arrows - Move selection"),
            Line::from("  g / G       - First / last story"),
            Line::from("  d / Delete  - Dismiss story"),
            Line::from("  1-5 or n/t/a/c/p - Sort by none/title/author/comments/points"),
            Line::from("                     (again to reverse)"),
            Line::from("  /           - Filter titles (Esc clears)"),
            Line::from("  r           - Search again"),
            Line::from("  s / Tab     - Back to search"),
            Line::from("  q / Esc     - Exit"),
            Line::from(""),
            Line::from("  F5          - Toggle debug pane"),
            Line::from("  F1          - Toggle this help"),
        ];

        let help = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title(" Help "))
            .wrap(Wrap { trim: false });
        f.render_widget(help, area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Set up the terminal, run the app and restore the terminal afterwards
pub fn run_tui_app(app: &mut TuiApp) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, StoriesSource, DEFAULT_ENDPOINT};
    use crate::persistence::MemoryStore;
    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;
    use tokio::runtime::Handle;
    use url::Url;

    struct FixedSource(Vec<Story>);

    #[async_trait]
    impl StoriesSource for FixedSource {
        async fn fetch_stories(&self, _url: &Url) -> Result<Vec<Story>, ApiError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "FixedSource"
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn app_with(stories: Vec<Story>) -> TuiApp {
        let controller = FetchController::new(
            Arc::new(FixedSource(stories)),
            DEFAULT_ENDPOINT,
            Handle::current(),
        )
        .unwrap();
        let search = SearchState::load(Box::new(MemoryStore::new()));
        TuiApp::new(controller, search, DisplayConfig::default())
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_typing_updates_search_term() {
        let mut app = app_with(vec![]);
        app.handle_key(key(KeyCode::Char('!')));
        assert_eq!(app.search_term(), "React!");
    }

    #[tokio::test]
    async fn test_loading_then_list_rendering() {
        let mut app = app_with(vec![
            Story::new("0", "React").with_points(4),
            Story::new("1", "Redux").with_points(5),
        ]);
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();

        app.submit_search();
        terminal.draw(|f| app.ui(f)).unwrap();
        assert!(screen_text(&terminal).contains(LOADING_MESSAGE));

        app.controller.wait_until_settled().await;
        terminal.draw(|f| app.ui(f)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Redux"));
        assert!(!text.contains(LOADING_MESSAGE));
    }

    #[tokio::test]
    async fn test_sort_and_dismiss_from_list() {
        let mut app = app_with(vec![
            Story::new("0", "React").with_points(4),
            Story::new("1", "Redux").with_points(5),
        ]);
        app.submit_search();
        app.controller.wait_until_settled().await;

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::List);

        app.handle_key(key(KeyCode::Char('p')));
        let titles: Vec<&str> = app.visible_stories().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Redux", "React"]);

        // Dismiss the selected (first shown) story
        app.handle_key(key(KeyCode::Char('d')));
        let titles: Vec<&str> = app.visible_stories().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["React"]);
        assert_eq!(app.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_dismiss_ignored_while_list_is_hidden() {
        let mut app = app_with(vec![Story::new("0", "React"), Story::new("1", "Redux")]);
        app.submit_search();
        app.controller.wait_until_settled().await;
        app.handle_key(key(KeyCode::Tab));

        // Search again and try to dismiss before the results arrive
        app.handle_key(key(KeyCode::Char('r')));
        assert!(app.controller().state().is_loading());
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.controller().state().data.len(), 2);
        assert!(!app.status_message().starts_with("Dismissed"));

        app.controller.wait_until_settled().await;
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.controller().state().data.len(), 1);
    }

    #[tokio::test]
    async fn test_filter_mode() {
        let mut app = app_with(vec![Story::new("0", "React"), Story::new("1", "Redux")]);
        app.submit_search();
        app.controller.wait_until_settled().await;

        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Char('/')));
        for c in "redux".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.visible_stories().len(), 1);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.filter(), "");
        assert_eq!(app.visible_stories().len(), 2);
        assert_eq!(app.focus(), Focus::List);
    }

    #[tokio::test]
    async fn test_help_swallows_keys() {
        let mut app = app_with(vec![]);
        app.handle_key(key(KeyCode::F(1)));
        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.search_term(), "React");
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.show_help);
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }
}
