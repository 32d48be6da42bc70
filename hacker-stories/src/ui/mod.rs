//! Terminal user interface
//!
//! The interactive story browser and its key handling.

pub mod actions;
pub mod key_dispatcher;
pub mod tui_app;

pub use actions::{Focus, UiAction};
pub use tui_app::{run_tui_app, TuiApp};
