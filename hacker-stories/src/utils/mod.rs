//! Utility functions and helpers
//!
//! Paths, logging setup and the in-memory log buffer used by the debug pane.

pub mod app_paths;
pub mod dual_logging;
pub mod logging;
