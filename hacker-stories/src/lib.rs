pub mod api;
pub mod config;
pub mod data;
pub mod persistence;
pub mod services;
pub mod state;
pub mod ui;
pub mod utils;
