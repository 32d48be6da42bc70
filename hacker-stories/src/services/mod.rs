pub mod fetch_controller;

pub use fetch_controller::{FetchController, FetchOutcome, OutcomeStatus};
