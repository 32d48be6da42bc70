//! Key-value persistence
//!
//! The application only ever stores a handful of strings (the last search
//! term). [`KeyValueStore`] is the capability the state layer depends on,
//! with a JSON file backed implementation for real use and an in-memory one
//! for tests.

pub mod kv_store;

pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore};
