//! External API client and models
//!
//! This module handles communication with the story search API
//! and defines the data models for its responses.

pub mod client;
pub mod models;

pub use client::{
    build_search_url, parse_endpoint, ApiError, HnApiClient, StoriesSource, DEFAULT_ENDPOINT,
};
pub use models::{SearchResponse, Story};
