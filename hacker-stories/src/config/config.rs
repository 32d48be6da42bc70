use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_ENDPOINT;
use crate::data::SortKey;
use crate::state::DEFAULT_SEARCH;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub behavior: BehaviorConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Search endpoint; the term is sent as `?query=<term>`
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Search term used when none has been saved yet
    pub default_search: String,

    /// Remember the last search term between runs
    pub persist_search: bool,

    /// Search for the restored term as soon as the app starts
    pub fetch_on_startup: bool,

    /// Sort applied when the app starts
    pub default_sort: SortKey,

    /// Number of dispatched actions kept for the debug pane
    pub max_action_history: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use Unicode glyphs for icons
    pub use_glyphs: bool,

    /// Show the url column in the story list
    pub show_urls: bool,

    /// Icons for different states (can be overridden)
    pub icons: IconConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub sort_ascending: String,
    pub sort_descending: String,
    pub loading: String,
    pub error: String,
    pub success: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            default_search: DEFAULT_SEARCH.to_string(),
            persist_search: true,
            fetch_on_startup: true,
            default_sort: SortKey::None,
            max_action_history: 100,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            use_glyphs: true,
            show_urls: true,
            icons: IconConfig::default(),
        }
    }
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            sort_ascending: "▲".to_string(),
            sort_descending: "▼".to_string(),
            loading: "⏳".to_string(),
            error: "❌".to_string(),
            success: "✅".to_string(),
        }
    }
}

impl IconConfig {
    /// Get simple ASCII alternatives for terminals without glyph support
    pub fn simple() -> Self {
        Self {
            sort_ascending: "^".to_string(),
            sort_descending: "v".to_string(),
            loading: "[..]".to_string(),
            error: "[X]".to_string(),
            success: "[OK]".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        // Apply simple mode if glyphs are disabled
        if !config.display.use_glyphs {
            config.display.icons = IconConfig::simple();
        }

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("hacker-stories").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        format!(
            r#"# Hacker Stories Configuration File
# Location: ~/.config/hacker-stories/config.toml (Linux)
#           ~/Library/Application Support/hacker-stories/config.toml (macOS)
#           %APPDATA%\hacker-stories\config.toml (Windows)

[api]
# Search endpoint. The search term is appended as ?query=<term>
# Can also be set with the HACKER_STORIES_ENDPOINT environment variable
endpoint = "{endpoint}"

[behavior]
# Search term used the first time the app runs
default_search = "{search}"

# Remember the last search term between runs
persist_search = true

# Search for the restored term as soon as the app starts
fetch_on_startup = true

# Initial sort: "none", "title", "author", "comments" or "points"
default_sort = "none"

# Number of dispatched actions shown in the debug pane (F5)
max_action_history = 100

[display]
# Use Unicode glyphs for icons
# Set to false for ASCII-only mode (better compatibility)
use_glyphs = true

# Show the url column in the story list
show_urls = true

# Icon configuration
# These are automatically set to ASCII when use_glyphs = false
[display.icons]
sort_ascending = "▲"
sort_descending = "▼"
loading = "⏳"
error = "❌"
success = "✅"
"#,
            endpoint = DEFAULT_ENDPOINT,
            search = DEFAULT_SEARCH,
        )
    }
}
