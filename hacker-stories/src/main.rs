use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use hacker_stories::api::{HnApiClient, Story};
use hacker_stories::config::Config;
use hacker_stories::data::{derive_view, SortKey, SortState};
use hacker_stories::persistence::{JsonFileStore, KeyValueStore, MemoryStore};
use hacker_stories::services::FetchController;
use hacker_stories::state::{SearchState, StoriesDispatcher, SEARCH_KEY};
use hacker_stories::ui::tui_app::{self, TuiApp};
use hacker_stories::utils::app_paths::AppPaths;
use hacker_stories::utils::{dual_logging, logging};

mod table_display;

use table_display::display_stories;

#[derive(Parser, Debug)]
#[command(name = "hacker-stories", version, about = "Search Hacker News stories from the terminal")]
struct Args {
    /// Search term to use instead of the remembered one
    #[arg(short, long)]
    query: Option<String>,

    /// Column to sort by: none, title, author, comments or points
    #[arg(short, long)]
    sort: Option<SortKey>,

    /// Reverse the sort direction
    #[arg(short, long)]
    reverse: bool,

    /// Only show stories whose title contains this text
    #[arg(short, long)]
    filter: Option<String>,

    /// Search once, print the results and exit
    #[arg(short, long)]
    print: bool,

    /// Search endpoint to query
    #[arg(long, env = "HACKER_STORIES_ENDPOINT")]
    endpoint: Option<String>,

    /// Write a commented default config file and exit
    #[arg(long)]
    generate_config: bool,
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error creating config directory {}", parent.display()))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("Error writing config file {}", path.display()))?;
    println!("Configuration file created at: {:?}", path);
    println!("Edit this file to customize Hacker Stories.");
    Ok(())
}

fn open_store(config: &Config) -> Box<dyn KeyValueStore> {
    if !config.behavior.persist_search {
        return Box::new(MemoryStore::new());
    }
    match AppPaths::store_file() {
        Ok(path) => {
            info!(target: "main", "Using store {}", path.display());
            Box::new(JsonFileStore::open(path))
        }
        Err(e) => {
            warn!(target: "main", "No data directory ({:#}), search term will not be saved", e);
            Box::new(MemoryStore::new())
        }
    }
}

/// Run one search to completion and return the stories to print, in view order
fn fetch_for_print(
    runtime: &Runtime,
    controller: &mut FetchController,
    term: &str,
    filter: &str,
    sort: &SortState,
) -> Result<Vec<Story>> {
    if controller.submit(term).is_none() {
        anyhow::bail!("Search term is empty");
    }
    runtime.block_on(controller.wait_until_settled());

    let state = controller.state();
    if state.is_error() {
        anyhow::bail!(tui_app::ERROR_MESSAGE);
    }
    Ok(derive_view(&state.data, filter, sort)
        .into_iter()
        .cloned()
        .collect())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.generate_config {
        return generate_config();
    }

    let log_buffer = logging::init_tracing_with_dual_logging("debug");
    if let Some(dual_logger) = dual_logging::get_dual_logger() {
        info!(target: "main", "Logs written to {}", dual_logger.log_path().display());
    }

    let config = Config::load().unwrap_or_else(|e| {
        warn!(target: "main", "Could not load config, using defaults: {:#}", e);
        Config::default()
    });

    let mut search = SearchState::load_with(
        open_store(&config),
        SEARCH_KEY,
        &config.behavior.default_search,
    );
    if let Some(query) = &args.query {
        if let Err(e) = search.set(query.as_str()) {
            warn!(target: "main", "Failed to persist search term: {:#}", e);
        }
    }

    let sort = SortState {
        sort_key: args.sort.unwrap_or(config.behavior.default_sort),
        is_reverse: args.reverse,
    };
    let filter = args.filter.unwrap_or_default();
    let endpoint = args.endpoint.unwrap_or_else(|| config.api.endpoint.clone());

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let mut controller = FetchController::with_dispatcher(
        Arc::new(HnApiClient::new()),
        &endpoint,
        runtime.handle().clone(),
        StoriesDispatcher::with_max_history(config.behavior.max_action_history),
    )?;

    if args.print {
        let stories = fetch_for_print(&runtime, &mut controller, search.value(), &filter, &sort)?;
        let stories: Vec<&Story> = stories.iter().collect();
        display_stories(&stories, &sort, &config.display);
        return Ok(());
    }

    let mut app = TuiApp::new(controller, search, config.display.clone())
        .with_sort(sort)
        .with_filter(&filter)
        .with_log_buffer(log_buffer);
    if config.behavior.fetch_on_startup {
        app.submit_search();
    }

    tui_app::run_tui_app(&mut app)?;
    info!(target: "main", "Exiting");
    Ok(())
}
