use hacker_stories::persistence::{JsonFileStore, KeyValueStore};
use hacker_stories::state::{SearchState, DEFAULT_SEARCH, SEARCH_KEY};
use tempfile::TempDir;

#[test]
fn test_search_term_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hacker-stories").join("store.json");

    // First run: nothing stored yet
    let mut search = SearchState::load(Box::new(JsonFileStore::open(&path)));
    assert_eq!(search.value(), DEFAULT_SEARCH);
    assert!(!path.exists(), "loading alone must not write");

    assert!(search.set("Redux").unwrap());
    drop(search);

    // Second run restores the last term
    let search = SearchState::load(Box::new(JsonFileStore::open(&path)));
    assert_eq!(search.value(), "Redux");

    let raw = std::fs::read_to_string(&path).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored[SEARCH_KEY], "Redux");
}

#[test]
fn test_other_keys_are_preserved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");

    let mut store = JsonFileStore::open(&path);
    store.set("theme", "dark").unwrap();

    let mut search = SearchState::load(Box::new(JsonFileStore::open(&path)));
    search.set("Rust").unwrap();

    let reopened = JsonFileStore::open(&path);
    assert_eq!(reopened.get("theme").as_deref(), Some("dark"));
    assert_eq!(reopened.get(SEARCH_KEY).as_deref(), Some("Rust"));
}

#[test]
fn test_empty_stored_term_falls_back_to_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"{"search": ""}"#).unwrap();

    let search = SearchState::load(Box::new(JsonFileStore::open(&path)));
    assert_eq!(search.value(), DEFAULT_SEARCH);
    assert!(search.can_submit());
}

#[test]
fn test_corrupt_store_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "not json at all").unwrap();

    let mut search = SearchState::load(Box::new(JsonFileStore::open(&path)));
    assert_eq!(search.value(), DEFAULT_SEARCH);

    search.set("Vue").unwrap();
    let reopened = JsonFileStore::open(&path);
    assert_eq!(reopened.get(SEARCH_KEY).as_deref(), Some("Vue"));
}
