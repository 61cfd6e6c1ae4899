//! Locally persisted collections: watch-later, liked, history, and
//! search-history. One JSON file per collection in the project data dir.
//!
//! Write semantics are dedup-and-promote: adding an entry removes any
//! existing entry with the same id, prepends the new one, truncates to the
//! collection's cap and writes the whole sequence back synchronously.
//! Corrupt or missing files read as empty — storage problems are logged and
//! swallowed, never surfaced to the user.

use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::api::Video;
use crate::constants::constants;

/// The three video collections. Search history is stored separately as
/// plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
  WatchLater,
  Liked,
  History,
}

impl Collection {
  fn file_name(self) -> &'static str {
    match self {
      Collection::WatchLater => "watch-later.json",
      Collection::Liked => "liked.json",
      Collection::History => "history.json",
    }
  }

  fn cap(self) -> usize {
    match self {
      Collection::History => constants().history_cap,
      Collection::WatchLater | Collection::Liked => constants().collection_cap,
    }
  }
}

pub struct Store {
  dir: PathBuf,
}

impl Store {
  /// Store rooted at the platform data directory. Falls back to the current
  /// directory when no home can be resolved.
  pub fn open() -> Self {
    let dir = ProjectDirs::from("", "", "tubeview")
      .map(|p| p.data_dir().to_path_buf())
      .unwrap_or_else(|| PathBuf::from("."));
    Self { dir }
  }

  /// Store rooted at an explicit directory (tests point this at a tempdir).
  pub fn at(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn data_dir(&self) -> &Path {
    &self.dir
  }

  pub fn load(&self, collection: Collection) -> Vec<Video> {
    self.read(collection.file_name())
  }

  /// Add a video to a collection: dedup by id, prepend, cap, persist.
  /// Idempotent in end-state — re-adding moves the entry to the front.
  /// Returns the new sequence.
  pub fn add(&self, collection: Collection, video: Video) -> Vec<Video> {
    let mut items = self.load(collection);
    items.retain(|v| v.id != video.id);
    items.insert(0, video);
    items.truncate(collection.cap());
    self.write(collection.file_name(), &items);
    items
  }

  pub fn load_searches(&self) -> Vec<String> {
    self.read("search-history.json")
  }

  /// Record a search query with the same dedup-and-promote policy, capped.
  pub fn record_search(&self, query: &str) -> Vec<String> {
    let mut queries = self.load_searches();
    queries.retain(|q| q != query);
    queries.insert(0, query.to_string());
    queries.truncate(constants().search_history_cap);
    self.write("search-history.json", &queries);
    queries
  }

  fn read<T: DeserializeOwned>(&self, file_name: &str) -> Vec<T> {
    let path = self.dir.join(file_name);
    let Ok(content) = std::fs::read_to_string(&path) else {
      return Vec::new();
    };
    match serde_json::from_str(&content) {
      Ok(items) => items,
      Err(e) => {
        // Corrupt storage is treated as an empty collection, never fatal.
        warn!(file = %path.display(), err = %e, "ignoring unreadable collection file");
        Vec::new()
      }
    }
  }

  fn write<T: Serialize>(&self, file_name: &str, items: &[T]) {
    if let Err(e) = std::fs::create_dir_all(&self.dir) {
      warn!(dir = %self.dir.display(), err = %e, "cannot create data dir");
      return;
    }
    let path = self.dir.join(file_name);
    match serde_json::to_string(items) {
      Ok(content) => {
        if let Err(e) = std::fs::write(&path, content) {
          warn!(file = %path.display(), err = %e, "failed to persist collection");
        }
      }
      Err(e) => warn!(file = %path.display(), err = %e, "failed to serialize collection"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::Snippet;

  fn video(id: &str) -> Video {
    Video {
      id: id.to_string(),
      snippet: Snippet { title: format!("Video {}", id), ..Snippet::default() },
      statistics: None,
      content_details: None,
    }
  }

  fn temp_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::at(dir.path());
    (dir, store)
  }

  #[test]
  fn load_missing_file_is_empty() {
    let (_dir, store) = temp_store();
    assert!(store.load(Collection::WatchLater).is_empty());
    assert!(store.load_searches().is_empty());
  }

  #[test]
  fn corrupt_file_reads_as_empty() {
    let (dir, store) = temp_store();
    std::fs::write(dir.path().join("liked.json"), "{not json").unwrap();
    assert!(store.load(Collection::Liked).is_empty());
  }

  #[test]
  fn add_persists_and_reloads() {
    let (_dir, store) = temp_store();
    store.add(Collection::WatchLater, video("a"));
    store.add(Collection::WatchLater, video("b"));
    let loaded = store.load(Collection::WatchLater);
    assert_eq!(loaded.len(), 2);
    // Most recently added first
    assert_eq!(loaded[0].id, "b");
    assert_eq!(loaded[1].id, "a");
  }

  #[test]
  fn re_adding_same_id_dedups_to_front() {
    let (_dir, store) = temp_store();
    store.add(Collection::History, video("a"));
    store.add(Collection::History, video("b"));
    let after = store.add(Collection::History, video("a"));
    assert_eq!(after.len(), 2);
    assert_eq!(after[0].id, "a");
    assert_eq!(after[1].id, "b");
  }

  #[test]
  fn history_caps_at_fifty() {
    let (_dir, store) = temp_store();
    for i in 0..50 {
      store.add(Collection::History, video(&format!("v{}", i)));
    }
    let after = store.add(Collection::History, video("v50"));
    assert_eq!(after.len(), 50);
    assert_eq!(after[0].id, "v50");
    // The oldest entry (v0) was dropped
    assert!(!after.iter().any(|v| v.id == "v0"));
    assert!(after.iter().any(|v| v.id == "v1"));
  }

  #[test]
  fn search_history_dedups_and_caps_at_ten() {
    let (_dir, store) = temp_store();
    for i in 0..10 {
      store.record_search(&format!("query {}", i));
    }
    store.record_search("query 3");
    let queries = store.load_searches();
    assert_eq!(queries.len(), 10);
    assert_eq!(queries[0], "query 3");
    assert_eq!(queries.iter().filter(|q| *q == "query 3").count(), 1);

    let after = store.record_search("brand new");
    assert_eq!(after.len(), 10);
    assert_eq!(after[0], "brand new");
  }
}
