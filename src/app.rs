use ratatui::widgets::ListState;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::api::{ApiClient, ApiError, Video};
use crate::config::Config;
use crate::constants::constants;
use crate::store::{Collection, Store};
use crate::suggest::{self, Suggestion};

// --- Types ---

pub type FetchResult = Result<Vec<Video>, ApiError>;

/// The fixed set of navigable views. `selected` video id is orthogonal:
/// the watch pane can be open over any view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
  Home,
  Trending,
  Music,
  Gaming,
  Movies,
  Sports,
  Bookmarks,
  History,
  Liked,
  Settings,
  Search,
}

impl View {
  pub fn title(self) -> &'static str {
    match self {
      View::Home => "Home",
      View::Trending => "Trending Videos",
      View::Music => "Music",
      View::Gaming => "Gaming",
      View::Movies => "Movies",
      View::Sports => "Sports",
      View::Bookmarks => "Watch Later",
      View::History => "History",
      View::Liked => "Liked Videos",
      View::Settings => "Settings",
      View::Search => "Search",
    }
  }

  /// Category views have no endpoint of their own; they re-dispatch as a
  /// fixed search query.
  pub fn category_query(self) -> Option<&'static str> {
    match self {
      View::Music => Some("music videos"),
      View::Gaming => Some("gaming highlights"),
      View::Movies => Some("movie trailers"),
      View::Sports => Some("sports highlights"),
      _ => None,
    }
  }

  /// Number-row key binding for direct view switching.
  pub fn from_digit(c: char) -> Option<View> {
    match c {
      '1' => Some(View::Home),
      '2' => Some(View::Trending),
      '3' => Some(View::Music),
      '4' => Some(View::Gaming),
      '5' => Some(View::Movies),
      '6' => Some(View::Sports),
      '7' => Some(View::Bookmarks),
      '8' => Some(View::History),
      '9' => Some(View::Liked),
      '0' => Some(View::Settings),
      _ => None,
    }
  }
}

/// Keyboard focus: the search input box or the grid/watch pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Grid,
}

/// In-flight async task receivers. A grid fetch carries the generation it
/// was spawned under; a related fetch carries the video id it belongs to.
#[derive(Default)]
pub(crate) struct Tasks {
  pub(crate) fetch_rx: Option<(u64, oneshot::Receiver<FetchResult>)>,
  pub(crate) related_rx: Option<(String, oneshot::Receiver<FetchResult>)>,
}

/// Single owner of all view-state. The UI reads it and raises intents
/// (navigate/search/select/retry/add); nothing else mutates it.
pub struct App {
  pub api: Arc<ApiClient>,
  pub store: Store,
  pub config: Config,

  pub mode: AppMode,
  pub view: View,
  /// The active search query; empty outside search-originated views.
  pub query: String,
  pub videos: Vec<Video>,
  pub loading: bool,
  pub error: Option<String>,
  pub has_searched: bool,
  /// Currently watched video id, if the watch pane is open.
  pub selected: Option<String>,
  /// Snapshot of the watched video so the pane survives list changes.
  pub selected_video: Option<Video>,
  pub related: Vec<Video>,
  pub related_loading: bool,
  pub list_state: ListState,
  pub related_state: ListState,

  // Search box
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub suggestions: Vec<Suggestion>,
  pub suggestion_index: Option<usize>,
  pub search_history: Vec<String>,

  pub should_quit: bool,
  /// Monotonically increasing; bumped by every navigate/search so results
  /// from superseded fetches can be discarded.
  generation: u64,
  pub(crate) tasks: Tasks,
}

impl App {
  pub fn new(api: ApiClient, store: Store, config: Config) -> Self {
    let search_history = store.load_searches();
    Self {
      api: Arc::new(api),
      store,
      config,
      mode: AppMode::Grid,
      view: View::Home,
      query: String::new(),
      videos: Vec::new(),
      loading: false,
      error: None,
      has_searched: false,
      selected: None,
      selected_video: None,
      related: Vec::new(),
      related_loading: false,
      list_state: ListState::default(),
      related_state: ListState::default(),
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      suggestions: Vec::new(),
      suggestion_index: None,
      search_history,
      should_quit: false,
      generation: 0,
      tasks: Tasks::default(),
    }
  }

  // --- Transitions ---

  pub fn navigate(&mut self, view: View) {
    info!(?view, "navigate");
    self.generation += 1;
    self.view = view;
    self.query.clear();
    self.close_player();
    self.error = None;
    self.loading = false;
    self.mode = AppMode::Grid;

    match view {
      View::Home => {
        self.has_searched = false;
        let api = Arc::clone(&self.api);
        let region = self.config.region().to_string();
        self.spawn_fetch(async move { api.get_trending_videos(constants().page_size, &region, "0").await });
      }
      View::Trending => {
        let api = Arc::clone(&self.api);
        self.spawn_fetch(async move { api.get_trending_videos(constants().page_size, "US", "0").await });
      }
      View::Music | View::Gaming | View::Movies | View::Sports => {
        // Safety: the four category views all map to a fixed query.
        if let Some(q) = view.category_query() {
          self.search(q);
        }
      }
      View::Bookmarks => self.show_collection(Collection::WatchLater),
      View::History => self.show_collection(Collection::History),
      View::Liked => self.show_collection(Collection::Liked),
      View::Settings | View::Search => {
        self.videos.clear();
        self.list_state.select(None);
      }
    }
  }

  /// Run a search. Blank and whitespace-only queries are a no-op — state is
  /// left exactly as it was.
  pub fn search(&mut self, query: &str) {
    let q = query.trim();
    if q.is_empty() {
      return;
    }
    info!(query = %q, "search");
    self.generation += 1;
    self.view = View::Search;
    self.query = q.to_string();
    self.has_searched = true;
    self.error = None;
    self.close_player();
    self.mode = AppMode::Grid;
    self.input = q.to_string();
    self.cursor_position = self.input.chars().count();
    self.suggestions.clear();
    self.suggestion_index = None;
    self.search_history = self.store.record_search(q);

    let api = Arc::clone(&self.api);
    let q = q.to_string();
    self.spawn_fetch(async move {
      // The search endpoint returns snippet-only items; a details lookup
      // backfills statistics and durations. Either step failing fails the
      // whole operation — no partial results.
      let found = api.search_videos(&q, constants().page_size, None).await?;
      let ids: Vec<String> = found.iter().map(|v| v.id.clone()).collect();
      api.get_video_details(&ids).await
    });
  }

  /// Open the watch pane on a video. If the id is among the loaded or
  /// related items, it's recorded into the history collection.
  pub fn select_video(&mut self, id: &str) {
    let video = self
      .videos
      .iter()
      .find(|v| v.id == id)
      .or_else(|| self.related.iter().find(|v| v.id == id))
      .cloned();
    self.selected = Some(id.to_string());
    if let Some(v) = &video {
      self.store.add(Collection::History, v.clone());
    }
    self.selected_video = video;
    debug!(id, "video selected");

    // Fetch the watch-pane related set in the background
    self.related.clear();
    self.related_state.select(None);
    self.related_loading = true;
    let api = Arc::clone(&self.api);
    let id = id.to_string();
    let tag = id.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(api.get_related_videos(&id, constants().related_max).await);
    });
    self.tasks.related_rx = Some((tag, rx));
  }

  pub fn close_player(&mut self) {
    self.selected = None;
    self.selected_video = None;
    self.related.clear();
    self.related_state.select(None);
    self.related_loading = false;
    self.tasks.related_rx = None;
  }

  /// Re-issue whatever was last attempted: the active search if a query is
  /// set, otherwise the current view's load.
  pub fn retry(&mut self) {
    if self.query.is_empty() {
      self.navigate(self.view);
    } else {
      let q = self.query.clone();
      self.search(&q);
    }
  }

  pub fn add_to_watch_later(&mut self) {
    if let Some(v) = self.current_video().cloned() {
      debug!(id = %v.id, "add to watch later");
      self.store.add(Collection::WatchLater, v);
    }
  }

  pub fn add_to_liked(&mut self) {
    if let Some(v) = self.current_video().cloned() {
      debug!(id = %v.id, "add to liked");
      self.store.add(Collection::Liked, v);
    }
  }

  // --- State access ---

  /// The video an add-intent applies to: the watched video when the watch
  /// pane is open, else the grid selection.
  pub fn current_video(&self) -> Option<&Video> {
    if self.selected.is_some() {
      return self.selected_video.as_ref();
    }
    self.videos.get(self.list_state.selected()?)
  }

  /// The list the j/k keys act on, with its selection state.
  pub fn active_list(&mut self) -> (usize, &mut ListState) {
    if self.selected.is_some() {
      (self.related.len(), &mut self.related_state)
    } else {
      (self.videos.len(), &mut self.list_state)
    }
  }

  pub fn page_title(&self) -> String {
    if self.selected.is_some() {
      return "Watching".to_string();
    }
    if !self.query.is_empty() {
      return format!("Search results for \"{}\"", self.query);
    }
    self.view.title().to_string()
  }

  // --- Suggestions ---

  pub fn update_suggestions(&mut self) {
    self.suggestions = suggest::suggestions(&self.input, &self.search_history);
    self.suggestion_index = None;
  }

  pub fn suggestion_down(&mut self) {
    if self.suggestions.is_empty() {
      return;
    }
    let len = self.suggestions.len();
    self.suggestion_index = Some(self.suggestion_index.map_or(0, |i| (i + 1) % len));
  }

  pub fn suggestion_up(&mut self) {
    if self.suggestions.is_empty() {
      return;
    }
    let len = self.suggestions.len();
    self.suggestion_index = Some(self.suggestion_index.map_or(len - 1, |i| if i == 0 { len - 1 } else { i - 1 }));
  }

  // --- Async plumbing ---

  fn show_collection(&mut self, collection: Collection) {
    self.videos = self.store.load(collection);
    self.list_state.select(if self.videos.is_empty() { None } else { Some(0) });
  }

  fn spawn_fetch<F>(&mut self, fut: F)
  where
    F: Future<Output = FetchResult> + Send + 'static,
  {
    self.loading = true;
    self.error = None;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(fut.await);
    });
    self.tasks.fetch_rx = Some((self.generation, rx));
  }

  /// Apply a finished grid fetch, unless a newer navigation superseded it.
  pub(crate) fn finish_fetch(&mut self, generation: u64, result: FetchResult) {
    if generation != self.generation {
      debug!(generation, current = self.generation, "discarding stale fetch result");
      return;
    }
    self.loading = false;
    match result {
      Ok(videos) => {
        self.videos = videos;
        if self.videos.is_empty() {
          self.list_state.select(None);
          self.error = Some("No results found.".to_string());
        } else {
          self.list_state.select(Some(0));
        }
      }
      Err(e) => {
        error!(err = %e, "fetch failed");
        self.videos.clear();
        self.list_state.select(None);
        self.error = Some(e.to_string());
      }
    }
  }

  /// Drain finished background work. Called once per event-loop tick.
  pub fn check_pending(&mut self) {
    if let Some((generation, mut rx)) = self.tasks.fetch_rx.take() {
      if generation != self.generation {
        // Superseded by a newer navigation; let the result die here.
        debug!(generation, current = self.generation, "dropping stale fetch");
      } else {
        match rx.try_recv() {
          Ok(result) => self.finish_fetch(generation, result),
          Err(oneshot::error::TryRecvError::Empty) => self.tasks.fetch_rx = Some((generation, rx)),
          Err(oneshot::error::TryRecvError::Closed) => {
            self.loading = false;
            self.error = Some("Fetch task failed.".to_string());
          }
        }
      }
    }

    if let Some((id, mut rx)) = self.tasks.related_rx.take() {
      if self.selected.as_deref() != Some(id.as_str()) {
        debug!(id, "dropping related results for deselected video");
        self.related_loading = false;
      } else {
        match rx.try_recv() {
          Ok(Ok(videos)) => {
            self.related_loading = false;
            // The watched video itself adds nothing to its own related list
            self.related = videos.into_iter().filter(|v| Some(v.id.as_str()) != self.selected.as_deref()).collect();
            self.related_state.select(if self.related.is_empty() { None } else { Some(0) });
          }
          Ok(Err(e)) => {
            // The watch pane just stays empty; the main list is unaffected.
            debug!(err = %e, "related fetch failed");
            self.related_loading = false;
          }
          Err(oneshot::error::TryRecvError::Empty) => self.tasks.related_rx = Some((id, rx)),
          Err(oneshot::error::TryRecvError::Closed) => self.related_loading = false,
        }
      }
    }
  }
}
