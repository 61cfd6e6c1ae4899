use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::warn;

use crate::api;
use crate::app::{App, AppMode, View};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Open a URL in the default browser, detached from the TUI.
fn open_in_browser(app: &mut App, url: &str) {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  match std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
  {
    Ok(mut child) => {
      // Reap the child in a background thread to avoid zombie processes.
      std::thread::spawn(move || {
        let _ = child.wait();
      });
    }
    Err(e) => {
      warn!(err = %e, "failed to open browser");
      app.error = Some(format!("Failed to open browser: {}", e));
    }
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  // Ctrl+O — open the watched (or grid-selected) video in the browser
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('o') {
    if let Some(video) = app.current_video() {
      let url = api::watch_url(&video.id);
      open_in_browser(app, &url);
    }
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Grid => handle_grid_key(app, key),
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      let query = match app.suggestion_index.and_then(|i| app.suggestions.get(i)) {
        Some(suggestion) => suggestion.text.clone(),
        None => app.input.clone(),
      };
      app.search(&query);
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
      app.update_suggestions();
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
        app.update_suggestions();
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
        app.update_suggestions();
      }
    }
    KeyCode::Down => {
      if app.suggestions.is_empty() {
        app.mode = AppMode::Grid;
      } else {
        app.suggestion_down();
      }
    }
    KeyCode::Up => app.suggestion_up(),
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
        app.suggestions.clear();
        app.suggestion_index = None;
      } else {
        app.mode = AppMode::Grid;
      }
    }
    _ => {}
  }
}

fn handle_grid_key(app: &mut App, key: event::KeyEvent) {
  // Number row switches views directly
  if let KeyCode::Char(c) = key.code
    && let Some(view) = View::from_digit(c)
  {
    app.navigate(view);
    return;
  }

  match key.code {
    KeyCode::Char('/') => {
      app.mode = AppMode::Input;
      app.update_suggestions();
    }
    KeyCode::Enter => {
      if app.selected.is_some() {
        // Switch to the highlighted related video
        if let Some(i) = app.related_state.selected()
          && let Some(video) = app.related.get(i)
        {
          let id = video.id.clone();
          app.select_video(&id);
        }
      } else if let Some(i) = app.list_state.selected()
        && let Some(video) = app.videos.get(i)
      {
        let id = video.id.clone();
        app.select_video(&id);
      }
    }
    KeyCode::Down | KeyCode::Char('j') => {
      let (count, state) = app.active_list();
      if count > 0 {
        let i = state.selected().map_or(0, |i| (i + 1) % count);
        state.select(Some(i));
      }
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let (count, state) = app.active_list();
      if count > 0 {
        let i = state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
        state.select(Some(i));
      }
    }
    KeyCode::Char('w') => app.add_to_watch_later(),
    KeyCode::Char('l') => app.add_to_liked(),
    KeyCode::Char('r') => {
      if app.error.is_some() {
        app.retry();
      }
    }
    KeyCode::Char('q') => {
      app.should_quit = true;
    }
    KeyCode::Esc => {
      if app.selected.is_some() {
        app.close_player();
      } else {
        app.mode = AppMode::Input;
      }
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn byte_index_matches_char_index_for_ascii() {
    assert_eq!(char_to_byte_index("search", 0), 0);
    assert_eq!(char_to_byte_index("search", 4), 4);
  }

  #[test]
  fn byte_index_accounts_for_multibyte_chars() {
    // A query someone might actually type: "café 動画" mixes 1-, 2- and
    // 3-byte chars.
    let s = "café 動画";
    assert_eq!(char_to_byte_index(s, 3), 3); // 'é' starts after "caf"
    assert_eq!(char_to_byte_index(s, 4), 5); // ' ' follows the 2-byte 'é'
    assert_eq!(char_to_byte_index(s, 5), 6); // '動' is 3 bytes wide
    assert_eq!(char_to_byte_index(s, 6), 9);
  }

  #[test]
  fn byte_index_past_end_clamps_to_len() {
    assert_eq!(char_to_byte_index("ok", 7), 2);
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 3), 0);
  }
}
