//! Local search-suggestion generator for the header search box.
//!
//! Deterministic given (query, search history) and entirely offline:
//! history substring matches first, then matching fixed trending phrases,
//! then pattern-generated completions, truncated to a total cap. Nothing
//! here touches durable state — a clicked suggestion just becomes a search.

use crate::constants::constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
  History,
  Trending,
  Pattern,
}

impl SuggestionKind {
  /// Gutter glyph for the dropdown.
  pub fn icon(self) -> &'static str {
    match self {
      SuggestionKind::History => "↺",
      SuggestionKind::Trending => "▲",
      SuggestionKind::Pattern => "⌕",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
  pub text: String,
  pub kind: SuggestionKind,
}

/// Generate up to 12 ranked suggestions: ≤3 history matches, ≤4 trending
/// phrase matches, ≤5 pattern completions, in that priority order.
/// A blank query yields nothing.
pub fn suggestions(query: &str, history: &[String]) -> Vec<Suggestion> {
  if query.trim().is_empty() {
    return Vec::new();
  }
  let needle = query.to_lowercase();
  let mut out: Vec<Suggestion> = Vec::new();

  out.extend(
    history
      .iter()
      .filter(|h| h.to_lowercase().contains(&needle))
      .take(3)
      .map(|h| Suggestion { text: h.clone(), kind: SuggestionKind::History }),
  );

  out.extend(
    constants()
      .trending_phrases
      .iter()
      .filter(|p| p.to_lowercase().contains(&needle))
      .take(4)
      .map(|p| Suggestion { text: p.clone(), kind: SuggestionKind::Trending }),
  );

  out.extend(
    constants()
      .suggestion_patterns
      .iter()
      .take(5)
      .map(|pattern| Suggestion { text: pattern.replace("{}", query), kind: SuggestionKind::Pattern }),
  );

  out.truncate(constants().suggestion_cap);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
    suggestions.iter().map(|s| s.text.as_str()).collect()
  }

  #[test]
  fn blank_query_yields_nothing() {
    assert!(suggestions("", &[]).is_empty());
    assert!(suggestions("   ", &["rust".to_string()]).is_empty());
  }

  #[test]
  fn history_matches_come_first_case_insensitive() {
    let history = vec!["Rust tutorials".to_string(), "cooking".to_string(), "rustlings".to_string()];
    let out = suggestions("rust", &history);
    assert_eq!(out[0].text, "Rust tutorials");
    assert_eq!(out[0].kind, SuggestionKind::History);
    assert_eq!(out[1].text, "rustlings");
  }

  #[test]
  fn history_capped_at_three() {
    let history: Vec<String> = (0..6).map(|i| format!("rust {}", i)).collect();
    let out = suggestions("rust", &history);
    let from_history = out.iter().filter(|s| s.kind == SuggestionKind::History).count();
    assert_eq!(from_history, 3);
  }

  #[test]
  fn trending_phrases_match_substring() {
    let out = suggestions("music", &[]);
    assert!(out.iter().any(|s| s.kind == SuggestionKind::Trending && s.text == "music videos"));
  }

  #[test]
  fn patterns_use_first_five_templates() {
    let out = suggestions("cats", &[]);
    let patterns: Vec<&str> =
      out.iter().filter(|s| s.kind == SuggestionKind::Pattern).map(|s| s.text.as_str()).collect();
    assert_eq!(patterns, ["cats tutorial", "cats review", "cats 2024", "best cats", "how to cats"]);
  }

  #[test]
  fn total_capped_at_twelve() {
    // "highlights" matches two trending phrases; pad history with matches too
    let history: Vec<String> = (0..5).map(|i| format!("highlights {}", i)).collect();
    let out = suggestions("highlights", &history);
    assert!(out.len() <= 12);
    // Priority order: history, trending, patterns
    assert_eq!(out[0].kind, SuggestionKind::History);
    assert_eq!(out[3].kind, SuggestionKind::Trending);
  }
}
