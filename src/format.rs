//! Pure display formatters for video metadata.
//!
//! The YouTube API transmits durations as ISO-8601 tokens (`PT1H2M3S`) and
//! counts as decimal strings. These helpers turn them into the short human
//! forms shown in the grid. Malformed input never fails, it degrades to a
//! zero value.

use chrono::{DateTime, Utc};

/// Relative-time buckets in descending order, largest first.
const TIME_BUCKETS: [(i64, &str); 6] = [
  (31_536_000, "year"),
  (2_592_000, "month"),
  (604_800, "week"),
  (86_400, "day"),
  (3_600, "hour"),
  (60, "minute"),
];

/// Format an ISO-8601 duration token (`PT#H#M#S`, any component optional)
/// as `H:MM:SS` when hours are present, else `M:SS`.
/// Anything that doesn't scan as a duration yields `0:00`.
pub fn format_duration(token: &str) -> String {
  let Some(rest) = token.trim().strip_prefix("PT") else {
    return "0:00".to_string();
  };

  let (mut h, mut m, mut s) = (0u64, 0u64, 0u64);
  let mut num = String::new();
  for c in rest.chars() {
    if c.is_ascii_digit() {
      num.push(c);
      continue;
    }
    let value: u64 = num.parse().unwrap_or(0);
    num.clear();
    match c {
      'H' => h = value,
      'M' => m = value,
      'S' => s = value,
      _ => return "0:00".to_string(),
    }
  }
  // Trailing digits without a unit designator
  if !num.is_empty() {
    return "0:00".to_string();
  }

  if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

/// Format a numeric view-count string as `N views` / `N.NK views` / `N.NM views`.
/// One-decimal rounding at the thousand and million thresholds.
pub fn format_view_count(raw: &str) -> String {
  let count: u64 = raw.trim().parse().unwrap_or(0);
  if count >= 1_000_000 {
    format!("{:.1}M views", count as f64 / 1_000_000.0)
  } else if count >= 1_000 {
    format!("{:.1}K views", count as f64 / 1_000.0)
  } else {
    format!("{} views", count)
  }
}

/// Relative-time string for an RFC3339 publish timestamp, against an explicit
/// `now` so callers (and tests) control the reference point.
/// First bucket whose floor-divided count reaches 1 wins; under a minute is
/// `Just now`, as is an unparseable timestamp.
pub fn time_ago(published_at: &str, now: DateTime<Utc>) -> String {
  let Ok(published) = DateTime::parse_from_rfc3339(published_at) else {
    return "Just now".to_string();
  };
  let diff = (now - published.with_timezone(&Utc)).num_seconds();

  for (secs, label) in TIME_BUCKETS {
    let count = diff / secs;
    if count >= 1 {
      let plural = if count == 1 { "" } else { "s" };
      return format!("{} {}{} ago", count, label, plural);
    }
  }
  "Just now".to_string()
}
