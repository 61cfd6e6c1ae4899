use chrono::Utc;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::api::{self, Video};
use crate::app::{App, AppMode, View};
use crate::config::Config;
use crate::format::{format_duration, format_view_count, time_ago};

// --- Palette ---

const ACCENT: Color = Color::Red;
const MUTED: Color = Color::DarkGray;
const BORDER: Color = Color::DarkGray;
const HIGHLIGHT_FG: Color = Color::White;
const HIGHLIGHT_BG: Color = Color::Red;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Right-column metadata for a grid row: channel, views, duration, age.
/// Absent statistics or durations simply contribute nothing.
fn row_meta(video: &Video) -> String {
  let mut parts: Vec<String> = Vec::new();
  if !video.snippet.channel_title.is_empty() {
    parts.push(video.snippet.channel_title.clone());
  }
  if let Some(stats) = &video.statistics
    && let Some(views) = &stats.view_count
  {
    parts.push(format_view_count(views));
  }
  if let Some(details) = &video.content_details
    && let Some(duration) = &details.duration
  {
    parts.push(format_duration(duration));
  }
  if !video.snippet.published_at.is_empty() {
    parts.push(time_ago(&video.snippet.published_at, Utc::now()));
  }
  parts.join("  ")
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);

  if app.mode == AppMode::Input && !app.suggestions.is_empty() {
    render_suggestions(frame, app, main_area);
  }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let left = Line::from(vec![
    Span::styled(" ▶ tubeview ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
    Span::styled(app.page_title(), Style::default().fg(MUTED)),
  ]);
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(MUTED)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if app.selected.is_some() {
    render_watch(frame, app, area);
  } else if app.view == View::Settings {
    render_settings(frame, app, area);
  } else if app.videos.is_empty() && !app.loading && app.error.is_none() && !app.has_searched {
    render_welcome(frame, area);
  } else {
    render_grid(frame, app, area);
  }
}

fn render_welcome(frame: &mut Frame, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  tubeview", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from("Browse trending, search, and keep watch-later lists. In the terminal."),
    Line::from(""),
    Line::from(Span::styled("Press / to search, or 1-9 to pick a view.", Style::default().fg(MUTED))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered().border_type(ratatui::widgets::BorderType::Rounded).border_style(Style::default().fg(BORDER)),
  );
  frame.render_widget(paragraph, area);
}

fn render_grid(frame: &mut Frame, app: &mut App, area: Rect) {
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = app
    .videos
    .iter()
    .map(|video| {
      let meta = row_meta(video);
      let line = if meta.is_empty() {
        Line::from(truncate_str(&video.snippet.title, inner_w))
      } else {
        let meta_w = meta.chars().count();
        let title_max = inner_w.saturating_sub(meta_w + 2);
        let title = truncate_str(&video.snippet.title, title_max);
        let gap = inner_w.saturating_sub(title.chars().count() + meta_w);
        Line::from(vec![Span::raw(title), Span::raw(" ".repeat(gap)), Span::styled(meta, Style::default().fg(MUTED))])
      };
      ListItem::new(line)
    })
    .collect();

  let title = format!(" {} — {} videos ", app.page_title(), app.videos.len());
  let list = List::new(items)
    .block(
      Block::bordered()
        .title(title)
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(BORDER)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(HIGHLIGHT_FG).bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_watch(frame: &mut Frame, app: &mut App, area: Rect) {
  let [detail_area, related_area] =
    Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).areas(area);

  let detail_block = Block::bordered()
    .title(" Watching ")
    .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(BORDER))
    .padding(Padding::horizontal(1));

  if let Some(video) = &app.selected_video {
    let inner_w = detail_area.width.saturating_sub(4) as usize;
    let mut lines = vec![
      Line::from(""),
      Line::from(Span::styled(truncate_str(&video.snippet.title, inner_w), Style::default().add_modifier(Modifier::BOLD))),
      Line::from(Span::styled(video.snippet.channel_title.clone(), Style::default().fg(MUTED))),
      Line::from(""),
    ];

    let mut stat_spans: Vec<Span> = Vec::new();
    if let Some(stats) = &video.statistics {
      if let Some(views) = &stats.view_count {
        stat_spans.push(Span::raw(format_view_count(views)));
      }
      if let Some(likes) = &stats.like_count {
        stat_spans.push(Span::styled(format!("   {} likes", likes), Style::default().fg(MUTED)));
      }
    }
    if let Some(details) = &video.content_details
      && let Some(duration) = &details.duration
    {
      stat_spans.push(Span::styled(format!("   {}", format_duration(duration)), Style::default().fg(MUTED)));
    }
    if !video.snippet.published_at.is_empty() {
      stat_spans.push(Span::styled(
        format!("   {}", time_ago(&video.snippet.published_at, Utc::now())),
        Style::default().fg(MUTED),
      ));
    }
    if !stat_spans.is_empty() {
      lines.push(Line::from(stat_spans));
      lines.push(Line::from(""));
    }

    if !video.snippet.description.is_empty() {
      for desc_line in video.snippet.description.lines().take(6) {
        lines.push(Line::from(desc_line.to_string()));
      }
      lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
      api::watch_url(&video.id),
      Style::default().fg(ACCENT).add_modifier(Modifier::UNDERLINED),
    )));
    lines.push(Line::from(vec![
      Span::styled("embed  ", Style::default().fg(MUTED)),
      Span::styled(api::embed_url(&video.id), Style::default().fg(MUTED)),
    ]));
    lines.push(Line::from(vec![
      Span::styled("thumb  ", Style::default().fg(MUTED)),
      Span::styled(video.thumbnail_url().to_string(), Style::default().fg(MUTED)),
    ]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(detail_block);
    frame.render_widget(paragraph, detail_area);
  } else if let Some(id) = &app.selected {
    // Selected outside the loaded list: all we have is the id.
    let lines = vec![
      Line::from(""),
      Line::from(Span::styled(
        api::watch_url(id),
        Style::default().fg(ACCENT).add_modifier(Modifier::UNDERLINED),
      )),
    ];
    frame.render_widget(Paragraph::new(lines).block(detail_block), detail_area);
  }

  let related_title = if app.related_loading { " Related (loading…) " } else { " Related " };
  let inner_w = related_area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = app
    .related
    .iter()
    .map(|video| {
      let duration = video
        .content_details
        .as_ref()
        .and_then(|d| d.duration.as_deref())
        .map(format_duration)
        .unwrap_or_default();
      let title_max = inner_w.saturating_sub(duration.chars().count() + 2);
      let title = truncate_str(&video.snippet.title, title_max);
      let gap = inner_w.saturating_sub(title.chars().count() + duration.chars().count());
      let line = Line::from(vec![
        Span::raw(title),
        Span::raw(" ".repeat(gap)),
        Span::styled(duration, Style::default().fg(MUTED)),
      ]);
      ListItem::new(line)
    })
    .collect();

  let list = List::new(items)
    .block(
      Block::bordered()
        .title(related_title)
        .title_style(Style::default().fg(ACCENT))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(BORDER)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(HIGHLIGHT_FG).bg(HIGHLIGHT_BG).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, related_area, &mut app.related_state);
}

fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
  let key_status = if app.api.has_api_key() {
    Span::styled("configured", Style::default().fg(Color::Green))
  } else {
    Span::styled("missing — set YOUTUBE_API_KEY", Style::default().fg(ACCENT))
  };
  let config_path = Config::config_file().map(|p| p.display().to_string()).unwrap_or_else(|| "-".to_string());

  let lines = vec![
    Line::from(""),
    Line::from(vec![Span::styled("API key      ", Style::default().fg(MUTED)), key_status]),
    Line::from(vec![Span::styled("Region       ", Style::default().fg(MUTED)), Span::raw(app.config.region().to_string())]),
    Line::from(""),
    Line::from(vec![Span::styled("Config file  ", Style::default().fg(MUTED)), Span::raw(config_path)]),
    Line::from(vec![
      Span::styled("Data dir     ", Style::default().fg(MUTED)),
      Span::raw(app.store.data_dir().display().to_string()),
    ]),
    Line::from(""),
    Line::from(Span::styled(
      "Collections: history keeps 50 entries, search history 10.",
      Style::default().fg(MUTED),
    )),
  ];
  let paragraph = Paragraph::new(lines).block(
    Block::bordered()
      .title(" Settings ")
      .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(BORDER))
      .padding(Padding::horizontal(1)),
  );
  frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let (text, style) = if app.loading {
    (" ⏳ Loading…".to_string(), Style::default().fg(Color::Yellow))
  } else if let Some(err) = &app.error {
    (format!(" ⚠  {} — press r to retry", err), Style::default().fg(ACCENT))
  } else if !app.videos.is_empty() {
    (format!(" {} videos", app.videos.len()), Style::default().fg(MUTED))
  } else {
    (" Ready".to_string(), Style::default().fg(MUTED))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let border_color = if app.mode == AppMode::Input { ACCENT } else { BORDER };
  let input_block = Block::bordered()
    .title(" Search ")
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

/// Dropdown of up to 12 local suggestions, anchored above the input box.
fn render_suggestions(frame: &mut Frame, app: &App, main_area: Rect) {
  let height = (app.suggestions.len() as u16 + 2).min(main_area.height);
  let popup = Rect {
    x: main_area.x,
    y: main_area.y + main_area.height.saturating_sub(height),
    width: main_area.width.min(60),
    height,
  };
  frame.render_widget(Clear, popup);

  let items: Vec<ListItem> = app
    .suggestions
    .iter()
    .map(|s| {
      ListItem::new(Line::from(vec![
        Span::styled(format!(" {} ", s.kind.icon()), Style::default().fg(MUTED)),
        Span::raw(s.text.clone()),
      ]))
    })
    .collect();

  let list = List::new(items)
    .block(
      Block::bordered()
        .title(" Suggestions ")
        .title_style(Style::default().fg(BORDER))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(BORDER)),
    )
    .highlight_style(Style::default().fg(HIGHLIGHT_FG).bg(HIGHLIGHT_BG));

  let mut state = ratatui::widgets::ListState::default().with_selected(app.suggestion_index);
  frame.render_stateful_widget(list, popup, &mut state);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      vec![("Enter", "Search"), ("↑/↓", "Suggestions"), ("Esc", "Back")]
    }
    AppMode::Grid => {
      let mut k = vec![("/", "Search"), ("j/k", "Navigate"), ("Enter", "Watch")];
      if app.selected.is_some() {
        k.push(("Esc", "Close"));
      }
      k.push(("w", "Save"));
      k.push(("l", "Like"));
      k.push(("1-0", "Views"));
      if app.error.is_some() {
        k.push(("r", "Retry"));
      }
      k.push(("q", "Quit"));
      k
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(Color::Black).bg(MUTED)),
        Span::styled(format!(" {} ", action), Style::default().fg(MUTED)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let view_label = format!("{} ", app.view.title());
  let right = Line::from(Span::styled(&view_label, Style::default().fg(MUTED)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(view_label.len() as u16), width: view_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
