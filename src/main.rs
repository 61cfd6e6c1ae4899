mod api;
mod app;
mod config;
mod constants;
mod format;
mod input;
mod store;
mod suggest;
mod ui;

use anyhow::Result;
use clap::Parser;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::ApiClient;
use app::{App, View};
use config::Config;
use store::Store;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// YouTube Data API key (overrides config file and YOUTUBE_API_KEY)
  #[arg(long)]
  api_key: Option<String>,

  /// Region code for the home trending chart (e.g. US, DE, JP)
  #[arg(long)]
  region: Option<String>,
}

/// Set up file-based logging. The TUI owns stdout, so logs go to a file in
/// the data dir; the returned guard must outlive the app to flush.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let proj_dirs = ProjectDirs::from("", "", "tubeview")?;
  let log_dir = proj_dirs.data_dir().join("logs");
  std::fs::create_dir_all(&log_dir).ok()?;

  let appender = tracing_appender::rolling::daily(log_dir, "tubeview.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _guard = init_tracing();

  let mut config = Config::load();
  if let Some(key) = args.api_key {
    config.api_key = Some(key);
  }
  if let Some(region) = args.region {
    config.region = Some(region);
  }
  if config.api_key.is_none() {
    // Startup warning only; calls fail with a config error until a key exists.
    warn!("no API key configured; set YOUTUBE_API_KEY or add api_key to prefs.toml");
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, config).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, config: Config) -> Result<()> {
  let api = ApiClient::new(config.api_key.clone());
  let store = Store::open();
  let mut app = App::new(api, store, config);
  info!(version = env!("CARGO_PKG_VERSION"), "starting");

  app.navigate(View::Home);

  loop {
    app.check_pending();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  Ok(())
}
