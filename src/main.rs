mod app;
mod event;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use newsdesk::cache::spawn_sweeper;
use newsdesk::config::Config;
use newsdesk::logging;
use newsdesk::news::FetchCoordinator;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "newsdesk")]
#[command(about = "A terminal reader for aggregated news, funding and briefing feeds")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/newsdesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Source tab to open first
  #[arg(short, long)]
  source: Option<String>,

  /// Ignore fresh cache entries for the first load of each tab
  #[arg(short, long)]
  refresh: bool,

  /// Clear the cached pages of one source tab and exit
  #[arg(long, value_name = "TAB")]
  clear_cache: Option<String>,

  /// Remove expired cache entries and exit
  #[arg(long)]
  sweep: bool,

  /// Print article counts per origin feed and exit
  #[arg(long)]
  sources: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let interactive = args.clear_cache.is_none() && !args.sweep && !args.sources;
  let _log_guard = logging::init(&Config::data_dir()?, !interactive)?;

  if let Some(key) = &args.source {
    if config.profile(key).is_none() {
      return Err(eyre!("Unknown source '{}'", key));
    }
  }

  let coordinator = FetchCoordinator::new(&config)?;

  if let Some(key) = &args.clear_cache {
    if config.profile(key).is_none() {
      return Err(eyre!("Unknown source '{}'", key));
    }
    let removed = coordinator.store().clear(key);
    info!(tab = %key, removed, "cache cleared");
    return Ok(());
  }

  if args.sweep {
    let removed = coordinator.store().sweep();
    info!(removed, "cache swept");
    return Ok(());
  }

  if args.sources {
    let counts = coordinator.sources().await?;
    for source in counts {
      println!("{:<24} {:>8}", source.name, source.count);
    }
    return Ok(());
  }

  let sweeper = spawn_sweeper(coordinator.store().clone(), config.cache.sweep_interval());

  let prefetch_pages = config.fetch.prefetch_pages;
  if prefetch_pages > 0 {
    let coordinator = coordinator.clone();
    let profiles = config.sources.clone();
    tokio::spawn(async move {
      join_all(profiles.iter().map(|p| coordinator.warm(p, prefetch_pages))).await;
    });
  }

  // Initialize and run the app
  let mut app = app::App::new(config, coordinator, args.source.as_deref(), args.refresh);
  let result = app.run().await;

  sweeper.stop().await;
  result
}
