use anyhow::{Context, Result};
use clap::Parser;
use reqwest::redirect::Policy;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use reelfeed::app::App;
use reelfeed::config::Config;
use reelfeed::controller::{FeedController, FeedEvent};
use reelfeed::feed::{Category, FeedKind, HttpApi};
use reelfeed::ui;

/// Get the default config file path (~/.config/reelfeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("reelfeed")
        .join("config.toml"))
}

/// Build the shared HTTP client.
///
/// - Limits redirects to 3 hops
/// - Keeps a few idle connections per host for media-heavy scrolling
fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(Policy::limited(3))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

#[derive(Parser, Debug)]
#[command(name = "reelfeed", about = "Terminal browser for short-form media feeds")]
struct Args {
    /// Config file (default: ~/.config/reelfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides `api_base_url`
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Feed to browse: reels or memes
    #[arg(long)]
    kind: Option<FeedKind>,

    /// Category selected at startup
    #[arg(long)]
    category: Option<Category>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they can be redirected away from the TUI
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let mut options = config
        .controller_options()
        .context("Invalid configuration")?;
    if let Some(kind) = args.kind {
        options.kind = kind;
    }
    let category = match args.category {
        Some(category) => category,
        None => config.default_category().context("Invalid configuration")?,
    };
    let base_url = args.base_url.unwrap_or_else(|| config.api_base_url.clone());

    let client = build_http_client(config.request_timeout())
        .context("Failed to build HTTP client")?;
    let api = HttpApi::new(client, &base_url, config.request_timeout())
        .with_context(|| format!("Invalid backend URL: {base_url}"))?;
    tracing::info!(base_url = %api.base_url(), kind = %options.kind, %category, "Starting");

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<FeedEvent>(64);

    let feed = FeedController::new(api, options, event_tx);
    let mut app = App::new(feed, config.grid_columns);
    app.select_category(category);

    // Run the TUI
    ui::run(&mut app, event_rx).await?;

    Ok(())
}
