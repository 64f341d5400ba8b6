use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

mod ui;

use newsreel::app::{App, AppEvent};
use newsreel::config::Config;

/// Get the config directory path (~/.config/newsreel/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("newsreel");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(
    name = "newsreel",
    about = "Terminal news reader merging NewsAPI and World News API results"
)]
struct Args {
    /// Config file (default: ~/.config/newsreel/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keyword to load on startup (default: config `default_keyword`)
    #[arg(long, short)]
    keyword: Option<String>,

    /// Load, print and exit instead of starting a session
    #[arg(long)]
    once: bool,

    /// With --once: number of pages to load
    #[arg(long, default_value_t = 1, value_name = "N", requires = "once")]
    pages: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the feed
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => {
            let config_dir = get_config_dir()?;
            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)
                    .context("Failed to create config directory")?;
                restrict_permissions(&config_dir);
            }
            config_dir.join("config.toml")
        }
    };

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    tracing::debug!(?config, "Effective configuration");

    if config.newsapi_key().is_none() && config.worldnews_key().is_none() {
        eprintln!("Warning: no API keys configured; every fetch will fail.");
        eprintln!(
            "Set NEWSAPI_KEY / WORLDNEWS_API_KEY or add keys to {}",
            config_path.display()
        );
    }

    let keyword = args
        .keyword
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| config.default_keyword.clone());

    let mut app = App::new(&config).context("Failed to create application")?;

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    if args.once {
        ui::run_once(&mut app, &keyword, args.pages, event_tx, event_rx).await?;
    } else {
        ui::run(&mut app, &keyword, event_tx, event_rx).await?;
        println!("Goodbye!");
    }
    Ok(())
}

/// Set directory permissions on Unix (user-only access); the config file
/// may hold API keys.
fn restrict_permissions(dir: &std::path::Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(dir, perms) {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}
