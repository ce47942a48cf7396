mod config;
mod platform;
mod reply;
mod router;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::router::Router;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,webapp_launcher=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let token = config.bot_token()?;

    info!("Configuration loaded successfully");
    info!("  Game: {}", config.game.title);
    info!("  URL: {}", config.game.url);
    info!("  Cache busting: {}", config.game.cache_busting);

    let router = Arc::new(Router::from_config(&config.game));
    let bot = Bot::new(token);

    info!("Bot is starting...");
    platform::telegram::run(bot, router, &config).await?;

    Ok(())
}
