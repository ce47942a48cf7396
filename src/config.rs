use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use url::Url;

/// Environment variable holding the bot token. Same name `Bot::from_env` reads.
pub const TOKEN_ENV: &str = "TELOXIDE_TOKEN";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    /// Fallback only; the `TELOXIDE_TOKEN` environment variable wins.
    #[serde(default)]
    pub bot_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_game_url")]
    pub url: Url,
    #[serde(default = "default_button_label")]
    pub button_label: String,
    /// Append `t=<unix time>` to the launch URL so clients refetch the app.
    #[serde(default = "default_cache_busting")]
    pub cache_busting: bool,
    /// Overrides the greeting derived from `title`.
    #[serde(default)]
    pub greeting: Option<String>,
    /// Overrides the built-in rules text. Sent with HTML formatting.
    #[serde(default)]
    pub help_text: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// Public HTTPS URL Telegram will POST updates to.
    pub url: Url,
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default)]
    pub secret_token: Option<String>,
}

fn default_title() -> String {
    "Логистические роботы".to_string()
}

fn default_game_url() -> Url {
    Url::parse("https://dmi-s.github.io/RonGame/webapp/index.html")
        .expect("default game URL is valid")
}

fn default_button_label() -> String {
    "Запустить игру".to_string()
}

fn default_cache_busting() -> bool {
    true
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8443))
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            url: default_game_url(),
            button_label: default_button_label(),
            cache_busting: default_cache_busting(),
            greeting: None,
            help_text: None,
        }
    }
}

impl GameConfig {
    /// Greeting shown above the launch button.
    pub fn greeting(&self) -> String {
        match &self.greeting {
            Some(greeting) => greeting.clone(),
            None => format!(
                "🎮 Добро пожаловать в игру '{}'!\nНажмите кнопку ниже, чтобы начать игру.",
                self.title
            ),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        // Telegram refuses to open web apps over plain HTTP.
        if self.game.url.scheme() != "https" {
            bail!("game.url must use https, got: {}", self.game.url);
        }
        if self.game.button_label.trim().is_empty() {
            bail!("game.button_label must not be empty");
        }
        if let Some(webhook) = &self.webhook {
            if webhook.url.scheme() != "https" {
                bail!("webhook.url must use https, got: {}", webhook.url);
            }
        }
        Ok(())
    }

    /// Resolve the bot token from the environment, then the config file.
    pub fn bot_token(&self) -> Result<String> {
        resolve_token(
            std::env::var(TOKEN_ENV).ok(),
            self.telegram.bot_token.as_deref(),
        )
    }
}

fn resolve_token(from_env: Option<String>, from_file: Option<&str>) -> Result<String> {
    let token = from_env
        .filter(|t| !t.trim().is_empty())
        .or_else(|| from_file.map(str::to_string))
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    if token.is_empty() {
        bail!(
            "No bot token configured: set {} or [telegram] bot_token",
            TOKEN_ENV
        );
    }
    Ok(token)
}
