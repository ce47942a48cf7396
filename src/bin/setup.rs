//! webapp-launcher setup wizard.
//!
//! Asks a few questions on the terminal and writes a starter `config.toml`.
//! The bot token is only written to the file when one is entered; leaving it
//! blank keeps it out of the file so it can come from `TELOXIDE_TOKEN`.
//!
//! Usage: `setup [--output PATH]`

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use url::Url;

const DEFAULT_TITLE: &str = "Логистические роботы";
const DEFAULT_URL: &str = "https://dmi-s.github.io/RonGame/webapp/index.html";
const DEFAULT_LABEL: &str = "Запустить игру";
const DEFAULT_LISTEN: &str = "0.0.0.0:8443";

const TOKEN_HINT: &str =
    "[telegram]\n# bot_token = \"\"  # prefer the TELOXIDE_TOKEN environment variable\n\n";
const WEBHOOK_HINT: &str =
    "\n# [webhook]\n# url = \"https://bot.example.org/hook\"\n# listen = \"0.0.0.0:8443\"\n";

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    bot_token: &'a str,
    title: &'a str,
    url: &'a str,
    button_label: &'a str,
    cache_busting: bool,
    webhook_url: &'a str,
}

#[derive(Serialize)]
struct ConfigFile<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    telegram: Option<TelegramSection<'a>>,
    game: GameSection<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook: Option<WebhookSection<'a>>,
}

#[derive(Serialize)]
struct TelegramSection<'a> {
    bot_token: &'a str,
}

#[derive(Serialize)]
struct GameSection<'a> {
    title: &'a str,
    url: &'a str,
    button_label: &'a str,
    cache_busting: bool,
}

#[derive(Serialize)]
struct WebhookSection<'a> {
    url: &'a str,
    listen: &'a str,
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> Result<String> {
    let file = ConfigFile {
        telegram: (!p.bot_token.is_empty()).then_some(TelegramSection {
            bot_token: p.bot_token,
        }),
        game: GameSection {
            title: p.title,
            url: p.url,
            button_label: p.button_label,
            cache_busting: p.cache_busting,
        },
        webhook: (!p.webhook_url.is_empty()).then_some(WebhookSection {
            url: p.webhook_url,
            listen: DEFAULT_LISTEN,
        }),
    };

    let mut out = String::new();
    if file.telegram.is_none() {
        out.push_str(TOKEN_HINT);
    }
    out.push_str(&toml::to_string(&file).context("Failed to serialize config")?);
    if file.webhook.is_none() {
        out.push_str(WEBHOOK_HINT);
    }
    Ok(out)
}

/// Same rule the bot applies on load: a parseable URL with the https scheme.
fn https_url(raw: &str, field: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid {field}: {raw}"))?;
    if url.scheme() != "https" {
        bail!("{field} must use https, got: {raw}");
    }
    Ok(url)
}

fn parse_yes_no(answer: &str, default: bool) -> Result<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "y" | "yes" | "д" | "да" => Ok(true),
        "n" | "no" | "н" | "нет" => Ok(false),
        other => bail!("Expected yes or no, got: {other}"),
    }
}

fn output_path(args: &[String]) -> Result<PathBuf> {
    match args.iter().position(|a| a == "--output") {
        None => Ok(PathBuf::from("config.toml")),
        Some(i) => args
            .get(i + 1)
            .map(PathBuf::from)
            .context("--output requires a path"),
    }
}

// ── Entry point ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = output_path(&args)?;

    println!("=== webapp-launcher setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let or_default = |s: String, default: &str| {
        if s.is_empty() {
            default.to_owned()
        } else {
            s
        }
    };

    let bot_token = read_line("Telegram bot token (blank to use TELOXIDE_TOKEN): ")?;
    let title = or_default(read_line(&format!("Game title [{DEFAULT_TITLE}]: "))?, DEFAULT_TITLE);
    let url = https_url(
        &or_default(read_line(&format!("Game URL [{DEFAULT_URL}]: "))?, DEFAULT_URL),
        "game URL",
    )?;
    let button_label = or_default(
        read_line(&format!("Button label [{DEFAULT_LABEL}]: "))?,
        DEFAULT_LABEL,
    );
    let cache_busting = parse_yes_no(&read_line("Append cache-busting timestamp? [Y/n]: ")?, true)?;
    let webhook_url = match read_line("Webhook URL (blank for long polling): ")? {
        raw if raw.is_empty() => None,
        raw => Some(https_url(&raw, "webhook URL")?),
    };

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        title: &title,
        url: url.as_str(),
        button_label: &button_label,
        cache_busting,
        webhook_url: webhook_url.as_ref().map(Url::as_str).unwrap_or_default(),
    })?;

    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config saved to {}", config_path.display());
    println!("   Run the bot with:  cargo run -- {}", config_path.display());
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
