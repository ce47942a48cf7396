pub mod telegram;

use crate::config::{Config, WebhookConfig};

/// How updates reach the bot
#[derive(Debug, Clone, Copy)]
pub enum Delivery<'a> {
    /// Long polling via `getUpdates`
    Polling,
    /// Telegram pushes updates to our HTTP endpoint
    Webhook(&'a WebhookConfig),
}

impl<'a> Delivery<'a> {
    /// Webhook when `[webhook]` is configured, long polling otherwise.
    pub fn from_config(config: &'a Config) -> Self {
        match &config.webhook {
            Some(webhook) => Delivery::Webhook(webhook),
            None => Delivery::Polling,
        }
    }
}

impl std::fmt::Display for Delivery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delivery::Polling => write!(f, "polling"),
            Delivery::Webhook(webhook) => write!(f, "webhook at {}", webhook.url),
        }
    }
}
