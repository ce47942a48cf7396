use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use super::{CommandHandler, InboundEvent};
use crate::config::GameConfig;
use crate::reply::{LaunchMessage, OutboundMessage};

/// Source of the current time for cache busting.
pub type Clock = fn() -> DateTime<Utc>;

/// Built-in rules text, HTML formatted.
pub const DEFAULT_HELP_TEXT: &str = "\
🤖 <b>Логистические роботы</b> - игра-головоломка

<b>Правила игры:</b>
• Переместите всех роботов на свои места выгрузки
• Роботы должны заряжаться при низком заряде (&lt;25%)
• Перед выгрузкой роботы должны загрузиться на станции погрузки
• Избегайте столкновений с препятствиями и другими роботами

<b>Управление:</b>
1. Нажмите на робота для выбора
2. Кликайте по клеткам для построения маршрута
3. Робот автоматически поедет по построенному пути

Удачи! 🚀";

/// Replies with the greeting and a button that opens the game.
pub struct LaunchHandler {
    greeting: String,
    button_label: String,
    url: Url,
    cache_busting: bool,
    clock: Clock,
}

impl LaunchHandler {
    pub fn from_config(game: &GameConfig) -> Self {
        Self {
            greeting: game.greeting(),
            button_label: game.button_label.clone(),
            url: game.url.clone(),
            cache_busting: game.cache_busting,
            clock: Utc::now,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

impl CommandHandler for LaunchHandler {
    fn handle(&self, _event: &InboundEvent) -> Option<OutboundMessage> {
        let mut launch = LaunchMessage::new(&self.greeting, &self.button_label, self.url.clone());
        if self.cache_busting {
            launch = launch.cache_busted_at((self.clock)());
        }
        Some(launch.into())
    }
}

/// Replies with the game rules.
pub struct HelpHandler {
    text: String,
}

impl HelpHandler {
    pub fn from_config(game: &GameConfig) -> Self {
        Self {
            text: game
                .help_text
                .clone()
                .unwrap_or_else(|| DEFAULT_HELP_TEXT.to_string()),
        }
    }
}

impl CommandHandler for HelpHandler {
    fn handle(&self, _event: &InboundEvent) -> Option<OutboundMessage> {
        Some(OutboundMessage::html(self.text.clone()))
    }
}

/// Acknowledges data posted back by the web application.
pub struct WebAppDataHandler;

impl CommandHandler for WebAppDataHandler {
    fn handle(&self, event: &InboundEvent) -> Option<OutboundMessage> {
        match event.payload.as_deref() {
            Some(data) if !data.is_empty() => {
                // Echoed verbatim; sent as plain text so nothing needs escaping.
                Some(OutboundMessage::plain(format!("Получены данные из игры: {}", data)))
            }
            _ => {
                debug!("Ignoring web app data event without payload");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::TextFormat;
    use crate::router::Command;
    use chrono::TimeZone;

    fn at_1000() -> DateTime<Utc> {
        Utc.timestamp_opt(1000, 0).unwrap()
    }

    fn at_2000() -> DateTime<Utc> {
        Utc.timestamp_opt(2000, 0).unwrap()
    }

    fn stamp(reply: &OutboundMessage) -> Option<i64> {
        reply
            .button
            .as_ref()?
            .url
            .query_pairs()
            .find(|(k, _)| k == "t")
            .and_then(|(_, v)| v.parse().ok())
    }

    fn start() -> InboundEvent {
        InboundEvent::command(Command::Start)
    }

    #[test]
    fn test_launch_stamps_clock_reading() {
        let handler = LaunchHandler::from_config(&GameConfig::default()).with_clock(at_1000);
        let reply = handler.handle(&start()).unwrap();
        assert_eq!(stamp(&reply), Some(1000));
    }

    #[test]
    fn test_launch_stamp_changes_over_time() {
        let game = GameConfig::default();
        let first = LaunchHandler::from_config(&game)
            .with_clock(at_1000)
            .handle(&start())
            .unwrap();
        let second = LaunchHandler::from_config(&game)
            .with_clock(at_2000)
            .handle(&start())
            .unwrap();
        assert_ne!(stamp(&first), stamp(&second));
    }

    #[test]
    fn test_launch_stamp_tracks_wall_clock() {
        let handler = LaunchHandler::from_config(&GameConfig::default());
        let before = Utc::now().timestamp();
        let reply = handler.handle(&start()).unwrap();
        let after = Utc::now().timestamp();

        let t = stamp(&reply).unwrap();
        assert!(t >= before && t <= after);
    }

    #[test]
    fn test_launch_without_cache_busting_uses_configured_url() {
        let game = GameConfig {
            cache_busting: false,
            ..GameConfig::default()
        };
        let reply = LaunchHandler::from_config(&game).handle(&start()).unwrap();
        let button = reply.button.unwrap();
        assert_eq!(button.url, game.url);
        assert_eq!(button.label, "Запустить игру");
    }

    #[test]
    fn test_example_game_url_shape() {
        let handler = LaunchHandler::from_config(&GameConfig::default()).with_clock(at_1000);
        let reply = handler.handle(&InboundEvent::command(Command::Game)).unwrap();
        assert_eq!(
            reply.button.unwrap().url.as_str(),
            "https://dmi-s.github.io/RonGame/webapp/index.html?t=1000"
        );
    }

    #[test]
    fn test_help_is_deterministic_html() {
        let handler = HelpHandler::from_config(&GameConfig::default());
        let first = handler.handle(&InboundEvent::command(Command::Help)).unwrap();
        let second = handler.handle(&InboundEvent::command(Command::Help)).unwrap();
        assert_eq!(first.text.as_bytes(), second.text.as_bytes());
        assert_eq!(first.format, TextFormat::Html);
        assert!(first.button.is_none());
        assert!(first.text.contains("Правила игры"));
    }

    #[test]
    fn test_help_override() {
        let game = GameConfig {
            help_text: Some("<b>Rules</b>".to_string()),
            ..GameConfig::default()
        };
        let reply = HelpHandler::from_config(&game)
            .handle(&InboundEvent::command(Command::Help))
            .unwrap();
        assert_eq!(reply.text, "<b>Rules</b>");
    }

    #[test]
    fn test_web_app_data_verbatim() {
        let payload = r#"{"moves":87,"time":143,"game":"15-puzzle"}"#;
        let reply = WebAppDataHandler
            .handle(&InboundEvent::web_app_data(payload))
            .unwrap();
        assert!(reply.text.contains(payload));
        assert_eq!(reply.format, TextFormat::Plain);
    }

    #[test]
    fn test_web_app_data_markup_not_escaped() {
        let reply = WebAppDataHandler
            .handle(&InboundEvent::web_app_data("<b>42</b> & *bold*"))
            .unwrap();
        assert!(reply.text.contains("<b>42</b> & *bold*"));
    }

    #[test]
    fn test_web_app_data_without_payload() {
        let event = InboundEvent::command(Command::WebAppData);
        assert!(WebAppDataHandler.handle(&event).is_none());
    }
}
