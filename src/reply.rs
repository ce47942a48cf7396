//! Outbound replies, independent of any chat platform.

use chrono::{DateTime, Utc};
use url::Url;

/// Query parameter carrying the cache-busting timestamp.
pub const CACHE_BUST_PARAM: &str = "t";

/// How the platform should interpret `OutboundMessage::text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Html,
}

/// Inline button that opens a URL inside the client's embedded browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchButton {
    pub label: String,
    pub url: Url,
}

/// A single reply, ready for the transport to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub format: TextFormat,
    pub button: Option<LaunchButton>,
}

impl OutboundMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
            button: None,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Html,
            button: None,
        }
    }
}

/// Greeting plus a button that launches the web application.
#[derive(Debug, Clone)]
pub struct LaunchMessage {
    pub greeting: String,
    pub button_label: String,
    pub target: Url,
    /// Unix time to stamp onto the URL, if cache busting is on.
    pub cache_bust: Option<i64>,
}

impl LaunchMessage {
    pub fn new(greeting: impl Into<String>, button_label: impl Into<String>, target: Url) -> Self {
        Self {
            greeting: greeting.into(),
            button_label: button_label.into(),
            target,
            cache_bust: None,
        }
    }

    pub fn cache_busted_at(mut self, now: DateTime<Utc>) -> Self {
        self.cache_bust = Some(now.timestamp());
        self
    }

    /// Final URL, with any existing `t` replaced by the cache-busting stamp.
    pub fn url(&self) -> Url {
        let Some(stamp) = self.cache_bust else {
            return self.target.clone();
        };

        // Other parameters are kept as raw segments so their encoding survives.
        let mut segments: Vec<String> = self
            .target
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|seg| !seg.is_empty())
            .filter(|seg| seg.split('=').next() != Some(CACHE_BUST_PARAM))
            .map(str::to_string)
            .collect();
        segments.push(format!("{}={}", CACHE_BUST_PARAM, stamp));

        let mut url = self.target.clone();
        url.set_query(Some(&segments.join("&")));
        url
    }
}

impl From<LaunchMessage> for OutboundMessage {
    fn from(launch: LaunchMessage) -> Self {
        let url = launch.url();
        Self {
            text: launch.greeting,
            format: TextFormat::Plain,
            button: Some(LaunchButton {
                label: launch.button_label,
                url,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn target() -> Url {
        Url::parse("https://host.example/webapp/index.html").unwrap()
    }

    #[test]
    fn test_url_without_cache_bust_is_target() {
        let launch = LaunchMessage::new("hi", "Play", target());
        assert_eq!(launch.url(), target());
    }

    #[test]
    fn test_url_with_cache_bust() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let launch = LaunchMessage::new("hi", "Play", target()).cache_busted_at(now);
        assert_eq!(
            launch.url().as_str(),
            "https://host.example/webapp/index.html?t=1700000000"
        );
    }

    #[test]
    fn test_cache_bust_replaces_existing_stamp_and_keeps_other_params() {
        let now = Utc.timestamp_opt(42, 0).unwrap();
        let target = Url::parse("https://host.example/app?level=3&t=1").unwrap();
        let url = LaunchMessage::new("hi", "Play", target).cache_busted_at(now).url();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("level".to_string(), "3".to_string()),
                ("t".to_string(), "42".to_string()),
            ]
        );
    }

    #[test]
    fn test_cache_bust_keeps_existing_encoding() {
        let now = Utc.timestamp_opt(5, 0).unwrap();
        let target = Url::parse("https://h.example/app?name=a%20b&x=1").unwrap();
        let url = LaunchMessage::new("hi", "Play", target).cache_busted_at(now).url();
        assert_eq!(url.as_str(), "https://h.example/app?name=a%20b&x=1&t=5");
    }

    #[test]
    fn test_into_outbound_message() {
        let msg: OutboundMessage = LaunchMessage::new("Welcome", "Play", target()).into();
        assert_eq!(msg.text, "Welcome");
        assert_eq!(msg.format, TextFormat::Plain);
        let button = msg.button.unwrap();
        assert_eq!(button.label, "Play");
        assert_eq!(button.url, target());
    }
}
