pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::GameConfig;
use crate::reply::OutboundMessage;

use handlers::{HelpHandler, LaunchHandler, WebAppDataHandler};

/// Every kind of inbound event the bot reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    Game,
    WebAppData,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Help => write!(f, "help"),
            Command::Game => write!(f, "game"),
            Command::WebAppData => write!(f, "webapp_data"),
        }
    }
}

/// An event received from the transport
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub command: Command,
    /// Data posted back by the web application; only set for `WebAppData`.
    pub payload: Option<String>,
}

impl InboundEvent {
    pub fn command(command: Command) -> Self {
        Self {
            command,
            payload: None,
        }
    }

    pub fn web_app_data(payload: impl Into<String>) -> Self {
        Self {
            command: Command::WebAppData,
            payload: Some(payload.into()),
        }
    }
}

/// Turns one inbound event into at most one reply.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, event: &InboundEvent) -> Option<OutboundMessage>;
}

/// Dispatch table from command to handler.
#[derive(Default)]
pub struct Router {
    handlers: HashMap<Command, Arc<dyn CommandHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard table: `start` and `game` launch the app, `help` shows the
    /// rules, web app data is acknowledged.
    pub fn from_config(game: &GameConfig) -> Self {
        let launch: Arc<dyn CommandHandler> = Arc::new(LaunchHandler::from_config(game));

        let mut router = Self::new();
        router.register(Command::Start, launch.clone());
        router.register(Command::Game, launch);
        router.register(Command::Help, Arc::new(HelpHandler::from_config(game)));
        router.register(Command::WebAppData, Arc::new(WebAppDataHandler));
        router
    }

    /// Register a handler, replacing any previous one for `command`.
    pub fn register(&mut self, command: Command, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(command, handler);
    }

    #[cfg(test)]
    pub fn is_registered(&self, command: Command) -> bool {
        self.handlers.contains_key(&command)
    }

    pub fn dispatch(&self, event: &InboundEvent) -> Option<OutboundMessage> {
        match self.handlers.get(&event.command) {
            Some(handler) => handler.handle(event),
            None => {
                debug!("No handler registered for {}", event.command);
                None
            }
        }
    }
}
