use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, WebAppInfo};
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use super::Delivery;
use crate::config::{Config, WebhookConfig};
use crate::reply::{LaunchButton, OutboundMessage, TextFormat};
use crate::router::{Command, InboundEvent, Router};

/// Slash commands understood in chat.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Команды:")]
pub enum SlashCommand {
    #[command(description = "запустить игру")]
    Start,
    #[command(description = "правила игры")]
    Help,
    #[command(description = "запустить игру")]
    Game,
}

impl From<SlashCommand> for Command {
    fn from(cmd: SlashCommand) -> Self {
        match cmd {
            SlashCommand::Start => Command::Start,
            SlashCommand::Help => Command::Help,
            SlashCommand::Game => Command::Game,
        }
    }
}

/// Run the Telegram bot until Ctrl-C
pub async fn run(bot: Bot, router: Arc<Router>, config: &Config) -> Result<()> {
    if let Err(e) = bot.set_my_commands(SlashCommand::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let delivery = Delivery::from_config(config);
    info!("Starting Telegram bot ({})...", delivery);

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![router])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build();

    match delivery {
        Delivery::Polling => dispatcher.dispatch().await,
        Delivery::Webhook(webhook) => {
            let listener = serve_webhook(bot, webhook).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("webhook listener"),
                )
                .await
        }
    }

    info!("Bot stopped");
    Ok(())
}

/// Bind the webhook endpoint and register it with Telegram.
async fn serve_webhook(
    bot: Bot,
    webhook: &WebhookConfig,
) -> Result<impl teloxide::update_listeners::UpdateListener<Err = std::convert::Infallible>> {
    let mut options = webhooks::Options::new(webhook.listen, webhook.url.clone());
    if let Some(secret) = &webhook.secret_token {
        options = options.secret_token(secret.clone());
    }

    let (listener, stop_flag, router) = webhooks::axum_to_router(bot, options)
        .await
        .context("Failed to set webhook")?;
    let app = router.route("/healthz", get(|| async { "ok" }));

    let tcp = tokio::net::TcpListener::bind(webhook.listen)
        .await
        .with_context(|| format!("Failed to bind webhook listener on {}", webhook.listen))?;
    info!("Webhook listening on {} for {}", webhook.listen, webhook.url);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app)
            .with_graceful_shutdown(stop_flag)
            .await
        {
            warn!("Webhook server error: {}", e);
        }
    });

    Ok(listener)
}

/// Handler tree: web app data first, then slash commands.
fn schema() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::filter_map(|msg: Message| msg.web_app_data().map(|d| d.data.clone()))
                .endpoint(handle_web_app_data),
        )
        .branch(
            dptree::entry()
                .filter_command::<SlashCommand>()
                .endpoint(handle_command),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: SlashCommand,
    router: Arc<Router>,
) -> ResponseResult<()> {
    info!("Command /{} in chat {}", Command::from(cmd.clone()), msg.chat.id.0);
    respond(&bot, &msg, &router, InboundEvent::command(cmd.into())).await
}

async fn handle_web_app_data(
    bot: Bot,
    msg: Message,
    data: String,
    router: Arc<Router>,
) -> ResponseResult<()> {
    info!("Web app data in chat {} ({} bytes)", msg.chat.id.0, data.len());
    debug!("Web app data: {}", data);
    respond(&bot, &msg, &router, InboundEvent::web_app_data(data)).await
}

async fn respond(
    bot: &Bot,
    msg: &Message,
    router: &Router,
    event: InboundEvent,
) -> ResponseResult<()> {
    match router.dispatch(&event) {
        Some(reply) => deliver(bot, msg.chat.id, reply).await,
        None => Ok(()),
    }
}

/// Send one reply as a single `sendMessage` call.
pub async fn deliver(bot: &Bot, chat_id: ChatId, reply: OutboundMessage) -> ResponseResult<()> {
    let mut request = bot.send_message(chat_id, reply.text);
    if let Some(parse_mode) = parse_mode(reply.format) {
        request = request.parse_mode(parse_mode);
    }
    if let Some(button) = &reply.button {
        request = request.reply_markup(launch_keyboard(button));
    }
    request.await?;
    Ok(())
}

fn parse_mode(format: TextFormat) -> Option<ParseMode> {
    match format {
        TextFormat::Plain => None,
        TextFormat::Html => Some(ParseMode::Html),
    }
}

/// One-row keyboard holding a single web app button.
fn launch_keyboard(button: &LaunchButton) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::web_app(
        button.label.clone(),
        WebAppInfo {
            url: button.url.clone(),
        },
    )]])
}
