use std::sync::Arc;
use teloxide::prelude::*;

use crate::bot::commands::parse_command;
use crate::bot::dialog::{DialogController, InboundEvent};
use crate::bot::transport::{deliver, TelegramTransport};

/// Classifies a message body: known commands become [`InboundEvent::Command`],
/// everything else (including unknown `/words`) is free text.
pub fn classify_text(text: &str, bot_username: &str) -> InboundEvent {
    match parse_command(text, bot_username) {
        Some((command, args)) => InboundEvent::Command { command, args },
        None => InboundEvent::FreeText(text.to_string()),
    }
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    controller: Arc<DialogController>,
    bot_username: Arc<str>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let chat_id = msg.chat.id.0;
    let display_name = msg
        .from()
        .map(|u| u.full_name())
        .or_else(|| msg.chat.first_name().map(str::to_string))
        .unwrap_or_else(|| "friend".to_string());

    let event = match msg.text() {
        Some(text) => {
            tracing::info!("Message received from {} in chat {}", display_name, chat_id);
            classify_text(text, &bot_username)
        }
        None => {
            tracing::info!("Non-text message received from {} in chat {}", display_name, chat_id);
            InboundEvent::NonText
        }
    };

    if let Some(reply) = controller.handle(chat_id, &display_name, event).await {
        let transport = TelegramTransport::new(bot);
        if let Err(e) = deliver(&transport, chat_id, &reply).await {
            tracing::error!("Failed to reply in chat {}: {}", chat_id, e);
        }
    }

    Ok(())
}
