use std::sync::Arc;
use teloxide::prelude::*;

use crate::bot::dialog::{DialogController, InboundEvent};
use crate::bot::transport::{deliver, TelegramTransport};

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    controller: Arc<DialogController>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Plans belong to the chat, which for private chats is the user id.
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat.id.0)
        .unwrap_or(q.from.id.0 as i64);
    let display_name = q.from.full_name();

    // Always answer so the client stops its loading indicator.
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(token) = q.data.clone() else {
        tracing::debug!("Callback without data from chat {}", chat_id);
        return Ok(());
    };

    tracing::info!("Callback received: '{}' from {} in chat {}", token, display_name, chat_id);

    let Some(reply) = controller
        .handle(chat_id, &display_name, InboundEvent::ButtonPress(token))
        .await
    else {
        return Ok(());
    };

    // The buttons have served their purpose once the press was accepted.
    if let Some(message) = q.message.as_ref() {
        if let Err(e) = bot.edit_message_reply_markup(message.chat.id, message.id).await {
            tracing::debug!("Could not remove buttons in chat {}: {}", chat_id, e);
        }
    }

    let transport = TelegramTransport::new(bot);
    if let Err(e) = deliver(&transport, chat_id, &reply).await {
        tracing::error!("Failed to reply in chat {}: {}", chat_id, e);
    }

    Ok(())
}
