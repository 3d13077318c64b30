//! Outbound chat operations, kept behind a trait so the dialog replies and
//! reminder notifications can be delivered by something other than Telegram.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile};

use crate::bot::dialog::{ButtonAction, Reply};
use crate::error::TransportError;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, owner_id: i64, text: &str) -> Result<(), TransportError>;

    async fn send_text_with_actions(
        &self,
        owner_id: i64,
        text: &str,
        actions: &[ButtonAction],
    ) -> Result<(), TransportError>;

    async fn send_photo(
        &self,
        owner_id: i64,
        image: Vec<u8>,
        caption: &str,
    ) -> Result<(), TransportError>;
}

/// Sends one dialog reply through `transport`.
pub async fn deliver(
    transport: &dyn ChatTransport,
    owner_id: i64,
    reply: &Reply,
) -> Result<(), TransportError> {
    match reply {
        Reply::Text(text) => transport.send_text(owner_id, text).await,
        Reply::WithActions { text, actions } => {
            transport.send_text_with_actions(owner_id, text, actions).await
        }
    }
}

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// One row of inline buttons whose callback data is the action token.
pub fn action_keyboard(actions: &[ButtonAction]) -> InlineKeyboardMarkup {
    let row = actions
        .iter()
        .map(|action| InlineKeyboardButton::callback(action.label(), action.token()))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, owner_id: i64, text: &str) -> Result<(), TransportError> {
        self.bot.send_message(ChatId(owner_id), text).await?;
        Ok(())
    }

    async fn send_text_with_actions(
        &self,
        owner_id: i64,
        text: &str,
        actions: &[ButtonAction],
    ) -> Result<(), TransportError> {
        self.bot
            .send_message(ChatId(owner_id), text)
            .reply_markup(action_keyboard(actions))
            .await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        owner_id: i64,
        image: Vec<u8>,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.bot
            .send_photo(ChatId(owner_id), InputFile::memory(image).file_name("reminder.jpg"))
            .caption(caption)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_action_keyboard_uses_tokens() {
        let keyboard = action_keyboard(&ButtonAction::ALL);
        assert_eq!(keyboard.inline_keyboard.len(), 1);

        let tokens: Vec<String> = keyboard.inline_keyboard[0]
            .iter()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(tokens, vec!["confirm", "change-index", "cancel"]);
    }
}
