pub mod callback;
pub mod message;

use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::bot::dialog::DialogController;

pub struct BotHandler {
    pub controller: Arc<DialogController>,
    pub bot_username: Arc<str>,
}

impl BotHandler {
    pub fn new(controller: Arc<DialogController>, bot_username: &str) -> Self {
        Self {
            controller,
            bot_username: bot_username.into(),
        }
    }

    pub fn schema(&self) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        use teloxide::dispatching::UpdateFilterExt;

        let controller = self.controller.clone();
        let controller_callback = self.controller.clone();
        let bot_username = self.bot_username.clone();

        dptree::entry()
            .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
                let controller = controller.clone();
                let bot_username = bot_username.clone();
                async move { message::message_handler(bot, msg, controller, bot_username).await }
            }))
            .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                let controller = controller_callback.clone();
                async move { callback::callback_handler(bot, q, controller).await }
            }))
    }
}
