use async_trait::async_trait;
use teloxide::{
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode},
    RequestError,
};

use crate::bot::{
    dispatcher::HandlerResult,
    processor::{Delivery, MenuLayout, RouterError, SessionRef},
};

/* Common utilites for handlers. */

// Make a keyboard, button menu, from rows of (label, callback data).
pub fn make_keyboard(layout: MenuLayout) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = layout
        .iter()
        .map(|row| {
            row.iter()
                .map(|(label, data)| InlineKeyboardButton::callback(*label, *data))
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

/* Fetch and routing failures are already reported by the router's monitor,
 * and the user receives nothing for them.
 * Only transport failures travel on to the dispatcher's error handler.
 */
pub fn settle(result: Result<(), RouterError>) -> HandlerResult {
    match result {
        Ok(()) | Err(RouterError::Fetch { .. }) | Err(RouterError::Routing(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

// Sends router output through Telegram, always as HTML.
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    pub fn new(bot: Bot) -> TelegramDelivery {
        TelegramDelivery { bot }
    }
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn deliver(&self, session: &SessionRef, html: &str) -> Result<(), RequestError> {
        self.bot
            .send_message(ChatId(session.chat_id), html)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn deliver_menu(
        &self,
        session: &SessionRef,
        html: &str,
        layout: MenuLayout,
    ) -> Result<(), RequestError> {
        self.bot
            .send_message(ChatId(session.chat_id), html)
            .parse_mode(ParseMode::Html)
            .reply_markup(make_keyboard(layout))
            .await?;
        Ok(())
    }

    async fn edit_message(&self, session: &SessionRef, html: &str) -> Result<(), RequestError> {
        match session.message_id {
            Some(id) => {
                self.bot
                    .edit_message_text(ChatId(session.chat_id), MessageId(id), html)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
            // Menu message no longer available, reply instead.
            None => self.deliver(session, html).await?,
        }
        Ok(())
    }
}
