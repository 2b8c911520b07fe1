//! Telegram transport using teloxide.

use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    KeyboardRemove, Recipient, ReplyMarkup,
};
use tracing::warn;

use crate::relay::transport::{Keyboard, Transport};

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Recipients are flat strings in the config: `@name` means a channel
/// username, anything else must be a numeric chat id.
fn parse_recipient(recipient: &str) -> Result<Recipient, String> {
    if let Some(channel) = recipient.strip_prefix('@') {
        if channel.is_empty() {
            return Err("empty channel username".to_string());
        }
        return Ok(Recipient::ChannelUsername(recipient.to_string()));
    }
    recipient
        .parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| format!("'{recipient}' is neither a chat id nor an @channel name"))
}

fn reply_markup(keyboard: Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply { rows, resize } => {
            let rows = rows
                .into_iter()
                .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>());
            let mut markup = KeyboardMarkup::new(rows);
            if resize {
                markup = markup.resize_keyboard();
            }
            ReplyMarkup::Keyboard(markup)
        }
        Keyboard::Inline { rows } => {
            let rows = rows.into_iter().map(|row| {
                row.into_iter()
                    .map(|b| InlineKeyboardButton::callback(b.label, b.data))
                    .collect::<Vec<_>>()
            });
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
        }
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

impl Transport for TelegramClient {
    async fn send_message(
        &self,
        recipient: &str,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, String> {
        let target = parse_recipient(recipient)?;

        let mut request = self.bot.send_message(target, text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }

        request.await.map(|msg| msg.id.0 as i64).map_err(|e| {
            let msg = format!("Failed to send to {recipient}: {e}");
            warn!("{}", msg);
            msg
        })
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), String> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_owned()))
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to answer callback: {e}");
                warn!("{}", msg);
                msg
            })
    }
}
