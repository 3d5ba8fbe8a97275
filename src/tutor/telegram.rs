//! Telegram client using teloxide.

use std::future::Future;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::warn;

/// Outbound side of the chat platform.
pub trait Messenger: Send + Sync + 'static {
    /// Send an HTML-formatted message. Returns the new message ID.
    fn send_message(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<i64, String>> + Send;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                msg
            })
    }
}
