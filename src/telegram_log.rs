//! Forwards log lines to a Telegram chat.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::tutor::message::html_escape;
use crate::tutor::telegram::Messenger;

/// Telegram's message limit is 4096 characters; leave room for the ellipsis.
const MAX_LOG_CHARS: usize = 4000;
/// INFO lines are flushed after this many accumulate, or on the interval.
const INFO_BATCH_SIZE: usize = 50;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Log message with priority.
enum LogMessage {
    /// WARN/ERROR - send immediately
    Urgent(String),
    /// INFO - batch and send periodically
    Info(String),
}

pub struct TelegramLogLayer {
    tx: mpsc::UnboundedSender<LogMessage>,
}

impl TelegramLogLayer {
    pub fn new<M: Messenger>(messenger: Arc<M>, chat_id: i64) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<LogMessage>();

        tokio::spawn(async move {
            let mut info_buffer: Vec<String> = Vec::new();
            let mut interval = tokio::time::interval(FLUSH_INTERVAL);

            loop {
                tokio::select! {
                    msg = rx.recv() => {
                        match msg {
                            Some(LogMessage::Urgent(text)) => {
                                send_log(messenger.as_ref(), chat_id, &text).await;
                            }
                            Some(LogMessage::Info(text)) => {
                                info_buffer.push(text);
                                if info_buffer.len() >= INFO_BATCH_SIZE {
                                    flush_buffer(messenger.as_ref(), chat_id, &mut info_buffer).await;
                                }
                            }
                            None => break,
                        }
                    }
                    _ = interval.tick() => {
                        flush_buffer(messenger.as_ref(), chat_id, &mut info_buffer).await;
                    }
                }
            }
        });

        Self { tx }
    }
}

/// Escape for HTML parse mode, then cut to the Telegram limit.
///
/// The limit applies to the escaped text, and an entity is never split.
fn format_log(text: &str) -> String {
    let mut result = String::new();
    let mut chars = 0;
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let escaped = html_escape(c.encode_utf8(&mut buf));
        let width = escaped.chars().count();
        if chars + width > MAX_LOG_CHARS {
            result.push_str("...");
            return result;
        }
        result.push_str(&escaped);
        chars += width;
    }
    result
}

async fn send_log<M: Messenger>(messenger: &M, chat_id: i64, text: &str) {
    // Failures can't be logged through tracing without feeding back into this layer.
    if let Err(e) = messenger.send_message(chat_id, &format_log(text)).await {
        eprintln!("Failed to send log to Telegram: {e}");
    }
}

async fn flush_buffer<M: Messenger>(messenger: &M, chat_id: i64, buffer: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    let combined = buffer.join("\n");
    buffer.clear();
    send_log(messenger, chat_id, &combined).await;
}

struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else if self.message.is_empty() {
            self.message = format!("{} = {:?}", field.name(), value);
        } else {
            self.message
                .push_str(&format!(", {} = {:?}", field.name(), value));
        }
    }
}

impl<S: Subscriber> Layer<S> for TelegramLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::INFO {
            return;
        }
        // Sending a log line logs through these targets; forwarding them would loop.
        let target = event.metadata().target();
        if target.starts_with("teloxide")
            || target.starts_with("reqwest")
            || target.starts_with("hyper")
            || target.ends_with("::tutor::telegram")
        {
            return;
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        let msg = match level {
            Level::ERROR => LogMessage::Urgent(format!("❌ {}", visitor.message)),
            Level::WARN => LogMessage::Urgent(format!("⚠️ {}", visitor.message)),
            _ => LogMessage::Info(visitor.message),
        };

        if self.tx.send(msg).is_err() {
            eprintln!("Log channel closed, message dropped");
        }
    }
}
