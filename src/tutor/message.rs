//! Inbound message type and HTML helpers for outbound text.
//!
//! Outbound messages are sent with Telegram's HTML parse mode, so every
//! piece of user or vocabulary content is escaped before it is embedded.

/// A text message received from the chat platform.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub user_id: i64,
    /// Username, or first name if the user has none.
    pub display_name: String,
    pub is_bot: bool,
    pub text: String,
}

/// Escape a string for safe inclusion in an HTML-formatted message.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Inline mention of a user that works whether or not they have a username.
pub fn mention(user_id: i64, display_name: &str) -> String {
    format!(
        r#"<a href="tg://user?id={}">{}</a>"#,
        user_id,
        html_escape(display_name)
    )
}
