use std::fmt;
use std::path::PathBuf;
use teloxide::types::ChatId;

/// Default location of the German→English word list.
const DEFAULT_VOCABULARY_PATH: &str = "german_english.json";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A chat ID variable is not a valid integer.
    InvalidChatId { var: &'static str, value: String, source: std::num::ParseIntError },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "missing required environment variable {}", var),
            Self::InvalidChatId { var, value, source } => {
                write!(f, "{} must be a chat ID, got '{}': {}", var, value, source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidChatId { source, .. } => Some(source),
            Self::Missing(_) | Self::Validation(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Chat that receives the daily lesson. Scheduled lessons are skipped when unset.
    pub lesson_chat_id: Option<ChatId>,
    /// JSON object mapping German terms to English terms.
    pub vocabulary_path: PathBuf,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
    pub log_chat_id: Option<ChatId>,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let telegram_bot_token = var("TELEGRAM_BOT_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "TELEGRAM_BOT_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }

        let lesson_chat_id = parse_chat_id("LESSON_CHAT_ID", var("LESSON_CHAT_ID"))?;
        let log_chat_id = parse_chat_id("LOG_CHAT_ID", var("LOG_CHAT_ID"))?;

        let vocabulary_path = var("VOCABULARY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VOCABULARY_PATH));
        let data_dir = var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token,
            lesson_chat_id,
            vocabulary_path,
            data_dir,
            log_chat_id,
        })
    }
}

fn parse_chat_id(var: &'static str, value: Option<String>) -> Result<Option<ChatId>, ConfigError> {
    value
        .map(|v| {
            v.parse::<i64>()
                .map(ChatId)
                .map_err(|source| ConfigError::InvalidChatId { var, value: v, source })
        })
        .transpose()
}
