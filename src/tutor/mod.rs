//! Tutor module - vocabulary quizzes, lessons and translation over Telegram.

pub mod command;
pub mod engine;
pub mod message;
pub mod quiz;
pub mod schedule;
pub mod scores;
pub mod telegram;
pub mod translate;
pub mod vocabulary;

#[cfg(test)]
mod tests;

pub use engine::{TutorConfig, TutorEngine, TutorEvent};
pub use message::IncomingMessage;
pub use telegram::TelegramClient;
pub use translate::TranslationClient;
pub use vocabulary::Vocabulary;
