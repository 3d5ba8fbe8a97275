//! Tutor engine - owns quiz and score state and dispatches events.
//!
//! Every inbound message and every lesson tick goes through one queue and is
//! handled in order by a single task, so session and score updates never
//! interleave. Translation requests are the exception: they hold no tutor
//! state and run on their own tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::tutor::command::Command;
use crate::tutor::message::{IncomingMessage, html_escape};
use crate::tutor::quiz::{QuizSession, SessionTable, Verdict};
use crate::tutor::scores::ScoreTable;
use crate::tutor::telegram::Messenger;
use crate::tutor::translate::Translator;
use crate::tutor::vocabulary::{Vocabulary, WordPick};

pub const TRANSLATE_USAGE: &str = "Usage: !translate &lt;phrase&gt; &lt;target_language (de)&gt;";
pub const TRANSLATE_ERROR: &str = "Sorry, there was an error translating the phrase.";
pub const QUIZ_FETCH_ERROR: &str = "Sorry, there was an error fetching a quiz word.";
pub const QUIZ_ENTRY_ERROR: &str = "Sorry, there was an error with the quiz word.";
pub const LESSON_FETCH_ERROR: &str = "Sorry, there was an error fetching the daily lesson word.";
pub const LESSON_ENTRY_ERROR: &str = "Sorry, there was an error with the daily lesson word.";

pub const HELP_TEXT: &str = "<b>German Language Learning Bot Commands:</b>
- <code>!translate &lt;phrase&gt; &lt;target_language&gt;</code>: Translates the provided phrase into the target language (de).
- <code>!quiz</code>: Asks a random vocabulary question. Respond with the correct answer.
- <code>!lesson</code>: Provides a daily lesson with a random vocabulary word.
- <code>!leaderboard</code>: Shows the quiz leaderboard.
- <code>!help</code>: Shows this help message.";

/// Events consumed by the engine.
#[derive(Debug)]
pub enum TutorEvent {
    Message(IncomingMessage),
    /// The daily lesson schedule fired.
    LessonTick,
}

/// What the engine did with an event.
#[derive(Debug)]
pub enum Dispatch {
    Replied,
    Ignored,
    /// A translation is running on its own task and will reply when done.
    Translating(JoinHandle<()>),
}

#[derive(Debug, Clone, Default)]
pub struct TutorConfig {
    /// Chat that receives scheduled lessons.
    pub lesson_chat_id: Option<i64>,
}

pub struct TutorEngine<M, T> {
    config: TutorConfig,
    vocabulary: Vocabulary,
    pub(super) sessions: SessionTable,
    pub(super) scores: ScoreTable,
    messenger: Arc<M>,
    translator: Arc<T>,
}

impl<M: Messenger, T: Translator> TutorEngine<M, T> {
    pub fn new(config: TutorConfig, vocabulary: Vocabulary, messenger: Arc<M>, translator: Arc<T>) -> Self {
        Self {
            config,
            vocabulary,
            sessions: SessionTable::default(),
            scores: ScoreTable::default(),
            messenger,
            translator,
        }
    }

    /// Process events until every sender is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<TutorEvent>) {
        info!("Tutor engine started ({} words)", self.vocabulary.len());
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!("Event queue closed, tutor engine stopping");
    }

    pub async fn handle_event(&mut self, event: TutorEvent) -> Dispatch {
        match event {
            TutorEvent::Message(msg) => self.handle_message(msg).await,
            TutorEvent::LessonTick => self.handle_lesson_tick().await,
        }
    }

    async fn handle_message(&mut self, msg: IncomingMessage) -> Dispatch {
        if msg.is_bot {
            return Dispatch::Ignored;
        }

        match Command::parse(&msg.text) {
            Command::Translate { phrase, target } => {
                Dispatch::Translating(self.spawn_translation(msg.chat_id, phrase, target))
            }
            Command::TranslateUsage => {
                self.reply(msg.chat_id, TRANSLATE_USAGE).await;
                Dispatch::Replied
            }
            Command::Quiz => {
                self.start_quiz(msg.chat_id, msg.user_id).await;
                Dispatch::Replied
            }
            Command::Lesson => {
                self.post_lesson(msg.chat_id).await;
                Dispatch::Replied
            }
            Command::Leaderboard => {
                let board = self.scores.leaderboard();
                self.reply(msg.chat_id, &board).await;
                Dispatch::Replied
            }
            Command::Help => {
                self.reply(msg.chat_id, HELP_TEXT).await;
                Dispatch::Replied
            }
            Command::Text(content) => self.check_answer(&msg, &content).await,
        }
    }

    async fn handle_lesson_tick(&mut self) -> Dispatch {
        let Some(chat_id) = self.config.lesson_chat_id else {
            debug!("Lesson tick with no lesson chat configured");
            return Dispatch::Ignored;
        };
        info!("📅 Posting daily lesson to chat {}", chat_id);
        self.post_lesson(chat_id).await;
        Dispatch::Replied
    }

    async fn start_quiz(&mut self, chat_id: i64, user_id: i64) {
        let session = match self.vocabulary.random_entry() {
            WordPick::Empty => {
                warn!("No words available for the quiz");
                self.reply(chat_id, QUIZ_FETCH_ERROR).await;
                return;
            }
            WordPick::Found(entry) if entry.english.is_empty() => {
                warn!("Invalid vocabulary entry: {:?}", entry);
                self.reply(chat_id, QUIZ_ENTRY_ERROR).await;
                return;
            }
            WordPick::Found(entry) => QuizSession::new(entry),
        };

        self.reply(chat_id, &session.prompt()).await;
        info!("🎯 Quiz for user {}: {}", user_id, session.question);
        if self.sessions.start(user_id, session).is_some() {
            debug!("Replaced unanswered quiz for user {}", user_id);
        }
    }

    async fn post_lesson(&self, chat_id: i64) {
        let lesson = match self.vocabulary.random_entry() {
            WordPick::Empty => {
                warn!("No words available for the lesson");
                LESSON_FETCH_ERROR.to_string()
            }
            WordPick::Found(entry) if entry.english.is_empty() => {
                warn!("Invalid vocabulary entry: {:?}", entry);
                LESSON_ENTRY_ERROR.to_string()
            }
            WordPick::Found(entry) => format!(
                "Today's lesson: The German word for '{}' is '{}'.",
                html_escape(&entry.english),
                html_escape(&entry.german)
            ),
        };
        self.reply(chat_id, &lesson).await;
    }

    async fn check_answer(&mut self, msg: &IncomingMessage, content: &str) -> Dispatch {
        let Some(session) = self.sessions.take(msg.user_id) else {
            return Dispatch::Ignored;
        };

        let verdict = session.grade(content);
        if verdict == Verdict::Correct {
            let points = self.scores.increment(msg.user_id, &msg.display_name);
            info!("✅ {} answered '{}' correctly ({} points)", msg.display_name, session.question, points);
        } else {
            info!("❌ {} missed '{}'", msg.display_name, session.question);
        }
        self.reply(msg.chat_id, &session.reply(verdict)).await;
        Dispatch::Replied
    }

    fn spawn_translation(&self, chat_id: i64, phrase: String, target: String) -> JoinHandle<()> {
        let translator = self.translator.clone();
        let messenger = self.messenger.clone();
        tokio::spawn(async move {
            let text = match translator.translate(&phrase, &target).await {
                Ok(translated) => format!("Translated phrase: {}", html_escape(&translated)),
                Err(e) => {
                    warn!("Error translating {:?} to {}: {}", phrase, target, e);
                    TRANSLATE_ERROR.to_string()
                }
            };
            if let Err(e) = messenger.send_message(chat_id, &text).await {
                warn!("Failed to deliver translation to chat {}: {}", chat_id, e);
            }
        })
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.messenger.send_message(chat_id, text).await {
            warn!("Failed to reply in chat {}: {}", chat_id, e);
        }
    }
}
