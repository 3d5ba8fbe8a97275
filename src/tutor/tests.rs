//! Engine tests: command dispatch, the quiz loop, lessons and translation.
//!
//! Run with: cargo test tutor

use super::*;
use crate::tutor::engine::{
    Dispatch, HELP_TEXT, LESSON_ENTRY_ERROR, LESSON_FETCH_ERROR, QUIZ_ENTRY_ERROR, QUIZ_FETCH_ERROR,
    TRANSLATE_ERROR, TRANSLATE_USAGE,
};
use crate::tutor::scores::NO_SCORES_MESSAGE;
use crate::tutor::telegram::Messenger;
use crate::tutor::translate::{TranslateError, Translator};
use crate::tutor::vocabulary::VocabularyEntry;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// FAKES
// =============================================================================

/// Records every message instead of sending it.
#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingMessenger {
    fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    fn last(&self) -> String {
        self.texts().pop().expect("nothing was sent")
    }
}

impl Messenger for RecordingMessenger {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat_id, text.to_string()));
        Ok(sent.len() as i64)
    }
}

/// Answers every translation with a fixed result and counts calls.
struct FakeTranslator {
    calls: AtomicUsize,
    reply: Option<String>,
}

impl FakeTranslator {
    fn answering(reply: &str) -> Self {
        Self { calls: AtomicUsize::new(0), reply: Some(reply.to_string()) }
    }

    fn failing() -> Self {
        Self { calls: AtomicUsize::new(0), reply: None }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Translator for FakeTranslator {
    async fn translate(&self, _phrase: &str, _target_language: &str) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(TranslateError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "upstream down".to_string(),
            }),
        }
    }
}

// =============================================================================
// HARNESS
// =============================================================================

const CHAT: i64 = -100500;
const ALICE: i64 = 111;
const BOB: i64 = 222;

struct Harness {
    engine: TutorEngine<RecordingMessenger, FakeTranslator>,
    messenger: Arc<RecordingMessenger>,
    translator: Arc<FakeTranslator>,
}

fn words(pairs: &[(&str, &str)]) -> Vocabulary {
    Vocabulary::from_entries(
        pairs
            .iter()
            .map(|(german, english)| VocabularyEntry { german: german.to_string(), english: english.to_string() })
            .collect(),
    )
}

fn harness_with(vocabulary: Vocabulary, translator: FakeTranslator, lesson_chat_id: Option<i64>) -> Harness {
    let messenger = Arc::new(RecordingMessenger::default());
    let translator = Arc::new(translator);
    let engine = TutorEngine::new(
        TutorConfig { lesson_chat_id },
        vocabulary,
        messenger.clone(),
        translator.clone(),
    );
    Harness { engine, messenger, translator }
}

fn hund_harness() -> Harness {
    harness_with(words(&[("Hund", "dog")]), FakeTranslator::answering("Hallo"), Some(CHAT))
}

fn message(user_id: i64, text: &str) -> TutorEvent {
    TutorEvent::Message(IncomingMessage {
        chat_id: CHAT,
        user_id,
        display_name: format!("user{}", user_id),
        is_bot: false,
        text: text.to_string(),
    })
}

impl Harness {
    async fn send(&mut self, user_id: i64, text: &str) -> Dispatch {
        match self.engine.handle_event(message(user_id, text)).await {
            Dispatch::Translating(handle) => {
                handle.await.unwrap();
                Dispatch::Replied
            }
            other => other,
        }
    }
}

// =============================================================================
// QUIZ LOOP
// =============================================================================

mod quiz_loop {
    use super::*;

    #[tokio::test]
    async fn test_quiz_asks_question_and_opens_session() {
        let mut h = hund_harness();
        assert!(matches!(h.send(ALICE, "!quiz").await, Dispatch::Replied));

        assert_eq!(h.messenger.sent(), vec![(CHAT, "What is the English word for 'Hund'?".to_string())]);
        let session = h.engine.sessions.get(ALICE).expect("session should be open");
        assert_eq!(session.answer, "dog");
        assert_eq!(session.hint, "The first letter of the word is 'd'");
    }

    #[tokio::test]
    async fn test_correct_answer_scores_and_clears_session() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "dog").await;

        assert_eq!(h.messenger.last(), "Correct! The English word for 'Hund' is 'dog'.");
        assert_eq!(h.engine.scores.score(ALICE), 1);
        assert!(h.engine.sessions.get(ALICE).is_none());
    }

    #[tokio::test]
    async fn test_answer_is_trimmed_and_case_folded() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "   DoG  ").await;
        assert_eq!(h.engine.scores.score(ALICE), 1);
    }

    #[tokio::test]
    async fn test_wrong_answer_reveals_answer_with_hint() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "cat").await;

        assert_eq!(
            h.messenger.last(),
            "Incorrect. The English word for 'Hund' is 'dog'. Here's a hint: The first letter of the word is 'd'"
        );
        assert_eq!(h.engine.scores.score(ALICE), 0);
        assert!(h.engine.sessions.get(ALICE).is_none());
    }

    #[tokio::test]
    async fn test_no_retry_after_wrong_answer() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "cat").await;
        let sent_before = h.messenger.sent().len();

        assert!(matches!(h.send(ALICE, "dog").await, Dispatch::Ignored));
        assert_eq!(h.messenger.sent().len(), sent_before);
        assert_eq!(h.engine.scores.score(ALICE), 0);
    }

    #[tokio::test]
    async fn test_exactly_one_reply_per_attempt() {
        let mut h = hund_harness();
        for attempt in ["dog", "cat", "hello there", ""] {
            h.send(ALICE, "!quiz").await;
            let before = h.messenger.sent().len();
            h.send(ALICE, attempt).await;
            assert_eq!(h.messenger.sent().len(), before + 1, "attempt {:?}", attempt);
            assert!(h.engine.sessions.get(ALICE).is_none());
        }
        assert_eq!(h.engine.scores.score(ALICE), 1);
    }

    #[tokio::test]
    async fn test_new_quiz_overwrites_session() {
        let mut h = harness_with(words(&[("Katze", "cat")]), FakeTranslator::answering(""), None);
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "!quiz").await;

        assert_eq!(h.engine.sessions.len(), 1);
        assert_eq!(h.messenger.sent().len(), 2);
        h.send(ALICE, "cat").await;
        assert_eq!(h.engine.scores.score(ALICE), 1);
    }

    #[tokio::test]
    async fn test_commands_are_not_consumed_as_answers() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "!help").await;

        assert_eq!(h.messenger.last(), HELP_TEXT);
        assert!(h.engine.sessions.get(ALICE).is_some());
    }

    #[tokio::test]
    async fn test_sessions_are_per_user() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;

        assert!(matches!(h.send(BOB, "dog").await, Dispatch::Ignored));
        assert_eq!(h.engine.scores.score(BOB), 0);
        assert!(h.engine.sessions.get(ALICE).is_some());
    }

    #[tokio::test]
    async fn test_text_without_session_is_ignored() {
        let mut h = hund_harness();
        assert!(matches!(h.send(ALICE, "guten tag").await, Dispatch::Ignored));
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bot_messages_are_ignored() {
        let mut h = hund_harness();
        let event = TutorEvent::Message(IncomingMessage {
            chat_id: CHAT,
            user_id: 999,
            display_name: "otherbot".into(),
            is_bot: true,
            text: "!quiz".into(),
        });
        assert!(matches!(h.engine.handle_event(event).await, Dispatch::Ignored));
        assert!(h.messenger.sent().is_empty());
        assert_eq!(h.engine.sessions.len(), 0);
    }
}

// =============================================================================
// VOCABULARY FAILURES
// =============================================================================

mod vocabulary_failures {
    use super::*;

    #[tokio::test]
    async fn test_empty_vocabulary_quiz() {
        let mut h = harness_with(Vocabulary::default(), FakeTranslator::answering(""), None);
        h.send(ALICE, "!quiz").await;

        assert_eq!(h.messenger.texts(), vec![QUIZ_FETCH_ERROR.to_string()]);
        assert_eq!(h.engine.sessions.len(), 0);
    }

    #[tokio::test]
    async fn test_empty_vocabulary_lesson() {
        let mut h = harness_with(Vocabulary::default(), FakeTranslator::answering(""), None);
        h.send(ALICE, "!lesson").await;
        assert_eq!(h.messenger.texts(), vec![LESSON_FETCH_ERROR.to_string()]);
    }

    #[tokio::test]
    async fn test_entry_without_translation() {
        let mut h = harness_with(words(&[("Hund", "")]), FakeTranslator::answering(""), None);
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "!lesson").await;

        assert_eq!(
            h.messenger.texts(),
            vec![QUIZ_ENTRY_ERROR.to_string(), LESSON_ENTRY_ERROR.to_string()]
        );
        assert_eq!(h.engine.sessions.len(), 0);
    }
}

// =============================================================================
// LESSONS
// =============================================================================

mod lessons {
    use super::*;

    #[tokio::test]
    async fn test_lesson_command_replies_in_sender_chat() {
        let mut h = harness_with(words(&[("Hund", "dog")]), FakeTranslator::answering(""), Some(42));
        h.send(ALICE, "!LESSON").await;
        assert_eq!(
            h.messenger.sent(),
            vec![(CHAT, "Today's lesson: The German word for 'dog' is 'Hund'.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_lesson_tick_posts_to_lesson_chat() {
        let mut h = harness_with(words(&[("Hund", "dog")]), FakeTranslator::answering(""), Some(42));
        assert!(matches!(h.engine.handle_event(TutorEvent::LessonTick).await, Dispatch::Replied));
        assert_eq!(
            h.messenger.sent(),
            vec![(42, "Today's lesson: The German word for 'dog' is 'Hund'.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_lesson_tick_without_chat_is_noop() {
        let mut h = harness_with(words(&[("Hund", "dog")]), FakeTranslator::answering(""), None);
        assert!(matches!(h.engine.handle_event(TutorEvent::LessonTick).await, Dispatch::Ignored));
        assert!(h.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_lesson_does_not_touch_sessions() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;
        h.engine.handle_event(TutorEvent::LessonTick).await;
        assert!(h.engine.sessions.get(ALICE).is_some());
    }
}

// =============================================================================
// TRANSLATION
// =============================================================================

mod translation {
    use super::*;

    #[tokio::test]
    async fn test_translate_replies_with_result() {
        let mut h = harness_with(Vocabulary::default(), FakeTranslator::answering("Guten Morgen"), None);
        h.send(ALICE, "!translate good morning de").await;

        assert_eq!(h.translator.calls(), 1);
        assert_eq!(h.messenger.sent(), vec![(CHAT, "Translated phrase: Guten Morgen".to_string())]);
    }

    #[tokio::test]
    async fn test_translate_result_is_escaped() {
        let mut h = harness_with(Vocabulary::default(), FakeTranslator::answering("<b>Hallo</b>"), None);
        h.send(ALICE, "!translate hello de").await;
        assert_eq!(h.messenger.last(), "Translated phrase: &lt;b&gt;Hallo&lt;/b&gt;");
    }

    #[tokio::test]
    async fn test_translate_failure_is_generic() {
        let mut h = harness_with(Vocabulary::default(), FakeTranslator::failing(), None);
        h.send(ALICE, "!translate hello de").await;

        assert_eq!(h.translator.calls(), 1);
        assert_eq!(h.messenger.texts(), vec![TRANSLATE_ERROR.to_string()]);
    }

    #[tokio::test]
    async fn test_translate_usage_never_calls_network() {
        let mut h = harness_with(Vocabulary::default(), FakeTranslator::answering("x"), None);
        for text in ["!translate", "!translate de", "!TRANSLATE   hello  "] {
            assert!(matches!(h.send(ALICE, text).await, Dispatch::Replied));
        }

        assert_eq!(h.translator.calls(), 0);
        assert_eq!(h.messenger.texts(), vec![TRANSLATE_USAGE.to_string(); 3]);
    }

    #[tokio::test]
    async fn test_translate_does_not_consume_session() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "!translate dog de").await;
        assert!(h.engine.sessions.get(ALICE).is_some());
    }
}

// =============================================================================
// LEADERBOARD & HELP
// =============================================================================

mod leaderboard {
    use super::*;

    #[tokio::test]
    async fn test_empty_leaderboard() {
        let mut h = hund_harness();
        h.send(ALICE, "!leaderboard").await;
        assert_eq!(h.messenger.texts(), vec![NO_SCORES_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_leaderboard_sorted_descending() {
        let mut h = hund_harness();
        h.send(ALICE, "!quiz").await;
        h.send(ALICE, "dog").await;
        for _ in 0..2 {
            h.send(BOB, "!quiz").await;
            h.send(BOB, "dog").await;
        }

        h.send(ALICE, "!leaderboard").await;
        let board = h.messenger.last();
        let lines: Vec<&str> = board.lines().skip(1).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1. "));
        assert!(lines[0].contains("tg://user?id=222"));
        assert!(lines[0].ends_with(": 2 points"));
        assert!(lines[1].starts_with("2. "));
        assert!(lines[1].contains("tg://user?id=111"));
        assert!(lines[1].ends_with(": 1 points"));
    }

    #[tokio::test]
    async fn test_help() {
        let mut h = hund_harness();
        h.send(ALICE, "!help").await;
        let help = h.messenger.last();
        for command in ["!translate", "!quiz", "!lesson", "!leaderboard", "!help"] {
            assert!(help.contains(command), "help should mention {}", command);
        }
    }
}

// =============================================================================
// EVENT LOOP
// =============================================================================

mod event_loop {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_run_processes_queue_in_order() {
        let h = hund_harness();
        let messenger = h.messenger.clone();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(h.engine.run(rx));

        tx.send(message(ALICE, "!quiz")).await.unwrap();
        tx.send(message(ALICE, "dog")).await.unwrap();
        tx.send(message(ALICE, "!leaderboard")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        let texts = messenger.texts();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[1], "Correct! The English word for 'Hund' is 'dog'.");
        assert!(texts[2].contains("1 points"));
    }
}
