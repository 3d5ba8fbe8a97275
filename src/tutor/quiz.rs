//! One-question quizzes, at most one outstanding per user.

use std::collections::HashMap;

use crate::tutor::message::html_escape;
use crate::tutor::vocabulary::VocabularyEntry;

/// An outstanding quiz question awaiting the user's next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    /// German term shown to the user.
    pub question: String,
    /// Expected English term.
    pub answer: String,
    /// Computed once when the session is created.
    pub hint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl QuizSession {
    pub fn new(entry: &VocabularyEntry) -> Self {
        Self {
            question: entry.german.clone(),
            answer: entry.english.clone(),
            hint: hint_for(&entry.english),
        }
    }

    /// The message that asks the question.
    pub fn prompt(&self) -> String {
        format!("What is the English word for '{}'?", html_escape(&self.question))
    }

    /// Compare an attempt against the answer after trimming, ignoring case.
    pub fn grade(&self, attempt: &str) -> Verdict {
        if attempt.trim().to_lowercase() == self.answer.to_lowercase() {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }

    /// The reply to an attempt. The answer is revealed either way.
    pub fn reply(&self, verdict: Verdict) -> String {
        let question = html_escape(&self.question);
        let answer = html_escape(&self.answer);
        match verdict {
            Verdict::Correct => {
                format!("Correct! The English word for '{}' is '{}'.", question, answer)
            }
            Verdict::Incorrect => format!(
                "Incorrect. The English word for '{}' is '{}'. Here's a hint: {}",
                question,
                answer,
                html_escape(&self.hint)
            ),
        }
    }
}

pub fn hint_for(answer: &str) -> String {
    let first = answer.chars().next().map(String::from).unwrap_or_default();
    format!("The first letter of the word is '{}'", first)
}

/// Outstanding quiz sessions keyed by user ID.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<i64, QuizSession>,
}

impl SessionTable {
    /// Start a session, returning the one it replaced, if any.
    pub fn start(&mut self, user_id: i64, session: QuizSession) -> Option<QuizSession> {
        self.sessions.insert(user_id, session)
    }

    /// Remove and return the user's session. A session is only ever read once.
    pub fn take(&mut self, user_id: i64) -> Option<QuizSession> {
        self.sessions.remove(&user_id)
    }

    #[cfg(test)]
    pub fn get(&self, user_id: i64) -> Option<&QuizSession> {
        self.sessions.get(&user_id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}
