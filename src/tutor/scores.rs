//! Per-user quiz scores and leaderboard rendering.

use std::collections::HashMap;

use crate::tutor::message::mention;

pub const NO_SCORES_MESSAGE: &str = "No scores yet. Start playing to get on the leaderboard!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub user_id: i64,
    /// Name last seen for this user, used for the leaderboard mention.
    pub display_name: String,
    pub points: u64,
}

/// Scores in the order users first scored.
#[derive(Debug, Default)]
pub struct ScoreTable {
    records: Vec<ScoreRecord>,
    index: HashMap<i64, usize>,
}

impl ScoreTable {
    /// Add one point, creating the record on a user's first correct answer.
    pub fn increment(&mut self, user_id: i64, display_name: &str) -> u64 {
        let slot = match self.index.get(&user_id) {
            Some(&slot) => slot,
            None => {
                self.records.push(ScoreRecord {
                    user_id,
                    display_name: String::new(),
                    points: 0,
                });
                self.index.insert(user_id, self.records.len() - 1);
                self.records.len() - 1
            }
        };
        let record = &mut self.records[slot];
        record.display_name = display_name.to_string();
        record.points += 1;
        record.points
    }

    #[cfg(test)]
    pub fn score(&self, user_id: i64) -> u64 {
        self.index
            .get(&user_id)
            .map(|&slot| self.records[slot].points)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by points, highest first. Ties keep first-scored order.
    pub fn ranked(&self) -> Vec<&ScoreRecord> {
        let mut ranked: Vec<&ScoreRecord> = self.records.iter().collect();
        ranked.sort_by(|a, b| b.points.cmp(&a.points));
        ranked
    }

    pub fn leaderboard(&self) -> String {
        if self.is_empty() {
            return NO_SCORES_MESSAGE.to_string();
        }
        let lines: Vec<String> = self
            .ranked()
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {}: {} points", i + 1, mention(r.user_id, &r.display_name), r.points))
            .collect();
        format!("<b>Leaderboard</b>:\n{}", lines.join("\n"))
    }
}
