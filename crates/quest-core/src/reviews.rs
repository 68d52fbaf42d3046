use anyhow::anyhow;
use tracing::info;

use quest_db::InsertOutcome;
use quest_types::models::{LeaderboardEntry, QuestStatus, Review};

use crate::error::{QuestError, Result};
use crate::validate::{self, MAX_CONTENT_CHARS};
use crate::Engine;

pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;
pub const MAX_LEADERBOARD_SIZE: usize = 50;

impl Engine {
    /// Records `from_email`'s rating of the other participant of a completed
    /// quest. Each participant may review a quest once.
    pub fn submit_review(
        &self,
        quest_id: i64,
        from_email: &str,
        to_email: Option<&str>,
        rating: i64,
        comment: &str,
    ) -> Result<Review> {
        let to_email = to_email
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(QuestError::MissingTarget)?;
        let from = validate::email(from_email)?;
        let to = validate::email(to_email)?;
        if !(1..=5).contains(&rating) {
            return Err(QuestError::Validation(format!(
                "rating must be an integer from 1 to 5, got {rating}"
            )));
        }
        let comment = validate::bounded_text("comment", comment, MAX_CONTENT_CHARS)?;

        let quest = self
            .db
            .get_quest(quest_id)?
            .ok_or_else(|| QuestError::quest_not_found(quest_id))?
            .into_quest()?;
        if quest.status != QuestStatus::Completed {
            return Err(QuestError::InvalidState {
                expected: QuestStatus::Completed,
                actual: quest.status,
            });
        }
        if quest.counterparty_of(&from) != Some(to.as_str()) {
            return Err(QuestError::PermissionDenied(format!(
                "only the two participants of quest {quest_id} may review each other"
            )));
        }

        let id = match self
            .db
            .insert_review(quest_id, &from, &to, rating as u8, &comment)?
        {
            InsertOutcome::Inserted(id) => id,
            InsertOutcome::Duplicate => return Err(QuestError::DuplicateReview),
        };

        info!("Review {} on quest {}: {} rated {} {}/5", id, quest_id, from, to, rating);
        let row = self
            .db
            .get_review(id)?
            .ok_or_else(|| anyhow!("review {} missing after insert", id))?;
        Ok(row.into_review()?)
    }

    /// Reviews `email` has received, newest first.
    pub fn list_reviews(&self, email: &str) -> Result<Vec<Review>> {
        let email = validate::email(email)?;
        self.db
            .reviews_received(&email)?
            .into_iter()
            .map(|row| row.into_review().map_err(QuestError::from))
            .collect()
    }

    /// Providers ranked by number of completed quests, then by email. `limit`
    /// is clamped to `1..=MAX_LEADERBOARD_SIZE`.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let limit = limit.clamp(1, MAX_LEADERBOARD_SIZE);
        let rows = self.db.leaderboard(limit)?;
        Ok(rows
            .into_iter()
            .zip(1u32..)
            .map(|(row, rank)| row.into_entry(rank))
            .collect())
    }
}
