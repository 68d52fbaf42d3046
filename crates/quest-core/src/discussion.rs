//! Public comments on a listing and the private channel between its two
//! participants.

use tracing::debug;

use quest_types::models::{Comment, PrivateMessage, Quest, QuestStatus};

use crate::error::{QuestError, Result};
use crate::validate::{self, MAX_CONTENT_CHARS};
use crate::Engine;

impl Engine {
    /// Any signed-in user may comment on a quest in any status.
    pub fn post_comment(&self, quest_id: i64, email: &str, content: &str) -> Result<Comment> {
        let author = validate::email(email)?;
        let content = validate::required_text("content", content, MAX_CONTENT_CHARS)?;
        self.load_quest(quest_id)?;
        self.provision(&author)?;

        let row = self.db.insert_comment(quest_id, &author, &content)?;
        debug!("Comment {} on quest {} by {}", row.id, quest_id, author);
        Ok(row.into_comment())
    }

    /// Comments on a quest, oldest first.
    pub fn list_comments(&self, quest_id: i64) -> Result<Vec<Comment>> {
        self.load_quest(quest_id)?;
        Ok(self
            .db
            .comments_for(quest_id)?
            .into_iter()
            .map(|row| row.into_comment())
            .collect())
    }

    pub fn post_message(
        &self,
        quest_id: i64,
        email: &str,
        content: &str,
    ) -> Result<PrivateMessage> {
        let sender = validate::email(email)?;
        let content = validate::required_text("content", content, MAX_CONTENT_CHARS)?;
        let quest = self.load_quest(quest_id)?;
        ensure_channel_member(&quest, &sender)?;

        let row = self.db.insert_message(quest_id, &sender, &content)?;
        debug!("Private message {} on quest {} by {}", row.id, quest_id, sender);
        Ok(row.into_message())
    }

    /// Private messages on a quest, oldest first. Participants only.
    pub fn list_messages(&self, quest_id: i64, email: &str) -> Result<Vec<PrivateMessage>> {
        let reader = validate::email(email)?;
        let quest = self.load_quest(quest_id)?;
        ensure_channel_member(&quest, &reader)?;

        Ok(self
            .db
            .messages_for(quest_id)?
            .into_iter()
            .map(|row| row.into_message())
            .collect())
    }

    fn load_quest(&self, id: i64) -> Result<Quest> {
        let row = self
            .db
            .get_quest(id)?
            .ok_or_else(|| QuestError::quest_not_found(id))?;
        Ok(row.into_quest()?)
    }
}

/// The channel opens once a provider is assigned and is closed to everyone
/// except the two participants.
fn ensure_channel_member(quest: &Quest, email: &str) -> Result<()> {
    if !quest.is_participant(email) {
        return Err(QuestError::PermissionDenied(format!(
            "only participants of quest {} can use its private messages",
            quest.id
        )));
    }
    if quest.status == QuestStatus::Open {
        return Err(QuestError::InvalidState {
            expected: QuestStatus::Locked,
            actual: quest.status,
        });
    }
    Ok(())
}
