use tracing::debug;

use quest_db::FavoriteOutcome;

use crate::error::{QuestError, Result};
use crate::{Engine, validate};

/// What a toggle did to the (user, quest) membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
}

impl FavoriteToggle {
    pub fn is_favorited(self) -> bool {
        matches!(self, Self::Added)
    }
}

impl Engine {
    /// Flips whether `user_email` has favorited the quest. Works in any
    /// lifecycle status.
    pub fn toggle_favorite(&self, user_email: &str, quest_id: i64) -> Result<FavoriteToggle> {
        let user = validate::email(user_email)?;
        let toggle = match self.db.toggle_favorite(&user, quest_id)? {
            FavoriteOutcome::Added => FavoriteToggle::Added,
            FavoriteOutcome::Removed => FavoriteToggle::Removed,
            FavoriteOutcome::QuestMissing => return Err(QuestError::quest_not_found(quest_id)),
        };
        debug!("Favorite {} / quest {}: {:?}", user, quest_id, toggle);
        Ok(toggle)
    }

    pub fn list_favorite_ids(&self, user_email: &str) -> Result<Vec<i64>> {
        let user = validate::email(user_email)?;
        Ok(self.db.favorite_ids(&user)?)
    }
}
