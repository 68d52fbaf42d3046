use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{QuestStatus, QuestType, Reputation};

// -- Identity --

/// Claims carried by the identity provider's bearer token. `sub` holds the
/// verified email unless a separate `email` claim is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
}

impl Claims {
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.sub)
    }
}

// -- Profiles --

/// Partial profile update. An absent field leaves the stored value alone.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

// -- Quests --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishQuestRequest {
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reward: String,
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

/// Filters for the open-quest listing. `全部` / `全校` mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub quest_type: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelQuery {
    #[serde(default)]
    pub force: bool,
}

/// A quest as shown to one particular viewer.
///
/// `contact_info` is only filled for the publisher. `counterparty_contact` is
/// filled for either participant while the deal is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestView {
    pub id: i64,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub title: String,
    pub description: String,
    pub reward: String,
    pub category: String,
    pub location: String,
    pub image_url: Option<String>,
    pub status: QuestStatus,
    pub created_at: DateTime<Utc>,
    pub publisher_email: String,
    pub publisher_nickname: Option<String>,
    pub publisher_avatar: Option<String>,
    pub publisher_rating: Reputation,
    pub provider_email: Option<String>,
    pub provider_nickname: Option<String>,
    pub contact_info: Option<String>,
    pub counterparty_contact: Option<String>,
}

// -- Reviews --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitReviewRequest {
    #[serde(default)]
    pub to_email: Option<String>,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

// -- Favorites --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleFavoriteRequest {
    pub quest_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleFavoriteResponse {
    pub quest_id: i64,
    pub is_favorited: bool,
}

// -- Discussion --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostContentRequest {
    pub content: String,
}

// -- Leaderboard --

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}
