use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel filter value meaning "any category" / "any type".
pub const ALL: &str = "全部";

/// Sentinel location meaning "anywhere on campus". Also the default location
/// of a quest published without one.
pub const WHOLE_CAMPUS: &str = "全校";

pub const MAX_NICKNAME_CHARS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Lifecycle status of a quest. Stored as the upper-case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    Open,
    Locked,
    PendingReview,
    Completed,
}

impl QuestStatus {
    pub const ALL: [QuestStatus; 4] = [
        QuestStatus::Open,
        QuestStatus::Locked,
        QuestStatus::PendingReview,
        QuestStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Locked => "LOCKED",
            Self::PendingReview => "PENDING_REVIEW",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// A quest has a provider in every state except `OPEN`.
    pub fn has_provider(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Contact details are handed to the counterparty only while a deal is in flight.
    pub fn exposes_contact(self) -> bool {
        matches!(self, Self::Locked | Self::PendingReview)
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "LOCKED" => Ok(Self::Locked),
            "PENDING_REVIEW" => Ok(Self::PendingReview),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(ParseEnumError {
                kind: "quest status",
                value: other.to_string(),
            }),
        }
    }
}

/// Whether the publisher is asking for help or offering something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestType {
    Request,
    Offer,
}

impl QuestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Offer => "OFFER",
        }
    }
}

impl fmt::Display for QuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUEST" => Ok(Self::Request),
            "OFFER" => Ok(Self::Offer),
            other => Err(ParseEnumError {
                kind: "quest type",
                value: other.to_string(),
            }),
        }
    }
}

/// Aggregate of the ratings a user has received.
///
/// "No reviews yet" is its own state and is never reported as a zero score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Reputation {
    Unrated,
    Rated { average: f64, reviews: u32 },
}

impl Reputation {
    /// Builds the aggregate from a SQL `AVG` / `COUNT` pair, rounding the
    /// average to one decimal place.
    pub fn from_aggregate(average: Option<f64>, count: i64) -> Self {
        match average {
            Some(avg) if count > 0 => Self::Rated {
                average: (avg * 10.0).round() / 10.0,
                reviews: u32::try_from(count).unwrap_or(u32::MAX),
            },
            _ => Self::Unrated,
        }
    }

    pub fn average(&self) -> Option<f64> {
        match self {
            Self::Unrated => None,
            Self::Rated { average, .. } => Some(*average),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub rating: Reputation,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: i64,
    pub publisher_email: String,
    pub provider_email: Option<String>,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub title: String,
    pub description: String,
    pub reward: String,
    pub category: String,
    pub location: String,
    pub contact_info: String,
    pub image_url: Option<String>,
    pub status: QuestStatus,
    pub created_at: DateTime<Utc>,
}

impl Quest {
    pub fn is_participant(&self, email: &str) -> bool {
        self.publisher_email == email || self.provider_email.as_deref() == Some(email)
    }

    /// The other side of the deal, seen from `email`.
    pub fn counterparty_of(&self, email: &str) -> Option<&str> {
        if self.publisher_email == email {
            self.provider_email.as_deref()
        } else if self.provider_email.as_deref() == Some(email) {
            Some(&self.publisher_email)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub quest_id: i64,
    pub from_email: String,
    pub to_email: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Public remark left on a quest listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub quest_id: i64,
    pub author_email: String,
    pub author_nickname: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Message exchanged between the publisher and provider of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub id: i64,
    pub quest_id: i64,
    pub sender_email: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub email: String,
    pub nickname: Option<String>,
    pub completed_count: u32,
    pub rating: Reputation,
}
