//! Database row types. These map directly to SQLite rows and are kept apart
//! from the quest-types models so the schema can evolve independently.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use quest_types::models::{
    Comment, LeaderboardEntry, PrivateMessage, Profile, Quest, QuestStatus, QuestType,
    Reputation, Review,
};

pub struct ProfileRow {
    pub email: String,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub rating_avg: Option<f64>,
    pub rating_count: i64,
}

pub struct QuestRow {
    pub id: i64,
    pub publisher_email: String,
    pub provider_email: Option<String>,
    pub quest_type: String,
    pub title: String,
    pub description: String,
    pub reward: String,
    pub category: String,
    pub location: String,
    pub contact_info: String,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: String,
}

/// A quest joined with its participants' profiles.
pub struct QuestViewRow {
    pub quest: QuestRow,
    pub publisher_nickname: Option<String>,
    pub publisher_avatar: Option<String>,
    pub publisher_rating_avg: Option<f64>,
    pub publisher_rating_count: i64,
    pub provider_nickname: Option<String>,
}

pub struct ReviewRow {
    pub id: i64,
    pub quest_id: i64,
    pub from_email: String,
    pub to_email: String,
    pub rating: i64,
    pub comment: String,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: i64,
    pub quest_id: i64,
    pub user_email: String,
    pub nickname: Option<String>,
    pub content: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub quest_id: i64,
    pub sender_email: String,
    pub content: String,
    pub created_at: String,
}

pub struct LeaderboardRow {
    pub email: String,
    pub nickname: Option<String>,
    pub task_count: i64,
    pub rating_avg: Option<f64>,
    pub rating_count: i64,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS.SSS" without timezone;
/// they are always UTC.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

impl ProfileRow {
    pub fn into_profile(self) -> Profile {
        Profile {
            rating: Reputation::from_aggregate(self.rating_avg, self.rating_count),
            created_at: parse_timestamp(&self.created_at),
            email: self.email,
            nickname: self.nickname,
            avatar_url: self.avatar_url,
        }
    }
}

impl QuestRow {
    pub fn into_quest(self) -> Result<Quest> {
        let status: QuestStatus = self
            .status
            .parse()
            .with_context(|| format!("quest {} has a corrupt status", self.id))?;
        let quest_type: QuestType = self
            .quest_type
            .parse()
            .with_context(|| format!("quest {} has a corrupt type", self.id))?;

        Ok(Quest {
            id: self.id,
            created_at: parse_timestamp(&self.created_at),
            publisher_email: self.publisher_email,
            provider_email: self.provider_email,
            quest_type,
            title: self.title,
            description: self.description,
            reward: self.reward,
            category: self.category,
            location: self.location,
            contact_info: self.contact_info,
            image_url: self.image_url,
            status,
        })
    }
}

impl ReviewRow {
    pub fn into_review(self) -> Result<Review> {
        let rating = u8::try_from(self.rating)
            .with_context(|| format!("review {} has a corrupt rating", self.id))?;
        Ok(Review {
            id: self.id,
            quest_id: self.quest_id,
            from_email: self.from_email,
            to_email: self.to_email,
            rating,
            comment: self.comment,
            created_at: parse_timestamp(&self.created_at),
        })
    }
}

impl CommentRow {
    pub fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            quest_id: self.quest_id,
            created_at: parse_timestamp(&self.created_at),
            author_email: self.user_email,
            author_nickname: self.nickname,
            content: self.content,
        }
    }
}

impl MessageRow {
    pub fn into_message(self) -> PrivateMessage {
        PrivateMessage {
            id: self.id,
            quest_id: self.quest_id,
            created_at: parse_timestamp(&self.created_at),
            sender_email: self.sender_email,
            content: self.content,
        }
    }
}

impl LeaderboardRow {
    pub fn into_entry(self, rank: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            email: self.email,
            nickname: self.nickname,
            completed_count: u32::try_from(self.task_count).unwrap_or(u32::MAX),
            rating: Reputation::from_aggregate(self.rating_avg, self.rating_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_millisecond_timestamps() {
        let ts = parse_timestamp("2026-10-17 08:30:15.250");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2026, 10, 17));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (8, 30, 15));
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn parses_plain_sqlite_timestamps() {
        let ts = parse_timestamp("2026-10-17 08:30:15");
        assert_eq!(ts.second(), 15);
    }

    #[test]
    fn corrupt_quest_status_is_an_error() {
        let row = QuestRow {
            id: 7,
            publisher_email: "a@x.edu".into(),
            provider_email: None,
            quest_type: "REQUEST".into(),
            title: "t".into(),
            description: String::new(),
            reward: String::new(),
            category: "c".into(),
            location: "全校".into(),
            contact_info: String::new(),
            image_url: None,
            status: "ARCHIVED".into(),
            created_at: "2026-10-17 08:30:15".into(),
        };
        assert!(row.into_quest().is_err());
    }
}
