//! Viewer-specific projection of a quest.
//!
//! Contact details are the one piece of quest data with access control: the
//! publisher always sees their own `contact_info`; once a deal is in flight
//! each participant is handed the other side's contact, and nobody else ever
//! is.

use quest_db::models::QuestViewRow;
use quest_types::api::QuestView;
use quest_types::models::{Quest, Reputation};

use crate::error::Result;

pub fn present(row: QuestViewRow, viewer: &str) -> Result<QuestView> {
    let publisher_rating =
        Reputation::from_aggregate(row.publisher_rating_avg, row.publisher_rating_count);
    let quest = row.quest.into_quest()?;

    let counterparty_contact = counterparty_contact(&quest, viewer);
    let contact_info = (quest.publisher_email == viewer).then(|| quest.contact_info.clone());

    Ok(QuestView {
        id: quest.id,
        quest_type: quest.quest_type,
        title: quest.title,
        description: quest.description,
        reward: quest.reward,
        category: quest.category,
        location: quest.location,
        image_url: quest.image_url,
        status: quest.status,
        created_at: quest.created_at,
        publisher_email: quest.publisher_email,
        publisher_nickname: row.publisher_nickname,
        publisher_avatar: row.publisher_avatar,
        publisher_rating,
        provider_email: quest.provider_email,
        provider_nickname: row.provider_nickname,
        contact_info,
        counterparty_contact,
    })
}

/// The publisher reaches the provider by email; the provider gets the
/// publisher's contact_info, falling back to their email when none was left.
fn counterparty_contact(quest: &Quest, viewer: &str) -> Option<String> {
    if !quest.status.exposes_contact() {
        return None;
    }
    if quest.publisher_email == viewer {
        return quest.provider_email.clone();
    }
    if quest.provider_email.as_deref() == Some(viewer) {
        let contact = quest.contact_info.trim();
        return Some(if contact.is_empty() {
            quest.publisher_email.clone()
        } else {
            contact.to_string()
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use quest_types::models::{QuestStatus, QuestType};

    use super::*;

    fn quest(status: QuestStatus, contact: &str) -> Quest {
        Quest {
            id: 1,
            publisher_email: "pub@campus.edu".into(),
            provider_email: status.has_provider().then(|| "pro@campus.edu".to_string()),
            quest_type: QuestType::Offer,
            title: "Desk lamp".into(),
            description: String::new(),
            reward: "20元".into(),
            category: "二手".into(),
            location: "全校".into(),
            contact_info: contact.into(),
            image_url: None,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn contact_hidden_while_open_and_after_completion() {
        for status in [QuestStatus::Open, QuestStatus::Completed] {
            let q = quest(status, "wx: pub");
            assert_eq!(counterparty_contact(&q, "pub@campus.edu"), None);
            assert_eq!(counterparty_contact(&q, "pro@campus.edu"), None);
        }
    }

    #[test]
    fn participants_see_each_other_in_flight() {
        for status in [QuestStatus::Locked, QuestStatus::PendingReview] {
            let q = quest(status, "wx: pub");
            assert_eq!(
                counterparty_contact(&q, "pub@campus.edu").as_deref(),
                Some("pro@campus.edu")
            );
            assert_eq!(counterparty_contact(&q, "pro@campus.edu").as_deref(), Some("wx: pub"));
            assert_eq!(counterparty_contact(&q, "else@campus.edu"), None);
        }
    }

    #[test]
    fn provider_falls_back_to_publisher_email() {
        let q = quest(QuestStatus::Locked, "  ");
        assert_eq!(
            counterparty_contact(&q, "pro@campus.edu").as_deref(),
            Some("pub@campus.edu")
        );
    }
}
