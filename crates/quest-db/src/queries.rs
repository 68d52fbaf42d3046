use crate::Database;
use crate::models::{
    CommentRow, LeaderboardRow, MessageRow, ProfileRow, QuestRow, QuestViewRow, ReviewRow,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tracing::debug;

use quest_types::models::{QuestStatus, QuestType};

macro_rules! quest_columns {
    () => {
        "q.id, q.publisher_email, q.provider_email, q.type, q.title, q.description, q.reward,
         q.category, q.location, q.contact_info, q.image_url, q.status, q.created_at"
    };
}

/// Quest joined with publisher/provider profiles and the publisher's received ratings.
const VIEW_SELECT: &str = concat!(
    "SELECT ",
    quest_columns!(),
    ", p1.nickname, p1.avatar_url,
       (SELECT AVG(rating) FROM reviews WHERE to_email = q.publisher_email),
       (SELECT COUNT(*) FROM reviews WHERE to_email = q.publisher_email),
       p2.nickname
     FROM quests q
     LEFT JOIN profiles p1 ON p1.email = q.publisher_email
     LEFT JOIN profiles p2 ON p2.email = q.provider_email"
);

const PROFILE_SELECT: &str = "SELECT p.email, p.nickname, p.avatar_url, p.created_at,
       (SELECT AVG(rating) FROM reviews WHERE to_email = p.email),
       (SELECT COUNT(*) FROM reviews WHERE to_email = p.email)
     FROM profiles p";

const REVIEW_COLUMNS: &str = "id, quest_id, from_email, to_email, rating, comment, created_at";

/// Who a conditional quest update must be issued by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorGuard<'a> {
    Publisher(&'a str),
    NotPublisher(&'a str),
    Provider(&'a str),
}

impl ActorGuard<'_> {
    fn clause(&self, placeholder: &str) -> String {
        match self {
            Self::Publisher(_) => format!("publisher_email = {placeholder}"),
            Self::NotPublisher(_) => format!("publisher_email <> {placeholder}"),
            Self::Provider(_) => format!("provider_email = {placeholder}"),
        }
    }

    fn email(&self) -> &str {
        match self {
            Self::Publisher(e) | Self::NotPublisher(e) | Self::Provider(e) => e,
        }
    }
}

/// Result of a favorite toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOutcome {
    Added,
    Removed,
    QuestMissing,
}

/// Result of an insert guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    Duplicate,
}

pub struct NewQuest<'a> {
    pub publisher_email: &'a str,
    pub quest_type: QuestType,
    pub title: &'a str,
    pub description: &'a str,
    pub reward: &'a str,
    pub category: &'a str,
    pub location: &'a str,
    pub contact_info: &'a str,
    pub image_url: Option<&'a str>,
}

/// Exact-match filters plus a case-insensitive substring on title/description.
/// Always restricted to open quests.
#[derive(Debug, Clone, Default)]
pub struct QuestSearch {
    pub text: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub quest_type: Option<QuestType>,
    pub oldest_first: bool,
}

impl Database {
    // -- Profiles --

    /// Inserts a profile unless one exists. Returns true if a row was created.
    pub fn ensure_profile(&self, email: &str, nickname: &str) -> Result<bool> {
        self.with_conn(|conn| insert_profile_if_missing(conn, email, nickname))
    }

    pub fn get_profile(&self, email: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!("{PROFILE_SELECT} WHERE p.email = ?1");
            let row = conn
                .query_row(&sql, [email], |row| {
                    Ok(ProfileRow {
                        email: row.get(0)?,
                        nickname: row.get(1)?,
                        avatar_url: row.get(2)?,
                        created_at: row.get(3)?,
                        rating_avg: row.get(4)?,
                        rating_count: row.get(5)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Overwrites only the fields that are `Some`. For `avatar_url`,
    /// `Some(None)` clears the stored value. Returns false if no such profile.
    pub fn update_profile(
        &self,
        email: &str,
        nickname: Option<&str>,
        avatar_url: Option<Option<&str>>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE profiles
                 SET nickname = COALESCE(?1, nickname),
                     avatar_url = CASE WHEN ?2 THEN ?3 ELSE avatar_url END
                 WHERE email = ?4",
                params![nickname, avatar_url.is_some(), avatar_url.flatten(), email],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn rating_for(&self, email: &str) -> Result<(Option<f64>, i64)> {
        self.with_conn(|conn| {
            let agg = conn.query_row(
                "SELECT AVG(rating), COUNT(*) FROM reviews WHERE to_email = ?1",
                [email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(agg)
        })
    }

    // -- Quests --

    /// Creates the publisher's profile if needed and inserts the quest as OPEN,
    /// both in one transaction. Returns the new quest id.
    pub fn insert_quest(&self, quest: &NewQuest<'_>, default_nickname: &str) -> Result<i64> {
        self.with_tx(|tx| {
            insert_profile_if_missing(tx, quest.publisher_email, default_nickname)?;
            tx.execute(
                "INSERT INTO quests
                    (publisher_email, type, title, description, reward, category, location,
                     contact_info, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    quest.publisher_email,
                    quest.quest_type.as_str(),
                    quest.title,
                    quest.description,
                    quest.reward,
                    quest.category,
                    quest.location,
                    quest.contact_info,
                    quest.image_url,
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn get_quest(&self, id: i64) -> Result<Option<QuestRow>> {
        self.with_conn(|conn| {
            let sql = concat!("SELECT ", quest_columns!(), " FROM quests q WHERE q.id = ?1");
            let row = conn.query_row(sql, [id], quest_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_quest_view(&self, id: i64) -> Result<Option<QuestViewRow>> {
        self.with_conn(|conn| {
            let sql = format!("{VIEW_SELECT} WHERE q.id = ?1");
            let row = conn.query_row(&sql, [id], view_from_row).optional()?;
            Ok(row)
        })
    }

    /// Moves a quest from `from` to `to` in one conditional statement, only if
    /// it is still in `from` and the guard holds. Entering OPEN clears the
    /// provider; leaving OPEN assigns the guarded actor as provider.
    ///
    /// Returns false when nothing matched (missing quest, lost race, wrong
    /// state or wrong actor).
    pub fn swap_status(
        &self,
        id: i64,
        from: QuestStatus,
        to: QuestStatus,
        guard: ActorGuard<'_>,
    ) -> Result<bool> {
        let provider = if to == QuestStatus::Open {
            "NULL"
        } else if from == QuestStatus::Open {
            "?4"
        } else {
            "provider_email"
        };
        let sql = format!(
            "UPDATE quests SET status = ?2, provider_email = {provider}
             WHERE id = ?1 AND status = ?3 AND {}",
            guard.clause("?4")
        );

        self.with_conn(|conn| {
            let changed = conn.execute(
                &sql,
                params![id, to.as_str(), from.as_str(), guard.email()],
            )?;
            debug!("swap_status quest={} {}->{} matched={}", id, from, to, changed);
            Ok(changed == 1)
        })
    }

    /// Deletes a quest only if it is in `from` and the guard holds.
    ///
    /// `None` means nothing matched; `Some(provider)` carries the provider
    /// that was assigned at the moment of deletion.
    pub fn delete_quest(
        &self,
        id: i64,
        from: QuestStatus,
        guard: ActorGuard<'_>,
    ) -> Result<Option<Option<String>>> {
        let sql = format!(
            "DELETE FROM quests WHERE id = ?1 AND status = ?2 AND {} RETURNING provider_email",
            guard.clause("?3")
        );

        self.with_conn(|conn| {
            let removed = conn
                .query_row(&sql, params![id, from.as_str(), guard.email()], |row| {
                    row.get::<_, Option<String>>(0)
                })
                .optional()?;
            Ok(removed)
        })
    }

    pub fn search_open_quests(&self, search: &QuestSearch) -> Result<Vec<QuestViewRow>> {
        let mut sql = format!("{VIEW_SELECT} WHERE q.status = 'OPEN'");
        let mut args: Vec<String> = Vec::new();

        if let Some(text) = &search.text {
            args.push(format!("%{}%", escape_like(&text.to_lowercase())));
            let n = args.len();
            sql.push_str(&format!(
                " AND (fold_case(q.title) LIKE ?{n} ESCAPE '\\'
                       OR fold_case(q.description) LIKE ?{n} ESCAPE '\\')"
            ));
        }
        if let Some(category) = &search.category {
            args.push(category.clone());
            sql.push_str(&format!(" AND q.category = ?{}", args.len()));
        }
        if let Some(location) = &search.location {
            args.push(location.clone());
            sql.push_str(&format!(" AND q.location = ?{}", args.len()));
        }
        if let Some(quest_type) = search.quest_type {
            args.push(quest_type.as_str().to_string());
            sql.push_str(&format!(" AND q.type = ?{}", args.len()));
        }
        sql.push_str(if search.oldest_first {
            " ORDER BY q.created_at ASC, q.id ASC"
        } else {
            " ORDER BY q.created_at DESC, q.id DESC"
        });

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), view_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every quest the user published or provides for, newest first.
    pub fn quests_involving(&self, email: &str) -> Result<Vec<QuestViewRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{VIEW_SELECT}
                 WHERE q.publisher_email = ?1 OR q.provider_email = ?1
                 ORDER BY q.created_at DESC, q.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([email], view_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Providers ranked by completed quests. Ratings only count reviews the
    /// provider received on those completed quests.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT q.provider_email, p.nickname, COUNT(DISTINCT q.id) AS task_count,
                        AVG(r.rating), COUNT(r.id)
                 FROM quests q
                 LEFT JOIN reviews r ON r.quest_id = q.id AND r.to_email = q.provider_email
                 LEFT JOIN profiles p ON p.email = q.provider_email
                 WHERE q.status = 'COMPLETED'
                 GROUP BY q.provider_email, p.nickname
                 ORDER BY task_count DESC, q.provider_email ASC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit as i64], |row| {
                    Ok(LeaderboardRow {
                        email: row.get(0)?,
                        nickname: row.get(1)?,
                        task_count: row.get(2)?,
                        rating_avg: row.get(3)?,
                        rating_count: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Reviews --

    /// Inserts a review; a second review for the same (quest, rater) pair is
    /// reported as `Duplicate` rather than as an error.
    pub fn insert_review(
        &self,
        quest_id: i64,
        from_email: &str,
        to_email: &str,
        rating: u8,
        comment: &str,
    ) -> Result<InsertOutcome> {
        self.with_conn(|conn| {
            let res = conn.execute(
                "INSERT INTO reviews (quest_id, from_email, to_email, rating, comment)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![quest_id, from_email, to_email, rating, comment],
            );
            match res {
                Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(InsertOutcome::Duplicate)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_review(&self, id: i64) -> Result<Option<ReviewRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1");
            let row = conn.query_row(&sql, [id], review_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn reviews_received(&self, email: &str) -> Result<Vec<ReviewRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews WHERE to_email = ?1
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([email], review_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Favorites --

    /// Toggle a favorite: removes if present, inserts if not. The insert only
    /// happens if the quest still exists, checked in the same transaction.
    pub fn toggle_favorite(&self, user_email: &str, quest_id: i64) -> Result<FavoriteOutcome> {
        self.with_tx(|tx| {
            let removed = tx.execute(
                "DELETE FROM favorites WHERE user_email = ?1 AND quest_id = ?2",
                params![user_email, quest_id],
            )?;
            if removed > 0 {
                return Ok(FavoriteOutcome::Removed);
            }
            let inserted = tx.execute(
                "INSERT INTO favorites (user_email, quest_id)
                 SELECT ?1, id FROM quests WHERE id = ?2",
                params![user_email, quest_id],
            )?;
            Ok(if inserted == 1 {
                FavoriteOutcome::Added
            } else {
                FavoriteOutcome::QuestMissing
            })
        })
    }

    pub fn favorite_ids(&self, user_email: &str) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT quest_id FROM favorites WHERE user_email = ?1 ORDER BY quest_id",
            )?;
            let ids = stmt
                .query_map([user_email], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        quest_id: i64,
        user_email: &str,
        content: &str,
    ) -> Result<CommentRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO quest_comments (quest_id, user_email, content) VALUES (?1, ?2, ?3)",
                params![quest_id, user_email, content],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                "SELECT c.id, c.quest_id, c.user_email, p.nickname, c.content, c.created_at
                 FROM quest_comments c LEFT JOIN profiles p ON p.email = c.user_email
                 WHERE c.id = ?1",
                [id],
                comment_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn comments_for(&self, quest_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.quest_id, c.user_email, p.nickname, c.content, c.created_at
                 FROM quest_comments c LEFT JOIN profiles p ON p.email = c.user_email
                 WHERE c.quest_id = ?1
                 ORDER BY c.created_at ASC, c.id ASC",
            )?;
            let rows = stmt
                .query_map([quest_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Private messages --

    pub fn insert_message(
        &self,
        quest_id: i64,
        sender_email: &str,
        content: &str,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO private_messages (quest_id, sender_email, content)
                 VALUES (?1, ?2, ?3)
                 RETURNING id, quest_id, sender_email, content, created_at",
                params![quest_id, sender_email, content],
                message_from_row,
            )?;
            Ok(row)
        })
    }

    pub fn messages_for(&self, quest_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, quest_id, sender_email, content, created_at
                 FROM private_messages WHERE quest_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map([quest_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn insert_profile_if_missing(conn: &Connection, email: &str, nickname: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO profiles (email, nickname) VALUES (?1, ?2)",
        params![email, nickname],
    )?;
    Ok(inserted == 1)
}

/// Escapes LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn quest_from_row(row: &Row<'_>) -> rusqlite::Result<QuestRow> {
    Ok(QuestRow {
        id: row.get(0)?,
        publisher_email: row.get(1)?,
        provider_email: row.get(2)?,
        quest_type: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        reward: row.get(6)?,
        category: row.get(7)?,
        location: row.get(8)?,
        contact_info: row.get(9)?,
        image_url: row.get(10)?,
        status: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<QuestViewRow> {
    Ok(QuestViewRow {
        quest: quest_from_row(row)?,
        publisher_nickname: row.get(13)?,
        publisher_avatar: row.get(14)?,
        publisher_rating_avg: row.get(15)?,
        publisher_rating_count: row.get(16)?,
        provider_nickname: row.get(17)?,
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        quest_id: row.get(1)?,
        from_email: row.get(2)?,
        to_email: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        quest_id: row.get(1)?,
        user_email: row.get(2)?,
        nickname: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        quest_id: row.get(1)?,
        sender_email: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUB: &str = "pub@campus.edu";
    const PRO: &str = "pro@campus.edu";

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn quest<'a>(title: &'a str, category: &'a str, location: &'a str) -> NewQuest<'a> {
        NewQuest {
            publisher_email: PUB,
            quest_type: QuestType::Request,
            title,
            description: "",
            reward: "奶茶",
            category,
            location,
            contact_info: "wx: pub",
            image_url: None,
        }
    }

    fn publish(db: &Database, title: &str) -> i64 {
        db.insert_quest(&quest(title, "跑腿", "全校"), "同学1").unwrap()
    }

    fn status_of(db: &Database, id: i64) -> String {
        db.get_quest(id).unwrap().unwrap().status
    }

    #[test]
    fn insert_quest_provisions_publisher() {
        let db = db();
        let id = publish(&db, "Pick up parcel");

        let profile = db.get_profile(PUB).unwrap().unwrap();
        assert_eq!(profile.nickname, "同学1");

        let row = db.get_quest(id).unwrap().unwrap();
        assert_eq!(row.status, "OPEN");
        assert!(row.provider_email.is_none());
    }

    #[test]
    fn swap_status_only_matches_expected_state() {
        let db = db();
        let id = publish(&db, "Pick up parcel");
        db.ensure_profile(PRO, "pro").unwrap();

        let from_open = ActorGuard::NotPublisher(PRO);
        assert!(db.swap_status(id, QuestStatus::Open, QuestStatus::Locked, from_open).unwrap());
        assert_eq!(db.get_quest(id).unwrap().unwrap().provider_email.as_deref(), Some(PRO));

        // Second accept finds the quest no longer OPEN.
        assert!(!db.swap_status(id, QuestStatus::Open, QuestStatus::Locked, from_open).unwrap());
        assert_eq!(status_of(&db, id), "LOCKED");
    }

    #[test]
    fn swap_status_respects_actor_guard() {
        let db = db();
        let id = publish(&db, "Pick up parcel");

        // Publisher cannot take their own quest.
        let own = ActorGuard::NotPublisher(PUB);
        assert!(!db.swap_status(id, QuestStatus::Open, QuestStatus::Locked, own).unwrap());

        db.ensure_profile(PRO, "pro").unwrap();
        db.swap_status(id, QuestStatus::Open, QuestStatus::Locked, ActorGuard::NotPublisher(PRO))
            .unwrap();

        let stranger = ActorGuard::Provider("x@campus.edu");
        assert!(!db.swap_status(id, QuestStatus::Locked, QuestStatus::Open, stranger).unwrap());

        let provider = ActorGuard::Provider(PRO);
        assert!(db.swap_status(id, QuestStatus::Locked, QuestStatus::Open, provider).unwrap());
        let row = db.get_quest(id).unwrap().unwrap();
        assert_eq!(row.status, "OPEN");
        assert!(row.provider_email.is_none());
    }

    #[test]
    fn delete_reports_displaced_provider() {
        let db = db();
        let id = publish(&db, "Pick up parcel");
        db.ensure_profile(PRO, "pro").unwrap();
        db.swap_status(id, QuestStatus::Open, QuestStatus::Locked, ActorGuard::NotPublisher(PRO))
            .unwrap();

        assert_eq!(
            db.delete_quest(id, QuestStatus::Open, ActorGuard::Publisher(PUB)).unwrap(),
            None
        );
        assert_eq!(
            db.delete_quest(id, QuestStatus::Locked, ActorGuard::Publisher(PUB)).unwrap(),
            Some(Some(PRO.to_string()))
        );
        assert!(db.get_quest(id).unwrap().is_none());
    }

    #[test]
    fn duplicate_review_is_an_outcome_not_an_error() {
        let db = db();
        let id = publish(&db, "Pick up parcel");

        let first = db.insert_review(id, PUB, PRO, 5, "great").unwrap();
        assert!(matches!(first, InsertOutcome::Inserted(_)));
        let second = db.insert_review(id, PUB, PRO, 4, "again").unwrap();
        assert_eq!(second, InsertOutcome::Duplicate);

        assert_eq!(db.reviews_received(PRO).unwrap().len(), 1);
    }

    #[test]
    fn out_of_range_rating_is_rejected_by_schema() {
        let db = db();
        let id = publish(&db, "Pick up parcel");
        assert!(db.insert_review(id, PUB, PRO, 6, "").is_err());
    }

    #[test]
    fn search_escapes_like_wildcards() {
        let db = db();
        publish(&db, "100% cotton shirt");
        publish(&db, "1000 cotton shirts");

        let search = QuestSearch {
            text: Some("100%".into()),
            ..Default::default()
        };
        let rows = db.search_open_quests(&search).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quest.title, "100% cotton shirt");
    }

    #[test]
    fn search_filters_and_sorts() {
        let db = db();
        let a = db.insert_quest(&quest("Math tutor", "学习", "城北校区"), "n").unwrap();
        let b = db.insert_quest(&quest("math notes", "学习", "忠山校区"), "n").unwrap();
        let c = db.insert_quest(&quest("Errand", "跑腿", "城北校区"), "n").unwrap();

        let text = QuestSearch {
            text: Some("MATH".into()),
            ..Default::default()
        };
        let ids: Vec<i64> = db
            .search_open_quests(&text)
            .unwrap()
            .iter()
            .map(|r| r.quest.id)
            .collect();
        assert_eq!(ids, vec![b, a]);

        let north = QuestSearch {
            location: Some("城北校区".into()),
            oldest_first: true,
            ..Default::default()
        };
        let ids: Vec<i64> = db
            .search_open_quests(&north)
            .unwrap()
            .iter()
            .map(|r| r.quest.id)
            .collect();
        assert_eq!(ids, vec![a, c]);

        let offers = QuestSearch {
            quest_type: Some(QuestType::Offer),
            ..Default::default()
        };
        assert!(db.search_open_quests(&offers).unwrap().is_empty());
    }

    #[test]
    fn toggle_favorite_flips_membership() {
        let db = db();
        let id = publish(&db, "Pick up parcel");

        assert_eq!(db.toggle_favorite(PRO, id).unwrap(), FavoriteOutcome::Added);
        assert_eq!(db.favorite_ids(PRO).unwrap(), vec![id]);
        assert_eq!(db.toggle_favorite(PRO, id).unwrap(), FavoriteOutcome::Removed);
        assert!(db.favorite_ids(PRO).unwrap().is_empty());
    }

    #[test]
    fn toggle_favorite_on_deleted_quest_reports_missing() {
        let db = db();
        let id = publish(&db, "Pick up parcel");
        db.delete_quest(id, QuestStatus::Open, ActorGuard::Publisher(PUB)).unwrap();

        assert_eq!(db.toggle_favorite(PRO, id).unwrap(), FavoriteOutcome::QuestMissing);
        assert_eq!(db.toggle_favorite(PRO, 999).unwrap(), FavoriteOutcome::QuestMissing);
        assert!(db.favorite_ids(PRO).unwrap().is_empty());
    }

    #[test]
    fn search_folds_unicode_case() {
        let db = db();
        let fullwidth = publish(&db, "ＰＹＴＨＯＮ 辅导");
        let accented = db
            .insert_quest(
                &NewQuest {
                    description: "Ünïcode ПРИВЕТ",
                    ..quest("Sprachkurs", "学习", "全校")
                },
                "n",
            )
            .unwrap();
        publish(&db, "Rust 辅导");

        let hits = |needle: &str| -> Vec<i64> {
            let search = QuestSearch {
                text: Some(needle.into()),
                ..Default::default()
            };
            db.search_open_quests(&search)
                .unwrap()
                .iter()
                .map(|r| r.quest.id)
                .collect()
        };
        assert_eq!(hits("ｐｙｔｈｏｎ"), vec![fullwidth]);
        assert_eq!(hits("ünïcode"), vec![accented]);
        assert_eq!(hits("привет"), vec![accented]);
        assert_eq!(hits("ÜNÏCODE"), vec![accented]);
    }

    #[test]
    fn deleting_quest_cascades_to_favorites_and_discussion() {
        let db = db();
        let id = publish(&db, "Pick up parcel");
        db.toggle_favorite(PRO, id).unwrap();
        db.insert_comment(id, PRO, "still available?").unwrap();
        db.insert_message(id, PUB, "hi").unwrap();

        db.delete_quest(id, QuestStatus::Open, ActorGuard::Publisher(PUB)).unwrap();

        assert!(db.favorite_ids(PRO).unwrap().is_empty());
        assert!(db.comments_for(id).unwrap().is_empty());
        assert!(db.messages_for(id).unwrap().is_empty());
    }

    #[test]
    fn update_profile_keeps_unspecified_fields() {
        let db = db();
        db.ensure_profile(PUB, "old").unwrap();
        db.update_profile(PUB, None, Some(Some("https://img/a.png"))).unwrap();

        let row = db.get_profile(PUB).unwrap().unwrap();
        assert_eq!(row.nickname, "old");
        assert_eq!(row.avatar_url.as_deref(), Some("https://img/a.png"));

        db.update_profile(PUB, Some("new"), None).unwrap();
        let row = db.get_profile(PUB).unwrap().unwrap();
        assert_eq!(row.avatar_url.as_deref(), Some("https://img/a.png"));

        db.update_profile(PUB, None, Some(None)).unwrap();
        let row = db.get_profile(PUB).unwrap().unwrap();
        assert_eq!(row.nickname, "new");
        assert_eq!(row.avatar_url, None);
    }
}
