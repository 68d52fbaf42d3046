use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE profiles (
                email       TEXT PRIMARY KEY,
                nickname    TEXT NOT NULL,
                avatar_url  TEXT,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE TABLE quests (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                publisher_email TEXT NOT NULL REFERENCES profiles(email),
                provider_email  TEXT REFERENCES profiles(email),
                type            TEXT NOT NULL CHECK (type IN ('REQUEST', 'OFFER')),
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                reward          TEXT NOT NULL DEFAULT '',
                category        TEXT NOT NULL,
                location        TEXT NOT NULL DEFAULT '全校',
                contact_info    TEXT NOT NULL DEFAULT '',
                image_url       TEXT,
                status          TEXT NOT NULL DEFAULT 'OPEN'
                                CHECK (status IN ('OPEN', 'LOCKED', 'PENDING_REVIEW', 'COMPLETED')),
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                CHECK ((provider_email IS NULL) = (status = 'OPEN'))
            );

            CREATE INDEX idx_quests_status_created ON quests(status, created_at);
            CREATE INDEX idx_quests_publisher ON quests(publisher_email);
            CREATE INDEX idx_quests_provider ON quests(provider_email);

            CREATE TABLE reviews (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                quest_id    INTEGER NOT NULL REFERENCES quests(id) ON DELETE CASCADE,
                from_email  TEXT NOT NULL,
                to_email    TEXT NOT NULL,
                rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment     TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                UNIQUE(quest_id, from_email)
            );

            CREATE INDEX idx_reviews_to ON reviews(to_email);

            CREATE TABLE favorites (
                user_email  TEXT NOT NULL,
                quest_id    INTEGER NOT NULL REFERENCES quests(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                PRIMARY KEY (user_email, quest_id)
            );

            CREATE TABLE quest_comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                quest_id    INTEGER NOT NULL REFERENCES quests(id) ON DELETE CASCADE,
                user_email  TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE INDEX idx_comments_quest ON quest_comments(quest_id, created_at);

            CREATE TABLE private_messages (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                quest_id     INTEGER NOT NULL REFERENCES quests(id) ON DELETE CASCADE,
                sender_email TEXT NOT NULL,
                content      TEXT NOT NULL,
                created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE INDEX idx_private_messages_quest ON private_messages(quest_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
