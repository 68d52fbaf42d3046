//! Campus quest marketplace core.
//!
//! [`Engine`] is the one authoritative implementation of every operation:
//! profiles, the quest lifecycle, reviews, favorites, listings and the
//! per-quest discussion. Callers pass the acting user's email explicitly; the
//! engine holds no session state of its own.

pub mod discussion;
pub mod error;
pub mod favorites;
pub mod lifecycle;
pub mod profiles;
pub mod reviews;
pub mod search;
pub mod validate;
pub mod view;

use quest_db::Database;

pub use error::{QuestError, Result};

pub struct Engine {
    db: Database,
}

impl Engine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Engine over a fresh in-memory database.
    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}
