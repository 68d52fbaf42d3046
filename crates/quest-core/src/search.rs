use quest_db::QuestSearch;
use quest_types::api::{QuestQuery, QuestView, SortOrder};
use quest_types::models::{ALL, QuestType, WHOLE_CAMPUS};
use tracing::debug;

use crate::error::{QuestError, Result};
use crate::{Engine, validate, view};

/// Turns listing filters into a store search. Empty values and the
/// "everything" sentinels drop the filter.
pub fn to_search(query: &QuestQuery) -> Result<QuestSearch> {
    let filter = |value: &Option<String>, sentinel: &str| {
        validate::optional_text(value.as_deref()).filter(|v| v != sentinel)
    };

    let quest_type = filter(&query.quest_type, ALL)
        .map(|t| {
            t.parse::<QuestType>()
                .map_err(|e| QuestError::Validation(e.to_string()))
        })
        .transpose()?;

    Ok(QuestSearch {
        text: validate::optional_text(query.q.as_deref()),
        category: filter(&query.category, ALL),
        location: filter(&query.location, WHOLE_CAMPUS),
        quest_type,
        oldest_first: query.sort == SortOrder::Oldest,
    })
}

impl Engine {
    /// Open quests matching `query`, each joined with its publisher's
    /// nickname, avatar and rating.
    pub fn search_quests(&self, query: &QuestQuery, viewer: &str) -> Result<Vec<QuestView>> {
        let viewer = validate::email(viewer)?;
        let search = to_search(query)?;
        debug!("Searching open quests: {:?}", search);

        self.db
            .search_open_quests(&search)?
            .into_iter()
            .map(|row| view::present(row, &viewer))
            .collect()
    }

    /// Every quest `email` published or is providing for, in any status,
    /// newest first.
    pub fn list_my_quests(&self, email: &str) -> Result<Vec<QuestView>> {
        let email = validate::email(email)?;
        self.db
            .quests_involving(&email)?
            .into_iter()
            .map(|row| view::present(row, &email))
            .collect()
    }

    pub fn get_quest(&self, id: i64, viewer: &str) -> Result<QuestView> {
        let viewer = validate::email(viewer)?;
        self.quest_view(id, &viewer)
    }
}
