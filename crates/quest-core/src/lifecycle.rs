use anyhow::anyhow;
use tracing::{info, warn};

use quest_db::ActorGuard;
use quest_db::queries::NewQuest;
use quest_types::api::{PublishQuestRequest, QuestView};
use quest_types::lifecycle::{self, Action, ActorRule, Target};
use quest_types::models::WHOLE_CAMPUS;

use crate::error::{QuestError, Result};
use crate::profiles::default_nickname;
use crate::validate::{self, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};
use crate::{Engine, view};

const MAX_SHORT_FIELD_CHARS: usize = 100;

impl Engine {
    /// Creates an OPEN quest owned by `email`, provisioning the publisher's
    /// profile in the same transaction.
    pub fn publish_quest(&self, email: &str, req: PublishQuestRequest) -> Result<QuestView> {
        let publisher = validate::email(email)?;
        let title = validate::required_text("title", &req.title, MAX_TITLE_CHARS)?;
        let description =
            validate::bounded_text("description", &req.description, MAX_DESCRIPTION_CHARS)?;
        let reward = validate::bounded_text("reward", &req.reward, MAX_SHORT_FIELD_CHARS)?;
        let category = validate::required_text("category", &req.category, MAX_SHORT_FIELD_CHARS)?;
        let location = validate::optional_text(Some(req.location.as_str()))
            .unwrap_or_else(|| WHOLE_CAMPUS.to_string());
        let location = validate::bounded_text("location", &location, MAX_SHORT_FIELD_CHARS)?;
        let contact_info =
            validate::bounded_text("contact_info", &req.contact_info, MAX_SHORT_FIELD_CHARS)?;
        let image_url = validate::optional_text(req.image_url.as_deref());

        let id = self.db.insert_quest(
            &NewQuest {
                publisher_email: &publisher,
                quest_type: req.quest_type,
                title: &title,
                description: &description,
                reward: &reward,
                category: &category,
                location: &location,
                contact_info: &contact_info,
                image_url: image_url.as_deref(),
            },
            &default_nickname(),
        )?;

        info!("Quest {} published by {}: {}", id, publisher, title);
        self.quest_view(id, &publisher)
    }

    /// OPEN → LOCKED. Exactly one of several concurrent accepts wins; the
    /// others get `InvalidState`.
    pub fn accept_quest(&self, id: i64, email: &str) -> Result<QuestView> {
        let provider = validate::email(email)?;
        self.provision(&provider)?;
        self.advance(id, &provider, Action::Accept)
    }

    /// LOCKED → OPEN, releasing the provider.
    pub fn drop_quest(&self, id: i64, email: &str) -> Result<QuestView> {
        let provider = validate::email(email)?;
        self.advance(id, &provider, Action::Drop)
    }

    /// LOCKED → PENDING_REVIEW.
    pub fn submit_quest(&self, id: i64, email: &str) -> Result<QuestView> {
        let provider = validate::email(email)?;
        self.advance(id, &provider, Action::Submit)
    }

    /// PENDING_REVIEW → COMPLETED.
    pub fn complete_quest(&self, id: i64, email: &str) -> Result<QuestView> {
        let publisher = validate::email(email)?;
        self.advance(id, &publisher, Action::Complete)
    }

    /// Deletes an OPEN quest.
    pub fn cancel_quest(&self, id: i64, email: &str) -> Result<()> {
        let publisher = validate::email(email)?;
        self.remove(id, &publisher, Action::Cancel)?;
        Ok(())
    }

    /// Deletes a LOCKED quest out from under its provider. Returns the
    /// provider who lost the match.
    pub fn force_cancel_quest(&self, id: i64, email: &str) -> Result<Option<String>> {
        let publisher = validate::email(email)?;
        self.remove(id, &publisher, Action::ForceCancel)
    }

    fn advance(&self, id: i64, actor: &str, action: Action) -> Result<QuestView> {
        let t = action.transition();
        let Target::Status(to) = t.to else {
            return Err(anyhow!("{} does not lead to a status", action).into());
        };

        if !self.db.swap_status(id, t.from, to, guard(t.actor, actor))? {
            return Err(self.explain_rejection(id, actor, action));
        }

        info!("Quest {} {}: {} -> {} by {}", id, action, t.from, to, actor);
        self.quest_view(id, actor)
    }

    fn remove(&self, id: i64, actor: &str, action: Action) -> Result<Option<String>> {
        let t = action.transition();
        if t.to != Target::Deleted {
            return Err(anyhow!("{} does not delete", action).into());
        }

        let Some(provider) = self.db.delete_quest(id, t.from, guard(t.actor, actor))? else {
            return Err(self.explain_rejection(id, actor, action));
        };

        match &provider {
            Some(p) => warn!("Quest {} force-cancelled by {}; provider {} dropped", id, actor, p),
            None => info!("Quest {} cancelled by {}", id, actor),
        }
        Ok(provider)
    }

    /// Works out why a conditional update matched nothing.
    fn explain_rejection(&self, id: i64, actor: &str, action: Action) -> QuestError {
        let loaded = self
            .db
            .get_quest(id)
            .and_then(|row| row.map(|r| r.into_quest()).transpose());
        let quest = match loaded {
            Ok(Some(quest)) => quest,
            Ok(None) => return QuestError::quest_not_found(id),
            Err(e) => return e.into(),
        };

        match lifecycle::check(
            action,
            quest.status,
            actor,
            &quest.publisher_email,
            quest.provider_email.as_deref(),
        ) {
            Err(rejection) => {
                warn!(
                    "Rejected {} on quest {} ({}) by {}: {:?}",
                    action, id, quest.status, actor, rejection
                );
                QuestError::from_rejection(rejection, format!("cannot {action} quest {id}"))
            }
            // The quest moved between the update and this read.
            Ok(t) => QuestError::InvalidState {
                expected: t.from,
                actual: quest.status,
            },
        }
    }

    pub(crate) fn quest_view(&self, id: i64, viewer: &str) -> Result<QuestView> {
        let row = self
            .db
            .get_quest_view(id)?
            .ok_or_else(|| QuestError::quest_not_found(id))?;
        view::present(row, viewer)
    }
}

fn guard(rule: ActorRule, actor: &str) -> ActorGuard<'_> {
    match rule {
        ActorRule::AnyoneButPublisher => ActorGuard::NotPublisher(actor),
        ActorRule::Publisher => ActorGuard::Publisher(actor),
        ActorRule::Provider => ActorGuard::Provider(actor),
    }
}
