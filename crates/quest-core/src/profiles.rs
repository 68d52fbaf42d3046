use anyhow::anyhow;
use rand::Rng;
use tracing::info;

use quest_types::api::UpdateProfileRequest;
use quest_types::models::{MAX_NICKNAME_CHARS, Profile, Reputation};

use crate::error::Result;
use crate::{Engine, validate};

/// Nickname given to a profile created on first sight of an email.
pub fn default_nickname() -> String {
    format!("同学{}", rand::rng().random_range(0..1000))
}

impl Engine {
    /// Creates the profile on first reference to `email`. Idempotent.
    pub fn ensure_profile(&self, email: &str) -> Result<Profile> {
        let email = validate::email(email)?;
        self.provision(&email)?;
        self.load_profile(&email)
    }

    /// Profiles are auto-provisioned, so this never reports "not found" for a
    /// well-formed email.
    pub fn get_profile(&self, email: &str) -> Result<Profile> {
        self.ensure_profile(email)
    }

    /// Partial update: only the fields present in `update` change. An empty
    /// `avatar_url` removes the avatar.
    pub fn update_profile(&self, email: &str, update: UpdateProfileRequest) -> Result<Profile> {
        let email = validate::email(email)?;
        let nickname = update
            .nickname
            .as_deref()
            .map(|n| validate::required_text("nickname", n, MAX_NICKNAME_CHARS))
            .transpose()?;
        let avatar_url = update
            .avatar_url
            .as_deref()
            .map(|url| validate::optional_text(Some(url)));

        self.provision(&email)?;
        self.db.update_profile(
            &email,
            nickname.as_deref(),
            avatar_url.as_ref().map(|url| url.as_deref()),
        )?;

        info!("Profile {} updated", email);
        self.load_profile(&email)
    }

    pub fn aggregate_rating(&self, email: &str) -> Result<Reputation> {
        let email = validate::email(email)?;
        let (avg, count) = self.db.rating_for(&email)?;
        Ok(Reputation::from_aggregate(avg, count))
    }

    /// Inserts a profile for an already-normalised email if none exists.
    pub(crate) fn provision(&self, email: &str) -> Result<()> {
        let nickname = default_nickname();
        if self.db.ensure_profile(email, &nickname)? {
            info!("Provisioned profile {} as {}", email, nickname);
        }
        Ok(())
    }

    fn load_profile(&self, email: &str) -> Result<Profile> {
        let row = self
            .db
            .get_profile(email)?
            .ok_or_else(|| anyhow!("profile {} missing after provisioning", email))?;
        Ok(row.into_profile())
    }
}
