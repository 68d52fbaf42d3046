use std::sync::Arc;

use tracing::error;

use quest_core::Engine;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub engine: Engine,
    /// HMAC secret shared with the identity provider.
    pub jwt_secret: String,
    /// Leaderboard length when the client does not ask for one.
    pub leaderboard_size: usize,
}

/// Runs an engine call on the blocking pool. SQLite access is synchronous and
/// must not stall the async workers.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Engine) -> quest_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.engine))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Join(e.to_string())
        })?
        .map_err(ApiError::from)
}
