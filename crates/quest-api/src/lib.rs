//! HTTP surface for the quest marketplace.
//!
//! Every route except `/health` sits behind [`middleware::require_auth`], which
//! turns the bearer token into an [`middleware::Identity`]. Handlers are thin:
//! they hand the caller's email to the [`quest_core::Engine`] on the blocking
//! pool and map [`quest_core::QuestError`] onto status codes.

pub mod discussion;
pub mod error;
pub mod favorites;
pub mod middleware;
pub mod profiles;
pub mod quests;
pub mod reviews;
pub mod state;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// Builds the full application router.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let protected = Router::new()
        .route("/api/profile", get(profiles::get_own_profile).put(profiles::update_profile))
        .route("/api/profiles/{email}", get(profiles::get_profile))
        .route("/api/profiles/{email}/reviews", get(reviews::list_reviews))
        .route("/api/quests", get(quests::list_quests).post(quests::publish_quest))
        .route("/api/quests/{id}", get(quests::get_quest).delete(quests::cancel_quest))
        .route("/api/quests/{id}/accept", post(quests::accept_quest))
        .route("/api/quests/{id}/drop", post(quests::drop_quest))
        .route("/api/quests/{id}/submit", post(quests::submit_quest))
        .route("/api/quests/{id}/complete", post(quests::complete_quest))
        .route("/api/quests/{id}/review", post(reviews::submit_review))
        .route(
            "/api/quests/{id}/comments",
            get(discussion::list_comments).post(discussion::post_comment),
        )
        .route(
            "/api/quests/{id}/messages",
            get(discussion::list_messages).post(discussion::post_message),
        )
        .route("/api/my-quests", get(quests::list_my_quests))
        .route("/api/favorites", get(favorites::list_favorites))
        .route("/api/favorites/toggle", post(favorites::toggle_favorite))
        .route("/api/leaderboard", get(reviews::leaderboard))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}
