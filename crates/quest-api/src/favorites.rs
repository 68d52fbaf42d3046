use axum::{
    Extension, Json,
    extract::State,
};
use axum_extra::extract::WithRejection;

use quest_types::api::{ToggleFavoriteRequest, ToggleFavoriteResponse};

use crate::error::ApiError;
use crate::middleware::Identity;
use crate::state::{AppState, blocking};

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Json(req), _): WithRejection<Json<ToggleFavoriteRequest>, ApiError>,
) -> Result<Json<ToggleFavoriteResponse>, ApiError> {
    let quest_id = req.quest_id;
    let toggle = blocking(&state, move |engine| engine.toggle_favorite(&me.email, quest_id)).await?;

    Ok(Json(ToggleFavoriteResponse {
        quest_id,
        is_favorited: toggle.is_favorited(),
    }))
}

/// Ids of the caller's favorited quests.
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
) -> Result<Json<Vec<i64>>, ApiError> {
    let ids = blocking(&state, move |engine| engine.list_favorite_ids(&me.email)).await?;
    Ok(Json(ids))
}
