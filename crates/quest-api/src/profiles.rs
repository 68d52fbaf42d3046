use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;

use quest_types::api::UpdateProfileRequest;
use quest_types::models::Profile;

use crate::error::ApiError;
use crate::middleware::Identity;
use crate::state::{AppState, blocking};

/// The caller's own profile, created on first sight.
pub async fn get_own_profile(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
) -> Result<Json<Profile>, ApiError> {
    let profile = blocking(&state, move |engine| engine.ensure_profile(&me.email)).await?;
    Ok(Json(profile))
}

pub async fn get_profile(
    State(state): State<AppState>,
    WithRejection(Path(email), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<Profile>, ApiError> {
    let profile = blocking(&state, move |engine| engine.get_profile(&email)).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> Result<Json<Profile>, ApiError> {
    let profile = blocking(&state, move |engine| engine.update_profile(&me.email, req)).await?;
    Ok(Json(profile))
}
