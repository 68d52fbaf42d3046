use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use quest_types::api::PostContentRequest;
use quest_types::models::{Comment, PrivateMessage};

use crate::error::ApiError;
use crate::middleware::Identity;
use crate::state::{AppState, blocking};

pub async fn list_comments(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = blocking(&state, move |engine| engine.list_comments(id)).await?;
    Ok(Json(comments))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<PostContentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let comment =
        blocking(&state, move |engine| engine.post_comment(id, &me.email, &req.content)).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<Vec<PrivateMessage>>, ApiError> {
    let messages = blocking(&state, move |engine| engine.list_messages(id, &me.email)).await?;
    Ok(Json(messages))
}

pub async fn post_message(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<PostContentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let message =
        blocking(&state, move |engine| engine.post_message(id, &me.email, &req.content)).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
