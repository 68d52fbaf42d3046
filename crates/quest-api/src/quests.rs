use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde_json::json;

use quest_core::Engine;
use quest_types::api::{CancelQuery, PublishQuestRequest, QuestQuery, QuestView};

use crate::error::ApiError;
use crate::middleware::Identity;
use crate::state::{AppState, blocking};

type LifecycleOp = fn(&Engine, i64, &str) -> quest_core::Result<QuestView>;

/// Open quests only, filtered and sorted per the query string.
pub async fn list_quests(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Query(query), _): WithRejection<Query<QuestQuery>, ApiError>,
) -> Result<Json<Vec<QuestView>>, ApiError> {
    let quests = blocking(&state, move |engine| engine.search_quests(&query, &me.email)).await?;
    Ok(Json(quests))
}

pub async fn publish_quest(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Json(req), _): WithRejection<Json<PublishQuestRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let quest = blocking(&state, move |engine| engine.publish_quest(&me.email, req)).await?;
    Ok((StatusCode::CREATED, Json(quest)))
}

pub async fn get_quest(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<QuestView>, ApiError> {
    let quest = blocking(&state, move |engine| engine.get_quest(id, &me.email)).await?;
    Ok(Json(quest))
}

/// Deletes an OPEN quest, or with `?force=true` a LOCKED one.
pub async fn cancel_quest(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<CancelQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let dropped_provider = blocking(&state, move |engine| {
        if query.force {
            engine.force_cancel_quest(id, &me.email)
        } else {
            engine.cancel_quest(id, &me.email).map(|()| None)
        }
    })
    .await?;

    Ok(Json(json!({ "id": id, "deleted": true, "dropped_provider": dropped_provider })))
}

pub async fn accept_quest(
    state: State<AppState>,
    me: Extension<Identity>,
    id: WithRejection<Path<i64>, ApiError>,
) -> Result<Json<QuestView>, ApiError> {
    transition(state, me, id, Engine::accept_quest).await
}

pub async fn drop_quest(
    state: State<AppState>,
    me: Extension<Identity>,
    id: WithRejection<Path<i64>, ApiError>,
) -> Result<Json<QuestView>, ApiError> {
    transition(state, me, id, Engine::drop_quest).await
}

pub async fn submit_quest(
    state: State<AppState>,
    me: Extension<Identity>,
    id: WithRejection<Path<i64>, ApiError>,
) -> Result<Json<QuestView>, ApiError> {
    transition(state, me, id, Engine::submit_quest).await
}

pub async fn complete_quest(
    state: State<AppState>,
    me: Extension<Identity>,
    id: WithRejection<Path<i64>, ApiError>,
) -> Result<Json<QuestView>, ApiError> {
    transition(state, me, id, Engine::complete_quest).await
}

async fn transition(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    op: LifecycleOp,
) -> Result<Json<QuestView>, ApiError> {
    let quest = blocking(&state, move |engine| op(engine, id, &me.email)).await?;
    Ok(Json(quest))
}

/// Everything the caller published or is providing for.
pub async fn list_my_quests(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
) -> Result<Json<Vec<QuestView>>, ApiError> {
    let quests = blocking(&state, move |engine| engine.list_my_quests(&me.email)).await?;
    Ok(Json(quests))
}
