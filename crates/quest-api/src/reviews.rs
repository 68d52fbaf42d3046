use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use quest_types::api::{LeaderboardQuery, SubmitReviewRequest};
use quest_types::models::{LeaderboardEntry, Review};

use crate::error::ApiError;
use crate::middleware::Identity;
use crate::state::{AppState, blocking};

pub async fn submit_review(
    State(state): State<AppState>,
    Extension(me): Extension<Identity>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<SubmitReviewRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let review = blocking(&state, move |engine| {
        engine.submit_review(id, &me.email, req.to_email.as_deref(), req.rating, &req.comment)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Reviews a user has received, newest first.
pub async fn list_reviews(
    State(state): State<AppState>,
    WithRejection(Path(email), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = blocking(&state, move |engine| engine.list_reviews(&email)).await?;
    Ok(Json(reviews))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<LeaderboardQuery>, ApiError>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(state.leaderboard_size);
    let board = blocking(&state, move |engine| engine.leaderboard(limit)).await?;
    Ok(Json(board))
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::*;

    async fn completed(app: &Router, provider: &str, title: &str) -> i64 {
        let id = publish(app, ALICE, title).await;
        for (action, who) in [("accept", provider), ("submit", provider), ("complete", ALICE)] {
            let (status, body) =
                call(app, "POST", &format!("/api/quests/{id}/{action}"), Some(who), None).await;
            assert_eq!(status, StatusCode::OK, "{action}: {body}");
        }
        id
    }

    #[tokio::test]
    async fn review_then_duplicate_is_409() {
        let app = app();
        let id = completed(&app, BOB, "Move boxes").await;
        let uri = format!("/api/quests/{id}/review");

        let (status, body) = call(
            &app,
            "POST",
            &uri,
            Some(ALICE),
            Some(json!({ "to_email": BOB, "rating": 5, "comment": "靠谱" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["rating"], 5);

        let (status, body) = call(
            &app,
            "POST",
            &uri,
            Some(ALICE),
            Some(json!({ "to_email": BOB, "rating": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "duplicate_review");

        let (_, reviews) = call(
            &app,
            "GET",
            "/api/profiles/bob@campus.edu/reviews",
            Some(CAROL),
            None,
        )
        .await;
        assert_eq!(reviews.as_array().unwrap().len(), 1);

        let (_, profile) =
            call(&app, "GET", "/api/profiles/bob@campus.edu", Some(CAROL), None).await;
        assert_eq!(profile["rating"]["average"], 5.0);
    }

    #[tokio::test]
    async fn review_input_errors() {
        let app = app();
        let id = completed(&app, BOB, "Move boxes").await;
        let uri = format!("/api/quests/{id}/review");

        let (status, body) =
            call(&app, "POST", &uri, Some(ALICE), Some(json!({ "rating": 5 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "missing_target");

        let (status, body) = call(
            &app,
            "POST",
            &uri,
            Some(ALICE),
            Some(json!({ "to_email": BOB, "rating": 9 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");

        let (status, _) = call(
            &app,
            "POST",
            &uri,
            Some(CAROL),
            Some(json!({ "to_email": BOB, "rating": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_review_body_is_validation_error() {
        let app = app();
        let id = completed(&app, BOB, "Move boxes").await;
        let uri = format!("/api/quests/{id}/review");

        let (status, body) = call(
            &app,
            "POST",
            &uri,
            Some(ALICE),
            Some(json!({ "to_email": BOB, "rating": 4.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert!(body["error"].is_string());

        let (status, body) = call(
            &app,
            "POST",
            &uri,
            Some(CAROL),
            Some(json!({ "to_email": BOB, "rating": 5, "from_email": ALICE })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");

        let (status, body) =
            call(&app, "GET", "/api/leaderboard?limit=-1", Some(CAROL), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn leaderboard_uses_configured_default_and_clamps() {
        let app = app();
        completed(&app, BOB, "b1").await;
        completed(&app, BOB, "b2").await;
        completed(&app, CAROL, "c1").await;

        let (status, board) = call(&app, "GET", "/api/leaderboard", Some(ALICE), None).await;
        assert_eq!(status, StatusCode::OK);
        let board = board.as_array().unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0]["email"], BOB);
        assert_eq!(board[0]["rank"], 1);
        assert_eq!(board[0]["completed_count"], 2);

        let (_, board) = call(&app, "GET", "/api/leaderboard?limit=0", Some(ALICE), None).await;
        assert_eq!(board.as_array().unwrap().len(), 1);
    }
}
