use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use quest_core::validate;
use quest_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, normalised. Inserted into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
}

/// Extract and validate the JWT from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })?;

    let email = validate::email(token_data.claims.email())?;
    req.extensions_mut().insert(Identity { email });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use jsonwebtoken::{EncodingKey, Header, encode};
    use tower::ServiceExt;

    use super::*;
    use crate::testing::*;

    #[tokio::test]
    async fn missing_token_is_401() {
        let app = app();
        let (status, body) = call(&app, "GET", "/api/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");
    }

    #[tokio::test]
    async fn wrong_secret_is_401() {
        let app = app();
        let req = Request::get("/api/profile")
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", token_with_secret(ALICE, "someone-else")),
            )
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_401() {
        let app = app();
        let claims = Claims {
            sub: ALICE.to_string(),
            email: None,
            exp: 1_000,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let req = Request::get("/api/profile")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn email_claim_wins_and_is_normalised() {
        let app = app();
        let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
        let claims = Claims {
            sub: "user-123".to_string(),
            email: Some("  Bob@Campus.EDU ".to_string()),
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let req = Request::get("/api/profile")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let profile: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(profile["email"], BOB);
    }

    #[tokio::test]
    async fn subject_without_at_sign_is_rejected() {
        let app = app();
        let (status, body) = call(&app, "GET", "/api/profile", Some("not-an-email"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }
}
