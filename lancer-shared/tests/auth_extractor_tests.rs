use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use lancer_shared::middleware::jwt_secret;
use lancer_shared::types::auth::{AuthUser, Claims, UserType};

async fn whoami(user: AuthUser) -> Json<Value> {
    Json(json!({ "id": user.id, "user_type": user.user_type }))
}

fn app() -> Router {
    Router::new().route("/whoami", get(whoami))
}

fn token_for(user_id: Uuid, ttl_secs: i64) -> String {
    let claims = Claims::new(user_id, UserType::Freelancer, ttl_secs);
    encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret().as_bytes())).unwrap()
}

async fn call(authorization: Option<String>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri("/whoami");
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    let response = app()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn valid_bearer_token_reaches_handler() {
    let user_id = Uuid::new_v4();
    let (status, body) = call(Some(format!("Bearer {}", token_for(user_id, 300)))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["user_type"], "freelancer");
}

#[tokio::test]
async fn missing_header_is_unauthorized() {
    let (status, body) = call(None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "E0004");
}

#[tokio::test]
async fn expired_token_reports_expiry() {
    let (status, body) = call(Some(format!("Bearer {}", token_for(Uuid::new_v4(), -600)))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "E1006");
}

#[tokio::test]
async fn token_signed_with_other_secret_is_invalid() {
    let claims = Claims::new(Uuid::new_v4(), UserType::Client, 300);
    let forged = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"not-the-secret")).unwrap();
    let (status, body) = call(Some(format!("Bearer {forged}"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "E1007");
}
