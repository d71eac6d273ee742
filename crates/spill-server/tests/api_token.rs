use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};
use spill_server::{app, AppState};
use spill_voice::{LiveKitConfig, TokenIssuer};
use tower::ServiceExt;

const URL: &str = "wss://spill.livekit.test";
const KEY: &str = "devkey";
const SECRET: &str = "secret-that-is-long-enough-for-hs256";

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    video: VideoClaims,
}

#[derive(Debug, Deserialize)]
struct VideoClaims {
    #[serde(rename = "roomJoin")]
    room_join: bool,
    room: String,
}

fn configured_app() -> axum::Router {
    app(AppState::new(TokenIssuer::new(LiveKitConfig::new(
        URL, KEY, SECRET,
    ))))
}

fn unconfigured_app() -> axum::Router {
    app(AppState::new(TokenIssuer::new(LiveKitConfig::new(
        URL, "", "",
    ))))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/getToken")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn claims(token: &str) -> Claims {
    let key = DecodingKey::from_secret(SECRET.as_bytes());
    decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256))
        .expect("token should decode with the server secret")
        .claims
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let (status, json) = send(configured_app(), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "spillitout-token-server");
}

#[tokio::test]
async fn health_check_ignores_missing_credentials() {
    let (status, json) = send(unconfigured_app(), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn get_token_returns_connection_details() {
    let (status, json) = send(
        configured_app(),
        get("/getToken?roomName=r1&participantName=Alice"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["serverUrl"], URL);
    assert_eq!(json["roomName"], "r1");
    assert_eq!(json["participantName"], "Alice");
    let token = json["participantToken"].as_str().unwrap();
    assert!(!token.is_empty());

    let claims = claims(token);
    assert!(claims.video.room_join);
    assert_eq!(claims.video.room, "r1");
    assert_eq!(claims.sub, "Alice");
}

#[tokio::test]
async fn get_token_uses_explicit_identity() {
    let (status, json) = send(
        configured_app(),
        get("/getToken?roomName=r1&participantName=Alice&participantIdentity=device-9"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["participantName"], "Alice");
    let claims = claims(json["participantToken"].as_str().unwrap());
    assert_eq!(claims.sub, "device-9");
}

#[tokio::test]
async fn post_token_returns_connection_details() {
    let (status, json) = send(
        configured_app(),
        post_json(json!({
            "roomName": "r1",
            "participantName": "Alice",
            "participantIdentity": "user-1"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["serverUrl"], URL);
    assert_eq!(json["roomName"], "r1");
    let claims = claims(json["participantToken"].as_str().unwrap());
    assert_eq!(claims.video.room, "r1");
    assert_eq!(claims.sub, "user-1");
}

#[tokio::test]
async fn get_and_post_share_response_shape() {
    let (_, from_get) = send(
        configured_app(),
        get("/getToken?roomName=r1&participantName=Alice"),
    )
    .await;
    let (_, from_post) = send(
        configured_app(),
        post_json(json!({"roomName": "r1", "participantName": "Alice"})),
    )
    .await;

    let keys = |value: &Value| {
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    };
    assert_eq!(keys(&from_get), keys(&from_post));
    assert_eq!(from_get["serverUrl"], from_post["serverUrl"]);
    assert_eq!(from_get["roomName"], from_post["roomName"]);
    assert_eq!(from_get["participantName"], from_post["participantName"]);
}

#[tokio::test]
async fn missing_credentials_fail_both_endpoints() {
    let (get_status, get_json) = send(
        unconfigured_app(),
        get("/getToken?roomName=r1&participantName=Alice"),
    )
    .await;
    let (post_status, post_json_body) = send(
        unconfigured_app(),
        post_json(json!({"roomName": "r1", "participantName": "Alice"})),
    )
    .await;

    for (status, body) in [(get_status, get_json), (post_status, post_json_body)] {
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(
            detail.contains("Server configuration error"),
            "unexpected detail: {}",
            detail
        );
        assert!(body.get("participantToken").is_none());
    }
}

#[tokio::test]
async fn signing_failure_is_internal_error_with_message() {
    let (status, json) = send(
        configured_app(),
        get("/getToken?roomName=r1&participantName="),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn missing_query_field_is_unprocessable() {
    let (status, json) = send(configured_app(), get("/getToken?roomName=r1")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().is_some());
}

#[tokio::test]
async fn missing_body_field_is_unprocessable() {
    let (status, json) = send(
        configured_app(),
        post_json(json!({"participantName": "Alice"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().is_some());
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/getToken")
        .header(header::ORIGIN, "https://app.spillitout.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = configured_app().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
