use axum::body::Body;
use axum::http::{Request, StatusCode};
use discovery_directory::config::{AppConfig, DirectoryConfig, LogConfig, ServerConfig};
use discovery_directory::domain::Directory;
use discovery_directory::metrics::Metrics;
use discovery_directory::router::build_router;
use discovery_directory::state::AppState;
use discovery_directory::wire::{Request as WireRequest, Response as WireResponse, Result as WireResult};
use prost::Message;
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_request_size: 1024 * 1024,
        },
        log: LogConfig {
            level: "error".to_string(),
            format: "pretty".to_string(),
        },
        directory: DirectoryConfig {
            delta_secs: 864_000,
            p_inc_secs: 86_400,
            max_contacts: 20_000,
        },
    }
}

fn test_state() -> AppState {
    let config = test_config();
    AppState {
        directory: Arc::new(Directory::new(
            config.directory.delta_secs,
            config.directory.p_inc_secs,
            config.directory.max_contacts,
        )),
        metrics: Arc::new(Metrics::new()),
        config: Arc::new(config),
    }
}

fn envelope(user: &[u8], token: &[u8], identifiers: Vec<Vec<u8>>) -> Vec<u8> {
    WireRequest {
        user: user.to_vec(),
        auth_token: token.to_vec(),
        identifiers,
    }
    .encode_to_vec()
}

async fn post(
    app: &axum::Router,
    path: &str,
    body: Vec<u8>,
) -> (StatusCode, WireResponse) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/x-protobuf")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let decoded = WireResponse::decode(body.as_ref()).unwrap();
    (status, decoded)
}

#[tokio::test]
async fn register_then_full_sync_finds_the_user() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    let (status, resp) = post(
        &app,
        "/user/register",
        envelope(b"alice", b"alice-token", Vec::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.result, WireResult::Success as i32);

    let (status, resp) = post(
        &app,
        "/discovery/full",
        envelope(b"alice", b"alice-token", vec![b"alice".to_vec(), b"bob".to_vec()]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.result, WireResult::Success as i32);
    assert_eq!(resp.added_users, vec![b"alice".to_vec()]);
}

#[tokio::test]
async fn full_sync_with_invalid_token_is_rejected() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    post(
        &app,
        "/user/register",
        envelope(b"alice", b"alice-token", Vec::new()),
    )
    .await;

    let (status, resp) = post(
        &app,
        "/discovery/full",
        envelope(b"alice", b"wrong-token", vec![b"alice".to_vec()]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.result, WireResult::AuthenticationInvalid as i32);
}

#[tokio::test]
async fn empty_body_is_request_data_missing() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    let (status, resp) = post(&app, "/user/register", Vec::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.result, WireResult::RequestDataMissing as i32);
}

#[tokio::test]
async fn malformed_body_is_request_data_invalid() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    let (status, resp) = post(&app, "/user/register", vec![0xFF, 0x00, 0xAB]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.result, WireResult::RequestDataInvalid as i32);
}

#[tokio::test]
async fn register_then_delete_removes_the_user() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    post(
        &app,
        "/user/register",
        envelope(b"alice", b"alice-token", Vec::new()),
    )
    .await;
    let (status, resp) = post(
        &app,
        "/user/delete",
        envelope(b"alice", b"alice-token", Vec::new()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.result, WireResult::Success as i32);

    let (_, resp) = post(
        &app,
        "/discovery/full",
        envelope(b"alice", b"alice-token", vec![b"alice".to_vec()]),
    )
    .await;
    // alice is no longer registered, so auth against her own (deleted)
    // account now fails.
    assert_eq!(resp.result, WireResult::AuthenticationInvalid as i32);
}

#[tokio::test]
async fn incremental_sync_reports_added_and_removed_deltas() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    post(
        &app,
        "/user/register",
        envelope(b"client", b"client-token", Vec::new()),
    )
    .await;
    post(
        &app,
        "/user/register",
        envelope(b"added-friend", b"ignored", Vec::new()),
    )
    .await;
    post(
        &app,
        "/user/register",
        envelope(b"removed-friend", b"removed-token", Vec::new()),
    )
    .await;
    post(
        &app,
        "/user/delete",
        envelope(b"removed-friend", b"removed-token", Vec::new()),
    )
    .await;

    let (status, resp) = post(
        &app,
        "/discovery/incremental",
        envelope(
            b"client",
            b"client-token",
            vec![b"added-friend".to_vec(), b"removed-friend".to_vec()],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.result, WireResult::Success as i32);
    assert_eq!(resp.added_users, vec![b"added-friend".to_vec()]);
    assert_eq!(resp.removed_users, vec![b"removed-friend".to_vec()]);
}

#[tokio::test]
async fn full_sync_over_capacity_is_rate_limited() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    post(
        &app,
        "/user/register",
        envelope(b"alice", b"alice-token", Vec::new()),
    )
    .await;

    let contacts: Vec<Vec<u8>> = (0u32..=20_000).map(|i| i.to_le_bytes().to_vec()).collect();
    let (status, resp) = post(
        &app,
        "/discovery/full",
        envelope(b"alice", b"alice-token", contacts),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.result, WireResult::RateLimitExceeded as i32);
}

#[tokio::test]
async fn health_endpoint_reports_registered_user_count() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    post(
        &app,
        "/user/register",
        envelope(b"alice", b"alice-token", Vec::new()),
    )
    .await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["registered_users"], 1);
}

#[tokio::test]
async fn reset_clears_all_registered_users() {
    let config = test_config();
    let state = test_state();
    let app = build_router(&config, state);

    post(
        &app,
        "/user/register",
        envelope(b"alice", b"alice-token", Vec::new()),
    )
    .await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, resp) = post(
        &app,
        "/discovery/full",
        envelope(b"alice", b"alice-token", vec![b"alice".to_vec()]),
    )
    .await;
    assert_eq!(resp.result, WireResult::AuthenticationInvalid as i32);
}
