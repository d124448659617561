//! HTTP surface tests.
//!
//! These run entirely locally: the keyless paths fail before any network
//! call, and the keyed paths stop at address validation.

use axum_test::TestServer;

use gpack_cosigner::{app_router, AppState, ServiceConfig};

fn keyless_server() -> TestServer {
    let state = AppState::new(ServiceConfig::for_tests()).unwrap();
    TestServer::new(app_router(state)).unwrap()
}

fn keyed_server() -> TestServer {
    let mut config = ServiceConfig::for_tests();
    config.creator_private_key = Some(hex::encode([7u8; 32]));
    let state = AppState::new(config).unwrap();
    TestServer::new(app_router(state)).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let server = keyless_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn info_reports_cosigner_availability() {
    let server = keyless_server();
    let body: serde_json::Value = server.get("/info").await.json();
    assert_eq!(body["cosigner_available"], serde_json::json!(false));
    assert_eq!(body["creator_address"], serde_json::Value::Null);
    assert_eq!(body["module_name"], serde_json::json!("galactic_packs"));

    let server = keyed_server();
    let body: serde_json::Value = server.get("/info").await.json();
    assert_eq!(body["cosigner_available"], serde_json::json!(true));
    assert!(body["creator_address"].as_str().unwrap().starts_with("0x"));
}

#[tokio::test]
async fn purchase_without_key_fails_fast_with_503() {
    let server = keyless_server();
    for _ in 0..3 {
        let response = server
            .post("/txn/purchase")
            .json(&serde_json::json!({ "userAddress": "0xa11ce" }))
            .await;
        response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error_code"], "COSIGNER_UNAVAILABLE");
    }
}

#[tokio::test]
async fn redeem_without_key_fails_fast_with_503() {
    let server = keyless_server();
    let response = server
        .post("/txn/redeem")
        .json(&serde_json::json!({
            "userAddress": "0xa11ce",
            "packTokenId": "0xfeed",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "COSIGNER_UNAVAILABLE");
}

#[tokio::test]
async fn malformed_user_address_is_a_400() {
    let server = keyed_server();
    let response = server
        .post("/txn/purchase")
        .json(&serde_json::json!({ "userAddress": "not-an-address" }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "INVALID_ADDRESS");
}

#[tokio::test]
async fn malformed_pack_token_is_a_400() {
    let server = keyed_server();
    let response = server
        .post("/txn/redeem")
        .json(&serde_json::json!({
            "userAddress": "0xa11ce",
            "packTokenId": "zzzz",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "INVALID_ADDRESS");
}

#[tokio::test]
async fn assets_rejects_a_malformed_address_before_any_lookup() {
    let server = keyless_server();
    let response = server.get("/assets/garbage").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_code"], "INVALID_ADDRESS");
}
