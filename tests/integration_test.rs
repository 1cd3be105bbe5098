mod common;

use axum::http::StatusCode;
use stakefolio::{init_db, Repository};
use std::sync::Arc;
use tempfile::TempDir;

async fn setup_sqlite_app() -> (common::TestApp, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let app = common::app_with_store(Arc::new(Repository::new(pool)));
    (app, temp_dir)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp) = setup_sqlite_app().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let (app, _temp) = setup_sqlite_app().await;
    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _temp) = setup_sqlite_app().await;
    let (status, _) = app.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_lifecycle_over_sqlite() {
    let (app, _temp) = setup_sqlite_app().await;
    let id = app.stake(1, 1, 100.0).await;

    app.clock.advance_days(10);
    let (status, body) = app
        .post(
            &format!("/api/staking/claim/{}", id),
            serde_json::json!({ "walletAddress": common::WALLET, "txHash": common::tx(2) }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    common::approx(&body["claimedAmount"], 1.0);

    let (status, _) = app
        .post(
            &format!("/api/staking/unstake/{}", id),
            serde_json::json!({ "walletAddress": common::WALLET, "txHash": common::tx(3) }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            &format!("/api/transactions/hash/{}/confirm", common::tx(3)),
            serde_json::json!({ "blockNumber": 42 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "confirmed");

    let (_, positions) = app
        .get(&format!("/api/staking/positions/{}?status=completed", common::WALLET))
        .await;
    assert_eq!(positions.as_array().unwrap().len(), 1);
    assert_eq!(positions[0]["version"], 3);

    let (_, page) = app.get(&format!("/api/transactions/{}", common::WALLET)).await;
    assert_eq!(page["pagination"]["total"], 3);
}
