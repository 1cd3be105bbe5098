mod common;

use axum::http::StatusCode;
use common::{approx, memory_app, WALLET};
use serde_json::json;

#[tokio::test]
async fn test_profile_creates_wallet_on_first_sight() {
    let app = memory_app();
    let (status, body) = app.get(&format!("/api/users/profile/{}", WALLET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], WALLET);
    approx(&body["portfolioValue"], 0.0);

    let (_, stats) = app.get("/api/users/stats").await;
    assert_eq!(stats["totalUsers"], 1);
    assert_eq!(stats["newUsersLast30Days"], 1);
}

#[tokio::test]
async fn test_profile_reflects_cached_stats() {
    let app = memory_app();
    app.stake(1, 1, 100.0).await;
    app.stake(2, 1, 50.0).await;

    let (_, body) = app.get(&format!("/api/users/profile/{}", WALLET)).await;
    approx(&body["stats"]["totalStaked"], 150.0);
    approx(&body["portfolioValue"], 150.0);
}

#[tokio::test]
async fn test_leaderboard_ranks_and_anonymizes() {
    let app = memory_app();
    app.stake(1, 1, 100.0).await;
    app.post(
        "/api/staking/stake",
        json!({
            "walletAddress": common::OTHER_WALLET,
            "poolId": 1,
            "amount": 500.0,
            "txHash": common::tx(2),
        }),
    )
    .await;

    let (status, body) = app.get("/api/users/leaderboard?page=1&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["walletAddress"], "0xbbbb...bbbb");
    approx(&entries[0]["totalStaked"], 500.0);
    assert_eq!(entries[1]["rank"], 2);

    let (_, second_page) = app.get("/api/users/leaderboard?page=2&limit=1").await;
    assert_eq!(second_page[0]["rank"], 2);

    let (status, _) = app.get("/api/users/leaderboard?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_activity_only_touches_known_wallets() {
    let app = memory_app();
    let uri = format!("/api/users/activity/{}", WALLET);

    let (status, body) = app.send("POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], false);

    app.get(&format!("/api/users/profile/{}", WALLET)).await;
    let (_, body) = app.send("POST", &uri, None).await;
    assert_eq!(body["updated"], true);
}

#[tokio::test]
async fn test_profile_update_validates_and_merges() {
    let app = memory_app();
    let uri = format!("/api/users/profile/{}", WALLET);

    let (status, _) = app
        .send("PUT", &uri, Some(json!({ "username": "alice" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.stake(1, 1, 100.0).await;
    let bad_bodies = [
        json!({ "email": "nope" }),
        json!({ "username": "al" }),
        json!({ "profile": { "bio": "b".repeat(501) } }),
        json!({ "preferences": { "theme": "blue" } }),
        json!({ "preferences": { "currency": "EURO" } }),
    ];
    for body in bad_bodies {
        let (status, error) = app.send("PUT", &uri, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert!(error["error"].is_string());
    }

    let (status, body) = app
        .send(
            "PUT",
            &uri,
            Some(json!({
                "email": "Alice@Example.com",
                "username": "alice",
                "profile": { "twitter": "@alice" },
                "preferences": { "theme": "light", "notifications": { "email": true } }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["profile"]["twitter"], "@alice");
    assert_eq!(body["preferences"]["theme"], "light");
    assert_eq!(body["preferences"]["currency"], "USD");
    assert_eq!(body["preferences"]["notifications"]["email"], true);
    approx(&body["stats"]["totalStaked"], 100.0);

    let (_, board) = app.get("/api/users/leaderboard").await;
    assert_eq!(board[0]["displayName"], "alice");

    let (status, _) = app
        .send("PUT", "/api/users/profile/not-a-wallet", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
