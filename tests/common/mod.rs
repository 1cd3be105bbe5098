#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use stakefolio::api::{self, AppState};
use stakefolio::{InMemoryStore, ManualClock, PoolCatalog, StakingService, StakingStore, TimeMs};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const START_MS: i64 = 1_700_000_000_000;
pub const WALLET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const OTHER_WALLET: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

pub fn tx(n: u64) -> String {
    format!("0x{:064x}", n)
}

pub struct TestApp {
    pub router: axum::Router,
    pub clock: ManualClock,
}

pub fn app_with_store(store: Arc<dyn StakingStore>) -> TestApp {
    let clock = ManualClock::new(TimeMs::new(START_MS));
    let service = StakingService::new(store, Arc::new(clock.clone()), PoolCatalog::default(), 10);
    TestApp {
        router: api::create_router(AppState::new(Arc::new(service))),
        clock,
    }
}

pub fn memory_app() -> TestApp {
    app_with_store(Arc::new(InMemoryStore::new()))
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    /// Stake `amount` into `pool_id` at 36.5% APY and return the position id.
    pub async fn stake(&self, n: u64, pool_id: u32, amount: f64) -> String {
        let (status, body) = self
            .post(
                "/api/staking/stake",
                serde_json::json!({
                    "walletAddress": WALLET,
                    "poolId": pool_id,
                    "amount": amount,
                    "txHash": tx(n),
                    "apy": 36.5,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "stake failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

pub fn num(v: &Value) -> f64 {
    v.as_f64().unwrap_or_else(|| panic!("expected number, got {}", v))
}

pub fn approx(actual: &Value, expected: f64) {
    let actual = num(actual);
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
