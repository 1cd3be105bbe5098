use crate::api::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": state.service.now().to_rfc3339(),
    }))
}

/// Ready once the store answers a pool-stats query.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.service.pools().await {
        Ok(pools) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "pools": pools.len() })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::{PoolCatalog, TimeMs};
    use crate::orchestration::StakingService;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn state() -> AppState {
        let service = StakingService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new(TimeMs::new(0))),
            PoolCatalog::default(),
            10,
        );
        AppState::new(Arc::new(service))
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health(State(state())).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["timestamp"], "1970-01-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn test_ready_reports_pool_count() {
        let (status, Json(body)) = ready(State(state())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["pools"], 3);
    }
}
