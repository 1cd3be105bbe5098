pub mod health;
pub mod portfolio;
pub mod staking;
pub mod transactions;
pub mod users;

use crate::domain::{PositionId, TxHash, WalletAddress};
use crate::engine::Period;
use crate::error::AppError;
use crate::orchestration::StakingService;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StakingService>,
}

impl AppState {
    pub fn new(service: Arc<StakingService>) -> Self {
        Self { service }
    }
}

pub(crate) fn parse_wallet(raw: &str) -> Result<WalletAddress, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid wallet address".into()))
}

pub(crate) fn parse_tx_hash(raw: &str) -> Result<TxHash, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid transaction hash".into()))
}

pub(crate) fn parse_position_id(raw: &str) -> Result<PositionId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid position id".into()))
}

/// Missing means the default window.
pub(crate) fn parse_period(raw: Option<&str>) -> Result<Period, AppError> {
    match raw {
        None => Ok(Period::default()),
        Some(p) => p.parse().map_err(AppError::BadRequest),
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/api/staking/pools", get(staking::get_pools))
        .route("/api/staking/positions/:wallet", get(staking::get_positions))
        .route("/api/staking/stake", post(staking::stake))
        .route("/api/staking/unstake/:position_id", post(staking::unstake))
        .route("/api/staking/claim/:position_id", post(staking::claim))
        .route(
            "/api/staking/emergency-withdraw/:position_id",
            post(staking::emergency_withdraw),
        )
        .route("/api/staking/stats/:wallet", get(staking::get_stats))
        .route(
            "/api/staking/rewards/calculate",
            put(staking::calculate_rewards),
        )
        .route("/api/portfolio/:wallet", get(portfolio::get_portfolio))
        .route("/api/portfolio/:wallet/history", get(portfolio::get_history))
        .route(
            "/api/portfolio/:wallet/analytics",
            get(portfolio::get_analytics),
        )
        .route(
            "/api/transactions/stats/global",
            get(transactions::get_global_stats),
        )
        .route(
            "/api/transactions/hash/:tx_hash",
            get(transactions::get_transaction),
        )
        .route(
            "/api/transactions/hash/:tx_hash/confirm",
            post(transactions::confirm_transaction),
        )
        .route(
            "/api/transactions/hash/:tx_hash/fail",
            post(transactions::fail_transaction),
        )
        .route(
            "/api/transactions/:wallet",
            get(transactions::get_transactions),
        )
        .route(
            "/api/transactions/:wallet/summary",
            get(transactions::get_summary),
        )
        .route(
            "/api/users/profile/:wallet",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/users/leaderboard", get(users::get_leaderboard))
        .route("/api/users/stats", get(users::get_platform_stats))
        .route("/api/users/activity/:wallet", post(users::record_activity))
        .layer(cors)
        .with_state(state)
}
