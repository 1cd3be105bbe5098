use crate::api::{parse_wallet, AppState};
use crate::domain::ProfileUpdate;
use crate::engine::{LeaderboardEntry, PlatformStats};
use crate::error::AppError;
use crate::orchestration::service::DEFAULT_PAGE_LIMIT;
use crate::orchestration::WalletProfile;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn get_profile(
    Path(wallet): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WalletProfile>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    Ok(Json(state.service.wallet_profile(&wallet).await?))
}

pub async fn update_profile(
    Path(wallet): Path<String>,
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<WalletProfile>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    Ok(Json(state.service.update_profile(&wallet, update).await?))
}

pub async fn get_leaderboard(
    Query(params): Query<LeaderboardQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    Ok(Json(state.service.leaderboard(page, limit).await?))
}

pub async fn get_platform_stats(State(state): State<AppState>) -> Result<Json<PlatformStats>, AppError> {
    Ok(Json(state.service.platform_stats().await?))
}

pub async fn record_activity(
    Path(wallet): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    let updated = state.service.touch_wallet(&wallet).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
