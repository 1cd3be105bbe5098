use crate::api::{parse_position_id, parse_tx_hash, parse_wallet, AppState};
use crate::domain::{Decimal, PoolId, Position, PositionStatus, TokenSymbol};
use crate::engine::UserStats;
use crate::error::AppError;
use crate::orchestration::{ClaimOutcome, PoolOverview, StakeRequest, SweepSummary};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsQuery {
    /// A position status, or `all`.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeBody {
    pub wallet_address: String,
    pub pool_id: u32,
    pub amount: Decimal,
    pub tx_hash: String,
    pub token_symbol: Option<String>,
    pub apy: Option<Decimal>,
    #[serde(default)]
    pub auto_compound: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionBody {
    pub wallet_address: String,
    pub tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimBody {
    pub wallet_address: String,
    pub tx_hash: String,
    pub amount: Option<Decimal>,
}

pub async fn get_pools(State(state): State<AppState>) -> Result<Json<Vec<PoolOverview>>, AppError> {
    Ok(Json(state.service.pools().await?))
}

pub async fn get_positions(
    Path(wallet): Path<String>,
    Query(params): Query<PositionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Position>>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    let status = match params.status.as_deref() {
        None | Some("all") => None,
        Some(s) => Some(s.parse::<PositionStatus>().map_err(AppError::BadRequest)?),
    };
    Ok(Json(state.service.positions(&wallet, status).await?))
}

pub async fn stake(
    State(state): State<AppState>,
    Json(body): Json<StakeBody>,
) -> Result<(StatusCode, Json<Position>), AppError> {
    let token_symbol = match body.token_symbol.as_deref() {
        Some(s) => Some(
            s.parse::<TokenSymbol>()
                .map_err(|_| AppError::BadRequest("Invalid token symbol".into()))?,
        ),
        None => None,
    };
    let request = StakeRequest {
        wallet: parse_wallet(&body.wallet_address)?,
        pool_id: PoolId::new(body.pool_id),
        amount: body.amount,
        tx_hash: parse_tx_hash(&body.tx_hash)?,
        token_symbol,
        apy: body.apy,
        auto_compound: body.auto_compound,
    };

    let position = state.service.stake(request).await?;
    Ok((StatusCode::CREATED, Json(position)))
}

pub async fn unstake(
    Path(position_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<Position>, AppError> {
    let position_id = parse_position_id(&position_id)?;
    let wallet = parse_wallet(&body.wallet_address)?;
    let tx_hash = parse_tx_hash(&body.tx_hash)?;
    Ok(Json(state.service.unstake(position_id, &wallet, tx_hash).await?))
}

pub async fn claim(
    Path(position_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ClaimBody>,
) -> Result<Json<ClaimOutcome>, AppError> {
    let position_id = parse_position_id(&position_id)?;
    let wallet = parse_wallet(&body.wallet_address)?;
    let tx_hash = parse_tx_hash(&body.tx_hash)?;
    Ok(Json(
        state
            .service
            .claim(position_id, &wallet, tx_hash, body.amount)
            .await?,
    ))
}

pub async fn emergency_withdraw(
    Path(position_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<Position>, AppError> {
    let position_id = parse_position_id(&position_id)?;
    let wallet = parse_wallet(&body.wallet_address)?;
    let tx_hash = parse_tx_hash(&body.tx_hash)?;
    Ok(Json(
        state
            .service
            .emergency_withdraw(position_id, &wallet, tx_hash)
            .await?,
    ))
}

pub async fn get_stats(
    Path(wallet): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserStats>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    Ok(Json(state.service.user_stats(&wallet).await?))
}

pub async fn calculate_rewards(State(state): State<AppState>) -> Result<Json<SweepSummary>, AppError> {
    Ok(Json(state.service.reward_sweep().run().await?))
}
