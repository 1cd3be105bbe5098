use crate::api::{parse_period, parse_wallet, AppState};
use crate::error::AppError;
use crate::orchestration::{PortfolioAnalytics, PortfolioHistory, PortfolioView};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

pub async fn get_portfolio(
    Path(wallet): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PortfolioView>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    Ok(Json(state.service.portfolio(&wallet).await?))
}

pub async fn get_history(
    Path(wallet): Path<String>,
    Query(params): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> Result<Json<PortfolioHistory>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    let period = parse_period(params.period.as_deref())?;
    Ok(Json(state.service.history(&wallet, period).await?))
}

pub async fn get_analytics(
    Path(wallet): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PortfolioAnalytics>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    Ok(Json(state.service.analytics(&wallet).await?))
}
