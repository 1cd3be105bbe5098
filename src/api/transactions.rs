use crate::api::portfolio::PeriodQuery;
use crate::api::{parse_period, parse_tx_hash, parse_wallet, AppState};
use crate::domain::{Decimal, TransactionFailure, TransactionRecord, TransactionStatus, TransactionType};
use crate::engine::{GlobalActivity, TransactionSummary};
use crate::error::AppError;
use crate::orchestration::service::DEFAULT_PAGE_LIMIT;
use crate::orchestration::{SortOrder, TransactionPage, TransactionQuery};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub status: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBody {
    pub block_number: u64,
    pub gas_used: Option<u64>,
    pub gas_price: Option<Decimal>,
}

impl TransactionsQuery {
    fn into_query(self) -> Result<TransactionQuery, AppError> {
        let tx_type = self
            .tx_type
            .as_deref()
            .map(str::parse::<TransactionType>)
            .transpose()
            .map_err(AppError::BadRequest)?;
        let status = self
            .status
            .as_deref()
            .map(str::parse::<TransactionStatus>)
            .transpose()
            .map_err(AppError::BadRequest)?;
        let sort = match self.sort_order.as_deref() {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "sortOrder must be asc or desc, got {}",
                    other
                )))
            }
        };

        Ok(TransactionQuery {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            tx_type,
            status,
            sort,
        })
    }
}

pub async fn get_transactions(
    Path(wallet): Path<String>,
    Query(params): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransactionPage>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    let query = params.into_query()?;
    Ok(Json(state.service.transactions(&wallet, &query).await?))
}

pub async fn get_summary(
    Path(wallet): Path<String>,
    Query(params): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransactionSummary>, AppError> {
    let wallet = parse_wallet(&wallet)?;
    let period = parse_period(params.period.as_deref())?;
    Ok(Json(state.service.transaction_summary(&wallet, period).await?))
}

pub async fn get_transaction(
    Path(tx_hash): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TransactionRecord>, AppError> {
    let tx_hash = parse_tx_hash(&tx_hash)?;
    Ok(Json(state.service.transaction(&tx_hash).await?))
}

pub async fn confirm_transaction(
    Path(tx_hash): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<TransactionRecord>, AppError> {
    let tx_hash = parse_tx_hash(&tx_hash)?;
    Ok(Json(
        state
            .service
            .confirm_transaction(&tx_hash, body.block_number, body.gas_used, body.gas_price)
            .await?,
    ))
}

pub async fn fail_transaction(
    Path(tx_hash): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<TransactionFailure>,
) -> Result<Json<TransactionRecord>, AppError> {
    let tx_hash = parse_tx_hash(&tx_hash)?;
    Ok(Json(state.service.fail_transaction(&tx_hash, body).await?))
}

pub async fn get_global_stats(
    Query(params): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> Result<Json<GlobalActivity>, AppError> {
    let period = parse_period(params.period.as_deref())?;
    Ok(Json(state.service.global_stats(period).await?))
}
