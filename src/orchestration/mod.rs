//! Caller-side workflows: load, run a lifecycle operation, commit.

use crate::domain::{TransactionFinalized, TxHash};
use crate::engine::LifecycleError;
use crate::store::StoreError;
use thiserror::Error;

pub mod service;
pub mod sweep;

pub use service::{
    ClaimOutcome, PoolOverview, PortfolioAnalytics, PortfolioHistory, PortfolioView,
    SortOrder, StakeRequest, StakingService, TransactionPage, TransactionQuery, WalletProfile,
    MAX_PAGE_LIMIT,
};
pub use sweep::{RewardSweep, SweepFailure, SweepSummary};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("transaction {0} already recorded")]
    DuplicateTransaction(TxHash),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Finalized(#[from] TransactionFinalized),

    #[error(transparent)]
    Store(#[from] StoreError),
}
