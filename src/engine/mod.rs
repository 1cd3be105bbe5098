//! Pure computation engine for reward accrual, position lifecycle and
//! portfolio views. Nothing here performs I/O.

use crate::domain::{Decimal, PositionStatus};
use thiserror::Error;

pub mod accrual;
pub mod activity;
pub mod history;
pub mod lifecycle;
pub mod platform;
pub mod portfolio;
pub mod risk;

pub use activity::{GlobalActivity, Period, RewardTrend, TransactionSummary};
pub use history::{HistoryIter, HistoryPoint, HistorySummary, InvalidBucketInterval};
pub use platform::{LeaderboardEntry, PlatformStats};
pub use portfolio::{
    AnalyticsSummary, DistributionEntry, PerformanceMetrics, PoolComparisonEntry, PoolStats,
    PortfolioOverview, UserStats,
};
pub use risk::{Recommendation, RiskLevel, RiskMetrics};

/// Rejected lifecycle operation. The position is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("apy must be within [0, 1000], got {0}")]
    InvalidApy(Decimal),

    #[error("cannot {operation} a position that is {status}")]
    InvalidState {
        operation: &'static str,
        status: PositionStatus,
    },

    #[error("no rewards available to claim")]
    NoRewardsAvailable,

    #[error("claim of {requested} exceeds pending rewards of {available}")]
    ClaimExceedsPending {
        requested: Decimal,
        available: Decimal,
    },
}
