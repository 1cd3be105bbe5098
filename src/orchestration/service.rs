//! Staking workflows over an injected store and clock.

use super::sweep::RewardSweep;
use super::ServiceError;
use crate::clock::Clock;
use crate::domain::{
    Decimal, PoolCatalog, PoolDefinition, PoolId, Position, PositionId, PositionStatus, TimeMs,
    ProfileUpdate, TokenSymbol, TransactionFailure, TransactionRecord, TransactionStatus,
    TransactionType, TxHash, Wallet, WalletAddress,
};
use crate::engine::{
    activity, history, lifecycle, platform, portfolio, risk, AnalyticsSummary, GlobalActivity,
    HistoryPoint, HistorySummary, LeaderboardEntry, Period, PlatformStats, PoolComparisonEntry,
    PoolStats, PortfolioOverview, Recommendation, RewardTrend, RiskMetrics, TransactionSummary,
    UserStats,
};
use crate::store::{PositionCriteria, StakingStore, StoreError, TransactionCriteria};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Window for reward trends in analytics.
pub const REWARD_TREND_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeRequest {
    pub wallet: WalletAddress,
    pub pool_id: PoolId,
    pub amount: Decimal,
    pub tx_hash: TxHash,
    /// Must match the pool's token when given.
    pub token_symbol: Option<TokenSymbol>,
    /// Defaults to the pool's advertised APY.
    pub apy: Option<Decimal>,
    pub auto_compound: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub position: Position,
    pub claimed_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolOverview {
    #[serde(flatten)]
    pub definition: PoolDefinition,
    pub stats: PoolStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    #[serde(flatten)]
    pub overview: PortfolioOverview,
    pub positions: Vec<Position>,
    pub recent_transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHistory {
    pub period: Period,
    pub history: Vec<HistoryPoint>,
    pub summary: HistorySummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalytics {
    pub risk_metrics: RiskMetrics,
    pub reward_trends: Vec<RewardTrend>,
    pub pool_comparison: Vec<PoolComparisonEntry>,
    pub recommendations: Vec<Recommendation>,
    pub summary: AnalyticsSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub page: u32,
    pub limit: u32,
    pub tx_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub sort: SortOrder,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            tx_type: None,
            status: None,
            sort: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub pages: usize,
    pub current_page: u32,
    pub limit: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<TransactionRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletProfile {
    #[serde(flatten)]
    pub wallet: Wallet,
    pub portfolio_value: Decimal,
}

/// Validate 1-based paging arguments.
fn check_paging(page: u32, limit: u32) -> Result<(), ServiceError> {
    if page < 1 {
        return Err(ServiceError::InvalidInput("page must be at least 1".to_string()));
    }
    if limit < 1 || limit > MAX_PAGE_LIMIT {
        return Err(ServiceError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(())
}

/// Recompute the wallet's cached totals from its positions.
async fn refresh_wallet(
    store: &dyn StakingStore,
    owner: &WalletAddress,
    now: TimeMs,
) -> Result<Wallet, StoreError> {
    let positions = store
        .find_positions(&PositionCriteria::owned_by(owner.clone()))
        .await?;
    let stats = portfolio::user_stats(&positions, now);

    let mut wallet = store.find_or_create_wallet(owner, now).await?;
    wallet.refresh_stats(stats.total_staked, stats.total_rewards, now);
    store.save_wallet(&wallet).await?;
    Ok(wallet)
}

/// Refresh the wallet cache after a committed write. A failure leaves the
/// cache stale until the next refresh and is only logged.
pub(crate) async fn refresh_wallet_after_commit(
    store: &dyn StakingStore,
    owner: &WalletAddress,
    now: TimeMs,
) {
    if let Err(e) = refresh_wallet(store, owner, now).await {
        warn!(wallet = %owner, error = %e, "wallet cache refresh failed");
    }
}

#[derive(Debug, Clone)]
pub struct StakingService {
    store: Arc<dyn StakingStore>,
    clock: Arc<dyn Clock>,
    catalog: PoolCatalog,
    recent_limit: usize,
}

impl StakingService {
    pub fn new(
        store: Arc<dyn StakingStore>,
        clock: Arc<dyn Clock>,
        catalog: PoolCatalog,
        recent_limit: usize,
    ) -> Self {
        Self {
            store,
            clock,
            catalog,
            recent_limit,
        }
    }

    pub fn catalog(&self) -> &PoolCatalog {
        &self.catalog
    }

    pub fn now(&self) -> TimeMs {
        self.clock.now()
    }

    pub fn reward_sweep(&self) -> RewardSweep {
        RewardSweep::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Open a position and record its pending stake transaction.
    pub async fn stake(&self, request: StakeRequest) -> Result<Position, ServiceError> {
        let pool = self
            .catalog
            .get(request.pool_id)
            .ok_or_else(|| ServiceError::NotFound(format!("pool {}", request.pool_id)))?;

        if let Some(symbol) = &request.token_symbol {
            if symbol != &pool.token {
                return Err(ServiceError::InvalidInput(format!(
                    "pool {} stakes {}, not {}",
                    pool.id, pool.token, symbol
                )));
            }
        }
        if request.amount.is_positive()
            && (request.amount < pool.min_stake || request.amount > pool.max_stake)
        {
            return Err(ServiceError::InvalidInput(format!(
                "amount {} outside pool limits [{}, {}]",
                request.amount, pool.min_stake, pool.max_stake
            )));
        }
        self.ensure_unused(&request.tx_hash).await?;

        let now = self.clock.now();
        let mut position = lifecycle::create_position(
            request.wallet.clone(),
            pool.id,
            &pool.meta(),
            request.amount,
            request.apy.unwrap_or(pool.apy),
            request.tx_hash.clone(),
            now,
        )?;
        position.auto_compound = request.auto_compound;

        let amount = position.principal;
        let record = pending_record(&position, request.tx_hash, TransactionType::Stake, amount, now);

        self.store.find_or_create_wallet(&request.wallet, now).await?;
        let saved = self
            .store
            .open_position(&position, &record)
            .await
            .map_err(|e| duplicate_as_transaction(e, &record.tx_hash))?;
        refresh_wallet_after_commit(self.store.as_ref(), &saved.owner, now).await;

        info!(
            position_id = %saved.id,
            wallet = %saved.owner,
            pool_id = %saved.pool_id,
            amount = %saved.principal,
            tx_hash = %record.tx_hash,
            "position opened"
        );
        Ok(saved)
    }

    pub async fn unstake(
        &self,
        position_id: PositionId,
        wallet: &WalletAddress,
        tx_hash: TxHash,
    ) -> Result<Position, ServiceError> {
        self.ensure_unused(&tx_hash).await?;
        let now = self.clock.now();
        let mut position = self.owned_position(position_id, wallet).await?;

        lifecycle::unstake(&mut position, tx_hash.clone(), now)?;
        let amount = position.principal;
        let record = pending_record(&position, tx_hash, TransactionType::Unstake, amount, now);
        let saved = self.commit(&position, &record, now).await?;

        info!(
            position_id = %saved.id,
            wallet = %wallet,
            tx_hash = %record.tx_hash,
            "unstake started"
        );
        Ok(saved)
    }

    /// Claim `amount` (all pending when `None`).
    pub async fn claim(
        &self,
        position_id: PositionId,
        wallet: &WalletAddress,
        tx_hash: TxHash,
        amount: Option<Decimal>,
    ) -> Result<ClaimOutcome, ServiceError> {
        self.ensure_unused(&tx_hash).await?;
        let now = self.clock.now();
        let mut position = self.owned_position(position_id, wallet).await?;

        let claimed = lifecycle::claim(&mut position, tx_hash.clone(), amount, now)?;
        let record =
            pending_record(&position, tx_hash, TransactionType::ClaimRewards, claimed, now);
        let saved = self.commit(&position, &record, now).await?;

        info!(
            position_id = %saved.id,
            wallet = %wallet,
            amount = %claimed,
            tx_hash = %record.tx_hash,
            "rewards claimed"
        );
        Ok(ClaimOutcome {
            position: saved,
            claimed_amount: claimed,
        })
    }

    pub async fn emergency_withdraw(
        &self,
        position_id: PositionId,
        wallet: &WalletAddress,
        tx_hash: TxHash,
    ) -> Result<Position, ServiceError> {
        self.ensure_unused(&tx_hash).await?;
        let now = self.clock.now();
        let mut position = self.owned_position(position_id, wallet).await?;

        lifecycle::emergency_withdraw(&mut position, tx_hash.clone(), now)?;
        let record = pending_record(
            &position,
            tx_hash,
            TransactionType::EmergencyWithdraw,
            position.principal,
            now,
        );
        let saved = self.commit(&position, &record, now).await?;

        info!(
            position_id = %saved.id,
            wallet = %wallet,
            tx_hash = %record.tx_hash,
            "emergency withdraw"
        );
        Ok(saved)
    }

    /// Mark a pending record confirmed. Confirming an unstake completes its position.
    pub async fn confirm_transaction(
        &self,
        tx_hash: &TxHash,
        block_number: u64,
        gas_used: Option<u64>,
        gas_price: Option<Decimal>,
    ) -> Result<TransactionRecord, ServiceError> {
        let now = self.clock.now();
        let mut record = self.transaction(tx_hash).await?;
        record.confirm(block_number, gas_used, gas_price)?;

        let completed = if record.tx_type == TransactionType::Unstake {
            let mut position = self
                .store
                .find_position(record.position_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("position {}", record.position_id)))?;
            lifecycle::complete_unstake(&mut position, Some(block_number))?;
            Some(position)
        } else {
            None
        };

        let saved = self
            .store
            .commit_settlement(&record, completed.as_ref())
            .await?;
        if let Some(position) = saved {
            refresh_wallet_after_commit(self.store.as_ref(), &position.owner, now).await;
            info!(position_id = %position.id, "unstake completed");
        }

        info!(tx_hash = %tx_hash, block_number, "transaction confirmed");
        Ok(record)
    }

    pub async fn fail_transaction(
        &self,
        tx_hash: &TxHash,
        failure: TransactionFailure,
    ) -> Result<TransactionRecord, ServiceError> {
        let mut record = self.transaction(tx_hash).await?;
        record.fail(failure)?;
        self.store.commit_settlement(&record, None).await?;

        info!(tx_hash = %tx_hash, "transaction failed");
        Ok(record)
    }

    /// Record wallet activity. Unknown wallets are left alone.
    pub async fn touch_wallet(&self, wallet: &WalletAddress) -> Result<bool, ServiceError> {
        match self.store.find_wallet(wallet).await? {
            Some(mut record) => {
                record.touch(self.clock.now());
                self.store.save_wallet(&record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply a validated profile edit to an existing wallet.
    pub async fn update_profile(
        &self,
        wallet: &WalletAddress,
        update: ProfileUpdate,
    ) -> Result<WalletProfile, ServiceError> {
        let mut record = self
            .store
            .find_wallet(wallet)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("wallet {}", wallet)))?;
        record
            .apply_profile(update, self.clock.now())
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        self.store.save_profile(&record).await?;

        info!(wallet = %wallet, "profile updated");
        Ok(WalletProfile {
            portfolio_value: record.portfolio_value(),
            wallet: record,
        })
    }

    // =========================================================================
    // Read views
    // =========================================================================

    /// Positions with rewards projected to now. `None` returns every status.
    pub async fn positions(
        &self,
        wallet: &WalletAddress,
        status: Option<PositionStatus>,
    ) -> Result<Vec<Position>, ServiceError> {
        let mut criteria = PositionCriteria::owned_by(wallet.clone());
        criteria.status = status;
        let now = self.clock.now();
        Ok(self
            .store
            .find_positions(&criteria)
            .await?
            .iter()
            .map(|p| lifecycle::project(p, now))
            .collect())
    }

    pub async fn user_stats(&self, wallet: &WalletAddress) -> Result<UserStats, ServiceError> {
        let positions = self.wallet_positions(wallet).await?;
        Ok(portfolio::user_stats(&positions, self.clock.now()))
    }

    pub async fn portfolio(&self, wallet: &WalletAddress) -> Result<PortfolioView, ServiceError> {
        let now = self.clock.now();
        let positions = self.wallet_positions(wallet).await?;
        let mut recent = self
            .store
            .find_transactions(&TransactionCriteria::for_wallet(wallet.clone()))
            .await?;
        recent.truncate(self.recent_limit);

        Ok(PortfolioView {
            overview: portfolio::portfolio_overview(&positions, now),
            positions: positions.iter().map(|p| lifecycle::project(p, now)).collect(),
            recent_transactions: recent,
        })
    }

    pub async fn history(
        &self,
        wallet: &WalletAddress,
        period: Period,
    ) -> Result<PortfolioHistory, ServiceError> {
        let now = self.clock.now();
        let positions: Vec<Position> = self
            .wallet_positions(wallet)
            .await?
            .iter()
            .map(|p| lifecycle::project(p, now))
            .collect();
        let start = period.since(now).unwrap_or_else(|| {
            positions
                .iter()
                .map(|p| p.staking_started_at)
                .min()
                .unwrap_or(now)
        });

        let points: Vec<HistoryPoint> = history::history(&positions, start, now, period.bucket_ms())
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?
            .collect();
        debug!(wallet = %wallet, period = %period, points = points.len(), "history built");

        Ok(PortfolioHistory {
            period,
            summary: history::summary(&points),
            history: points,
        })
    }

    pub async fn analytics(
        &self,
        wallet: &WalletAddress,
    ) -> Result<PortfolioAnalytics, ServiceError> {
        let now = self.clock.now();
        let projected: Vec<Position> = self
            .wallet_positions(wallet)
            .await?
            .iter()
            .filter(|p| p.is_active())
            .map(|p| lifecycle::project(p, now))
            .collect();
        let transactions = self
            .store
            .find_transactions(&TransactionCriteria::for_wallet(wallet.clone()))
            .await?;

        let metrics = risk::risk_metrics(&projected);
        let comparison = portfolio::pool_comparison(&projected, now);
        Ok(PortfolioAnalytics {
            recommendations: risk::recommendations(&metrics, &projected),
            risk_metrics: metrics.rounded(),
            reward_trends: activity::reward_trends(
                &transactions,
                now.minus_days(REWARD_TREND_DAYS),
            ),
            summary: portfolio::analytics_summary(&comparison, projected.len()),
            pool_comparison: comparison,
        })
    }

    /// Catalog entries with live pool statistics.
    pub async fn pools(&self) -> Result<Vec<PoolOverview>, ServiceError> {
        let lookups = self.catalog.pools().iter().map(|definition| async move {
            let positions = self
                .store
                .find_positions(&PositionCriteria::in_pool(definition.id))
                .await?;
            Ok::<_, ServiceError>(PoolOverview {
                definition: definition.clone(),
                stats: portfolio::pool_stats(&positions),
            })
        });
        try_join_all(lookups).await
    }

    pub async fn transactions(
        &self,
        wallet: &WalletAddress,
        query: &TransactionQuery,
    ) -> Result<TransactionPage, ServiceError> {
        check_paging(query.page, query.limit)?;

        let criteria = TransactionCriteria {
            wallet: Some(wallet.clone()),
            tx_type: query.tx_type,
            status: query.status,
            ..TransactionCriteria::default()
        };
        let mut records = self.store.find_transactions(&criteria).await?;
        if query.sort == SortOrder::Asc {
            records.reverse();
        }

        let total = records.len();
        let limit = query.limit as usize;
        let skip = (query.page as usize - 1).saturating_mul(limit);
        let transactions: Vec<TransactionRecord> =
            records.into_iter().skip(skip).take(limit).collect();

        Ok(TransactionPage {
            transactions,
            pagination: Pagination {
                total,
                pages: total.div_ceil(limit),
                current_page: query.page,
                limit: query.limit,
                has_next: skip + limit < total,
                has_prev: query.page > 1,
            },
        })
    }

    pub async fn transaction_summary(
        &self,
        wallet: &WalletAddress,
        period: Period,
    ) -> Result<TransactionSummary, ServiceError> {
        let now = self.clock.now();
        let records = self
            .store
            .find_transactions(&TransactionCriteria::for_wallet(wallet.clone()))
            .await?;
        Ok(activity::transaction_summary(&records, period.since(now), now))
    }

    pub async fn transaction(&self, tx_hash: &TxHash) -> Result<TransactionRecord, ServiceError> {
        self.store
            .find_transaction(tx_hash)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", tx_hash)))
    }

    pub async fn global_stats(&self, period: Period) -> Result<GlobalActivity, ServiceError> {
        let since = period.since(self.clock.now());
        let criteria = TransactionCriteria {
            since,
            ..TransactionCriteria::default()
        };
        let records = self.store.find_transactions(&criteria).await?;
        Ok(activity::global_stats(&records, since))
    }

    /// Wallet profile, creating the wallet on first sight.
    pub async fn wallet_profile(&self, wallet: &WalletAddress) -> Result<WalletProfile, ServiceError> {
        let record = self
            .store
            .find_or_create_wallet(wallet, self.clock.now())
            .await?;
        Ok(WalletProfile {
            portfolio_value: record.portfolio_value(),
            wallet: record,
        })
    }

    pub async fn leaderboard(&self, page: u32, limit: u32) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        check_paging(page, limit)?;
        let wallets = self.store.list_wallets().await?;
        Ok(platform::leaderboard(&wallets, page as usize, limit as usize))
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats, ServiceError> {
        let wallets = self.store.list_wallets().await?;
        Ok(platform::platform_stats(&wallets, self.clock.now()))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn wallet_positions(&self, wallet: &WalletAddress) -> Result<Vec<Position>, ServiceError> {
        Ok(self
            .store
            .find_positions(&PositionCriteria::owned_by(wallet.clone()))
            .await?)
    }

    /// The position, if it exists and belongs to `wallet`.
    async fn owned_position(
        &self,
        position_id: PositionId,
        wallet: &WalletAddress,
    ) -> Result<Position, ServiceError> {
        match self.store.find_position(position_id).await? {
            Some(p) if &p.owner == wallet => Ok(p),
            _ => Err(ServiceError::NotFound(format!("position {}", position_id))),
        }
    }

    async fn ensure_unused(&self, tx_hash: &TxHash) -> Result<(), ServiceError> {
        if self.store.find_transaction(tx_hash).await?.is_some() {
            return Err(ServiceError::DuplicateTransaction(tx_hash.clone()));
        }
        Ok(())
    }

    async fn commit(
        &self,
        position: &Position,
        record: &TransactionRecord,
        now: TimeMs,
    ) -> Result<Position, ServiceError> {
        let saved = self
            .store
            .commit_transition(position, record)
            .await
            .map_err(|e| duplicate_as_transaction(e, &record.tx_hash))?;
        refresh_wallet_after_commit(self.store.as_ref(), &saved.owner, now).await;
        Ok(saved)
    }
}

/// Pending ledger entry for an event on `position`.
fn pending_record(
    position: &Position,
    tx_hash: TxHash,
    tx_type: TransactionType,
    amount: Decimal,
    now: TimeMs,
) -> TransactionRecord {
    TransactionRecord::pending(
        tx_hash,
        position.owner.clone(),
        tx_type,
        amount,
        position.token_symbol.clone(),
        position.pool_id,
        position.id,
        position.network.clone(),
        now,
    )
}

/// A hash reused between the pre-check and the commit surfaces the same way
/// as one caught by the pre-check.
fn duplicate_as_transaction(err: StoreError, tx_hash: &TxHash) -> ServiceError {
    match err {
        StoreError::Duplicate(what) if what.starts_with("transaction") => {
            ServiceError::DuplicateTransaction(tx_hash.clone())
        }
        other => ServiceError::Store(other),
    }
}
