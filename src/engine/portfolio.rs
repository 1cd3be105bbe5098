//! Cross-position summaries.
//!
//! All functions are read-only over caller-supplied snapshots. Positions are
//! projected to `now` where a view reports live rewards; inputs are never
//! mutated.

use super::lifecycle;
use crate::domain::{Decimal, PoolId, Position, PositionStatus, TimeMs};
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals over a wallet's active positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_staked: Decimal,
    pub total_rewards: Decimal,
    pub total_pending: Decimal,
    pub active_positions: usize,
    #[serde(rename = "avgAPY")]
    pub avg_apy: Decimal,
}

impl UserStats {
    pub fn empty() -> Self {
        Self {
            total_staked: Decimal::zero(),
            total_rewards: Decimal::zero(),
            total_pending: Decimal::zero(),
            active_positions: 0,
            avg_apy: Decimal::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub total_staked: Decimal,
    pub total_stakers: usize,
    pub avg_stake: Decimal,
    pub total_rewards_paid: Decimal,
}

/// One pool's slice of a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    pub pool_id: PoolId,
    pub pool_name: String,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub rewards: Decimal,
    pub apy: Decimal,
}

impl DistributionEntry {
    pub fn reward_ratio(&self) -> Decimal {
        self.rewards.ratio_or_zero(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_return: Decimal,
    #[serde(rename = "avgAPY")]
    pub avg_apy: Decimal,
    pub best_performing_pool: Option<DistributionEntry>,
    /// Whole days since the earliest active position started.
    pub staking_duration: i64,
    pub active_positions: usize,
    pub completed_positions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolComparisonEntry {
    pub pool_id: PoolId,
    pub pool_name: String,
    pub staked_amount: Decimal,
    pub percentage: Decimal,
    pub apy: Decimal,
    pub total_rewards: Decimal,
    pub roi: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_positions: usize,
    #[serde(rename = "avgAPY")]
    pub avg_apy: Decimal,
    #[serde(rename = "totalROI")]
    pub total_roi: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioOverview {
    #[serde(flatten)]
    pub stats: UserStats,
    pub total_value: Decimal,
    pub lifetime_rewards: Decimal,
    pub portfolio_distribution: Vec<DistributionEntry>,
    pub performance_metrics: PerformanceMetrics,
}

fn project_all(positions: &[Position], now: TimeMs) -> Vec<Position> {
    positions
        .iter()
        .map(|p| lifecycle::project(p, now))
        .collect()
}

/// Summary of the active positions, with rewards projected to `now`.
pub fn user_stats(positions: &[Position], now: TimeMs) -> UserStats {
    let active: Vec<Position> = positions
        .iter()
        .filter(|p| p.is_active())
        .map(|p| lifecycle::project(p, now))
        .collect();

    let total_staked: Decimal = active.iter().map(|p| p.principal).sum();
    let weighted_apy: Decimal = active.iter().map(|p| p.apy * p.principal).sum();

    UserStats {
        total_staked,
        total_rewards: active.iter().map(|p| p.rewards.earned).sum(),
        total_pending: active.iter().map(|p| p.rewards.pending).sum(),
        active_positions: active.len(),
        avg_apy: weighted_apy.ratio_or_zero(total_staked),
    }
}

/// Pool-level totals. Staked figures cover active positions; rewards paid
/// cover every status.
pub fn pool_stats(positions: &[Position]) -> PoolStats {
    let active: Vec<&Position> = positions.iter().filter(|p| p.is_active()).collect();
    let total_staked: Decimal = active.iter().map(|p| p.principal).sum();

    PoolStats {
        total_staked,
        total_stakers: active.len(),
        avg_stake: total_staked.ratio_or_zero(Decimal::from_i64(active.len() as i64)),
        total_rewards_paid: positions.iter().map(|p| p.rewards.claimed).sum(),
    }
}

/// Principal and rewards grouped by pool, in ascending pool id order.
pub fn portfolio_distribution(positions: &[Position]) -> Vec<DistributionEntry> {
    let mut groups: BTreeMap<PoolId, DistributionEntry> = BTreeMap::new();
    for p in positions {
        let entry = groups.entry(p.pool_id).or_insert_with(|| DistributionEntry {
            pool_id: p.pool_id,
            pool_name: p.pool_name.clone(),
            amount: Decimal::zero(),
            percentage: Decimal::zero(),
            rewards: Decimal::zero(),
            apy: p.apy,
        });
        entry.amount = entry.amount + p.principal;
        entry.rewards = entry.rewards + p.rewards.earned;
    }

    let total: Decimal = groups.values().map(|g| g.amount).sum();
    groups
        .into_values()
        .map(|mut g| {
            g.percentage = g.amount.percent_of(total);
            g
        })
        .collect()
}

/// Group with the highest `rewards / amount`. Empty groups are skipped and
/// ties go to the lowest pool id.
pub fn best_performing_pool(distribution: &[DistributionEntry]) -> Option<&DistributionEntry> {
    let mut best: Option<&DistributionEntry> = None;
    let mut candidates: Vec<&DistributionEntry> =
        distribution.iter().filter(|g| g.amount.is_positive()).collect();
    candidates.sort_by_key(|g| g.pool_id);

    for group in candidates {
        match best {
            Some(current) if group.reward_ratio() <= current.reward_ratio() => {}
            _ => best = Some(group),
        }
    }
    best
}

pub fn performance_metrics(positions: &[Position], now: TimeMs) -> PerformanceMetrics {
    let projected = project_all(positions, now);
    let stats = user_stats(positions, now);

    let all_principal: Decimal = projected.iter().map(|p| p.principal).sum();
    let lifetime_rewards: Decimal = projected.iter().map(|p| p.rewards.earned).sum();
    let distribution = portfolio_distribution(&projected);

    let staking_duration = projected
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.staking_started_at)
        .min()
        .map(|start| start.whole_days_until(now))
        .unwrap_or(0);

    PerformanceMetrics {
        total_return: lifetime_rewards.percent_of(all_principal),
        avg_apy: stats.avg_apy,
        best_performing_pool: best_performing_pool(&distribution).cloned(),
        staking_duration,
        active_positions: stats.active_positions,
        completed_positions: projected
            .iter()
            .filter(|p| p.status == PositionStatus::Completed)
            .count(),
    }
}

/// Per-pool comparison over active positions, largest stake first.
pub fn pool_comparison(positions: &[Position], now: TimeMs) -> Vec<PoolComparisonEntry> {
    let active: Vec<Position> = positions
        .iter()
        .filter(|p| p.is_active())
        .map(|p| lifecycle::project(p, now))
        .collect();
    let total_staked: Decimal = active.iter().map(|p| p.principal).sum();

    let mut by_pool: BTreeMap<PoolId, Vec<&Position>> = BTreeMap::new();
    for p in &active {
        by_pool.entry(p.pool_id).or_default().push(p);
    }

    let mut entries: Vec<PoolComparisonEntry> = by_pool
        .into_iter()
        .map(|(pool_id, members)| {
            let staked_amount: Decimal = members.iter().map(|p| p.principal).sum();
            let apy_sum: Decimal = members.iter().map(|p| p.apy).sum();
            let total_rewards: Decimal = members.iter().map(|p| p.rewards.earned).sum();
            PoolComparisonEntry {
                pool_id,
                pool_name: members[0].pool_name.clone(),
                staked_amount,
                percentage: staked_amount.percent_of(total_staked),
                apy: apy_sum.ratio_or_zero(Decimal::from_i64(members.len() as i64)),
                total_rewards,
                roi: total_rewards.percent_of(staked_amount),
            }
        })
        .collect();

    // Stable sort keeps ascending pool id among equal stakes.
    entries.sort_by(|a, b| b.staked_amount.cmp(&a.staked_amount));
    entries
}

pub fn analytics_summary(comparison: &[PoolComparisonEntry], total_positions: usize) -> AnalyticsSummary {
    let total_staked: Decimal = comparison.iter().map(|c| c.staked_amount).sum();
    let total_rewards: Decimal = comparison.iter().map(|c| c.total_rewards).sum();
    AnalyticsSummary {
        total_positions,
        avg_apy: comparison
            .iter()
            .map(|c| c.apy * c.percentage / Decimal::hundred())
            .sum(),
        total_roi: total_rewards.percent_of(total_staked),
    }
}

pub fn portfolio_overview(positions: &[Position], now: TimeMs) -> PortfolioOverview {
    let projected = project_all(positions, now);
    let stats = user_stats(positions, now);
    let lifetime_rewards: Decimal = projected.iter().map(|p| p.rewards.earned).sum();

    PortfolioOverview {
        total_value: stats.total_staked + stats.total_rewards,
        lifetime_rewards,
        portfolio_distribution: portfolio_distribution(&projected),
        performance_metrics: performance_metrics(positions, now),
        stats,
    }
}
