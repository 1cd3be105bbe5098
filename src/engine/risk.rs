//! Concentration risk and portfolio recommendations.

use crate::domain::{Decimal, PoolId, Position};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    fn from_concentration(concentration: Decimal) -> Self {
        if concentration > Decimal::from_i64(70) {
            RiskLevel::High
        } else if concentration > Decimal::from_i64(40) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub diversification_score: Decimal,
    pub concentration_risk: Decimal,
    pub largest_pool_share: Decimal,
    pub risk_level: RiskLevel,
    pub total_pools: usize,
    pub total_staked: Decimal,
}

impl RiskMetrics {
    /// Copy with the two scores rounded to whole numbers for display.
    pub fn rounded(&self) -> Self {
        Self {
            diversification_score: self.diversification_score.round(),
            concentration_risk: self.concentration_risk.round(),
            ..self.clone()
        }
    }
}

/// Risk metrics over active positions. Inactive inputs are ignored.
pub fn risk_metrics(positions: &[Position]) -> RiskMetrics {
    let mut by_pool: BTreeMap<PoolId, Decimal> = BTreeMap::new();
    for p in positions.iter().filter(|p| p.is_active()) {
        let slot = by_pool.entry(p.pool_id).or_default();
        *slot = *slot + p.principal;
    }

    let total_staked: Decimal = by_pool.values().sum();
    let largest = by_pool.values().copied().max().unwrap_or_default();
    let largest_pool_share = largest.percent_of(total_staked);
    let total_pools = by_pool.len();

    let spread = Decimal::one() - largest_pool_share / Decimal::hundred();
    let diversification_score =
        (Decimal::from_i64(total_pools as i64 * 20) * spread).min(Decimal::hundred());

    RiskMetrics {
        diversification_score,
        concentration_risk: largest_pool_share,
        largest_pool_share,
        risk_level: RiskLevel::from_concentration(largest_pool_share),
        total_pools,
        total_staked,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Risk,
    Diversification,
    Rewards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

impl Recommendation {
    fn new(kind: RecommendationKind, priority: Priority, title: &str, message: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            priority,
        }
    }
}

/// Ordered advice: risk, then diversification, then unclaimed rewards.
pub fn recommendations(metrics: &RiskMetrics, positions: &[Position]) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if metrics.concentration_risk > Decimal::from_i64(70) {
        out.push(Recommendation::new(
            RecommendationKind::Risk,
            Priority::High,
            "High Concentration Risk",
            "Consider diversifying across more pools to reduce risk",
        ));
    }

    if metrics.total_pools < 2 && metrics.total_staked > Decimal::hundred() {
        out.push(Recommendation::new(
            RecommendationKind::Diversification,
            Priority::Medium,
            "Diversify Your Portfolio",
            "Stake in multiple pools to spread risk and maximize returns",
        ));
    }

    let one_percent = Decimal::one() / Decimal::hundred();
    let has_unclaimed = positions
        .iter()
        .filter(|p| p.is_active())
        .any(|p| p.rewards.pending > p.principal * one_percent);
    if has_unclaimed {
        out.push(Recommendation::new(
            RecommendationKind::Rewards,
            Priority::Low,
            "Unclaimed Rewards Available",
            "You have significant unclaimed rewards. Consider claiming them.",
        ));
    }

    out
}
