//! Portfolio value over time.

use super::accrual;
use crate::domain::{Decimal, Position, TimeMs};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bucket interval must be positive, got {0} ms")]
pub struct InvalidBucketInterval(pub i64);

/// Portfolio totals at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub timestamp: TimeMs,
    pub date: String,
    pub total_staked: Decimal,
    pub total_rewards: Decimal,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
}

/// Lazy iterator over `start, start + step, ... <= end`.
///
/// Cloning restarts from the clone's current position, so a fresh clone
/// taken before iteration replays the full series.
#[derive(Debug, Clone)]
pub struct HistoryIter<'a> {
    positions: &'a [Position],
    next: Option<TimeMs>,
    end: TimeMs,
    step_ms: i64,
}

/// Build the value series for `positions` between `start` and `end`.
///
/// # Errors
/// `InvalidBucketInterval` if `bucket_interval_ms <= 0`.
pub fn history(
    positions: &[Position],
    start: TimeMs,
    end: TimeMs,
    bucket_interval_ms: i64,
) -> Result<HistoryIter<'_>, InvalidBucketInterval> {
    if bucket_interval_ms <= 0 {
        return Err(InvalidBucketInterval(bucket_interval_ms));
    }
    Ok(HistoryIter {
        positions,
        next: Some(start),
        end,
        step_ms: bucket_interval_ms,
    })
}

impl Iterator for HistoryIter<'_> {
    type Item = HistoryPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let t = self.next.filter(|t| *t <= self.end)?;
        self.next = t.as_ms().checked_add(self.step_ms).map(TimeMs::new);
        Some(point_at(self.positions, t))
    }
}

/// Whether `position` counts towards the portfolio at `t`.
fn is_staked_at(position: &Position, t: TimeMs) -> bool {
    position.staking_started_at <= t
        && position
            .unstake_event
            .as_ref()
            .map_or(true, |event| event.timestamp >= t)
}

fn point_at(positions: &[Position], t: TimeMs) -> HistoryPoint {
    let mut total_staked = Decimal::zero();
    let mut total_rewards = Decimal::zero();

    for p in positions.iter().filter(|p| is_staked_at(p, t)) {
        let projected = accrual::accrue(p.principal, p.apy, p.staking_started_at, t);
        total_staked = total_staked + p.principal;
        total_rewards = total_rewards + projected.min(p.rewards.earned);
    }

    HistoryPoint {
        timestamp: t,
        date: t.to_rfc3339(),
        total_staked,
        total_rewards,
        total_value: total_staked + total_rewards,
    }
}

pub fn summary(points: &[HistoryPoint]) -> HistorySummary {
    let start_value = points.first().map(|p| p.total_value).unwrap_or_default();
    let end_value = points.last().map(|p| p.total_value).unwrap_or_default();

    if points.len() < 2 {
        return HistorySummary {
            start_value,
            end_value,
            change: Decimal::zero(),
            change_percent: Decimal::zero(),
        };
    }

    let change = end_value - start_value;
    HistorySummary {
        start_value,
        end_value,
        change,
        change_percent: change.percent_of(start_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        LifecycleEvent, PoolId, PositionId, PositionStatus, Rewards, TxHash, MS_PER_DAY,
    };

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn position(principal: &str, started_day: i64, earned: &str) -> Position {
        let start = TimeMs::new(started_day * MS_PER_DAY);
        let mut rewards = Rewards::zeroed(start);
        rewards.earned = d(earned);
        rewards.pending = d(earned);
        Position {
            id: PositionId::generate(),
            owner: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            pool_id: PoolId::new(1),
            pool_name: "ETH Staking Pool".to_string(),
            token_symbol: "ETH".parse().unwrap(),
            principal: d(principal),
            apy: d("10"),
            lock_period_days: 0,
            rewards,
            status: PositionStatus::Active,
            stake_event: None,
            unstake_event: None,
            last_claim_event: None,
            staking_started_at: start,
            staking_ended_at: None,
            network: "ethereum".to_string(),
            auto_compound: false,
            version: 0,
            created_at: start,
        }
    }

    fn unstaked_on(mut p: Position, day: i64) -> Position {
        let tx: TxHash = format!("0x{:064x}", 9).parse().unwrap();
        p.status = PositionStatus::Unstaking;
        p.unstake_event = Some(LifecycleEvent::new(tx, TimeMs::new(day * MS_PER_DAY)));
        p
    }

    #[test]
    fn test_rejects_non_positive_interval() {
        assert_eq!(
            history(&[], TimeMs::new(0), TimeMs::new(10), 0).unwrap_err(),
            InvalidBucketInterval(0)
        );
        assert!(history(&[], TimeMs::new(0), TimeMs::new(10), -5).is_err());
    }

    #[test]
    fn test_time_points_include_end() {
        let points: Vec<_> = history(&[], TimeMs::new(0), TimeMs::new(3 * MS_PER_DAY), MS_PER_DAY)
            .unwrap()
            .collect();
        assert_eq!(points.len(), 4);
        assert_eq!(points[3].timestamp, TimeMs::new(3 * MS_PER_DAY));
        assert!(points.iter().all(|p| p.total_value.is_zero()));
    }

    #[test]
    fn test_empty_range_yields_nothing() {
        let mut iter = history(&[], TimeMs::new(10), TimeMs::new(0), 1).unwrap();
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_clone_restarts_series() {
        let positions = vec![position("3650", 0, "5")];
        let iter = history(&positions, TimeMs::new(0), TimeMs::new(4 * MS_PER_DAY), MS_PER_DAY)
            .unwrap();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_projection_clamped_to_recorded_earned() {
        let positions = vec![position("3650", 0, "2")];
        let points: Vec<_> = history(&positions, TimeMs::new(0), TimeMs::new(4 * MS_PER_DAY), MS_PER_DAY)
            .unwrap()
            .collect();

        let rewards: Vec<Decimal> = points.iter().map(|p| p.total_rewards).collect();
        assert_eq!(rewards, vec![d("0"), d("1"), d("2"), d("2"), d("2")]);
        assert_eq!(points[1].total_value, d("3651"));
    }

    #[test]
    fn test_only_positions_staked_at_each_point_count() {
        let positions = vec![position("100", 2, "0"), unstaked_on(position("200", 0, "0"), 1)];
        let points: Vec<_> = history(&positions, TimeMs::new(0), TimeMs::new(3 * MS_PER_DAY), MS_PER_DAY)
            .unwrap()
            .collect();

        let staked: Vec<Decimal> = points.iter().map(|p| p.total_staked).collect();
        // Day 1 is the unstake instant and still counts.
        assert_eq!(staked, vec![d("200"), d("200"), d("100"), d("100")]);
    }

    #[test]
    fn test_summary() {
        let positions = vec![position("100", 0, "0"), position("100", 1, "0")];
        let points: Vec<_> = history(&positions, TimeMs::new(0), TimeMs::new(MS_PER_DAY), MS_PER_DAY)
            .unwrap()
            .collect();
        let s = summary(&points);
        assert_eq!(s.start_value, d("100"));
        assert_eq!(s.end_value, d("200"));
        assert_eq!(s.change, d("100"));
        assert_eq!(s.change_percent, d("100"));
    }

    #[test]
    fn test_summary_single_point_has_no_change() {
        let points: Vec<_> = history(&[position("100", 0, "0")], TimeMs::new(0), TimeMs::new(0), 1)
            .unwrap()
            .collect();
        let s = summary(&points);
        assert_eq!(s.start_value, d("100"));
        assert_eq!(s.change_percent, Decimal::zero());
        assert_eq!(summary(&[]).end_value, Decimal::zero());
    }
}
