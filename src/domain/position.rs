//! Staking position record and its reward bookkeeping.

use crate::domain::{Decimal, PoolId, PositionId, TimeMs, TokenSymbol, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Active,
    Unstaking,
    Completed,
    EmergencyWithdraw,
}

impl PositionStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PositionStatus::Completed | PositionStatus::EmergencyWithdraw
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Active => "active",
            PositionStatus::Unstaking => "unstaking",
            PositionStatus::Completed => "completed",
            PositionStatus::EmergencyWithdraw => "emergency_withdraw",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PositionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PositionStatus::Active),
            "unstaking" => Ok(PositionStatus::Unstaking),
            "completed" => Ok(PositionStatus::Completed),
            "emergency_withdraw" => Ok(PositionStatus::EmergencyWithdraw),
            other => Err(format!("unknown position status: {}", other)),
        }
    }
}

/// Reward balances. `pending == earned - claimed` after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rewards {
    pub earned: Decimal,
    pub claimed: Decimal,
    pub pending: Decimal,
    pub last_calculated_at: Option<TimeMs>,
}

impl Rewards {
    pub fn zeroed(at: TimeMs) -> Self {
        Self {
            earned: Decimal::zero(),
            claimed: Decimal::zero(),
            pending: Decimal::zero(),
            last_calculated_at: Some(at),
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.pending == self.earned - self.claimed
    }
}

/// A recorded stake or unstake milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub external_ref: TxHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub timestamp: TimeMs,
}

impl LifecycleEvent {
    pub fn new(external_ref: TxHash, timestamp: TimeMs) -> Self {
        Self {
            external_ref,
            block_number: None,
            timestamp,
        }
    }
}

/// The most recent reward claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEvent {
    pub external_ref: TxHash,
    pub amount: Decimal,
    pub timestamp: TimeMs,
}

/// Pool attributes copied onto a position when it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMeta {
    pub name: String,
    pub token_symbol: TokenSymbol,
    pub lock_period_days: u32,
}

/// A staking commitment of one wallet into one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub owner: WalletAddress,
    pub pool_id: PoolId,
    pub pool_name: String,
    pub token_symbol: TokenSymbol,
    pub principal: Decimal,
    pub apy: Decimal,
    pub lock_period_days: u32,
    pub rewards: Rewards,
    pub status: PositionStatus,
    pub stake_event: Option<LifecycleEvent>,
    pub unstake_event: Option<LifecycleEvent>,
    pub last_claim_event: Option<ClaimEvent>,
    pub staking_started_at: TimeMs,
    pub staking_ended_at: Option<TimeMs>,
    pub network: String,
    /// Stored and reported, but accrual is always simple interest.
    pub auto_compound: bool,
    /// Optimistic concurrency counter owned by the store.
    pub version: u64,
    pub created_at: TimeMs,
}

impl Position {
    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    /// Expected reward per day at the current principal and APY.
    pub fn daily_reward(&self) -> Decimal {
        crate::engine::accrual::daily_reward(self.principal, self.apy)
    }

    pub fn total_value(&self) -> Decimal {
        self.principal + self.rewards.earned
    }

    pub fn lock_ends_at(&self) -> TimeMs {
        self.staking_started_at
            .plus_days(i64::from(self.lock_period_days))
    }

    pub fn is_locked(&self, now: TimeMs) -> bool {
        self.lock_period_days > 0 && now < self.lock_ends_at()
    }

    pub fn days_staked(&self, now: TimeMs) -> i64 {
        self.staking_started_at.whole_days_until(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PositionStatus::EmergencyWithdraw).unwrap();
        assert_eq!(json, "\"emergency_withdraw\"");
        assert_eq!(
            "emergency_withdraw".parse::<PositionStatus>().unwrap(),
            PositionStatus::EmergencyWithdraw
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(PositionStatus::Completed.is_terminal());
        assert!(PositionStatus::EmergencyWithdraw.is_terminal());
        assert!(!PositionStatus::Active.is_terminal());
        assert!(!PositionStatus::Unstaking.is_terminal());
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("paused".parse::<PositionStatus>().is_err());
    }
}
