//! Position state machine.
//!
//! ```text
//! active ──unstake──▶ unstaking ──complete──▶ completed
//!   │
//!   └──emergency_withdraw──▶ emergency_withdraw
//! ```
//!
//! Accrual runs only while a position is `active`. Every function here is
//! pure with respect to I/O: callers persist the mutated position and append
//! the correlated ledger record.

use super::accrual;
use super::LifecycleError;
use crate::domain::{
    ClaimEvent, Decimal, LifecycleEvent, PoolId, PoolMeta, Position, PositionId, PositionStatus,
    Rewards, TimeMs, TxHash, WalletAddress,
};

/// Upper bound on the APY percentage a position may carry.
pub const MAX_APY: i64 = 1000;

pub const DEFAULT_NETWORK: &str = "ethereum";

/// Decimal places kept on reward balances (wei precision).
/// At this scale `earned + delta` and `earned - claimed` stay exact.
pub const REWARD_SCALE: u32 = 18;

/// Open a new active position with zeroed rewards.
///
/// # Errors
/// `InvalidAmount` if `principal <= 0`, `InvalidApy` if `apy` is outside `[0, 1000]`.
pub fn create_position(
    owner: WalletAddress,
    pool_id: PoolId,
    pool: &PoolMeta,
    principal: Decimal,
    apy: Decimal,
    stake_ref: TxHash,
    now: TimeMs,
) -> Result<Position, LifecycleError> {
    if !principal.is_positive() {
        return Err(LifecycleError::InvalidAmount(principal));
    }
    if apy.is_negative() || apy > Decimal::from_i64(MAX_APY) {
        return Err(LifecycleError::InvalidApy(apy));
    }

    Ok(Position {
        id: PositionId::generate(),
        owner,
        pool_id,
        pool_name: pool.name.clone(),
        token_symbol: pool.token_symbol.clone(),
        principal,
        apy,
        lock_period_days: pool.lock_period_days,
        rewards: Rewards::zeroed(now),
        status: PositionStatus::Active,
        stake_event: Some(LifecycleEvent::new(stake_ref, now)),
        unstake_event: None,
        last_claim_event: None,
        staking_started_at: now,
        staking_ended_at: None,
        network: DEFAULT_NETWORK.to_string(),
        auto_compound: false,
        version: 0,
        created_at: now,
    })
}

/// Fold accrual since the last calculation into `earned` and `pending`.
///
/// Returns the accrued delta, rounded to [`REWARD_SCALE`]. No-op (zero) unless the position is active.
/// Repeated calls with the same `now` accrue nothing. A `now` earlier than
/// the last calculation accrues nothing and leaves the watermark in place.
pub fn recompute_rewards(position: &mut Position, now: TimeMs) -> Decimal {
    if !position.is_active() {
        return Decimal::zero();
    }

    let from = position
        .rewards
        .last_calculated_at
        .unwrap_or(position.staking_started_at);
    if now < from {
        return Decimal::zero();
    }

    let delta =
        accrual::accrue(position.principal, position.apy, from, now).round_dp(REWARD_SCALE);
    position.rewards.earned = position.rewards.earned + delta;
    settle_pending(&mut position.rewards);
    position.rewards.last_calculated_at = Some(now);
    delta
}

fn settle_pending(rewards: &mut Rewards) {
    rewards.pending = rewards.earned - rewards.claimed;
}

/// Read-only projection: a copy of `position` with rewards recomputed as of `now`.
pub fn project(position: &Position, now: TimeMs) -> Position {
    let mut projected = position.clone();
    recompute_rewards(&mut projected, now);
    projected
}

/// Claim `amount` (or everything pending when `None` / non-positive).
///
/// Returns the amount claimed, rounded to [`REWARD_SCALE`]. Partial claims
/// leave the remainder pending.
///
/// # Errors
/// `InvalidState` unless active, `NoRewardsAvailable` when there is nothing
/// to claim, `ClaimExceedsPending` when `amount` is above the pending balance.
pub fn claim(
    position: &mut Position,
    external_ref: TxHash,
    amount: Option<Decimal>,
    now: TimeMs,
) -> Result<Decimal, LifecycleError> {
    require_status(position, PositionStatus::Active, "claim")?;
    recompute_rewards(position, now);

    let pending = position.rewards.pending;
    let claim_amount = amount
        .filter(|a| a.is_positive())
        .map_or(pending, |a| a.round_dp(REWARD_SCALE));
    if !claim_amount.is_positive() {
        return Err(LifecycleError::NoRewardsAvailable);
    }
    if claim_amount > pending {
        return Err(LifecycleError::ClaimExceedsPending {
            requested: claim_amount,
            available: pending,
        });
    }

    position.rewards.claimed = position.rewards.claimed + claim_amount;
    settle_pending(&mut position.rewards);
    position.last_claim_event = Some(ClaimEvent {
        external_ref,
        amount: claim_amount,
        timestamp: now,
    });
    Ok(claim_amount)
}

/// Begin unstaking. Accrual is settled up to `now` and then frozen.
///
/// # Errors
/// `InvalidState` unless active.
pub fn unstake(
    position: &mut Position,
    external_ref: TxHash,
    now: TimeMs,
) -> Result<(), LifecycleError> {
    require_status(position, PositionStatus::Active, "unstake")?;
    recompute_rewards(position, now);

    position.status = PositionStatus::Unstaking;
    position.unstake_event = Some(LifecycleEvent::new(external_ref, now));
    position.staking_ended_at = Some(now);
    Ok(())
}

/// Exit immediately. Accrual since the last recompute is forfeited.
///
/// # Errors
/// `InvalidState` unless active.
pub fn emergency_withdraw(
    position: &mut Position,
    external_ref: TxHash,
    now: TimeMs,
) -> Result<(), LifecycleError> {
    require_status(position, PositionStatus::Active, "emergency_withdraw")?;

    position.status = PositionStatus::EmergencyWithdraw;
    position.unstake_event = Some(LifecycleEvent::new(external_ref, now));
    position.staking_ended_at = Some(now);
    Ok(())
}

/// Finish an unstake once the withdrawal is confirmed on chain.
///
/// # Errors
/// `InvalidState` unless unstaking.
pub fn complete_unstake(
    position: &mut Position,
    block_number: Option<u64>,
) -> Result<(), LifecycleError> {
    require_status(position, PositionStatus::Unstaking, "complete_unstake")?;

    position.status = PositionStatus::Completed;
    if let (Some(event), Some(block)) = (position.unstake_event.as_mut(), block_number) {
        event.block_number = Some(block);
    }
    Ok(())
}

fn require_status(
    position: &Position,
    required: PositionStatus,
    operation: &'static str,
) -> Result<(), LifecycleError> {
    if position.status != required {
        return Err(LifecycleError::InvalidState {
            operation,
            status: position.status,
        });
    }
    Ok(())
}
