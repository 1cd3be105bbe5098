//! Simple-interest reward accrual.
//!
//! `delta = principal * (apy / 100 / 365) * elapsed_days`, with a fixed
//! 365-day year and fractional days. Rewards are never compounded here.
//!
//! The single division happens last so that exact inputs stay exact
//! (dividing by 365 first would round at the 28th digit).

use crate::domain::{Decimal, TimeMs, MS_PER_DAY};

/// Percent-to-fraction (100) times days per year (365).
const PERCENT_DAYS_PER_YEAR: i64 = 100 * 365;

/// Daily rate as a fraction, e.g. 36.5% APY -> 0.001.
pub fn daily_rate(apy: Decimal) -> Decimal {
    apy / Decimal::from_i64(PERCENT_DAYS_PER_YEAR)
}

/// Expected reward for one day.
pub fn daily_reward(principal: Decimal, apy: Decimal) -> Decimal {
    principal * apy / Decimal::from_i64(PERCENT_DAYS_PER_YEAR)
}

/// Fractional days between two instants. Negative when `to < from`.
pub fn elapsed_days(from: TimeMs, to: TimeMs) -> Decimal {
    Decimal::from_i64(to.as_ms() - from.as_ms()) / Decimal::from_i64(MS_PER_DAY)
}

/// Reward accrued over `elapsed_days`; zero for a non-positive span.
pub fn reward_for_days(principal: Decimal, apy: Decimal, elapsed_days: Decimal) -> Decimal {
    if !elapsed_days.is_positive() {
        return Decimal::zero();
    }
    principal * apy * elapsed_days / Decimal::from_i64(PERCENT_DAYS_PER_YEAR)
}

/// Reward accrued between `from` and `to`.
pub fn accrue(principal: Decimal, apy: Decimal, from: TimeMs, to: TimeMs) -> Decimal {
    reward_for_days(principal, apy, elapsed_days(from, to))
}
