//! Platform-wide views over cached wallet stats.

use crate::domain::{Decimal, TimeMs, Wallet};
use serde::Serialize;

pub const NEW_USER_WINDOW_DAYS: i64 = 30;
pub const ACTIVE_USER_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    /// Anonymized address, e.g. `0x1234...abcd`.
    pub wallet_address: String,
    pub display_name: String,
    pub total_staked: Decimal,
    pub total_rewards: Decimal,
    pub joined_at: TimeMs,
}

/// One page of wallets ranked by cached `total_staked`, largest first.
///
/// `page` is 1-based. Equal stakes keep address order so pages are stable.
pub fn leaderboard(wallets: &[Wallet], page: usize, limit: usize) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&Wallet> = wallets.iter().collect();
    ranked.sort_by(|a, b| {
        b.stats
            .total_staked
            .cmp(&a.stats.total_staked)
            .then_with(|| a.address.cmp(&b.address))
    });

    let skip = page.saturating_sub(1).saturating_mul(limit);
    ranked
        .into_iter()
        .enumerate()
        .skip(skip)
        .take(limit)
        .map(|(index, wallet)| LeaderboardEntry {
            rank: index + 1,
            wallet_address: wallet.address.anonymized(),
            display_name: wallet.display_name(),
            total_staked: wallet.stats.total_staked,
            total_rewards: wallet.stats.total_rewards,
            joined_at: wallet.joined_at,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: usize,
    pub total_staked: Decimal,
    pub total_rewards: Decimal,
    pub avg_staked: Decimal,
    pub new_users_last_30_days: usize,
    pub active_users_last_7_days: usize,
}

pub fn platform_stats(wallets: &[Wallet], now: TimeMs) -> PlatformStats {
    let total_staked: Decimal = wallets.iter().map(|w| w.stats.total_staked).sum();
    let new_since = now.minus_days(NEW_USER_WINDOW_DAYS);
    let active_since = now.minus_days(ACTIVE_USER_WINDOW_DAYS);

    PlatformStats {
        total_users: wallets.len(),
        total_staked,
        total_rewards: wallets.iter().map(|w| w.stats.total_rewards).sum(),
        avg_staked: total_staked.ratio_or_zero(Decimal::from_i64(wallets.len() as i64)),
        new_users_last_30_days: wallets.iter().filter(|w| w.joined_at >= new_since).count(),
        active_users_last_7_days: wallets
            .iter()
            .filter(|w| w.last_active >= active_since)
            .count(),
    }
}
