//! Ledger-derived summaries: reward trends, per-type activity and global volume.

use crate::domain::{
    Decimal, PoolId, TimeMs, TransactionRecord, TransactionStatus, TransactionType, WalletAddress,
    MS_PER_DAY,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Days counted as "recent" in activity summaries.
pub const RECENT_ACTIVITY_DAYS: i64 = 7;

/// Reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// Window length in days; `None` for an unbounded window.
    pub fn days(&self) -> Option<i64> {
        match self {
            Period::SevenDays => Some(7),
            Period::ThirtyDays => Some(30),
            Period::NinetyDays => Some(90),
            Period::OneYear => Some(365),
            Period::All => None,
        }
    }

    /// History bucket width in days.
    pub fn bucket_days(&self) -> i64 {
        match self {
            Period::SevenDays | Period::ThirtyDays => 1,
            Period::NinetyDays => 3,
            Period::OneYear | Period::All => 7,
        }
    }

    pub fn bucket_ms(&self) -> i64 {
        self.bucket_days() * MS_PER_DAY
    }

    /// Start of the window ending at `now`, or `None` when unbounded.
    pub fn since(&self, now: TimeMs) -> Option<TimeMs> {
        self.days().map(|days| now.minus_days(days))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::SevenDays => "7d",
            Period::ThirtyDays => "30d",
            Period::NinetyDays => "90d",
            Period::OneYear => "1y",
            Period::All => "all",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Period::SevenDays),
            "30d" => Ok(Period::ThirtyDays),
            "90d" => Ok(Period::NinetyDays),
            "1y" => Ok(Period::OneYear),
            "all" => Ok(Period::All),
            other => Err(format!("invalid period: {}", other)),
        }
    }
}

fn in_window(tx: &TransactionRecord, since: Option<TimeMs>) -> bool {
    since.map_or(true, |since| tx.created_at >= since)
}

fn mean(total: Decimal, count: usize) -> Decimal {
    total.ratio_or_zero(Decimal::from_i64(count as i64))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardTrend {
    pub date: String,
    pub amount: Decimal,
    pub pool_id: PoolId,
}

/// Confirmed reward claims created at or after `since`, in input order.
pub fn reward_trends(transactions: &[TransactionRecord], since: TimeMs) -> Vec<RewardTrend> {
    transactions
        .iter()
        .filter(|tx| {
            tx.tx_type == TransactionType::ClaimRewards
                && tx.status == TransactionStatus::Confirmed
                && tx.created_at >= since
        })
        .map(|tx| RewardTrend {
            date: tx.created_at.to_date_string(),
            amount: tx.amount,
            pool_id: tx.pool_id,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSummary {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub count: usize,
    pub total_amount: Decimal,
    pub avg_amount: Decimal,
    pub success_rate: Decimal,
    pub pending: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub total_transactions: usize,
    pub total_volume: Decimal,
    pub avg_gas_fee: Decimal,
    /// Whole-number percentage of confirmed records.
    pub success_rate: Decimal,
    pub recent_activity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub overall: OverallSummary,
    pub by_type: Vec<TypeSummary>,
}

/// Per-type and overall figures for records created at or after `since`.
///
/// `recent_activity` counts every input record from the last seven days,
/// regardless of `since`.
pub fn transaction_summary(
    transactions: &[TransactionRecord],
    since: Option<TimeMs>,
    now: TimeMs,
) -> TransactionSummary {
    let windowed: Vec<&TransactionRecord> = transactions
        .iter()
        .filter(|tx| in_window(tx, since))
        .collect();

    let by_type = TransactionType::ALL
        .into_iter()
        .map(|tx_type| {
            let of_type: Vec<&TransactionRecord> = windowed
                .iter()
                .copied()
                .filter(|tx| tx.tx_type == tx_type)
                .collect();
            let count = of_type.len();
            let total_amount: Decimal = of_type.iter().map(|tx| tx.amount).sum();
            let confirmed = count_status(of_type.iter().copied(), TransactionStatus::Confirmed);
            TypeSummary {
                tx_type,
                count,
                total_amount,
                avg_amount: mean(total_amount, count),
                success_rate: Decimal::from_i64(confirmed as i64)
                    .percent_of(Decimal::from_i64(count as i64)),
                pending: count_status(of_type.iter().copied(), TransactionStatus::Pending),
                failed: count_status(of_type.iter().copied(), TransactionStatus::Failed),
            }
        })
        .collect();

    let gas_fees: Vec<Decimal> = windowed.iter().filter_map(|tx| tx.gas_fee).collect();
    let confirmed = count_status(windowed.iter().copied(), TransactionStatus::Confirmed);
    let recent_since = now.minus_days(RECENT_ACTIVITY_DAYS);

    TransactionSummary {
        overall: OverallSummary {
            total_transactions: windowed.len(),
            total_volume: windowed.iter().map(|tx| tx.amount).sum(),
            avg_gas_fee: mean(gas_fees.iter().sum(), gas_fees.len()),
            success_rate: Decimal::from_i64(confirmed as i64)
                .percent_of(Decimal::from_i64(windowed.len() as i64))
                .round(),
            recent_activity: transactions
                .iter()
                .filter(|tx| tx.created_at >= recent_since)
                .count(),
        },
        by_type,
    }
}

fn count_status<'a>(
    records: impl Iterator<Item = &'a TransactionRecord>,
    status: TransactionStatus,
) -> usize {
    records.filter(|tx| tx.status == status).count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeBucket {
    pub date: String,
    pub volume: Decimal,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_transactions: usize,
    pub total_volume: Decimal,
    pub unique_users: usize,
    pub avg_transaction_size: Decimal,
    pub total_gas_fees: Decimal,
    pub successful_txs: usize,
    pub success_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalActivity {
    pub summary: GlobalStats,
    pub volume_chart: Vec<VolumeBucket>,
}

/// Platform-wide figures for records created at or after `since`.
pub fn global_stats(transactions: &[TransactionRecord], since: Option<TimeMs>) -> GlobalActivity {
    let windowed: Vec<&TransactionRecord> = transactions
        .iter()
        .filter(|tx| in_window(tx, since))
        .collect();

    let total_volume: Decimal = windowed.iter().map(|tx| tx.amount).sum();
    let unique_users: HashSet<&WalletAddress> = windowed.iter().map(|tx| &tx.wallet).collect();
    let successful_txs = count_status(windowed.iter().copied(), TransactionStatus::Confirmed);

    let mut by_day: BTreeMap<String, VolumeBucket> = BTreeMap::new();
    for tx in &windowed {
        let date = tx.created_at.to_date_string();
        let bucket = by_day.entry(date.clone()).or_insert_with(|| VolumeBucket {
            date,
            volume: Decimal::zero(),
            transactions: 0,
        });
        bucket.volume = bucket.volume + tx.amount;
        bucket.transactions += 1;
    }

    GlobalActivity {
        summary: GlobalStats {
            total_transactions: windowed.len(),
            total_volume,
            unique_users: unique_users.len(),
            avg_transaction_size: mean(total_volume, windowed.len()),
            total_gas_fees: windowed.iter().filter_map(|tx| tx.gas_fee).sum(),
            successful_txs,
            success_rate: Decimal::from_i64(successful_txs as i64)
                .percent_of(Decimal::from_i64(windowed.len() as i64)),
        },
        volume_chart: by_day.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionId, TransactionFailure};

    const DAY0: i64 = 1_700_000_000_000;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn record(
        n: u64,
        wallet: &str,
        tx_type: TransactionType,
        amount: &str,
        day: i64,
    ) -> TransactionRecord {
        TransactionRecord::pending(
            format!("0x{:064x}", n).parse().unwrap(),
            wallet.parse().unwrap(),
            tx_type,
            d(amount),
            "ETH".parse().unwrap(),
            PoolId::new(1),
            PositionId::generate(),
            "ethereum".to_string(),
            TimeMs::new(DAY0).plus_days(day),
        )
    }

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";

    fn confirmed(mut tx: TransactionRecord, gas_used: Option<u64>) -> TransactionRecord {
        tx.confirm(1, gas_used, gas_used.map(|_| Decimal::from_i64(1_000_000_000)))
            .unwrap();
        tx
    }

    fn failed(mut tx: TransactionRecord) -> TransactionRecord {
        tx.fail(TransactionFailure {
            message: "reverted".to_string(),
            code: None,
            reason: None,
        })
        .unwrap();
        tx
    }

    #[test]
    fn test_period_parse_and_windows() {
        assert_eq!("90d".parse::<Period>().unwrap(), Period::NinetyDays);
        assert!("2w".parse::<Period>().is_err());
        assert_eq!(Period::OneYear.days(), Some(365));
        assert_eq!(Period::NinetyDays.bucket_days(), 3);
        assert_eq!(Period::All.since(TimeMs::new(DAY0)), None);
        assert_eq!(
            Period::SevenDays.since(TimeMs::new(DAY0)),
            Some(TimeMs::new(DAY0).minus_days(7))
        );
        assert_eq!(Period::default(), Period::ThirtyDays);
    }

    #[test]
    fn test_reward_trends_only_confirmed_claims_in_window() {
        let txs = vec![
            confirmed(record(1, ALICE, TransactionType::ClaimRewards, "0.5", 0), None),
            confirmed(record(2, ALICE, TransactionType::ClaimRewards, "0.7", 10), None),
            record(3, ALICE, TransactionType::ClaimRewards, "0.9", 11),
            confirmed(record(4, ALICE, TransactionType::Stake, "10", 12), None),
        ];
        let trends = reward_trends(&txs, TimeMs::new(DAY0).plus_days(5));
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].amount, d("0.7"));
        assert_eq!(trends[0].date, TimeMs::new(DAY0).plus_days(10).to_date_string());
    }

    #[test]
    fn test_transaction_summary_by_type() {
        let txs = vec![
            confirmed(record(1, ALICE, TransactionType::Stake, "10", 0), Some(21_000)),
            failed(record(2, ALICE, TransactionType::Stake, "20", 1)),
            record(3, ALICE, TransactionType::ClaimRewards, "1", 2),
            confirmed(record(4, ALICE, TransactionType::Stake, "5", -40), None),
        ];
        let now = TimeMs::new(DAY0).plus_days(3);
        let summary = transaction_summary(&txs, Period::ThirtyDays.since(now), now);

        let stake = &summary.by_type[0];
        assert_eq!(stake.tx_type, TransactionType::Stake);
        assert_eq!(stake.count, 2);
        assert_eq!(stake.total_amount, d("30"));
        assert_eq!(stake.avg_amount, d("15"));
        assert_eq!(stake.success_rate, d("50"));
        assert_eq!(stake.failed, 1);

        let claims = &summary.by_type[2];
        assert_eq!(claims.pending, 1);
        assert_eq!(claims.success_rate, Decimal::zero());
        assert_eq!(summary.by_type[3].count, 0);

        assert_eq!(summary.overall.total_transactions, 3);
        assert_eq!(summary.overall.total_volume, d("31"));
        assert_eq!(summary.overall.success_rate, d("33"));
        assert_eq!(summary.overall.avg_gas_fee, d("0.000021"));
        assert_eq!(summary.overall.recent_activity, 3);
    }

    #[test]
    fn test_global_stats_and_volume_chart() {
        let txs = vec![
            confirmed(record(1, ALICE, TransactionType::Stake, "10", 0), Some(21_000)),
            confirmed(record(2, BOB, TransactionType::Stake, "30", 0), Some(21_000)),
            failed(record(3, BOB, TransactionType::Unstake, "30", 2)),
        ];
        let stats = global_stats(&txs, None);

        assert_eq!(stats.summary.total_transactions, 3);
        assert_eq!(stats.summary.total_volume, d("70"));
        assert_eq!(stats.summary.unique_users, 2);
        assert_eq!(stats.summary.successful_txs, 2);
        assert_eq!(stats.summary.total_gas_fees, d("0.000042"));
        assert_eq!(stats.volume_chart.len(), 2);
        assert_eq!(stats.volume_chart[0].volume, d("40"));
        assert_eq!(stats.volume_chart[0].transactions, 2);
        assert!(stats.volume_chart[0].date < stats.volume_chart[1].date);
    }

    #[test]
    fn test_global_stats_empty() {
        let stats = global_stats(&[], Some(TimeMs::new(DAY0)));
        assert_eq!(stats.summary.success_rate, Decimal::zero());
        assert_eq!(stats.summary.avg_transaction_size, Decimal::zero());
        assert!(stats.volume_chart.is_empty());
    }
}
