//! SQLite-backed store.
//!
//! Methods are organized across submodules by record kind:
//! - `positions.rs` - position rows and the version-checked save
//! - `transactions.rs` - ledger rows
//!
//! Wallet operations and the multi-record commits live here.

mod positions;
mod transactions;

use crate::domain::{
    Decimal, Notifications, Position, Preferences, ProfileDetails, Theme, TimeMs,
    TransactionRecord, Wallet, WalletAddress, WalletStats,
};
use crate::store::{StakingStore, StoreError, WalletStore};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::fmt::Display;
use std::str::FromStr;

/// Repository for all database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// =========================================================================
// Row decoding
// =========================================================================

fn parse_text<T>(raw: &str, column: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("column {}: {}", column, e)))
}

/// Required text column parsed into `T`.
pub(crate) fn text_col<T>(row: &SqliteRow, column: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.try_get(column)?;
    parse_text(&raw, column)
}

/// Nullable text column parsed into `T`.
pub(crate) fn opt_text_col<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, StoreError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|r| parse_text(&r, column)).transpose()
}

/// Required integer column narrowed into `T`.
pub(crate) fn int_col<T: TryFrom<i64>>(row: &SqliteRow, column: &str) -> Result<T, StoreError> {
    let raw: i64 = row.try_get(column)?;
    T::try_from(raw).map_err(|_| StoreError::Corrupt(format!("column {}: {} out of range", column, raw)))
}

pub(crate) fn opt_int_col<T: TryFrom<i64>>(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<T>, StoreError> {
    let raw: Option<i64> = row.try_get(column)?;
    raw.map(|v| {
        T::try_from(v)
            .map_err(|_| StoreError::Corrupt(format!("column {}: {} out of range", column, v)))
    })
    .transpose()
}

pub(crate) fn opt_time_col(row: &SqliteRow, column: &str) -> Result<Option<TimeMs>, StoreError> {
    Ok(row.try_get::<Option<i64>, _>(column)?.map(TimeMs::new))
}

pub(crate) fn time_col(row: &SqliteRow, column: &str) -> Result<TimeMs, StoreError> {
    Ok(TimeMs::new(row.try_get::<i64, _>(column)?))
}

/// Map a unique-constraint failure to `Duplicate`, anything else to `Database`.
pub(crate) fn on_insert_error(err: sqlx::Error, what: impl Into<String>) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what.into()),
        _ => StoreError::Database(err),
    }
}

/// u64 counters are stored as SQLite INTEGER (i64).
pub(crate) fn to_db_int(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} does not fit in INTEGER", value)))
}

fn wallet_from_row(row: &SqliteRow) -> Result<Wallet, StoreError> {
    Ok(Wallet {
        address: text_col::<WalletAddress>(row, "address")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        profile: ProfileDetails {
            avatar: row.try_get("avatar")?,
            bio: row.try_get("bio")?,
            twitter: row.try_get("twitter")?,
            discord: row.try_get("discord")?,
        },
        preferences: Preferences {
            theme: text_col::<Theme>(row, "theme")?,
            currency: row.try_get("currency")?,
            notifications: Notifications {
                email: row.try_get("notify_email")?,
                push: row.try_get("notify_push")?,
            },
        },
        stats: WalletStats {
            total_staked: text_col::<Decimal>(row, "total_staked")?,
            total_rewards: text_col::<Decimal>(row, "total_rewards")?,
            refreshed_at: opt_time_col(row, "stats_refreshed_at")?,
        },
        joined_at: time_col(row, "joined_at")?,
        last_active: time_col(row, "last_active")?,
    })
}

// =========================================================================
// Wallet operations
// =========================================================================

#[async_trait]
impl WalletStore for Repository {
    async fn find_or_create_wallet(
        &self,
        address: &WalletAddress,
        now: TimeMs,
    ) -> Result<Wallet, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO wallets (address, total_staked, total_rewards, stats_refreshed_at, joined_at, last_active)
            VALUES (?, '0', '0', NULL, ?, ?)
            ON CONFLICT(address) DO NOTHING
            "#,
        )
        .bind(address.as_str())
        .bind(now.as_ms())
        .bind(now.as_ms())
        .execute(&self.pool)
        .await?;

        self.find_wallet(address)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("wallet {}", address)))
    }

    async fn find_wallet(&self, address: &WalletAddress) -> Result<Option<Wallet>, StoreError> {
        let row = sqlx::query("SELECT * FROM wallets WHERE address = ?")
            .bind(address.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(wallet_from_row).transpose()
    }

    async fn save_wallet(&self, wallet: &Wallet) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO wallets (address, total_staked, total_rewards, stats_refreshed_at, joined_at, last_active)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                total_staked = excluded.total_staked,
                total_rewards = excluded.total_rewards,
                stats_refreshed_at = excluded.stats_refreshed_at,
                last_active = MAX(last_active, excluded.last_active)
            "#,
        )
        .bind(wallet.address.as_str())
        .bind(wallet.stats.total_staked.to_canonical_string())
        .bind(wallet.stats.total_rewards.to_canonical_string())
        .bind(wallet.stats.refreshed_at.map(|t| t.as_ms()))
        .bind(wallet.joined_at.as_ms())
        .bind(wallet.last_active.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_profile(&self, wallet: &Wallet) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE wallets SET
                email = ?, username = ?, avatar = ?, bio = ?, twitter = ?, discord = ?,
                theme = ?, currency = ?, notify_email = ?, notify_push = ?,
                last_active = MAX(last_active, ?)
            WHERE address = ?
            "#,
        )
        .bind(wallet.email.as_deref())
        .bind(wallet.username.as_deref())
        .bind(wallet.profile.avatar.as_deref())
        .bind(wallet.profile.bio.as_deref())
        .bind(wallet.profile.twitter.as_deref())
        .bind(wallet.profile.discord.as_deref())
        .bind(wallet.preferences.theme.as_str())
        .bind(wallet.preferences.currency.as_str())
        .bind(wallet.preferences.notifications.email)
        .bind(wallet.preferences.notifications.push)
        .bind(wallet.last_active.as_ms())
        .bind(wallet.address.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("wallet {}", wallet.address)));
        }
        Ok(())
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        let rows = sqlx::query("SELECT * FROM wallets ORDER BY address ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(wallet_from_row).collect()
    }
}

// =========================================================================
// Atomic commits
// =========================================================================

#[async_trait]
impl StakingStore for Repository {
    async fn open_position(
        &self,
        position: &Position,
        record: &TransactionRecord,
    ) -> Result<Position, StoreError> {
        let mut tx = self.pool.begin().await?;
        positions::insert_position(&mut tx, position).await?;
        transactions::insert_transaction(&mut tx, record).await?;
        tx.commit().await?;
        Ok(position.clone())
    }

    async fn commit_transition(
        &self,
        position: &Position,
        record: &TransactionRecord,
    ) -> Result<Position, StoreError> {
        let mut tx = self.pool.begin().await?;
        let saved = positions::update_position(&mut tx, position).await?;
        transactions::insert_transaction(&mut tx, record).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn commit_settlement(
        &self,
        record: &TransactionRecord,
        position: Option<&Position>,
    ) -> Result<Option<Position>, StoreError> {
        let mut tx = self.pool.begin().await?;
        transactions::update_pending_transaction(&mut tx, record).await?;
        let saved = match position {
            Some(p) => Some(positions::update_position(&mut tx, p).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(saved)
    }
}
