//! Position rows and the version-checked save.

use super::{
    int_col, on_insert_error, opt_int_col, opt_text_col, opt_time_col, text_col, time_col,
    to_db_int, Repository,
};
use crate::domain::{
    ClaimEvent, Decimal, LifecycleEvent, PoolId, Position, PositionId, PositionStatus, Rewards,
    TxHash,
};
use crate::store::{PositionCriteria, PositionStore, StoreError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

/// Flattened optional event columns.
struct EventColumns {
    external_ref: Option<String>,
    block: Option<i64>,
    at: Option<i64>,
}

impl EventColumns {
    fn of(event: Option<&LifecycleEvent>) -> Result<Self, StoreError> {
        Ok(match event {
            Some(e) => EventColumns {
                external_ref: Some(e.external_ref.to_string()),
                block: e.block_number.map(to_db_int).transpose()?,
                at: Some(e.timestamp.as_ms()),
            },
            None => EventColumns {
                external_ref: None,
                block: None,
                at: None,
            },
        })
    }
}

fn event_from_row(row: &SqliteRow, prefix: &str) -> Result<Option<LifecycleEvent>, StoreError> {
    let external_ref = opt_text_col::<TxHash>(row, &format!("{}_ref", prefix))?;
    let at = opt_time_col(row, &format!("{}_at", prefix))?;
    let block_number = opt_int_col::<u64>(row, &format!("{}_block", prefix))?;

    Ok(match (external_ref, at) {
        (Some(external_ref), Some(timestamp)) => Some(LifecycleEvent {
            external_ref,
            block_number,
            timestamp,
        }),
        _ => None,
    })
}

fn position_from_row(row: &SqliteRow) -> Result<Position, StoreError> {
    let claim_ref = opt_text_col::<TxHash>(row, "claim_ref")?;
    let claim_amount = opt_text_col::<Decimal>(row, "claim_amount")?;
    let claim_at = opt_time_col(row, "claim_at")?;
    let last_claim_event = match (claim_ref, claim_amount, claim_at) {
        (Some(external_ref), Some(amount), Some(timestamp)) => Some(ClaimEvent {
            external_ref,
            amount,
            timestamp,
        }),
        _ => None,
    };

    Ok(Position {
        id: text_col::<PositionId>(row, "id")?,
        owner: text_col(row, "owner")?,
        pool_id: PoolId::new(int_col(row, "pool_id")?),
        pool_name: row.try_get("pool_name")?,
        token_symbol: text_col(row, "token_symbol")?,
        principal: text_col(row, "principal")?,
        apy: text_col(row, "apy")?,
        lock_period_days: int_col(row, "lock_period_days")?,
        rewards: Rewards {
            earned: text_col(row, "rewards_earned")?,
            claimed: text_col(row, "rewards_claimed")?,
            pending: text_col(row, "rewards_pending")?,
            last_calculated_at: opt_time_col(row, "rewards_calculated_at")?,
        },
        status: text_col::<PositionStatus>(row, "status")?,
        stake_event: event_from_row(row, "stake")?,
        unstake_event: event_from_row(row, "unstake")?,
        last_claim_event,
        staking_started_at: time_col(row, "staking_started_at")?,
        staking_ended_at: opt_time_col(row, "staking_ended_at")?,
        network: row.try_get("network")?,
        auto_compound: row.try_get::<i64, _>("auto_compound")? != 0,
        version: int_col(row, "version")?,
        created_at: time_col(row, "created_at")?,
    })
}

pub(super) async fn insert_position(
    conn: &mut SqliteConnection,
    p: &Position,
) -> Result<(), StoreError> {
    let stake = EventColumns::of(p.stake_event.as_ref())?;
    let unstake = EventColumns::of(p.unstake_event.as_ref())?;
    let claim = p.last_claim_event.as_ref();

    sqlx::query(
        r#"
        INSERT INTO positions (
            id, owner, pool_id, pool_name, token_symbol, principal, apy, lock_period_days,
            rewards_earned, rewards_claimed, rewards_pending, rewards_calculated_at, status,
            stake_ref, stake_block, stake_at, unstake_ref, unstake_block, unstake_at,
            claim_ref, claim_amount, claim_at,
            staking_started_at, staking_ended_at, network, auto_compound, version, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(p.id.to_string())
    .bind(p.owner.as_str())
    .bind(i64::from(p.pool_id.as_u32()))
    .bind(p.pool_name.as_str())
    .bind(p.token_symbol.as_str())
    .bind(p.principal.to_canonical_string())
    .bind(p.apy.to_canonical_string())
    .bind(i64::from(p.lock_period_days))
    .bind(p.rewards.earned.to_canonical_string())
    .bind(p.rewards.claimed.to_canonical_string())
    .bind(p.rewards.pending.to_canonical_string())
    .bind(p.rewards.last_calculated_at.map(|t| t.as_ms()))
    .bind(p.status.as_str())
    .bind(stake.external_ref)
    .bind(stake.block)
    .bind(stake.at)
    .bind(unstake.external_ref)
    .bind(unstake.block)
    .bind(unstake.at)
    .bind(claim.map(|c| c.external_ref.to_string()))
    .bind(claim.map(|c| c.amount.to_canonical_string()))
    .bind(claim.map(|c| c.timestamp.as_ms()))
    .bind(p.staking_started_at.as_ms())
    .bind(p.staking_ended_at.map(|t| t.as_ms()))
    .bind(p.network.as_str())
    .bind(p.auto_compound)
    .bind(to_db_int(p.version)?)
    .bind(p.created_at.as_ms())
    .execute(&mut *conn)
    .await
    .map_err(|e| on_insert_error(e, format!("position {}", p.id)))?;

    Ok(())
}

/// Write the mutable columns if the stored version still equals `p.version`,
/// bumping it by one.
pub(super) async fn update_position(
    conn: &mut SqliteConnection,
    p: &Position,
) -> Result<Position, StoreError> {
    let unstake = EventColumns::of(p.unstake_event.as_ref())?;
    let claim = p.last_claim_event.as_ref();
    let expected = to_db_int(p.version)?;

    let result = sqlx::query(
        r#"
        UPDATE positions SET
            principal = ?, apy = ?,
            rewards_earned = ?, rewards_claimed = ?, rewards_pending = ?, rewards_calculated_at = ?,
            status = ?, unstake_ref = ?, unstake_block = ?, unstake_at = ?,
            claim_ref = ?, claim_amount = ?, claim_at = ?,
            staking_ended_at = ?, auto_compound = ?, version = version + 1
        WHERE id = ? AND version = ?
        "#,
    )
    .bind(p.principal.to_canonical_string())
    .bind(p.apy.to_canonical_string())
    .bind(p.rewards.earned.to_canonical_string())
    .bind(p.rewards.claimed.to_canonical_string())
    .bind(p.rewards.pending.to_canonical_string())
    .bind(p.rewards.last_calculated_at.map(|t| t.as_ms()))
    .bind(p.status.as_str())
    .bind(unstake.external_ref)
    .bind(unstake.block)
    .bind(unstake.at)
    .bind(claim.map(|c| c.external_ref.to_string()))
    .bind(claim.map(|c| c.amount.to_canonical_string()))
    .bind(claim.map(|c| c.timestamp.as_ms()))
    .bind(p.staking_ended_at.map(|t| t.as_ms()))
    .bind(p.auto_compound)
    .bind(p.id.to_string())
    .bind(expected)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let stored: Option<i64> = sqlx::query_scalar("SELECT version FROM positions WHERE id = ?")
            .bind(p.id.to_string())
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match stored {
            None => StoreError::NotFound(format!("position {}", p.id)),
            Some(v) => StoreError::Conflict(format!(
                "position {} is at version {}, not {}",
                p.id, v, p.version
            )),
        });
    }

    let mut saved = p.clone();
    saved.version += 1;
    Ok(saved)
}

#[async_trait]
impl PositionStore for Repository {
    async fn find_positions(&self, criteria: &PositionCriteria) -> Result<Vec<Position>, StoreError> {
        let owner = criteria.owner.as_ref().map(|o| o.as_str().to_string());
        let pool_id = criteria.pool_id.map(|id| i64::from(id.as_u32()));
        let status = criteria.status.map(|s| s.as_str());

        let rows = sqlx::query(
            r#"
            SELECT * FROM positions
            WHERE (? IS NULL OR owner = ?)
              AND (? IS NULL OR pool_id = ?)
              AND (? IS NULL OR status = ?)
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(owner.clone())
        .bind(owner)
        .bind(pool_id)
        .bind(pool_id)
        .bind(status)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(position_from_row).collect()
    }

    async fn find_position(&self, id: PositionId) -> Result<Option<Position>, StoreError> {
        let row = sqlx::query("SELECT * FROM positions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(position_from_row).transpose()
    }

    async fn save_position(&self, position: &Position) -> Result<Position, StoreError> {
        let mut conn = self.pool.acquire().await?;
        update_position(&mut conn, position).await
    }
}
