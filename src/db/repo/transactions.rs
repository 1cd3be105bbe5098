//! Ledger rows.

use super::{
    int_col, on_insert_error, opt_int_col, opt_text_col, text_col, time_col, to_db_int, Repository,
};
use crate::domain::{
    PoolId, TransactionFailure, TransactionRecord, TransactionStatus, TransactionType, TxHash,
};
use crate::store::{StoreError, TransactionCriteria, TransactionLedger};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

fn transaction_from_row(row: &SqliteRow) -> Result<TransactionRecord, StoreError> {
    let error = row
        .try_get::<Option<String>, _>("error_message")?
        .map(|message| -> Result<TransactionFailure, StoreError> {
            Ok(TransactionFailure {
                message,
                code: row.try_get("error_code")?,
                reason: row.try_get("error_reason")?,
            })
        })
        .transpose()?;

    Ok(TransactionRecord {
        tx_hash: text_col(row, "tx_hash")?,
        wallet: text_col(row, "wallet")?,
        tx_type: text_col::<TransactionType>(row, "tx_type")?,
        status: text_col::<TransactionStatus>(row, "status")?,
        amount: text_col(row, "amount")?,
        token_symbol: text_col(row, "token_symbol")?,
        pool_id: PoolId::new(int_col(row, "pool_id")?),
        position_id: text_col(row, "position_id")?,
        network: row.try_get("network")?,
        block_number: opt_int_col(row, "block_number")?,
        gas_used: opt_int_col(row, "gas_used")?,
        gas_price: opt_text_col(row, "gas_price")?,
        gas_fee: opt_text_col(row, "gas_fee")?,
        confirmations: int_col(row, "confirmations")?,
        error,
        created_at: time_col(row, "created_at")?,
    })
}

pub(super) async fn insert_transaction(
    conn: &mut SqliteConnection,
    r: &TransactionRecord,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            tx_hash, wallet, tx_type, status, amount, token_symbol, pool_id, position_id, network,
            block_number, gas_used, gas_price, gas_fee, confirmations,
            error_message, error_code, error_reason, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(r.tx_hash.as_str())
    .bind(r.wallet.as_str())
    .bind(r.tx_type.as_str())
    .bind(r.status.as_str())
    .bind(r.amount.to_canonical_string())
    .bind(r.token_symbol.as_str())
    .bind(i64::from(r.pool_id.as_u32()))
    .bind(r.position_id.to_string())
    .bind(r.network.as_str())
    .bind(r.block_number.map(to_db_int).transpose()?)
    .bind(r.gas_used.map(to_db_int).transpose()?)
    .bind(r.gas_price.map(|p| p.to_canonical_string()))
    .bind(r.gas_fee.map(|f| f.to_canonical_string()))
    .bind(i64::from(r.confirmations))
    .bind(r.error.as_ref().map(|e| e.message.as_str()))
    .bind(r.error.as_ref().and_then(|e| e.code.as_deref()))
    .bind(r.error.as_ref().and_then(|e| e.reason.as_deref()))
    .bind(r.created_at.as_ms())
    .execute(&mut *conn)
    .await
    .map_err(|e| on_insert_error(e, format!("transaction {}", r.tx_hash)))?;

    Ok(())
}

/// Overwrite the settlement columns of a record still pending in storage.
pub(super) async fn update_pending_transaction(
    conn: &mut SqliteConnection,
    r: &TransactionRecord,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE transactions SET
            status = ?, block_number = ?, gas_used = ?, gas_price = ?, gas_fee = ?,
            confirmations = ?, error_message = ?, error_code = ?, error_reason = ?
        WHERE tx_hash = ? AND status = 'pending'
        "#,
    )
    .bind(r.status.as_str())
    .bind(r.block_number.map(to_db_int).transpose()?)
    .bind(r.gas_used.map(to_db_int).transpose()?)
    .bind(r.gas_price.map(|p| p.to_canonical_string()))
    .bind(r.gas_fee.map(|f| f.to_canonical_string()))
    .bind(i64::from(r.confirmations))
    .bind(r.error.as_ref().map(|e| e.message.as_str()))
    .bind(r.error.as_ref().and_then(|e| e.code.as_deref()))
    .bind(r.error.as_ref().and_then(|e| e.reason.as_deref()))
    .bind(r.tx_hash.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT status FROM transactions WHERE tx_hash = ?")
                .bind(r.tx_hash.as_str())
                .fetch_optional(&mut *conn)
                .await?;
        return Err(match stored {
            None => StoreError::NotFound(format!("transaction {}", r.tx_hash)),
            Some(status) => StoreError::Conflict(format!(
                "transaction {} is already {}",
                r.tx_hash, status
            )),
        });
    }
    Ok(())
}

#[async_trait]
impl TransactionLedger for Repository {
    async fn append(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert_transaction(&mut conn, record).await
    }

    async fn find_transaction(&self, tx_hash: &TxHash) -> Result<Option<TransactionRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM transactions WHERE tx_hash = ?")
            .bind(tx_hash.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn find_transactions(
        &self,
        criteria: &TransactionCriteria,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let wallet = criteria.wallet.as_ref().map(|w| w.as_str().to_string());
        let tx_type = criteria.tx_type.map(|t| t.as_str());
        let status = criteria.status.map(|s| s.as_str());
        let position_id = criteria.position_id.map(|id| id.to_string());
        let since = criteria.since.map(|t| t.as_ms());

        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE (? IS NULL OR wallet = ?)
              AND (? IS NULL OR tx_type = ?)
              AND (? IS NULL OR status = ?)
              AND (? IS NULL OR position_id = ?)
              AND (? IS NULL OR created_at >= ?)
            ORDER BY created_at DESC, tx_hash ASC
            "#,
        )
        .bind(wallet.clone())
        .bind(wallet)
        .bind(tx_type)
        .bind(tx_type)
        .bind(status)
        .bind(status)
        .bind(position_id.clone())
        .bind(position_id)
        .bind(since)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn update_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        update_pending_transaction(&mut conn, record).await
    }
}
