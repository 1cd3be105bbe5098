//! Ledger record of a stake / unstake / claim / emergency withdraw event.

use crate::domain::{Decimal, PoolId, PositionId, TimeMs, TokenSymbol, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Stake,
    Unstake,
    ClaimRewards,
    EmergencyWithdraw,
}

impl TransactionType {
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Stake,
        TransactionType::Unstake,
        TransactionType::ClaimRewards,
        TransactionType::EmergencyWithdraw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Stake => "stake",
            TransactionType::Unstake => "unstake",
            TransactionType::ClaimRewards => "claim_rewards",
            TransactionType::EmergencyWithdraw => "emergency_withdraw",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown transaction type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "confirmed" => Ok(TransactionStatus::Confirmed),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// Failure details reported by the chain-submission component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFailure {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transaction {tx_hash} is already {status}")]
pub struct TransactionFinalized {
    pub tx_hash: TxHash,
    pub status: TransactionStatus,
}

/// One ledger entry. Immutable once it leaves `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub tx_hash: TxHash,
    pub wallet: WalletAddress,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub token_symbol: TokenSymbol,
    pub pool_id: PoolId,
    pub position_id: PositionId,
    pub network: String,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    pub gas_price: Option<Decimal>,
    pub gas_fee: Option<Decimal>,
    pub confirmations: u32,
    pub error: Option<TransactionFailure>,
    pub created_at: TimeMs,
}

/// Wei per ether, for converting `gasUsed * gasPrice` into a native-token fee.
const WEI_PER_ETHER: i64 = 1_000_000_000_000_000_000;

impl TransactionRecord {
    /// Create a pending record for an event on `position_id`.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        tx_hash: TxHash,
        wallet: WalletAddress,
        tx_type: TransactionType,
        amount: Decimal,
        token_symbol: TokenSymbol,
        pool_id: PoolId,
        position_id: PositionId,
        network: String,
        created_at: TimeMs,
    ) -> Self {
        Self {
            tx_hash,
            wallet,
            tx_type,
            status: TransactionStatus::Pending,
            amount,
            token_symbol,
            pool_id,
            position_id,
            network,
            block_number: None,
            gas_used: None,
            gas_price: None,
            gas_fee: None,
            confirmations: 0,
            error: None,
            created_at,
        }
    }

    /// Mark confirmed at `block_number`; the gas fee is derived when both
    /// gas figures are known.
    pub fn confirm(
        &mut self,
        block_number: u64,
        gas_used: Option<u64>,
        gas_price: Option<Decimal>,
    ) -> Result<(), TransactionFinalized> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Confirmed;
        self.block_number = Some(block_number);
        self.gas_used = gas_used;
        self.gas_price = gas_price;
        self.confirmations = 1;
        self.gas_fee = match (gas_used, gas_price) {
            (Some(used), Some(price)) => Some(
                Decimal::from_i64(used as i64) * price / Decimal::from_i64(WEI_PER_ETHER),
            ),
            _ => None,
        };
        Ok(())
    }

    pub fn fail(&mut self, failure: TransactionFailure) -> Result<(), TransactionFinalized> {
        self.ensure_pending()?;
        self.status = TransactionStatus::Failed;
        self.error = Some(failure);
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), TransactionFinalized> {
        if self.status != TransactionStatus::Pending {
            return Err(TransactionFinalized {
                tx_hash: self.tx_hash.clone(),
                status: self.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TransactionRecord {
        TransactionRecord::pending(
            format!("0x{}", "1".repeat(64)).parse().unwrap(),
            "0x1111111111111111111111111111111111111111".parse().unwrap(),
            TransactionType::Stake,
            Decimal::from_i64(10),
            "ETH".parse().unwrap(),
            PoolId::new(1),
            PositionId::generate(),
            "ethereum".to_string(),
            TimeMs::new(1_000),
        )
    }

    #[test]
    fn test_confirm_derives_gas_fee() {
        let mut tx = record();
        tx.confirm(
            18_000_000,
            Some(21_000),
            Some(Decimal::from_i64(20_000_000_000)),
        )
        .unwrap();

        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.block_number, Some(18_000_000));
        assert_eq!(tx.confirmations, 1);
        assert_eq!(
            tx.gas_fee,
            Some(Decimal::from_str_canonical("0.00042").unwrap())
        );
    }

    #[test]
    fn test_confirmed_record_is_immutable() {
        let mut tx = record();
        tx.confirm(1, None, None).unwrap();
        assert_eq!(tx.gas_fee, None);

        let err = tx
            .fail(TransactionFailure {
                message: "reverted".to_string(),
                code: None,
                reason: None,
            })
            .unwrap_err();
        assert_eq!(err.status, TransactionStatus::Confirmed);
        assert!(tx.confirm(2, None, None).is_err());
        assert_eq!(tx.block_number, Some(1));
    }

    #[test]
    fn test_fail_records_error() {
        let mut tx = record();
        tx.fail(TransactionFailure {
            message: "out of gas".to_string(),
            code: Some("-32000".to_string()),
            reason: None,
        })
        .unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.error.as_ref().map(|e| e.message.as_str()), Some("out of gas"));
    }

    #[test]
    fn test_type_parse_roundtrip() {
        for t in TransactionType::ALL {
            assert_eq!(t.as_str().parse::<TransactionType>().unwrap(), t);
        }
        assert!("swap".parse::<TransactionType>().is_err());
    }
}
