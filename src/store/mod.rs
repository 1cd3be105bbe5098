//! Storage collaborators for positions, ledger records and wallets.
//!
//! The engine never touches storage directly. Callers load snapshots through
//! these traits, run a lifecycle operation, and commit the result together
//! with its ledger record through [`StakingStore`].

use crate::domain::{
    PoolId, Position, PositionId, PositionStatus, TimeMs, TransactionRecord, TransactionStatus,
    TransactionType, TxHash, Wallet, WalletAddress,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[cfg(test)]
pub(crate) mod faulty;
pub mod memory;

#[cfg(test)]
pub(crate) use faulty::FaultyStore;
pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// The stored record changed since the caller's snapshot.
    #[error("conflicting update: {0}")]
    Conflict(String),

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Position filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionCriteria {
    pub owner: Option<WalletAddress>,
    pub pool_id: Option<PoolId>,
    pub status: Option<PositionStatus>,
}

impl PositionCriteria {
    pub fn owned_by(owner: WalletAddress) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn in_pool(pool_id: PoolId) -> Self {
        Self {
            pool_id: Some(pool_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: PositionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, p: &Position) -> bool {
        self.owner.as_ref().map_or(true, |o| &p.owner == o)
            && self.pool_id.map_or(true, |id| p.pool_id == id)
            && self.status.map_or(true, |s| p.status == s)
    }
}

/// Ledger filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionCriteria {
    pub wallet: Option<WalletAddress>,
    pub tx_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub position_id: Option<PositionId>,
    /// Created at or after.
    pub since: Option<TimeMs>,
}

impl TransactionCriteria {
    pub fn for_wallet(wallet: WalletAddress) -> Self {
        Self {
            wallet: Some(wallet),
            ..Self::default()
        }
    }

    pub fn matches(&self, tx: &TransactionRecord) -> bool {
        self.wallet.as_ref().map_or(true, |w| &tx.wallet == w)
            && self.tx_type.map_or(true, |t| tx.tx_type == t)
            && self.status.map_or(true, |s| tx.status == s)
            && self.position_id.map_or(true, |id| tx.position_id == id)
            && self.since.map_or(true, |since| tx.created_at >= since)
    }
}

#[async_trait]
pub trait PositionStore: Send + Sync + fmt::Debug {
    /// Matching positions, newest first.
    async fn find_positions(&self, criteria: &PositionCriteria) -> Result<Vec<Position>, StoreError>;

    async fn find_one(&self, criteria: &PositionCriteria) -> Result<Option<Position>, StoreError> {
        Ok(self.find_positions(criteria).await?.into_iter().next())
    }

    async fn find_position(&self, id: PositionId) -> Result<Option<Position>, StoreError>;

    /// Compare-and-swap on `position.version`.
    ///
    /// Returns the stored copy with its version bumped.
    ///
    /// # Errors
    /// `Conflict` if the stored version differs, `NotFound` if the
    /// position does not exist.
    async fn save_position(&self, position: &Position) -> Result<Position, StoreError>;
}

#[async_trait]
pub trait TransactionLedger: Send + Sync + fmt::Debug {
    /// # Errors
    /// `Duplicate` if a record with the same hash already exists.
    async fn append(&self, record: &TransactionRecord) -> Result<(), StoreError>;

    async fn find_transaction(&self, tx_hash: &TxHash) -> Result<Option<TransactionRecord>, StoreError>;

    /// Matching records, newest first.
    async fn find_transactions(
        &self,
        criteria: &TransactionCriteria,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Replace a record that is still pending in storage.
    ///
    /// # Errors
    /// `NotFound` if absent, `Conflict` if the stored record already left
    /// `pending`.
    async fn update_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError>;
}

#[async_trait]
pub trait WalletStore: Send + Sync + fmt::Debug {
    async fn find_or_create_wallet(
        &self,
        address: &WalletAddress,
        now: TimeMs,
    ) -> Result<Wallet, StoreError>;

    async fn find_wallet(&self, address: &WalletAddress) -> Result<Option<Wallet>, StoreError>;

    /// Upsert the stats cache and `last_active`. Profile fields are not written.
    async fn save_wallet(&self, wallet: &Wallet) -> Result<(), StoreError>;

    /// Write the profile and preferences of an existing wallet, plus
    /// `last_active`. The stats cache is not written.
    ///
    /// # Errors
    /// `NotFound` if the wallet does not exist.
    async fn save_profile(&self, wallet: &Wallet) -> Result<(), StoreError>;

    async fn list_wallets(&self) -> Result<Vec<Wallet>, StoreError>;
}

/// Full store used by the staking service.
#[async_trait]
pub trait StakingStore: PositionStore + TransactionLedger + WalletStore {
    /// Insert a new position and its originating record atomically.
    ///
    /// # Errors
    /// `Duplicate` if the record hash or position id already exists; nothing
    /// is written in that case.
    async fn open_position(
        &self,
        position: &Position,
        record: &TransactionRecord,
    ) -> Result<Position, StoreError>;

    /// Save a mutated position and append its record atomically.
    ///
    /// # Errors
    /// `Conflict` on a stale version, `Duplicate` on a reused hash; nothing
    /// is written in either case.
    async fn commit_transition(
        &self,
        position: &Position,
        record: &TransactionRecord,
    ) -> Result<Position, StoreError>;

    /// Update a pending record and, when given, save its position in the
    /// same commit. Returns the saved position.
    ///
    /// # Errors
    /// As [`TransactionLedger::update_transaction`] and
    /// [`PositionStore::save_position`]; nothing is written on failure.
    async fn commit_settlement(
        &self,
        record: &TransactionRecord,
        position: Option<&Position>,
    ) -> Result<Option<Position>, StoreError>;
}
