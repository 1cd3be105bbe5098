//! Test store that delegates to [`InMemoryStore`] but can reject writes.

use super::{
    InMemoryStore, PositionCriteria, PositionStore, StakingStore, StoreError, TransactionCriteria,
    TransactionLedger, WalletStore,
};
use crate::domain::{Position, PositionId, TimeMs, TransactionRecord, TxHash, Wallet, WalletAddress};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    reject_position_saves: AtomicBool,
    reject_wallet_saves: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_position_saves(&self, on: bool) {
        self.reject_position_saves.store(on, Ordering::SeqCst);
    }

    pub fn reject_wallet_saves(&self, on: bool) {
        self.reject_wallet_saves.store(on, Ordering::SeqCst);
    }

    fn injected(flag: &AtomicBool, what: String) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict(what));
        }
        Ok(())
    }
}

#[async_trait]
impl PositionStore for FaultyStore {
    async fn find_positions(&self, c: &PositionCriteria) -> Result<Vec<Position>, StoreError> {
        self.inner.find_positions(c).await
    }

    async fn find_position(&self, id: PositionId) -> Result<Option<Position>, StoreError> {
        self.inner.find_position(id).await
    }

    async fn save_position(&self, p: &Position) -> Result<Position, StoreError> {
        Self::injected(&self.reject_position_saves, format!("position {}", p.id))?;
        self.inner.save_position(p).await
    }
}

#[async_trait]
impl TransactionLedger for FaultyStore {
    async fn append(&self, r: &TransactionRecord) -> Result<(), StoreError> {
        self.inner.append(r).await
    }

    async fn find_transaction(&self, h: &TxHash) -> Result<Option<TransactionRecord>, StoreError> {
        self.inner.find_transaction(h).await
    }

    async fn find_transactions(
        &self,
        c: &TransactionCriteria,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        self.inner.find_transactions(c).await
    }

    async fn update_transaction(&self, r: &TransactionRecord) -> Result<(), StoreError> {
        self.inner.update_transaction(r).await
    }
}

#[async_trait]
impl WalletStore for FaultyStore {
    async fn find_or_create_wallet(
        &self,
        a: &WalletAddress,
        now: TimeMs,
    ) -> Result<Wallet, StoreError> {
        self.inner.find_or_create_wallet(a, now).await
    }

    async fn find_wallet(&self, a: &WalletAddress) -> Result<Option<Wallet>, StoreError> {
        self.inner.find_wallet(a).await
    }

    async fn save_wallet(&self, w: &Wallet) -> Result<(), StoreError> {
        Self::injected(&self.reject_wallet_saves, format!("wallet {}", w.address))?;
        self.inner.save_wallet(w).await
    }

    async fn save_profile(&self, w: &Wallet) -> Result<(), StoreError> {
        Self::injected(&self.reject_wallet_saves, format!("wallet {}", w.address))?;
        self.inner.save_profile(w).await
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        self.inner.list_wallets().await
    }
}

#[async_trait]
impl StakingStore for FaultyStore {
    async fn open_position(
        &self,
        p: &Position,
        r: &TransactionRecord,
    ) -> Result<Position, StoreError> {
        self.inner.open_position(p, r).await
    }

    async fn commit_transition(
        &self,
        p: &Position,
        r: &TransactionRecord,
    ) -> Result<Position, StoreError> {
        Self::injected(&self.reject_position_saves, format!("position {}", p.id))?;
        self.inner.commit_transition(p, r).await
    }

    async fn commit_settlement(
        &self,
        r: &TransactionRecord,
        p: Option<&Position>,
    ) -> Result<Option<Position>, StoreError> {
        self.inner.commit_settlement(r, p).await
    }
}
