//! In-memory store for tests and local development.

use super::{
    PositionCriteria, PositionStore, StakingStore, StoreError, TransactionCriteria,
    TransactionLedger, WalletStore,
};
use crate::domain::{
    Position, PositionId, TimeMs, TransactionRecord, TransactionStatus, TxHash, Wallet,
    WalletAddress,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    positions: HashMap<PositionId, Position>,
    transactions: HashMap<TxHash, TransactionRecord>,
    wallets: HashMap<WalletAddress, Wallet>,
}

impl State {
    fn check_version(&self, position: &Position) -> Result<(), StoreError> {
        let stored = self
            .positions
            .get(&position.id)
            .ok_or_else(|| StoreError::NotFound(format!("position {}", position.id)))?;
        if stored.version != position.version {
            return Err(StoreError::Conflict(format!(
                "position {} is at version {}, not {}",
                position.id, stored.version, position.version
            )));
        }
        Ok(())
    }

    fn check_unused_hash(&self, tx_hash: &TxHash) -> Result<(), StoreError> {
        if self.transactions.contains_key(tx_hash) {
            return Err(StoreError::Duplicate(format!("transaction {}", tx_hash)));
        }
        Ok(())
    }

    fn check_pending(&self, tx_hash: &TxHash) -> Result<(), StoreError> {
        match self.transactions.get(tx_hash) {
            None => Err(StoreError::NotFound(format!("transaction {}", tx_hash))),
            Some(stored) if stored.status != TransactionStatus::Pending => Err(
                StoreError::Conflict(format!("transaction {} is already {}", tx_hash, stored.status)),
            ),
            Some(_) => Ok(()),
        }
    }

    /// Caller must have run `check_version`.
    fn store_position(&mut self, position: &Position) -> Position {
        let mut saved = position.clone();
        saved.version += 1;
        self.positions.insert(saved.id, saved.clone());
        saved
    }
}

/// Store backed by hash maps behind a single lock, so multi-record commits
/// are atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> TimeMs, key: impl Fn(&T) -> String) {
    items.sort_by(|a, b| {
        created_at(b)
            .cmp(&created_at(a))
            .then_with(|| key(a).cmp(&key(b)))
    });
}

#[async_trait]
impl PositionStore for InMemoryStore {
    async fn find_positions(&self, criteria: &PositionCriteria) -> Result<Vec<Position>, StoreError> {
        let state = self.state.read().await;
        let mut found: Vec<Position> = state
            .positions
            .values()
            .filter(|p| criteria.matches(p))
            .cloned()
            .collect();
        newest_first(&mut found, |p| p.created_at, |p| p.id.to_string());
        Ok(found)
    }

    async fn find_position(&self, id: PositionId) -> Result<Option<Position>, StoreError> {
        Ok(self.state.read().await.positions.get(&id).cloned())
    }

    async fn save_position(&self, position: &Position) -> Result<Position, StoreError> {
        let mut state = self.state.write().await;
        state.check_version(position)?;
        Ok(state.store_position(position))
    }
}

#[async_trait]
impl TransactionLedger for InMemoryStore {
    async fn append(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.check_unused_hash(&record.tx_hash)?;
        state
            .transactions
            .insert(record.tx_hash.clone(), record.clone());
        Ok(())
    }

    async fn find_transaction(&self, tx_hash: &TxHash) -> Result<Option<TransactionRecord>, StoreError> {
        Ok(self.state.read().await.transactions.get(tx_hash).cloned())
    }

    async fn find_transactions(
        &self,
        criteria: &TransactionCriteria,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let state = self.state.read().await;
        let mut found: Vec<TransactionRecord> = state
            .transactions
            .values()
            .filter(|tx| criteria.matches(tx))
            .cloned()
            .collect();
        newest_first(&mut found, |tx| tx.created_at, |tx| tx.tx_hash.to_string());
        Ok(found)
    }

    async fn update_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.check_pending(&record.tx_hash)?;
        state
            .transactions
            .insert(record.tx_hash.clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl WalletStore for InMemoryStore {
    async fn find_or_create_wallet(
        &self,
        address: &WalletAddress,
        now: TimeMs,
    ) -> Result<Wallet, StoreError> {
        let mut state = self.state.write().await;
        Ok(state
            .wallets
            .entry(address.clone())
            .or_insert_with(|| Wallet::new(address.clone(), now))
            .clone())
    }

    async fn find_wallet(&self, address: &WalletAddress) -> Result<Option<Wallet>, StoreError> {
        Ok(self.state.read().await.wallets.get(address).cloned())
    }

    async fn save_wallet(&self, wallet: &Wallet) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match state.wallets.get_mut(&wallet.address) {
            Some(stored) => {
                stored.stats = wallet.stats.clone();
                stored.touch(wallet.last_active);
            }
            None => {
                state.wallets.insert(wallet.address.clone(), wallet.clone());
            }
        }
        Ok(())
    }

    async fn save_profile(&self, wallet: &Wallet) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let stored = state
            .wallets
            .get_mut(&wallet.address)
            .ok_or_else(|| StoreError::NotFound(format!("wallet {}", wallet.address)))?;
        stored.email = wallet.email.clone();
        stored.username = wallet.username.clone();
        stored.profile = wallet.profile.clone();
        stored.preferences = wallet.preferences.clone();
        stored.touch(wallet.last_active);
        Ok(())
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        let state = self.state.read().await;
        let mut wallets: Vec<Wallet> = state.wallets.values().cloned().collect();
        wallets.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(wallets)
    }
}

#[async_trait]
impl StakingStore for InMemoryStore {
    async fn open_position(
        &self,
        position: &Position,
        record: &TransactionRecord,
    ) -> Result<Position, StoreError> {
        let mut state = self.state.write().await;
        state.check_unused_hash(&record.tx_hash)?;
        if state.positions.contains_key(&position.id) {
            return Err(StoreError::Duplicate(format!("position {}", position.id)));
        }
        state.positions.insert(position.id, position.clone());
        state
            .transactions
            .insert(record.tx_hash.clone(), record.clone());
        Ok(position.clone())
    }

    async fn commit_transition(
        &self,
        position: &Position,
        record: &TransactionRecord,
    ) -> Result<Position, StoreError> {
        let mut state = self.state.write().await;
        state.check_version(position)?;
        state.check_unused_hash(&record.tx_hash)?;
        let saved = state.store_position(position);
        state
            .transactions
            .insert(record.tx_hash.clone(), record.clone());
        Ok(saved)
    }

    async fn commit_settlement(
        &self,
        record: &TransactionRecord,
        position: Option<&Position>,
    ) -> Result<Option<Position>, StoreError> {
        let mut state = self.state.write().await;
        state.check_pending(&record.tx_hash)?;
        if let Some(position) = position {
            state.check_version(position)?;
        }
        state
            .transactions
            .insert(record.tx_hash.clone(), record.clone());
        Ok(position.map(|p| state.store_position(p)))
    }
}
