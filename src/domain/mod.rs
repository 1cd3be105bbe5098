//! Domain types for staking positions, ledger records and wallets.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Validated primitives: TimeMs, WalletAddress, TxHash, PoolId, TokenSymbol, PositionId
//! - Tagged records for positions, transactions and wallets
//! - The pool catalog

pub mod decimal;
pub mod pool;
pub mod position;
pub mod primitives;
pub mod transaction;
pub mod wallet;

pub use decimal::Decimal;
pub use pool::{PoolCatalog, PoolDefinition};
pub use position::{ClaimEvent, LifecycleEvent, PoolMeta, Position, PositionStatus, Rewards};
pub use primitives::{
    PoolId, PositionId, PrimitiveParseError, TimeMs, TokenSymbol, TxHash, WalletAddress,
    MS_PER_DAY,
};
pub use transaction::{
    TransactionFailure, TransactionFinalized, TransactionRecord, TransactionStatus,
    TransactionType,
};
pub use wallet::{
    Notifications, NotificationsUpdate, Preferences, PreferencesUpdate, ProfileDetails,
    ProfileError, ProfileUpdate, Theme, Wallet, WalletStats,
};
