pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, StoreBackend};
pub use db::{init_db, Repository};
pub use domain::{
    Decimal, PoolCatalog, PoolId, Position, PositionId, PositionStatus, TimeMs, TransactionRecord,
    TxHash, WalletAddress,
};
pub use error::AppError;
pub use orchestration::{RewardSweep, ServiceError, StakingService};
pub use store::{InMemoryStore, StakingStore, StoreError};
