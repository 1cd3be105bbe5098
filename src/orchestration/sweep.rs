//! Periodic reward recalculation over every active position.

use super::service::refresh_wallet_after_commit;
use crate::clock::Clock;
use crate::domain::{PositionId, PositionStatus, WalletAddress};
use crate::engine::lifecycle;
use crate::store::{PositionCriteria, StakingStore, StoreError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepFailure {
    pub position_id: PositionId,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub scanned: usize,
    pub updated: usize,
    pub failed: Vec<SweepFailure>,
}

#[derive(Debug, Clone)]
pub struct RewardSweep {
    store: Arc<dyn StakingStore>,
    clock: Arc<dyn Clock>,
}

impl RewardSweep {
    pub fn new(store: Arc<dyn StakingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Recompute every active position as of one instant.
    ///
    /// A position that fails to save is recorded in the summary and the
    /// sweep moves on. Only listing the positions can fail the whole run.
    pub async fn run(&self) -> Result<SweepSummary, StoreError> {
        let now = self.clock.now();
        let positions = self
            .store
            .find_positions(&PositionCriteria::default().with_status(PositionStatus::Active))
            .await?;

        let mut summary = SweepSummary {
            scanned: positions.len(),
            ..SweepSummary::default()
        };
        let mut touched: BTreeSet<WalletAddress> = BTreeSet::new();

        for mut position in positions {
            let before = position.rewards.earned;
            lifecycle::recompute_rewards(&mut position, now);
            if position.rewards.earned == before {
                continue;
            }

            match self.store.save_position(&position).await {
                Ok(saved) => {
                    summary.updated += 1;
                    touched.insert(saved.owner);
                }
                Err(e) => {
                    warn!(position_id = %position.id, error = %e, "reward sweep skipped position");
                    summary.failed.push(SweepFailure {
                        position_id: position.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        for owner in &touched {
            refresh_wallet_after_commit(self.store.as_ref(), owner, now).await;
        }

        info!(
            scanned = summary.scanned,
            updated = summary.updated,
            failed = summary.failed.len(),
            "reward sweep finished"
        );
        Ok(summary)
    }
}
