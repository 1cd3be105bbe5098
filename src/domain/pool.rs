//! Catalog of offered staking pools.

use crate::domain::{Decimal, PoolId, PoolMeta, TokenSymbol};
use serde::Serialize;

/// Static pool definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDefinition {
    pub id: PoolId,
    pub name: String,
    pub token: TokenSymbol,
    pub apy: Decimal,
    pub lock_period_days: u32,
    pub min_stake: Decimal,
    pub max_stake: Decimal,
    pub description: String,
    pub risks: Vec<String>,
    pub features: Vec<String>,
}

impl PoolDefinition {
    pub fn meta(&self) -> PoolMeta {
        PoolMeta {
            name: self.name.clone(),
            token_symbol: self.token.clone(),
            lock_period_days: self.lock_period_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolCatalog {
    pools: Vec<PoolDefinition>,
}

impl PoolCatalog {
    pub fn new(pools: Vec<PoolDefinition>) -> Self {
        Self { pools }
    }

    pub fn get(&self, id: PoolId) -> Option<&PoolDefinition> {
        self.pools.iter().find(|p| p.id == id)
    }

    pub fn pools(&self) -> &[PoolDefinition] {
        &self.pools
    }
}

#[allow(clippy::too_many_arguments)]
fn pool(
    id: u32,
    name: &str,
    token: &str,
    apy: &str,
    lock_period_days: u32,
    stake_bounds: (&str, &str),
    description: &str,
    risks: &[&str],
    features: &[&str],
) -> PoolDefinition {
    let dec = |s: &str| Decimal::from_str_canonical(s).unwrap_or_default();
    PoolDefinition {
        id: PoolId::new(id),
        name: name.to_string(),
        token: token.parse().expect("built-in pool token symbols are valid"),
        apy: dec(apy),
        lock_period_days,
        min_stake: dec(stake_bounds.0),
        max_stake: dec(stake_bounds.1),
        description: description.to_string(),
        risks: risks.iter().map(|s| s.to_string()).collect(),
        features: features.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for PoolCatalog {
    fn default() -> Self {
        Self::new(vec![
            pool(
                1,
                "ETH Staking Pool",
                "ETH",
                "8.5",
                0,
                ("0.1", "1000"),
                "Flexible ETH staking with competitive rewards",
                &["Smart contract risk", "Market volatility"],
                &["No lock period", "Compound rewards", "Instant unstaking"],
            ),
            pool(
                2,
                "USDC Stable Pool",
                "USDC",
                "12.0",
                30,
                ("100", "50000"),
                "High-yield stablecoin staking with 30-day lock",
                &["Smart contract risk", "Depeg risk"],
                &["High APY", "Stable returns", "Auto-compound"],
            ),
            pool(
                3,
                "BTC Wrapped Pool",
                "WBTC",
                "6.8",
                7,
                ("0.01", "10"),
                "Bitcoin exposure with moderate lock period",
                &["Smart contract risk", "Custodial risk", "Market volatility"],
                &["Bitcoin exposure", "Weekly rewards", "Flexible terms"],
            ),
        ])
    }
}
