//! Domain primitives: TimeMs, WalletAddress, TxHash, PoolId, TokenSymbol, PositionId.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time. Engine code receives time through a `Clock`
    /// instead of calling this directly.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }

    pub fn plus_ms(&self, ms: i64) -> Self {
        TimeMs(self.0.saturating_add(ms))
    }

    pub fn minus_days(&self, days: i64) -> Self {
        TimeMs(self.0.saturating_sub(days.saturating_mul(MS_PER_DAY)))
    }

    pub fn plus_days(&self, days: i64) -> Self {
        TimeMs(self.0.saturating_add(days.saturating_mul(MS_PER_DAY)))
    }

    /// Whole days elapsed from `self` to `later` (floored, never negative).
    pub fn whole_days_until(&self, later: TimeMs) -> i64 {
        (later.0 - self.0).max(0) / MS_PER_DAY
    }

    /// UTC calendar date as `YYYY-MM-DD`.
    pub fn to_date_string(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// RFC 3339 timestamp in UTC.
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_default()
    }

    fn to_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        use chrono::TimeZone;
        chrono::Utc.timestamp_millis_opt(self.0).single()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveParseError {
    #[error("Invalid wallet address: {0}")]
    WalletAddress(String),
    #[error("Invalid transaction hash: {0}")]
    TxHash(String),
    #[error("Invalid position id: {0}")]
    PositionId(String),
    #[error("Invalid token symbol: {0}")]
    TokenSymbol(String),
}

fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len + 2 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Wallet address: `0x` followed by 40 hex digits, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for public listings, e.g. `0x1234...abcd`.
    pub fn anonymized(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for WalletAddress {
    type Err = PrimitiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if !is_hex_of_len(&normalized, 40) {
            return Err(PrimitiveParseError::WalletAddress(s.to_string()));
        }
        Ok(WalletAddress(normalized))
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = PrimitiveParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque on-chain transaction reference: `0x` followed by 64 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TxHash {
    type Err = PrimitiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if !is_hex_of_len(&normalized, 64) {
            return Err(PrimitiveParseError::TxHash(s.to_string()));
        }
        Ok(TxHash(normalized))
    }
}

impl TryFrom<String> for TxHash {
    type Error = PrimitiveParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Staking pool identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub u32);

impl PoolId {
    pub fn new(id: u32) -> Self {
        PoolId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token symbol (e.g. "ETH", "USDC"), stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenSymbol(String);

impl TokenSymbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TokenSymbol {
    type Err = PrimitiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.len() > 10 {
            return Err(PrimitiveParseError::TokenSymbol(s.to_string()));
        }
        Ok(TokenSymbol(trimmed.to_uppercase()))
    }
}

impl TryFrom<String> for TokenSymbol {
    type Error = PrimitiveParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenSymbol> for String {
    fn from(value: TokenSymbol) -> Self {
        value.0
    }
}

impl std::fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionId(Uuid);

impl PositionId {
    pub fn generate() -> Self {
        PositionId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl FromStr for PositionId {
    type Err = PrimitiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(PositionId)
            .map_err(|_| PrimitiveParseError::PositionId(s.to_string()))
    }
}

impl std::fmt::Display for PositionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_address_is_lowercased() {
        let addr: WalletAddress = "0xABCDEF0123456789abcdef0123456789ABCDEF01".parse().unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_wallet_address_rejects_bad_input() {
        assert!("0x123".parse::<WalletAddress>().is_err());
        assert!("1234567890123456789012345678901234567890ab"
            .parse::<WalletAddress>()
            .is_err());
        assert!("0xzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"
            .parse::<WalletAddress>()
            .is_err());
    }

    #[test]
    fn test_wallet_address_anonymized() {
        let addr: WalletAddress = "0x1234567890123456789012345678901234abcdef".parse().unwrap();
        assert_eq!(addr.anonymized(), "0x1234...cdef");
    }

    #[test]
    fn test_tx_hash_requires_64_hex_digits() {
        let ok = format!("0x{}", "a".repeat(64));
        assert!(ok.parse::<TxHash>().is_ok());
        assert!(format!("0x{}", "a".repeat(63)).parse::<TxHash>().is_err());
    }

    #[test]
    fn test_tx_hash_deserialize_validates() {
        let result: Result<TxHash, _> = serde_json::from_str("\"0xnope\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_token_symbol_uppercased() {
        let token: TokenSymbol = "usdc".parse().unwrap();
        assert_eq!(token.as_str(), "USDC");
        assert!("".parse::<TokenSymbol>().is_err());
    }

    #[test]
    fn test_position_id_roundtrips_through_display() {
        let id = PositionId::generate();
        let parsed: PositionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_whole_days_until() {
        let start = TimeMs::new(0);
        assert_eq!(start.whole_days_until(TimeMs::new(MS_PER_DAY * 3 - 1)), 2);
        assert_eq!(start.whole_days_until(TimeMs::new(-5)), 0);
    }

    #[test]
    fn test_date_string() {
        assert_eq!(TimeMs::new(0).to_date_string(), "1970-01-01");
        assert_eq!(TimeMs::new(MS_PER_DAY).to_date_string(), "1970-01-02");
    }
}
