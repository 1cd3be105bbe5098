//! Wallet record with its cached stats projection and user profile.

use crate::domain::{Decimal, TimeMs, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 30;
pub const BIO_MAX_CHARS: usize = 500;
pub const CURRENCY_CHARS: usize = 3;
pub const DEFAULT_CURRENCY: &str = "USD";

/// Cached totals derived from the wallet's positions.
///
/// This is a materialized view; positions remain the source of truth and
/// the cache may lag until the next refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStats {
    pub total_staked: Decimal,
    pub total_rewards: Decimal,
    pub refreshed_at: Option<TimeMs>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(ProfileError::Theme(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub twitter: Option<String>,
    pub discord: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifications {
    pub email: bool,
    pub push: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            email: false,
            push: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Theme,
    pub currency: String,
    pub notifications: Notifications,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            currency: DEFAULT_CURRENCY.to_string(),
            notifications: Notifications::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub address: WalletAddress,
    pub email: Option<String>,
    pub username: Option<String>,
    pub profile: ProfileDetails,
    pub preferences: Preferences,
    pub stats: WalletStats,
    pub joined_at: TimeMs,
    pub last_active: TimeMs,
}

impl Wallet {
    pub fn new(address: WalletAddress, now: TimeMs) -> Self {
        Self {
            address,
            email: None,
            username: None,
            profile: ProfileDetails::default(),
            preferences: Preferences::default(),
            stats: WalletStats {
                total_staked: Decimal::zero(),
                total_rewards: Decimal::zero(),
                refreshed_at: None,
            },
            joined_at: now,
            last_active: now,
        }
    }

    pub fn portfolio_value(&self) -> Decimal {
        self.stats.total_staked + self.stats.total_rewards
    }

    /// Replace the cached totals with freshly derived ones.
    pub fn refresh_stats(&mut self, total_staked: Decimal, total_rewards: Decimal, now: TimeMs) {
        self.stats.total_staked = total_staked;
        self.stats.total_rewards = total_rewards;
        self.stats.refreshed_at = Some(now);
        self.last_active = self.last_active.max(now);
    }

    pub fn touch(&mut self, now: TimeMs) {
        self.last_active = self.last_active.max(now);
    }

    /// Username when set, otherwise `User 0x1234`.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(name) => name.clone(),
            None => format!("User {}", &self.address.as_str()[..6]),
        }
    }

    /// Validate every present field of `update`, then apply them all.
    ///
    /// # Errors
    /// The first invalid field; the wallet is unchanged in that case.
    pub fn apply_profile(&mut self, update: ProfileUpdate, now: TimeMs) -> Result<(), ProfileError> {
        let email = update.email.map(|e| normalize_email(&e)).transpose()?;
        let username = update.username.map(|u| normalize_username(&u)).transpose()?;
        let profile = update.profile.unwrap_or_default();
        if let Some(bio) = &profile.bio {
            if bio.chars().count() > BIO_MAX_CHARS {
                return Err(ProfileError::Bio(BIO_MAX_CHARS));
            }
        }
        let preferences = update.preferences.unwrap_or_default();
        let theme = preferences.theme.as_deref().map(Theme::from_str).transpose()?;
        if let Some(currency) = &preferences.currency {
            if currency.chars().count() != CURRENCY_CHARS {
                return Err(ProfileError::Currency(currency.clone()));
            }
        }

        if email.is_some() {
            self.email = email;
        }
        if username.is_some() {
            self.username = username;
        }
        merge(&mut self.profile.avatar, profile.avatar);
        merge(&mut self.profile.bio, profile.bio);
        merge(&mut self.profile.twitter, profile.twitter);
        merge(&mut self.profile.discord, profile.discord);
        if let Some(theme) = theme {
            self.preferences.theme = theme;
        }
        if let Some(currency) = preferences.currency {
            self.preferences.currency = currency;
        }
        if let Some(notifications) = preferences.notifications {
            if let Some(email) = notifications.email {
                self.preferences.notifications.email = email;
            }
            if let Some(push) = notifications.push {
                self.preferences.notifications.push = push;
            }
        }
        self.touch(now);
        Ok(())
    }
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

/// `local@domain.tld`, no whitespace, lowercased.
fn normalize_email(raw: &str) -> Result<String, ProfileError> {
    let invalid = || ProfileError::Email(raw.to_string());
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = raw.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(raw.to_lowercase())
}

fn normalize_username(raw: &str) -> Result<String, ProfileError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(ProfileError::Username(USERNAME_MIN_CHARS, USERNAME_MAX_CHARS));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("invalid email format: {0}")]
    Email(String),
    #[error("username must be {0}-{1} characters")]
    Username(usize, usize),
    #[error("bio must be at most {0} characters")]
    Bio(usize),
    #[error("theme must be dark or light, got {0}")]
    Theme(String),
    #[error("currency must be 3 characters, got {0}")]
    Currency(String),
}

/// Partial profile edit; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub profile: Option<ProfileDetails>,
    pub preferences: Option<PreferencesUpdate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub theme: Option<String>,
    pub currency: Option<String>,
    pub notifications: Option<NotificationsUpdate>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NotificationsUpdate {
    pub email: Option<bool>,
    pub push: Option<bool>,
}
