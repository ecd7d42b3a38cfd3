//! Session state and the read-only snapshot the UI observes

use serde::{Deserialize, Serialize};

use crate::core::units::format_units_truncated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Switching,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
            SessionStatus::Switching => "switching",
        }
    }

    /// States in which an account is held.
    pub fn has_account(&self) -> bool {
        matches!(self, SessionStatus::Connected | SessionStatus::Switching)
    }
}

/// `account` is non-empty iff `status` is Connected or Switching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub account: String,
    pub chain_id: String,
    pub status: SessionStatus,
    pub transient_message: String,
}

/// Cached balance: raw smallest units plus the truncated display string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub raw: u128,
    pub display: String,
}

impl Balance {
    pub fn zero() -> Self {
        Self { raw: 0, display: "0".into() }
    }

    pub fn from_raw(raw: u128, decimals: u32, places: u32) -> Self {
        Self { raw, display: format_units_truncated(raw, decimals, places) }
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub account: String,
    pub chain_id: String,
    /// Registry name, or the raw id for unknown chains
    pub chain_name: String,
    pub status: SessionStatus,
    pub message: String,
    pub balance: String,
    pub symbol: String,
}

/// What the caller should do after a reconciled provider event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    None,
    RefreshBalance,
}
