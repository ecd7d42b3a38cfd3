//! Session errors. Each one also ends up as a transient status message.

use thiserror::Error;

use crate::core::units::UnitsError;
use crate::provider::ProviderError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("No wallet provider found. Install a browser wallet to continue.")]
    ProviderUnavailable,
    #[error("Request rejected: {0}")]
    UserRejected(String),
    #[error("No accounts available")]
    NoAccounts,
    #[error("Network switch failed: {0}")]
    NetworkSwitch(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Balance fetch failed: {0}")]
    BalanceFetch(String),
    #[error("{0}")]
    TransactionSubmit(String),
    #[error("Provider error: {0}")]
    Rpc(ProviderError),
}

impl SessionError {
    /// Authorization-style failure: rejection stays distinct from other
    /// provider errors.
    pub fn from_request(error: ProviderError) -> Self {
        if error.is_user_rejection() {
            SessionError::UserRejected(error.message)
        } else {
            SessionError::Rpc(error)
        }
    }
}

impl From<UnitsError> for SessionError {
    fn from(e: UnitsError) -> Self {
        SessionError::InvalidAmount(e.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
