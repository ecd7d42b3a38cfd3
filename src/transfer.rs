//! Transaction Submitter - validate and dispatch one native-currency transfer
//!
//! Validation happens before the provider is touched: a bad address or amount
//! never produces a request.

use serde::{Deserialize, Serialize};

use crate::core::address::is_valid_address;
use crate::core::paths::status as msg;
use crate::core::units::parse_units;
use crate::error::{SessionError, SessionResult};
use crate::provider::TransferRequest;
use crate::session::{SessionStatus, WalletSession};

/// Form fields of the transfer being submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransfer {
    pub to: String,
    pub amount_eth: String,
}

/// Check `to` and `amount` and convert the amount to smallest units.
pub fn validate_transfer(to: &str, amount: &str, decimals: u32) -> SessionResult<u128> {
    if !is_valid_address(to) {
        return Err(SessionError::InvalidAddress(to.to_string()));
    }
    let value = parse_units(amount, decimals)?;
    if value == 0 {
        return Err(SessionError::InvalidAmount("amount must be greater than zero".into()));
    }
    Ok(value)
}

impl WalletSession {
    /// Send `amount` (decimal, native currency) to `to` from the current
    /// account. Returns the transaction hash, `None` while the wallet has not
    /// produced one.
    pub async fn send(&self, to: &str, amount: &str) -> SessionResult<Option<String>> {
        let (account, chain_id, connected) = {
            let inner = self.inner.borrow();
            (inner.account.clone(), inner.chain_id.clone(), inner.status == SessionStatus::Connected)
        };

        let value = match validate_transfer(to, amount, self.registry.decimals(&chain_id)) {
            Ok(value) => value,
            Err(e) => return Err(self.fail(e)),
        };
        if !connected {
            return Err(self.fail(SessionError::NotConnected));
        }
        let provider = self.require_provider()?;

        self.inner.borrow_mut().pending = Some(PendingTransfer {
            to: to.to_string(),
            amount_eth: amount.trim().to_string(),
        });

        let request = TransferRequest { from: account, to: to.to_string(), value };
        tracing::info!(to = %request.to, value = %request.value, "submitting transfer");

        match provider.send_transaction(&request).await {
            Ok(hash) => {
                self.inner.borrow_mut().pending = None;
                let shown = hash.as_deref().unwrap_or(msg::PENDING);
                tracing::info!(tx = shown, "transfer submitted");
                self.set_status(format!("Transaction sent: {}", shown));
                if let Err(e) = self.refresh_balance().await {
                    tracing::debug!("balance refresh after send failed: {}", e);
                }
                Ok(hash)
            }
            Err(e) => {
                // provider wording is shown as-is
                let error = SessionError::TransactionSubmit(e.message);
                tracing::warn!(code = e.code, "transfer failed: {}", error);
                self.set_status(error.to_string());
                Err(error)
            }
        }
    }

    pub fn pending_transfer(&self) -> Option<PendingTransfer> {
        self.inner.borrow().pending.clone()
    }

    pub fn reset_transfer(&self) {
        self.inner.borrow_mut().pending = None;
    }
}
