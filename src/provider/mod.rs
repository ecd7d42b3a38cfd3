//! Provider Adapter - typed capability surface over an EIP-1193 wallet
//!
//! ```text
//! WalletSession
//!     │
//!     ▼
//! ProviderAdapter (typed: accounts, chain id, switch/add, balance, send)
//!     │
//!     ▼
//! dyn Eip1193 (request(method, params) + on/removeListener)
//!     ├── MemoryProvider   (scriptable, tests + CLI demo)
//!     └── InjectedProvider (window.ethereum, wasm feature)
//! ```
//!
//! Absence of a provider is modelled as `Option<ProviderAdapter>` on the
//! session, checked before any request is issued.

mod memory;

pub use memory::MemoryProvider;

use async_trait::async_trait;
use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::rc::Rc;
use thiserror::Error;

use crate::chain::{normalize_chain_id, ChainDescriptor};
use crate::core::paths::methods;
use crate::core::units::{parse_quantity, to_quantity};

/// EIP-1193 / EIP-1474 error codes
pub mod codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Error returned by the provider for a single request
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    pub fn with_data(mut self, data: Value) -> Self { self.data = Some(data); self }

    pub fn user_rejected() -> Self {
        Self::new(codes::USER_REJECTED, "User rejected the request.")
    }

    pub fn unrecognized_chain(chain_id: &str) -> Self {
        Self::new(
            codes::UNRECOGNIZED_CHAIN,
            format!("Unrecognized chain ID \"{}\". Try adding the chain using wallet_addEthereumChain first.", chain_id),
        )
    }

    pub fn malformed(method: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(codes::INTERNAL_ERROR, format!("malformed {} response: {}", method, detail))
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == codes::USER_REJECTED
    }

    /// Unknown-chain signal. Some mobile wallets wrap it as
    /// `-32603` with `data.originalError.code == 4902`.
    pub fn is_unrecognized_chain(&self) -> bool {
        if self.code == codes::UNRECOGNIZED_CHAIN {
            return true;
        }
        self.data
            .as_ref()
            .and_then(|d| d.pointer("/originalError/code"))
            .and_then(Value::as_i64)
            == Some(codes::UNRECOGNIZED_CHAIN)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AccountsChanged,
    ChainChanged,
    Disconnect,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        use crate::core::paths::events;
        match self {
            EventKind::AccountsChanged => events::ACCOUNTS_CHANGED,
            EventKind::ChainChanged => events::CHAIN_CHANGED,
            EventKind::Disconnect => events::DISCONNECT,
        }
    }
}

/// Push event from the provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
    Disconnect(ProviderError),
}

impl ProviderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProviderEvent::AccountsChanged(_) => EventKind::AccountsChanged,
            ProviderEvent::ChainChanged(_) => EventKind::ChainChanged,
            ProviderEvent::Disconnect(_) => EventKind::Disconnect,
        }
    }
}

/// Bounded queue end handed to the provider for event delivery.
pub type EventSink = mpsc::Sender<ProviderEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Raw EIP-1193 provider: one request method plus event listeners.
#[async_trait(?Send)]
pub trait Eip1193 {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value>;

    fn subscribe(&self, kind: EventKind, sink: EventSink) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// `eth_sendTransaction` parameters for a plain value transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    /// Smallest units
    #[serde(with = "quantity")]
    pub value: u128,
}

mod quantity {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&crate::core::units::to_quantity(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(d)?;
        crate::core::units::parse_quantity(&raw).map_err(serde::de::Error::custom)
    }
}

/// Typed wrapper that issues the JSON-RPC calls the session needs.
#[derive(Clone)]
pub struct ProviderAdapter {
    inner: Rc<dyn Eip1193>,
}

impl ProviderAdapter {
    pub fn new(inner: Rc<dyn Eip1193>) -> Self {
        Self { inner }
    }

    /// `None` when no signing capability is installed.
    pub fn detect(inner: Option<Rc<dyn Eip1193>>) -> Option<Self> {
        inner.map(Self::new)
    }

    /// `eth_requestAccounts` - may prompt the user.
    pub async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        let value = self.inner.request(methods::REQUEST_ACCOUNTS, json!([])).await?;
        parse_accounts(methods::REQUEST_ACCOUNTS, value)
    }

    /// `eth_accounts` - already-authorized accounts, never prompts.
    pub async fn accounts(&self) -> ProviderResult<Vec<String>> {
        let value = self.inner.request(methods::ACCOUNTS, json!([])).await?;
        parse_accounts(methods::ACCOUNTS, value)
    }

    pub async fn chain_id(&self) -> ProviderResult<String> {
        let value = self.inner.request(methods::CHAIN_ID, json!([])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| ProviderError::malformed(methods::CHAIN_ID, &value))?;
        normalize_chain_id(raw).ok_or_else(|| ProviderError::malformed(methods::CHAIN_ID, raw))
    }

    pub async fn switch_chain(&self, chain_id: &str) -> ProviderResult<()> {
        self.inner
            .request(methods::SWITCH_CHAIN, json!([{ "chainId": chain_id }]))
            .await
            .map(|_| ())
    }

    pub async fn add_chain(&self, descriptor: &ChainDescriptor) -> ProviderResult<()> {
        let params = serde_json::to_value(descriptor)
            .map_err(|e| ProviderError::new(codes::INVALID_PARAMS, e.to_string()))?;
        self.inner
            .request(methods::ADD_CHAIN, Value::Array(vec![params]))
            .await
            .map(|_| ())
    }

    /// Balance in smallest units at the latest block.
    pub async fn get_balance(&self, address: &str) -> ProviderResult<u128> {
        let value = self
            .inner
            .request(methods::GET_BALANCE, json!([address, "latest"]))
            .await?;
        let raw = value
            .as_str()
            .ok_or_else(|| ProviderError::malformed(methods::GET_BALANCE, &value))?;
        parse_quantity(raw).map_err(|e| ProviderError::malformed(methods::GET_BALANCE, e))
    }

    /// Returns the transaction hash, or `None` when the wallet has not
    /// produced one yet.
    pub async fn send_transaction(&self, tx: &TransferRequest) -> ProviderResult<Option<String>> {
        let params = json!([{
            "from": tx.from,
            "to": tx.to,
            "value": to_quantity(tx.value),
        }]);
        let value = self.inner.request(methods::SEND_TRANSACTION, params).await?;
        Ok(value.as_str().filter(|h| !h.is_empty()).map(str::to_string))
    }

    pub fn subscribe(&self, kind: EventKind, sink: EventSink) -> SubscriptionId {
        self.inner.subscribe(kind, sink)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.unsubscribe(id)
    }
}

fn parse_accounts(method: &str, value: Value) -> ProviderResult<Vec<String>> {
    serde_json::from_value::<Vec<String>>(value).map_err(|e| ProviderError::malformed(method, e))
}
