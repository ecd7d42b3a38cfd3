//! MemoryProvider - scriptable in-process EIP-1193 wallet
//!
//! Behaves like a browser wallet closely enough to drive the session end to
//! end: authorization, chain switching with 4902 for unknown chains, balances,
//! transfers, and push events. Every request is recorded so callers can assert
//! which methods were (or were not) issued.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::{
    codes, EventKind, Eip1193, EventSink, ProviderError, ProviderEvent, ProviderResult,
    SubscriptionId, TransferRequest,
};
use crate::chain::{normalize_chain_id, ChainDescriptor};
use crate::core::paths::methods;
use crate::core::units::to_quantity;

struct MemoryState {
    accounts: Vec<String>,
    authorized: bool,
    chain_id: String,
    known_chains: BTreeSet<String>,
    balances: HashMap<String, u128>,
    failures: HashMap<String, VecDeque<ProviderError>>,
    calls: Vec<String>,
    listeners: BTreeMap<SubscriptionId, (EventKind, EventSink)>,
    next_subscription: u64,
    tx_count: u64,
    sent: Vec<TransferRequest>,
    withhold_hash: bool,
}

pub struct MemoryProvider {
    state: RefCell<MemoryState>,
}

impl MemoryProvider {
    /// Wallet holding `accounts`, sitting on `chain_id`, not yet authorized.
    pub fn new(accounts: &[&str], chain_id: &str) -> Self {
        let chain_id = normalize_chain_id(chain_id).unwrap_or_else(|| chain_id.to_string());
        Self {
            state: RefCell::new(MemoryState {
                accounts: accounts.iter().map(|a| a.to_string()).collect(),
                authorized: false,
                known_chains: BTreeSet::from([chain_id.clone()]),
                chain_id,
                balances: HashMap::new(),
                failures: HashMap::new(),
                calls: Vec::new(),
                listeners: BTreeMap::new(),
                next_subscription: 0,
                tx_count: 0,
                sent: Vec::new(),
                withhold_hash: false,
            }),
        }
    }

    /// Mark the accounts as already granted to this site.
    pub fn authorized(self) -> Self {
        self.state.borrow_mut().authorized = true;
        self
    }

    pub fn with_known_chain(self, chain_id: &str) -> Self {
        if let Some(id) = normalize_chain_id(chain_id) {
            self.state.borrow_mut().known_chains.insert(id);
        }
        self
    }

    pub fn with_balance(self, address: &str, wei: u128) -> Self {
        self.set_balance(address, wei);
        self
    }

    pub fn set_balance(&self, address: &str, wei: u128) {
        self.state.borrow_mut().balances.insert(address.to_ascii_lowercase(), wei);
    }

    /// Queue an error for the next call of `method`.
    pub fn fail_next(&self, method: &str, error: ProviderError) {
        self.state
            .borrow_mut()
            .failures
            .entry(method.to_string())
            .or_default()
            .push_back(error);
    }

    /// Answer `eth_sendTransaction` with `null` instead of a hash.
    pub fn withhold_tx_hash(&self, withhold: bool) {
        self.state.borrow_mut().withhold_hash = withhold;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.borrow().calls.iter().filter(|m| m.as_str() == method).count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn chain_id(&self) -> String {
        self.state.borrow().chain_id.clone()
    }

    pub fn is_authorized(&self) -> bool {
        self.state.borrow().authorized
    }

    pub fn sent(&self) -> Vec<TransferRequest> {
        self.state.borrow().sent.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// The user picks different accounts inside the wallet.
    pub fn set_accounts(&self, accounts: &[&str]) {
        let accounts: Vec<String> = accounts.iter().map(|a| a.to_string()).collect();
        let authorized = {
            let mut state = self.state.borrow_mut();
            state.accounts = accounts.clone();
            state.authorized
        };
        if authorized {
            self.emit(ProviderEvent::AccountsChanged(accounts));
        }
    }

    /// The user switches network inside the wallet.
    pub fn set_chain(&self, chain_id: &str) {
        let id = normalize_chain_id(chain_id).unwrap_or_else(|| chain_id.to_string());
        {
            let mut state = self.state.borrow_mut();
            state.known_chains.insert(id.clone());
            state.chain_id = id.clone();
        }
        self.emit(ProviderEvent::ChainChanged(id));
    }

    /// The user disconnects the site from inside the wallet.
    pub fn revoke(&self) {
        self.state.borrow_mut().authorized = false;
        self.emit(ProviderEvent::AccountsChanged(Vec::new()));
    }

    /// Deliver an event to every listener of its kind. Full queues drop it.
    pub fn emit(&self, event: ProviderEvent) {
        let kind = event.kind();
        let mut dropped = Vec::new();
        {
            // send on the registered senders; a clone would carry its own slot
            let mut state = self.state.borrow_mut();
            for (listener, sink) in state.listeners.values_mut() {
                if *listener == kind {
                    if let Err(e) = sink.try_send(event.clone()) {
                        dropped.push(e.to_string());
                    }
                }
            }
        }
        for reason in dropped {
            tracing::warn!(event = kind.as_str(), "event dropped: {}", reason);
        }
    }

    fn visible_accounts(&self) -> Vec<String> {
        let state = self.state.borrow();
        if state.authorized { state.accounts.clone() } else { Vec::new() }
    }

    fn switch(&self, params: &Value) -> ProviderResult<Value> {
        let target = params
            .pointer("/0/chainId")
            .and_then(Value::as_str)
            .and_then(normalize_chain_id)
            .ok_or_else(|| ProviderError::new(codes::INVALID_PARAMS, "expected [{chainId}]"))?;
        let changed = {
            let mut state = self.state.borrow_mut();
            if !state.known_chains.contains(&target) {
                return Err(ProviderError::unrecognized_chain(&target));
            }
            let changed = state.chain_id != target;
            state.chain_id = target.clone();
            changed
        };
        if changed {
            self.emit(ProviderEvent::ChainChanged(target));
        }
        Ok(Value::Null)
    }

    fn add(&self, params: &Value) -> ProviderResult<Value> {
        let descriptor: ChainDescriptor = params
            .get(0)
            .cloned()
            .ok_or_else(|| ProviderError::new(codes::INVALID_PARAMS, "expected [descriptor]"))
            .and_then(|v| {
                serde_json::from_value(v)
                    .map_err(|e| ProviderError::new(codes::INVALID_PARAMS, e.to_string()))
            })?;
        let id = normalize_chain_id(&descriptor.chain_id)
            .ok_or_else(|| ProviderError::new(codes::INVALID_PARAMS, "bad chainId"))?;
        self.state.borrow_mut().known_chains.insert(id);
        Ok(Value::Null)
    }

    fn balance(&self, params: &Value) -> ProviderResult<Value> {
        let address = params
            .get(0)
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::new(codes::INVALID_PARAMS, "expected [address, block]"))?;
        let wei = self
            .state
            .borrow()
            .balances
            .get(&address.to_ascii_lowercase())
            .copied()
            .unwrap_or(0);
        Ok(Value::String(to_quantity(wei)))
    }

    fn send(&self, params: &Value) -> ProviderResult<Value> {
        let tx: TransferRequest = params
            .get(0)
            .cloned()
            .ok_or_else(|| ProviderError::new(codes::INVALID_PARAMS, "expected [tx]"))
            .and_then(|v| {
                serde_json::from_value(v)
                    .map_err(|e| ProviderError::new(codes::INVALID_PARAMS, e.to_string()))
            })?;

        let mut state = self.state.borrow_mut();
        let owns_sender = state.authorized
            && state.accounts.iter().any(|a| a.eq_ignore_ascii_case(&tx.from));
        if !owns_sender {
            return Err(ProviderError::new(
                codes::UNAUTHORIZED,
                "The requested account has not been authorized by the user.",
            ));
        }
        let from = tx.from.to_ascii_lowercase();
        let available = state.balances.get(&from).copied().unwrap_or(0);
        if available < tx.value {
            return Err(ProviderError::new(codes::INTERNAL_ERROR, "insufficient funds for transfer"));
        }
        state.balances.insert(from, available - tx.value);
        *state.balances.entry(tx.to.to_ascii_lowercase()).or_insert(0) += tx.value;
        state.tx_count += 1;
        let hash = format!("0x{:064x}", state.tx_count);
        let withhold = state.withhold_hash;
        state.sent.push(tx);

        Ok(if withhold { Value::Null } else { Value::String(hash) })
    }
}

#[async_trait(?Send)]
impl Eip1193 for MemoryProvider {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let queued = {
            let mut state = self.state.borrow_mut();
            state.calls.push(method.to_string());
            state.failures.get_mut(method).and_then(VecDeque::pop_front)
        };
        if let Some(error) = queued {
            return Err(error);
        }

        match method {
            methods::REQUEST_ACCOUNTS => {
                let mut state = self.state.borrow_mut();
                state.authorized = true;
                Ok(json!(state.accounts))
            }
            methods::ACCOUNTS => Ok(json!(self.visible_accounts())),
            methods::CHAIN_ID => Ok(Value::String(self.state.borrow().chain_id.clone())),
            methods::SWITCH_CHAIN => self.switch(&params),
            methods::ADD_CHAIN => self.add(&params),
            methods::GET_BALANCE => self.balance(&params),
            methods::SEND_TRANSACTION => self.send(&params),
            other => Err(ProviderError::new(
                codes::UNSUPPORTED_METHOD,
                format!("The Provider does not support the requested method: {}", other),
            )),
        }
    }

    fn subscribe(&self, kind: EventKind, sink: EventSink) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.listeners.insert(id, (kind, sink));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.borrow_mut().listeners.remove(&id);
    }
}
