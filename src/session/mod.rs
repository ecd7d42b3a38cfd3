//! Session State Machine - single source of truth for wallet/network state
//!
//! ```text
//!                 connect()                 switch_network()
//! Disconnected ─────────────▶ Connecting ──▶ Connected ⇄ Switching
//!      ▲                                         │            │
//!      └──────── accountsChanged([]) / disconnect ────────────┘
//! ```
//!
//! Inputs are UI calls (`connect`, `switch_network`, `refresh_balance`,
//! `send`) and provider pushes fed through [`WalletSession::apply`]. Every
//! transition runs to completion on one thread; state is never borrowed across
//! an await. Async operations re-check the state they started from before
//! writing their result, so late responses cannot clobber newer state.

mod config;
mod state;
mod status;
mod timer;

pub use config::{SessionConfig, DEFAULT_STATUS_TTL};
pub use state::{Balance, Followup, SessionSnapshot, SessionState, SessionStatus};
pub use status::StatusLine;
#[cfg(feature = "native")]
pub use timer::TokioScheduler;
pub use timer::{ManualScheduler, Scheduler, Task, TimerHandle};

use futures::channel::mpsc;
use futures::StreamExt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::chain::{normalize_chain_id, ChainRegistry};
use crate::core::address::same_address;
use crate::core::paths::status as msg;
use crate::error::{SessionError, SessionResult};
use crate::network::switch_or_add;
use crate::provider::{Eip1193, EventKind, ProviderAdapter, ProviderEvent, SubscriptionId};
use crate::store::{PersistedSession, SessionPersistence, SessionStore};
use crate::transfer::PendingTransfer;

pub type EventQueue = mpsc::Receiver<ProviderEvent>;

pub(crate) struct Inner {
    pub(crate) account: String,
    pub(crate) chain_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) line: StatusLine,
    pub(crate) balance: Balance,
    /// Bumped by every balance request and every account/chain change.
    pub(crate) balance_token: u64,
    pub(crate) pending: Option<PendingTransfer>,
    timer: Option<TimerHandle>,
    subscriptions: Vec<SubscriptionId>,
    watchers: Vec<mpsc::UnboundedSender<SessionSnapshot>>,
    closed: bool,
}

impl Inner {
    fn new() -> Self {
        Self {
            account: String::new(),
            chain_id: String::new(),
            status: SessionStatus::Disconnected,
            line: StatusLine::default(),
            balance: Balance::zero(),
            balance_token: 0,
            pending: None,
            timer: None,
            subscriptions: Vec::new(),
            watchers: Vec::new(),
            closed: false,
        }
    }

    fn adopt(&mut self, account: String, chain_id: String) {
        if !same_address(&self.account, &account) || self.chain_id != chain_id {
            self.reset_balance();
        }
        self.account = account;
        self.chain_id = chain_id;
        self.status = SessionStatus::Connected;
    }

    fn drop_account(&mut self) {
        self.account.clear();
        self.status = SessionStatus::Disconnected;
        self.reset_balance();
    }

    fn reset_balance(&mut self) {
        self.balance = Balance::zero();
        self.balance_token += 1;
    }

    fn persisted(&self) -> PersistedSession {
        PersistedSession { account: self.account.clone(), chain_id: self.chain_id.clone() }
    }

    fn snapshot(&self, registry: &ChainRegistry) -> SessionSnapshot {
        let symbol = registry
            .get(&self.chain_id)
            .map(|c| c.native_currency.symbol.clone())
            .unwrap_or_default();
        SessionSnapshot {
            account: self.account.clone(),
            chain_id: self.chain_id.clone(),
            chain_name: if self.chain_id.is_empty() { String::new() } else { registry.display_name(&self.chain_id) },
            status: self.status,
            message: self.line.message().to_string(),
            balance: self.balance.display.clone(),
            symbol,
        }
    }

    fn notify(&mut self, registry: &ChainRegistry) {
        if self.watchers.is_empty() {
            return;
        }
        let snapshot = self.snapshot(registry);
        self.watchers.retain(|tx| tx.unbounded_send(snapshot.clone()).is_ok());
    }
}

/// Wallet session manager. Cheap to clone; clones share one state.
#[derive(Clone)]
pub struct WalletSession {
    pub(crate) inner: Rc<RefCell<Inner>>,
    pub(crate) provider: Option<ProviderAdapter>,
    pub(crate) persistence: SessionPersistence,
    pub(crate) registry: Rc<ChainRegistry>,
    pub(crate) config: Rc<SessionConfig>,
    scheduler: Rc<dyn Scheduler>,
}

impl WalletSession {
    /// `provider` is `None` when no wallet is installed.
    pub fn new(
        provider: Option<Rc<dyn Eip1193>>,
        store: Rc<dyn SessionStore>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::new())),
            provider: ProviderAdapter::detect(provider),
            persistence: SessionPersistence::new(store),
            registry: Rc::new(ChainRegistry::default()),
            config: Rc::new(SessionConfig::default()),
            scheduler,
        }
    }

    pub fn with_registry(mut self, registry: ChainRegistry) -> Self { self.registry = Rc::new(registry); self }
    pub fn with_config(mut self, config: SessionConfig) -> Self { self.config = Rc::new(config); self }

    // =========================================================================
    // OBSERVABLE STATE
    // =========================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.borrow().snapshot(&self.registry)
    }

    pub fn state(&self) -> SessionState {
        let inner = self.inner.borrow();
        SessionState {
            account: inner.account.clone(),
            chain_id: inner.chain_id.clone(),
            status: inner.status,
            transient_message: inner.line.message().to_string(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.borrow().status
    }

    pub fn account(&self) -> Option<String> {
        let inner = self.inner.borrow();
        (!inner.account.is_empty()).then(|| inner.account.clone())
    }

    pub fn chain_id(&self) -> Option<String> {
        let inner = self.inner.borrow();
        (!inner.chain_id.is_empty()).then(|| inner.chain_id.clone())
    }

    pub fn message(&self) -> String {
        self.inner.borrow().line.message().to_string()
    }

    pub fn balance(&self) -> Balance {
        self.inner.borrow().balance.clone()
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Receive a snapshot after every transition.
    pub fn watch(&self) -> mpsc::UnboundedReceiver<SessionSnapshot> {
        let (tx, rx) = mpsc::unbounded();
        self.inner.borrow_mut().watchers.push(tx);
        rx
    }

    // =========================================================================
    // USER OPERATIONS
    // =========================================================================

    /// Ask the provider for account access and adopt the first account.
    pub async fn connect(&self) -> SessionResult<String> {
        let provider = self.require_provider()?;
        {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return Err(SessionError::ProviderUnavailable);
            }
            if inner.status.has_account() {
                return Ok(inner.account.clone());
            }
            inner.status = SessionStatus::Connecting;
            inner.notify(&self.registry);
        }
        tracing::debug!("connecting");

        let result = async {
            let accounts = provider.request_accounts().await.map_err(SessionError::from_request)?;
            let account = accounts.into_iter().next().ok_or(SessionError::NoAccounts)?;
            let chain_id = provider.chain_id().await.map_err(SessionError::from_request)?;
            Ok::<_, SessionError>((account, chain_id))
        }
        .await;

        match result {
            Ok((account, chain_id)) => {
                let applied = {
                    let mut inner = self.inner.borrow_mut();
                    let current = inner.status == SessionStatus::Connecting && !inner.closed;
                    if current {
                        inner.adopt(account.clone(), chain_id.clone());
                        self.persistence.save(&inner.persisted());
                    }
                    current
                };
                if !applied {
                    tracing::warn!(account = %account, "connect result superseded, discarded");
                    return match self.account() {
                        Some(current) => Ok(current),
                        None => Err(self.fail(SessionError::NotConnected)),
                    };
                }
                tracing::info!(account = %account, chain = %chain_id, "connected");
                self.set_status(msg::CONNECTED);
                Ok(account)
            }
            Err(e) => {
                {
                    let mut inner = self.inner.borrow_mut();
                    if inner.status == SessionStatus::Connecting {
                        inner.status = SessionStatus::Disconnected;
                    }
                }
                Err(self.fail(e))
            }
        }
    }

    /// Restore a persisted session without prompting. Only adopts the stored
    /// account if the provider still lists it as authorized.
    pub async fn try_auto_reconnect(&self) -> SessionResult<bool> {
        let Some(provider) = self.provider.clone() else {
            return Ok(false);
        };
        let Some(saved) = self.persistence.load() else {
            return Ok(false);
        };
        if self.status() != SessionStatus::Disconnected {
            return Ok(false);
        }

        let authorized = match provider.accounts().await {
            Ok(accounts) => accounts,
            Err(e) => return Err(self.fail(SessionError::from_request(e))),
        };
        let Some(account) = authorized.into_iter().find(|a| same_address(a, &saved.account)) else {
            tracing::info!(account = %saved.account, "persisted account no longer authorized, clearing");
            self.persistence.clear();
            return Ok(false);
        };

        let chain_id = match provider.chain_id().await {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!("chain id unavailable on reconnect, using persisted: {}", e);
                normalize_chain_id(&saved.chain_id).unwrap_or(saved.chain_id)
            }
        };

        {
            let mut inner = self.inner.borrow_mut();
            if inner.status != SessionStatus::Disconnected || inner.closed {
                return Ok(false);
            }
            inner.adopt(account.clone(), chain_id.clone());
            self.persistence.save(&inner.persisted());
        }
        tracing::info!(account = %account, chain = %chain_id, "session restored");
        self.set_status(msg::RECONNECTED);
        Ok(true)
    }

    /// Switch the provider to `target`, adding it from the registry if the
    /// provider does not know it. Never leaves the session in `Switching`.
    pub async fn switch_network(&self, target: &str) -> SessionResult<()> {
        let Some(target) = normalize_chain_id(target) else {
            return Err(self.fail(SessionError::NetworkSwitch(format!("invalid chain id {:?}", target))));
        };
        let provider = self.require_provider()?;
        {
            let mut inner = self.inner.borrow_mut();
            let status = inner.status;
            match status {
                SessionStatus::Connected => {}
                SessionStatus::Switching => {
                    drop(inner);
                    return Err(self.fail(SessionError::NetworkSwitch("a switch is already in progress".into())));
                }
                _ => {
                    drop(inner);
                    return Err(self.fail(SessionError::NotConnected));
                }
            }
            inner.status = SessionStatus::Switching;
            inner.notify(&self.registry);
        }
        tracing::debug!(chain = %target, "switching");

        let result = switch_or_add(&provider, &self.registry, &target).await;

        let still_switching = {
            let mut inner = self.inner.borrow_mut();
            let switching = inner.status == SessionStatus::Switching;
            if switching {
                inner.status = SessionStatus::Connected;
                if result.is_ok() {
                    if inner.chain_id != target {
                        inner.chain_id = target.clone();
                        inner.reset_balance();
                    }
                    self.persistence.save(&inner.persisted());
                }
            }
            switching
        };

        match result {
            Ok(()) if still_switching => {
                let name = self.registry.display_name(&target);
                tracing::info!(chain = %target, "switched to {}", name);
                self.set_status(format!("Switched to {}", name));
                if let Err(e) = self.refresh_balance().await {
                    tracing::debug!("balance refresh after switch failed: {}", e);
                }
                Ok(())
            }
            Ok(()) => {
                tracing::warn!(chain = %target, "switch completed after session changed, discarded");
                Ok(())
            }
            Err(e) if still_switching => Err(self.fail(e)),
            Err(e) => Err(e),
        }
    }

    /// Fetch the balance of the current account and cache its truncated
    /// display form. A failure keeps the previous balance.
    pub async fn refresh_balance(&self) -> SessionResult<u128> {
        let provider = self.require_provider()?;
        let (token, account, chain_id) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.status.has_account() {
                drop(inner);
                return Err(self.fail(SessionError::NotConnected));
            }
            inner.balance_token += 1;
            (inner.balance_token, inner.account.clone(), inner.chain_id.clone())
        };

        let result = provider.get_balance(&account).await;

        let mut inner = self.inner.borrow_mut();
        let current = inner.balance_token == token
            && inner.account == account
            && inner.chain_id == chain_id
            && !inner.closed;
        match result {
            Ok(raw) if current => {
                inner.balance = Balance::from_raw(
                    raw,
                    self.registry.decimals(&chain_id),
                    self.config.display_decimals,
                );
                inner.notify(&self.registry);
                Ok(raw)
            }
            Ok(raw) => {
                tracing::debug!(token, "stale balance response discarded");
                Ok(raw)
            }
            Err(e) => {
                let error = SessionError::BalanceFetch(e.message);
                drop(inner);
                if current {
                    Err(self.fail(error))
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Forget the session locally. The wallet keeps its own authorization.
    pub fn disconnect(&self) {
        let _ = self.reconcile_accounts_changed(Vec::new());
    }

    // =========================================================================
    // PROVIDER EVENTS
    // =========================================================================

    /// Single entry point for provider pushes.
    pub fn apply(&self, event: ProviderEvent) -> Followup {
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.reconcile_accounts_changed(accounts),
            ProviderEvent::ChainChanged(chain_id) => self.reconcile_chain_changed(&chain_id),
            ProviderEvent::Disconnect(error) => {
                tracing::info!(code = error.code, "provider disconnected: {}", error.message);
                self.reconcile_accounts_changed(Vec::new())
            }
        }
    }

    pub fn reconcile_accounts_changed(&self, accounts: Vec<String>) -> Followup {
        let Some(first) = accounts.into_iter().next() else {
            {
                let mut inner = self.inner.borrow_mut();
                if inner.closed {
                    return Followup::None;
                }
                inner.drop_account();
            }
            self.persistence.clear();
            tracing::info!("disconnected");
            self.set_status(msg::DISCONNECTED);
            return Followup::None;
        };

        {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return Followup::None;
            }
            if !inner.status.has_account() {
                tracing::debug!(account = %first, "accounts changed while not connected, ignored");
                return Followup::None;
            }
            if same_address(&inner.account, &first) {
                return Followup::None;
            }
            let prior = inner.status;
            let chain_id = inner.chain_id.clone();
            inner.adopt(first.clone(), chain_id);
            // an in-flight switch still owns the Switching -> Connected edge
            inner.status = prior;
            self.persistence.save(&inner.persisted());
        }
        tracing::info!(account = %first, "account changed");
        self.set_status(msg::ACCOUNT_CHANGED);
        Followup::RefreshBalance
    }

    /// Adopt a pushed chain id. The same chain in another spelling (`0x0089`,
    /// `137`) is not a change: no status, no save, no balance refresh.
    pub fn reconcile_chain_changed(&self, chain_id: &str) -> Followup {
        let chain_id = normalize_chain_id(chain_id).unwrap_or_else(|| chain_id.to_string());
        let connected = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed || inner.chain_id == chain_id {
                return Followup::None;
            }
            inner.chain_id = chain_id.clone();
            inner.reset_balance();
            let connected = inner.status.has_account();
            if connected {
                self.persistence.save(&inner.persisted());
            }
            connected
        };
        tracing::info!(chain = %chain_id, "network changed");
        self.set_status(msg::NETWORK_CHANGED);
        if connected { Followup::RefreshBalance } else { Followup::None }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Subscribe to provider events through a bounded queue.
    pub fn subscribe_events(&self) -> SessionResult<EventQueue> {
        let provider = self.require_provider()?;
        let (tx, rx) = mpsc::channel(self.config.event_buffer);
        let ids: Vec<SubscriptionId> = [EventKind::AccountsChanged, EventKind::ChainChanged, EventKind::Disconnect]
            .into_iter()
            .map(|kind| provider.subscribe(kind, tx.clone()))
            .collect();
        self.inner.borrow_mut().subscriptions.extend(ids);
        Ok(rx)
    }

    /// Drain the event queue until it closes (provider unsubscribed or the
    /// session shut down), performing requested balance refreshes.
    pub async fn run_events(&self, mut events: EventQueue) {
        while let Some(event) = events.next().await {
            if self.inner.borrow().closed {
                break;
            }
            tracing::debug!(event = event.kind().as_str(), "provider event");
            if self.apply(event) == Followup::RefreshBalance {
                if let Err(e) = self.refresh_balance().await {
                    tracing::debug!("refresh after event failed: {}", e);
                }
            }
        }
    }

    /// Subscribe and restore any persisted session. Returns the event queue
    /// for [`WalletSession::run_events`].
    pub async fn start(&self) -> SessionResult<EventQueue> {
        let events = self.subscribe_events()?;
        if self.try_auto_reconnect().await.unwrap_or(false) {
            let _ = self.refresh_balance().await;
        }
        Ok(events)
    }

    /// Unsubscribe from the provider, cancel the status timer, close
    /// watchers. Later events and timers are ignored.
    pub fn shutdown(&self) {
        let (subscriptions, timer) = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.watchers.clear();
            (std::mem::take(&mut inner.subscriptions), inner.timer.take())
        };
        if let Some(provider) = &self.provider {
            for id in subscriptions {
                provider.unsubscribe(id);
            }
        }
        if let Some(timer) = timer {
            timer.cancel();
        }
        tracing::debug!("session shut down");
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    pub(crate) fn require_provider(&self) -> SessionResult<ProviderAdapter> {
        match &self.provider {
            Some(provider) => Ok(provider.clone()),
            None => Err(self.fail(SessionError::ProviderUnavailable)),
        }
    }

    /// Surface an error as the transient status and hand it back.
    pub(crate) fn fail(&self, error: SessionError) -> SessionError {
        tracing::warn!("{}", error);
        self.set_status(error.to_string());
        error
    }

    /// Show `message` for `status_ttl`, restarting the window.
    pub(crate) fn set_status(&self, message: impl Into<String>) {
        let (generation, previous) = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return;
            }
            let generation = inner.line.set(message);
            inner.notify(&self.registry);
            (generation, inner.timer.take())
        };
        if let Some(timer) = previous {
            timer.cancel();
        }

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        let registry = self.registry.clone();
        let handle = self.scheduler.schedule(
            self.config.status_ttl,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else { return };
                let mut inner = inner.borrow_mut();
                if inner.closed {
                    return;
                }
                if inner.line.expire(generation) {
                    inner.timer = None;
                    inner.notify(&registry);
                }
            }),
        );
        self.inner.borrow_mut().timer = Some(handle);
    }
}
