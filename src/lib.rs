//! Beeconnect: wallet session manager over an EIP-1193 provider.
//!
//! # Architecture
//!
//! ```text
//! UI (connect, switch_network, refresh_balance, send)   provider pushes
//!   │                                                        │
//!   └───────────────▶ WalletSession (state machine) ◀────────┘
//!                         │         │          │
//!                         │         │          └── Scheduler (status expiry)
//!                         │         └── SessionPersistence → SessionStore
//!                         │
//!                         ├── network::switch_or_add ── ChainRegistry
//!                         └── ProviderAdapter → dyn Eip1193
//! ```
//!
//! # Operations
//!
//! | Operation | Prompts? | Description |
//! |-----------|----------|-------------|
//! | `connect()` | yes | `eth_requestAccounts`, adopt first account |
//! | `try_auto_reconnect()` | never | `eth_accounts`, adopt persisted account if still granted |
//! | `switch_network(id)` | yes | switch, add-then-retry once on 4902 |
//! | `refresh_balance()` | no | `eth_getBalance`, truncated display |
//! | `send(to, amount)` | yes | validate, `eth_sendTransaction` |
//! | `apply(event)` | - | reconcile `accountsChanged` / `chainChanged` / `disconnect` |
//!
//! # Features
//!
//! - `native` - tokio timers, file-backed session store, CLI
//! - `wasm` - browser bindings (`window.ethereum`, `localStorage`, `setTimeout`)
//!
//! # Usage
//!
//! ```ignore
//! use beeconnect::{MemoryProvider, MemoryStore, TokioScheduler, WalletSession};
//! use std::rc::Rc;
//!
//! let wallet = Rc::new(MemoryProvider::new(&["0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"], "0x1"));
//! let scheduler = TokioScheduler::new();
//! let session = WalletSession::new(Some(wallet), Rc::new(MemoryStore::new()), Rc::new(scheduler.clone()));
//!
//! // status messages expire only while the scheduler is driven
//! scheduler.run_until(async {
//!     let events = session.start().await?;
//!     session.connect().await?;
//!     session.switch_network("0x89").await?;
//!     session.run_events(events).await;
//!     Ok::<_, beeconnect::SessionError>(())
//! }).await?;
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod chain;
pub mod core;
pub mod error;
pub mod network;
pub mod provider;
pub mod session;
pub mod store;
pub mod transfer;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports
// =============================================================================
pub use chain::{ChainDescriptor, ChainRegistry, NativeCurrency};
pub use error::{SessionError, SessionResult};
pub use provider::{Eip1193, MemoryProvider, ProviderAdapter, ProviderError, ProviderEvent};
pub use session::{
    Balance, Followup, ManualScheduler, Scheduler, SessionConfig, SessionSnapshot, SessionState,
    SessionStatus, WalletSession,
};
pub use store::{MemoryStore, PersistedSession, SessionStore};
pub use transfer::PendingTransfer;

#[cfg(feature = "native")]
pub use session::TokioScheduler;
#[cfg(feature = "native")]
pub use store::FileStore;

#[cfg(feature = "wasm")]
pub use wasm::{BrowserScheduler, InjectedProvider, JsWalletSession, LocalStorageStore};
