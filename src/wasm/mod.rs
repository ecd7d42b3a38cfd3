//! WASM module: browser wallet session
//!
//! Wires the session core to browser capabilities:
//! - `window.ethereum` (EIP-1193 injected provider)
//! - `window.localStorage` (session hint)
//! - `window.setTimeout` (status expiry)
//! - JS bindings via wasm-bindgen
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        WalletSession (JS API)           │
//! │  connect, switchNetwork, refreshBalance │
//! │  send, snapshot, watch, shutdown        │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     session::WalletSession (core)       │
//! │  state machine + switch protocol        │
//! └──────┬──────────────┬──────────────┬────┘
//!        │              │              │
//! ┌──────▼─────┐ ┌──────▼──────┐ ┌─────▼──────┐
//! │ Injected   │ │ LocalStorage│ │ Browser    │
//! │ Provider   │ │ Store       │ │ Scheduler  │
//! └────────────┘ └─────────────┘ └────────────┘
//! ```

mod provider;
mod session;
mod storage;
mod timer;

pub use provider::InjectedProvider;
pub use session::JsWalletSession;
pub use storage::LocalStorageStore;
pub use timer::BrowserScheduler;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
