//! WalletSession JS bindings
//!
//! The UI reads `snapshot()` (or subscribes with `watch`) and only calls the
//! mutation entry points. Failures are also reflected in `snapshot().message`,
//! so callers may ignore rejected promises.

use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use super::log;
use super::provider::InjectedProvider;
use super::storage::LocalStorageStore;
use super::timer::BrowserScheduler;
use crate::provider::Eip1193;
use crate::session::{SessionConfig, WalletSession};
use crate::store::{MemoryStore, SessionStore};

fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value.serialize(&serializer).unwrap_or(JsValue::NULL)
}

fn js_error(message: impl ToString) -> JsValue {
    JsValue::from_str(&message.to_string())
}

#[wasm_bindgen(js_name = "WalletSession")]
pub struct JsWalletSession {
    session: WalletSession,
}

#[wasm_bindgen(js_class = "WalletSession")]
impl JsWalletSession {
    /// Bind to `window.ethereum` (if any) and `localStorage` (memory fallback).
    #[wasm_bindgen(constructor)]
    pub fn new(app: Option<String>) -> JsWalletSession {
        let provider: Option<Rc<dyn Eip1193>> = match InjectedProvider::detect() {
            Some(p) => Some(Rc::new(p)),
            None => {
                log!("[beeconnect] no injected provider");
                None
            }
        };
        let store: Rc<dyn SessionStore> = match LocalStorageStore::open() {
            Some(s) => Rc::new(s),
            None => {
                log!("[beeconnect] localStorage unavailable, session will not persist");
                Rc::new(MemoryStore::new())
            }
        };
        let config = SessionConfig::new(app.unwrap_or_else(|| "beeconnect".into()));
        let session = WalletSession::new(provider, store, Rc::new(BrowserScheduler)).with_config(config);
        Self { session }
    }

    #[wasm_bindgen(getter, js_name = "hasProvider")]
    pub fn has_provider(&self) -> bool {
        self.session.has_provider()
    }

    /// Subscribe to provider events and restore a persisted session.
    #[wasm_bindgen]
    pub async fn start(&self) -> Result<JsValue, JsValue> {
        let session = self.session.clone();
        let events = session.start().await.map_err(js_error)?;
        let pump = session.clone();
        wasm_bindgen_futures::spawn_local(async move {
            pump.run_events(events).await;
        });
        Ok(to_js(&session.snapshot()))
    }

    #[wasm_bindgen]
    pub async fn connect(&self) -> Result<JsValue, JsValue> {
        let session = self.session.clone();
        let account = session.connect().await.map_err(js_error)?;
        let _ = session.refresh_balance().await;
        Ok(JsValue::from_str(&account))
    }

    #[wasm_bindgen(js_name = "switchNetwork")]
    pub async fn switch_network(&self, chain_id: String) -> Result<(), JsValue> {
        self.session.clone().switch_network(&chain_id).await.map_err(js_error)
    }

    /// Resolves to the displayed (truncated) balance.
    #[wasm_bindgen(js_name = "refreshBalance")]
    pub async fn refresh_balance(&self) -> Result<String, JsValue> {
        let session = self.session.clone();
        session.refresh_balance().await.map_err(js_error)?;
        Ok(session.balance().display)
    }

    /// Resolves to the transaction hash, or `null` while pending.
    #[wasm_bindgen]
    pub async fn send(&self, to: String, amount: String) -> Result<JsValue, JsValue> {
        let hash = self.session.clone().send(&to, &amount).await.map_err(js_error)?;
        Ok(hash.map(|h| JsValue::from_str(&h)).unwrap_or(JsValue::NULL))
    }

    #[wasm_bindgen]
    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    #[wasm_bindgen]
    pub fn snapshot(&self) -> JsValue {
        to_js(&self.session.snapshot())
    }

    #[wasm_bindgen(js_name = "pendingTransfer")]
    pub fn pending_transfer(&self) -> JsValue {
        to_js(&self.session.pending_transfer())
    }

    #[wasm_bindgen(js_name = "resetTransfer")]
    pub fn reset_transfer(&self) {
        self.session.reset_transfer();
    }

    /// Chain registry for the network selector.
    #[wasm_bindgen]
    pub fn chains(&self) -> JsValue {
        let chains: Vec<_> = self.session.registry().iter().collect();
        to_js(&chains)
    }

    /// Call `callback(snapshot)` after every transition.
    #[wasm_bindgen]
    pub fn watch(&self, callback: js_sys::Function) {
        let rx = self.session.watch();
        let this = JsValue::NULL;
        wasm_bindgen_futures::spawn_local(async move {
            use futures::StreamExt;
            let mut rx = rx;
            while let Some(snapshot) = rx.next().await {
                let _ = callback.call1(&this, &to_js(&snapshot));
            }
        });
    }

    /// Release provider listeners and timers.
    #[wasm_bindgen]
    pub fn shutdown(&self) {
        self.session.shutdown();
    }
}
