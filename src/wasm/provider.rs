//! InjectedProvider - EIP-1193 provider injected as `window.ethereum`

use async_trait::async_trait;
use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::log;
use crate::provider::{
    codes, Eip1193, EventKind, EventSink, ProviderError, ProviderEvent, ProviderResult, SubscriptionId,
};

struct Listener {
    kind: EventKind,
    callback: Closure<dyn FnMut(JsValue)>,
}

pub struct InjectedProvider {
    ethereum: JsValue,
    listeners: RefCell<BTreeMap<SubscriptionId, Listener>>,
    next_id: RefCell<u64>,
}

impl InjectedProvider {
    /// `None` when no wallet extension injected `window.ethereum`.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }
        Some(Self {
            ethereum,
            listeners: RefCell::new(BTreeMap::new()),
            next_id: RefCell::new(0),
        })
    }

    fn call(&self, method: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
        let function = Reflect::get(&self.ethereum, &JsValue::from_str(method))?.dyn_into::<Function>()?;
        let array = Array::new();
        for arg in args {
            array.push(arg);
        }
        function.apply(&self.ethereum, &array)
    }
}

fn to_js(value: &Value) -> Result<JsValue, ProviderError> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value
        .serialize(&serializer)
        .map_err(|e| ProviderError::new(codes::INVALID_PARAMS, e.to_string()))
}

fn provider_error(raw: JsValue) -> ProviderError {
    serde_wasm_bindgen::from_value::<ProviderError>(raw.clone())
        .unwrap_or_else(|_| ProviderError::new(codes::INTERNAL_ERROR, format!("{:?}", raw)))
}

fn to_event(kind: EventKind, payload: JsValue) -> Option<ProviderEvent> {
    match kind {
        EventKind::AccountsChanged => serde_wasm_bindgen::from_value::<Vec<String>>(payload)
            .ok()
            .map(ProviderEvent::AccountsChanged),
        EventKind::ChainChanged => payload.as_string().map(ProviderEvent::ChainChanged),
        EventKind::Disconnect => Some(ProviderEvent::Disconnect(provider_error(payload))),
    }
}

#[async_trait(?Send)]
impl Eip1193 for InjectedProvider {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let args = to_js(&json!({ "method": method, "params": params }))?;
        let promise = self
            .call("request", &[&args])
            .map_err(provider_error)?
            .dyn_into::<js_sys::Promise>()
            .map_err(|_| ProviderError::malformed(method, "request() did not return a promise"))?;
        let result = JsFuture::from(promise).await.map_err(provider_error)?;
        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| ProviderError::malformed(method, e))
    }

    fn subscribe(&self, kind: EventKind, sink: EventSink) -> SubscriptionId {
        let mut sink = sink;
        let callback = Closure::wrap(Box::new(move |payload: JsValue| {
            match to_event(kind, payload) {
                Some(event) => {
                    if let Err(e) = sink.try_send(event) {
                        log!("[beeconnect] {} dropped: {}", kind.as_str(), e);
                    }
                }
                None => log!("[beeconnect] unreadable {} payload", kind.as_str()),
            }
        }) as Box<dyn FnMut(JsValue)>);

        let event = JsValue::from_str(kind.as_str());
        if let Err(e) = self.call("on", &[&event, callback.as_ref()]) {
            log!("[beeconnect] ethereum.on({}) failed: {:?}", kind.as_str(), e);
        }

        let id = {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            SubscriptionId(*next)
        };
        self.listeners.borrow_mut().insert(id, Listener { kind, callback });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let Some(listener) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        let event = JsValue::from_str(listener.kind.as_str());
        if let Err(e) = self.call("removeListener", &[&event, listener.callback.as_ref()]) {
            log!("[beeconnect] ethereum.removeListener failed: {:?}", e);
        }
    }
}
