//! Shared wallet doubles for the integration tests

use async_trait::async_trait;
use beeconnect::provider::{EventKind, EventSink, ProviderResult, SubscriptionId};
use beeconnect::{Eip1193, MemoryProvider};
use futures::channel::oneshot;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Holds the first call of one method until released, then forwards to the
/// in-memory wallet.
pub struct GatedProvider {
    pub inner: MemoryProvider,
    method: &'static str,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl GatedProvider {
    pub fn new(inner: MemoryProvider, method: &'static str) -> (Rc<Self>, oneshot::Sender<()>) {
        let (release, gate) = oneshot::channel();
        let provider = Rc::new(Self { inner, method, gate: RefCell::new(Some(gate)) });
        (provider, release)
    }
}

#[async_trait(?Send)]
impl Eip1193 for GatedProvider {
    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        if method == self.method {
            let gate = self.gate.borrow_mut().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
        }
        self.inner.request(method, params).await
    }

    fn subscribe(&self, kind: EventKind, sink: EventSink) -> SubscriptionId {
        self.inner.subscribe(kind, sink)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.unsubscribe(id)
    }
}
