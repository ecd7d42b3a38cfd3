//! Network Switch Protocol - EIP-3326 switch with EIP-3085 add fallback
//!
//! ```text
//! switch(target) ──ok──▶ done
//!      │
//!      └─ 4902 + registry has target ─▶ add(descriptor) ─▶ switch(target) once
//!      └─ anything else ─────────────▶ NetworkSwitch(message)
//! ```
//!
//! At most one add and one retry: a second failure is final.

use crate::chain::ChainRegistry;
use crate::error::{SessionError, SessionResult};
use crate::provider::ProviderAdapter;

pub async fn switch_or_add(
    provider: &ProviderAdapter,
    registry: &ChainRegistry,
    target: &str,
) -> SessionResult<()> {
    let first = match provider.switch_chain(target).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if !first.is_unrecognized_chain() {
        tracing::debug!(chain = target, code = first.code, "switch refused");
        return Err(SessionError::NetworkSwitch(first.message));
    }
    let Some(descriptor) = registry.get(target) else {
        tracing::debug!(chain = target, "provider and registry both lack chain");
        return Err(SessionError::NetworkSwitch(first.message));
    };

    tracing::info!(chain = target, name = %descriptor.chain_name, "adding chain to provider");
    provider
        .add_chain(descriptor)
        .await
        .map_err(|e| SessionError::NetworkSwitch(e.message))?;

    provider
        .switch_chain(target)
        .await
        .map_err(|e| SessionError::NetworkSwitch(e.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::methods;
    use crate::provider::{codes, MemoryProvider, ProviderError};
    use std::rc::Rc;

    fn setup(wallet: MemoryProvider) -> (Rc<MemoryProvider>, ProviderAdapter) {
        let wallet = Rc::new(wallet);
        (wallet.clone(), ProviderAdapter::new(wallet))
    }

    #[tokio::test]
    async fn known_chain_switches_directly() {
        let (wallet, adapter) = setup(MemoryProvider::new(&[], "0x1").with_known_chain("0x89"));
        switch_or_add(&adapter, &ChainRegistry::default(), "0x89").await.unwrap();
        assert_eq!(wallet.chain_id(), "0x89");
        assert_eq!(wallet.call_count(methods::ADD_CHAIN), 0);
    }

    #[tokio::test]
    async fn unknown_chain_is_added_then_switched() {
        let (wallet, adapter) = setup(MemoryProvider::new(&[], "0x1"));
        switch_or_add(&adapter, &ChainRegistry::default(), "0x89").await.unwrap();
        assert_eq!(wallet.chain_id(), "0x89");
        assert_eq!(
            wallet.calls(),
            vec![methods::SWITCH_CHAIN, methods::ADD_CHAIN, methods::SWITCH_CHAIN]
        );
    }

    #[tokio::test]
    async fn retry_happens_once() {
        let (wallet, adapter) = setup(MemoryProvider::new(&[], "0x1"));
        wallet.fail_next(methods::SWITCH_CHAIN, ProviderError::unrecognized_chain("0x89"));
        wallet.fail_next(methods::SWITCH_CHAIN, ProviderError::unrecognized_chain("0x89"));
        wallet.fail_next(methods::SWITCH_CHAIN, ProviderError::unrecognized_chain("0x89"));

        let err = switch_or_add(&adapter, &ChainRegistry::default(), "0x89").await.unwrap_err();
        assert!(matches!(err, SessionError::NetworkSwitch(_)));
        assert_eq!(wallet.call_count(methods::SWITCH_CHAIN), 2);
        assert_eq!(wallet.call_count(methods::ADD_CHAIN), 1);
        assert_eq!(wallet.chain_id(), "0x1");
    }

    #[tokio::test]
    async fn unregistered_unknown_chain_fails_without_add() {
        let (wallet, adapter) = setup(MemoryProvider::new(&[], "0x1"));
        let err = switch_or_add(&adapter, &ChainRegistry::default(), "0x1337").await.unwrap_err();
        assert!(matches!(err, SessionError::NetworkSwitch(msg) if msg.contains("0x1337")));
        assert_eq!(wallet.calls(), vec![methods::SWITCH_CHAIN]);
    }

    #[tokio::test]
    async fn rejection_is_not_mistaken_for_missing_chain() {
        let (wallet, adapter) = setup(MemoryProvider::new(&[], "0x1"));
        wallet.fail_next(methods::SWITCH_CHAIN, ProviderError::user_rejected());
        let err = switch_or_add(&adapter, &ChainRegistry::default(), "0x89").await.unwrap_err();
        assert_eq!(err, SessionError::NetworkSwitch("User rejected the request.".into()));
        assert_eq!(wallet.call_count(methods::ADD_CHAIN), 0);
    }

    #[tokio::test]
    async fn add_failure_stops_sequence() {
        let (wallet, adapter) = setup(MemoryProvider::new(&[], "0x1"));
        wallet.fail_next(methods::ADD_CHAIN, ProviderError::new(codes::INTERNAL_ERROR, "rpc url unreachable"));
        let err = switch_or_add(&adapter, &ChainRegistry::default(), "0x89").await.unwrap_err();
        assert_eq!(err, SessionError::NetworkSwitch("rpc url unreachable".into()));
        assert_eq!(wallet.call_count(methods::SWITCH_CHAIN), 1);
    }
}
