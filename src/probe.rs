//! Reachability probes run before each retry attempt

use crate::provider::ContentStore;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Reports whether the remote dependency can currently be reached
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// Probe backed by a content store's `ping`
pub struct StoreProbe {
    store: Arc<dyn ContentStore>,
}

impl StoreProbe {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReachabilityProbe for StoreProbe {
    async fn is_reachable(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(store = self.store.name(), error = %e, "Reachability probe failed");
                false
            }
        }
    }
}

/// Probe that never reports an outage
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

#[async_trait]
impl ReachabilityProbe for AlwaysReachable {
    async fn is_reachable(&self) -> bool {
        true
    }
}

/// Probe built from a closure
pub struct FnProbe<F> {
    check: F,
}

impl<F> FnProbe<F>
where
    F: Fn() -> BoxFuture<'static, bool> + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

#[async_trait]
impl<F> ReachabilityProbe for FnProbe<F>
where
    F: Fn() -> BoxFuture<'static, bool> + Send + Sync,
{
    async fn is_reachable(&self) -> bool {
        (self.check)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::memory::MemoryContentStore;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_store_probe_follows_store() {
        let store = Arc::new(MemoryContentStore::default());
        let probe = StoreProbe::new(store.clone());
        assert!(probe.is_reachable().await);

        store.set_reachable(false);
        assert!(!probe.is_reachable().await);

        store.set_reachable(true);
        assert!(probe.is_reachable().await);
    }

    #[tokio::test]
    async fn test_fn_probe() {
        let probe = FnProbe::new(|| async { false }.boxed());
        assert!(!probe.is_reachable().await);
        assert!(AlwaysReachable.is_reachable().await);
    }
}
