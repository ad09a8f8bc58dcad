use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use spark_rpc_core::{Result, TransportClient, TransportClientFactory};
use tracing::debug;

/// 按端点缓存传输客户端的工厂。
///
/// # 契约说明（What）
/// - 同一端点只调用一次 `connector`，之后的 [`TransportClientFactory::client_for`] 都返回同一个客户端；
/// - `connector` 失败时不缓存任何内容，下次调用会重新尝试；
/// - [`Self::evict`] 丢弃缓存的客户端，仍被调用方持有的 `Arc` 不受影响。
///
/// # 风险提示（Trade-offs）
/// - `connector` 在分片写锁内执行，不得回调本工厂。
pub struct PooledClientFactory<F> {
    connector: F,
    clients: DashMap<SocketAddr, Arc<dyn TransportClient>>,
}

impl<F> PooledClientFactory<F>
where
    F: Fn(SocketAddr) -> Result<Arc<dyn TransportClient>> + Send + Sync + 'static,
{
    pub fn new(connector: F) -> Self {
        Self {
            connector,
            clients: DashMap::new(),
        }
    }

    /// 移除 `endpoint` 的缓存客户端，返回是否存在。
    pub fn evict(&self, endpoint: SocketAddr) -> bool {
        self.clients.remove(&endpoint).is_some()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl<F> TransportClientFactory for PooledClientFactory<F>
where
    F: Fn(SocketAddr) -> Result<Arc<dyn TransportClient>> + Send + Sync + 'static,
{
    fn client_for(&self, endpoint: SocketAddr) -> Result<Arc<dyn TransportClient>> {
        if let Some(client) = self.clients.get(&endpoint) {
            return Ok(Arc::clone(client.value()));
        }
        match self.clients.entry(endpoint) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let client = (self.connector)(endpoint)?;
                debug!(%endpoint, "transport client created");
                entry.insert(Arc::clone(&client));
                Ok(client)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spark_rpc_core::{InvokeMessage, InvokeResultMessage, RpcError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullClient;

    #[async_trait]
    impl TransportClient for NullClient {
        async fn send(&self, _message: InvokeMessage) -> Result<InvokeResultMessage> {
            Ok(InvokeResultMessage::default())
        }
    }

    fn counting_factory(
        connects: Arc<AtomicUsize>,
    ) -> PooledClientFactory<impl Fn(SocketAddr) -> Result<Arc<dyn TransportClient>> + Send + Sync + 'static>
    {
        PooledClientFactory::new(move |_endpoint| {
            connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullClient) as Arc<dyn TransportClient>)
        })
    }

    #[test]
    fn reuses_one_client_per_endpoint() {
        let connects = Arc::new(AtomicUsize::new(0));
        let factory = counting_factory(connects.clone());
        let a: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        let b: SocketAddr = "127.0.0.1:7001".parse().unwrap();

        let first = factory.client_for(a).unwrap();
        let second = factory.client_for(a).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        factory.client_for(b).unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(factory.len(), 2);

        assert!(factory.evict(a));
        assert!(!factory.evict(a));
        factory.client_for(a).unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn connector_failure_is_not_cached() {
        let factory = PooledClientFactory::new(
            |endpoint: SocketAddr| -> Result<Arc<dyn TransportClient>> {
                Err(RpcError::communication(endpoint, "connection refused"))
            },
        );
        let endpoint: SocketAddr = "127.0.0.1:7000".parse().unwrap();
        let err = factory.client_for(endpoint).err().unwrap();
        assert!(err.is_communication());
        assert!(factory.is_empty());
    }
}
