use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indexer_core::{BlockDelta, BlockHash};
use tracing::warn;

use crate::api::NodeApi;
use crate::model::{AddressDeltaResponse, AddressUtxoResponse, RpcError};

/// Round-robins read-only calls across a pool of node endpoints.
///
/// Each call starts from a rotating cursor and makes up to pool-size
/// attempts with a fixed inter-attempt delay; the first success wins and
/// the last error is surfaced if every attempt fails. There is no other
/// timeout.
pub struct FailoverPool {
    clients: Vec<Arc<dyn NodeApi>>,
    cursor: AtomicUsize,
    retry_delay: Duration,
}

impl FailoverPool {
    pub fn new(clients: Vec<Arc<dyn NodeApi>>, retry_delay: Duration) -> Self {
        Self { clients, cursor: AtomicUsize::new(0), retry_delay }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub async fn try_all<T, F, Fut>(&self, op: F) -> Result<T, RpcError>
    where
        F: Fn(Arc<dyn NodeApi>) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        if self.clients.is_empty() {
            return Err(RpcError::Internal("empty client pool".to_string()));
        }
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        let mut last_err = None;
        for attempt in 0..self.clients.len() {
            let client = self.clients[(start + attempt) % self.clients.len()].clone();
            match op(client).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt, error = %e, "node RPC attempt failed");
                    last_err = Some(e);
                }
            }
            if attempt + 1 < self.clients.len() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        // The loop ran at least once, so an error was recorded.
        Err(last_err.unwrap_or_else(|| RpcError::Internal("no attempts made".to_string())))
    }
}

#[async_trait]
impl NodeApi for FailoverPool {
    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, RpcError> {
        self.try_all(|c| async move { c.get_block_hash(height).await }).await
    }

    async fn get_block_deltas(&self, hash: BlockHash) -> Result<BlockDelta, RpcError> {
        self.try_all(|c| async move { c.get_block_deltas(hash).await }).await
    }

    async fn get_address_deltas(
        &self,
        addresses: &[String],
        start: u32,
        end: u32,
    ) -> Result<AddressDeltaResponse, RpcError> {
        self.try_all(|c| {
            let addresses = addresses.to_vec();
            async move { c.get_address_deltas(&addresses, start, end).await }
        })
        .await
    }

    async fn get_address_utxos(&self, addresses: &[String]) -> Result<AddressUtxoResponse, RpcError> {
        self.try_all(|c| {
            let addresses = addresses.to_vec();
            async move { c.get_address_utxos(&addresses).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    /// Fails a configurable number of times before succeeding.
    struct FlakyNode {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    impl FlakyNode {
        fn new(failures: u32) -> Self {
            Self { failures_left: AtomicU32::new(failures), calls: AtomicU32::new(0) }
        }
    }

    #[async_trait]
    impl NodeApi for FlakyNode {
        async fn get_block_hash(&self, height: u32) -> Result<BlockHash, RpcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
                return Err(RpcError::Rpc { code: -32601, message: format!("unavailable at {}", height) });
            }
            Ok(BlockHash::from_u64_word(height as u64))
        }

        async fn get_block_deltas(&self, _hash: BlockHash) -> Result<BlockDelta, RpcError> {
            Err(RpcError::Internal("unused".to_string()))
        }

        async fn get_address_deltas(
            &self,
            _addresses: &[String],
            _start: u32,
            _end: u32,
        ) -> Result<AddressDeltaResponse, RpcError> {
            Err(RpcError::Internal("unused".to_string()))
        }

        async fn get_address_utxos(&self, _addresses: &[String]) -> Result<AddressUtxoResponse, RpcError> {
            Err(RpcError::Internal("unused".to_string()))
        }
    }

    fn pool(nodes: Vec<Arc<FlakyNode>>) -> FailoverPool {
        let clients: Vec<Arc<dyn NodeApi>> = nodes.into_iter().map(|n| n as Arc<dyn NodeApi>).collect();
        FailoverPool::new(clients, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn first_healthy_client_wins() {
        let bad = Arc::new(FlakyNode::new(u32::MAX));
        let good = Arc::new(FlakyNode::new(0));
        let pool = pool(vec![bad.clone(), good.clone()]);

        let hash = pool.get_block_hash(5).await.unwrap();
        assert_eq!(hash, BlockHash::from_u64_word(5));
        assert_eq!(bad.calls.load(Ordering::SeqCst) + good.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_pool_returns_last_error() {
        let pool = pool(vec![Arc::new(FlakyNode::new(u32::MAX)), Arc::new(FlakyNode::new(u32::MAX))]);
        let err = pool.get_block_hash(5).await.unwrap_err();
        assert!(matches!(err, RpcError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn cursor_rotates_between_calls() {
        let a = Arc::new(FlakyNode::new(0));
        let b = Arc::new(FlakyNode::new(0));
        let pool = pool(vec![a.clone(), b.clone()]);

        pool.get_block_hash(1).await.unwrap();
        pool.get_block_hash(2).await.unwrap();
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_pool_is_an_error() {
        let pool = FailoverPool::new(vec![], Duration::from_millis(1));
        assert!(pool.get_block_hash(1).await.is_err());
    }
}
