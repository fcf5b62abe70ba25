//! The RPC Pool (`spec.md` §4.5): one alloy JSON-RPC client per configured
//! chain, dialed lazily and health-checked on a timeout, with reconnect on
//! error rather than eager retry loops.

use std::{collections::HashMap, sync::Arc, time::Duration};

use alloy_provider::{Provider, ReqwestProvider};
use thiserror::Error;
use timelockwatch_common::{ChainId, Classify, ErrorClass};
use timelockwatch_primitives::Chain;
use tokio::sync::RwLock;

/// How long a dial or health check is allowed to take before the chain is
/// marked unavailable for this tick (`spec.md` §4.5).
const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("chain {0} has no rpc endpoint configured")]
    NoEndpoint(ChainId),
    #[error("chain {0} url template could not be rendered")]
    BadTemplate(ChainId),
    #[error("chain {chain_id} dial failed: {source}")]
    Dial {
        chain_id: ChainId,
        #[source]
        source: url::ParseError,
    },
    #[error("chain {chain_id} unreachable: {message}")]
    Unreachable { chain_id: ChainId, message: String },
    #[error("chain {chain_id} health check timed out after {0:?}", DIAL_TIMEOUT)]
    Timeout { chain_id: ChainId },
}

impl Classify for RpcError {
    fn class(&self) -> ErrorClass {
        ErrorClass::RpcUnavailable
    }
}

/// A dialed connection to one chain's RPC endpoint. Cheap to clone; the
/// inner alloy provider is reference-counted HTTP transport state.
#[derive(Debug, Clone)]
pub struct ChainClient {
    pub chain_id: ChainId,
    provider: ReqwestProvider,
}

impl ChainClient {
    pub fn provider(&self) -> &ReqwestProvider {
        &self.provider
    }

    /// `eth_chainId`, used both as the post-dial health check and to catch
    /// rpc/chain_id config mismatches at startup.
    pub async fn remote_chain_id(&self) -> Result<u64, RpcError> {
        tokio::time::timeout(DIAL_TIMEOUT, self.provider.get_chain_id())
            .await
            .map_err(|_| RpcError::Timeout { chain_id: self.chain_id })?
            .map_err(|e| RpcError::Unreachable { chain_id: self.chain_id, message: e.to_string() })
    }

    pub async fn latest_block_number(&self) -> Result<u64, RpcError> {
        tokio::time::timeout(DIAL_TIMEOUT, self.provider.get_block_number())
            .await
            .map_err(|_| RpcError::Timeout { chain_id: self.chain_id })?
            .map_err(|e| RpcError::Unreachable { chain_id: self.chain_id, message: e.to_string() })
    }
}

/// Holds one [`ChainClient`] per active chain, dialed on first use and
/// re-dialed whenever a previous client is evicted after a failure.
#[derive(Debug, Default)]
pub struct RpcPool {
    clients: RwLock<HashMap<ChainId, Arc<ChainClient>>>,
}

impl RpcPool {
    pub fn new() -> Self {
        Self { clients: RwLock::new(HashMap::new()) }
    }

    /// Returns the pooled client for `chain`, dialing and health-checking it
    /// first if this is the first call or the previous client was evicted.
    pub async fn get(&self, chain: &Chain, api_key: &str) -> Result<Arc<ChainClient>, RpcError> {
        if let Some(client) = self.clients.read().await.get(&chain.chain_id) {
            return Ok(client.clone());
        }
        self.dial(chain, api_key).await
    }

    /// Drops the cached client for `chain_id` so the next [`RpcPool::get`]
    /// redials, per the lazy-reconnect policy of `spec.md` §4.5.
    pub async fn evict(&self, chain_id: ChainId) {
        self.clients.write().await.remove(&chain_id);
    }

    async fn dial(&self, chain: &Chain, api_key: &str) -> Result<Arc<ChainClient>, RpcError> {
        let url_str = chain.rpc.render(api_key).ok_or(RpcError::BadTemplate(chain.chain_id))?;
        let url: url::Url = url_str
            .parse()
            .map_err(|source| RpcError::Dial { chain_id: chain.chain_id, source })?;

        let provider = ReqwestProvider::new_http(url);
        let client = Arc::new(ChainClient { chain_id: chain.chain_id, provider });

        client.remote_chain_id().await?;

        self.clients.write().await.insert(chain.chain_id, client.clone());
        tracing::info!(chain_id = %chain.chain_id, "dialed rpc endpoint");
        Ok(client)
    }

    /// Tries each fallback endpoint in turn after the primary dial fails.
    /// Per `spec.md` §9 Open Question 1, fallback order is the order the
    /// operator configured, with no health-based reordering.
    pub async fn dial_with_fallback(
        &self,
        chain: &Chain,
        api_key: &str,
    ) -> Result<Arc<ChainClient>, RpcError> {
        match self.dial(chain, api_key).await {
            Ok(client) => Ok(client),
            Err(primary_err) => {
                for fallback_url in &chain.rpc.fallbacks {
                    let url: Result<url::Url, _> = fallback_url.parse();
                    let Ok(url) = url else { continue };
                    let provider = ReqwestProvider::new_http(url);
                    let client =
                        Arc::new(ChainClient { chain_id: chain.chain_id, provider });
                    if client.remote_chain_id().await.is_ok() {
                        self.clients.write().await.insert(chain.chain_id, client.clone());
                        tracing::warn!(chain_id = %chain.chain_id, "dialed fallback rpc endpoint");
                        return Ok(client);
                    }
                }
                Err(primary_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timelockwatch_primitives::RpcEndpoints;

    fn chain_with_rpc(rpc: RpcEndpoints) -> Chain {
        Chain {
            chain_id: ChainId(1),
            chain_name: "ethereum".into(),
            display_name: "Ethereum".into(),
            native_currency: "ETH".into(),
            logo_url: None,
            is_testnet: false,
            rpc,
            rpc_enabled: true,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn dial_fails_fast_when_template_has_no_placeholder_and_no_key() {
        let chain = chain_with_rpc(RpcEndpoints {
            template: "not a url at all".into(),
            placeholder: "{API_KEY}".into(),
            fallbacks: vec![],
        });
        let pool = RpcPool::new();
        let err = pool.get(&chain, "key").await.unwrap_err();
        assert!(matches!(err, RpcError::Dial { .. }));
    }

    #[tokio::test]
    async fn evict_forces_redial() {
        let pool = RpcPool::new();
        pool.evict(ChainId(1)).await;
        assert!(pool.clients.read().await.get(&ChainId(1)).is_none());
    }
}
