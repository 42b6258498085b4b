use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use async_trait::async_trait;
use eyre::WrapErr;

use super::types::{BlockRange, LogRecord};

/// Contract address plus the single topic 0 a log must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topic: B256,
}

/// The two node calls the scanner depends on.
///
/// Implementations must fail rather than return partial results.
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn current_height(&self) -> eyre::Result<u64>;

    async fn filtered_logs(
        &self,
        filter: &LogFilter,
        range: BlockRange,
    ) -> eyre::Result<Vec<LogRecord>>;
}

/// [`NodeClient`] over an alloy JSON-RPC provider.
pub struct RpcNodeClient<P> {
    provider: P,
}

impl<P: Provider> RpcNodeClient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

/// Connect to an HTTP JSON-RPC endpoint.
pub fn connect_http(rpc_url: &str) -> eyre::Result<RpcNodeClient<impl Provider>> {
    let url = rpc_url
        .parse()
        .map_err(|e| eyre::eyre!("Invalid RPC URL '{}': {}", rpc_url, e))?;
    Ok(RpcNodeClient::new(ProviderBuilder::new().connect_http(url)))
}

#[async_trait]
impl<P: Provider> NodeClient for RpcNodeClient<P> {
    async fn current_height(&self) -> eyre::Result<u64> {
        self.provider
            .get_block_number()
            .await
            .wrap_err("eth_blockNumber failed")
    }

    async fn filtered_logs(
        &self,
        filter: &LogFilter,
        range: BlockRange,
    ) -> eyre::Result<Vec<LogRecord>> {
        let query = Filter::new()
            .address(filter.address)
            .event_signature(filter.topic)
            .from_block(range.start)
            .to_block(range.end);

        let logs = self
            .provider
            .get_logs(&query)
            .await
            .wrap_err_with(|| format!("eth_getLogs failed for blocks {range}"))?;

        Ok(logs.into_iter().map(LogRecord::from).collect())
    }
}
