use alloy::primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::client::{LogFilter, NodeClient};
use super::envelope::{event_topic, TransferLogicEntered};
use super::types::{BlockRange, LogRecord};

pub(crate) const CONTRACT: Address = address!("0x1c2349acbb7f83d07577692c75b6d7654899bf10");

/// In-memory node: canned logs per queried range, optional failures, and a
/// record of every call it served.
pub(crate) struct StubNodeClient {
    height: u64,
    height_fails: bool,
    logs: HashMap<BlockRange, Vec<LogRecord>>,
    failing: Option<BlockRange>,
    queried: Mutex<Vec<BlockRange>>,
    filters: Mutex<Vec<LogFilter>>,
}

impl StubNodeClient {
    pub(crate) fn new(height: u64) -> Self {
        Self {
            height,
            height_fails: false,
            logs: HashMap::new(),
            failing: None,
            queried: Mutex::new(Vec::new()),
            filters: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_logs(mut self, range: BlockRange, logs: Vec<LogRecord>) -> Self {
        self.logs.insert(range, logs);
        self
    }

    pub(crate) fn failing_on(mut self, range: BlockRange) -> Self {
        self.failing = Some(range);
        self
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.height_fails = true;
        self
    }

    pub(crate) fn queried(&self) -> Vec<BlockRange> {
        self.queried.lock().unwrap().clone()
    }

    pub(crate) fn filters(&self) -> Vec<LogFilter> {
        self.filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeClient for StubNodeClient {
    async fn current_height(&self) -> eyre::Result<u64> {
        if self.height_fails {
            return Err(eyre::eyre!("connection refused"));
        }
        Ok(self.height)
    }

    async fn filtered_logs(
        &self,
        filter: &LogFilter,
        range: BlockRange,
    ) -> eyre::Result<Vec<LogRecord>> {
        self.queried.lock().unwrap().push(range);
        self.filters.lock().unwrap().push(*filter);
        if self.failing == Some(range) {
            return Err(eyre::eyre!("query returned more than 10000 results"));
        }
        Ok(self.logs.get(&range).cloned().unwrap_or_default())
    }
}

/// A log at `(block, index)` carrying the envelope topic and no data.
pub(crate) fn record_at(block: u64, index: u64) -> LogRecord {
    LogRecord {
        block_number: block,
        tx_hash: keccak256(format!("{block}:{index}")),
        log_index: index,
        address: CONTRACT,
        topics: vec![event_topic()],
        data: Bytes::new(),
    }
}

/// A well-formed `TransferLogicEntered` log wrapping `payload`.
pub(crate) fn envelope_record(block: u64, payload: Vec<u8>, nonce: u64) -> LogRecord {
    let nonce = U256::from(nonce);
    let event = TransferLogicEntered {
        data: payload.into(),
        nonce,
    };
    LogRecord {
        topics: vec![event_topic(), B256::from(nonce.to_be_bytes::<32>())],
        data: event.encode_data().into(),
        ..record_at(block, 0)
    }
}
