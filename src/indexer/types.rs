use alloy::primitives::{Address, Bytes, FixedBytes, B256, U256};
use bigdecimal::BigDecimal;
use std::fmt;

/// First four bytes of a transfer payload, derived from a canonical signature.
pub type Selector = FixedBytes<4>;

/// Closed interval `[start, end]` of block numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRange {
    pub start: u64,
    pub end: u64,
}

impl BlockRange {
    /// Returns `None` when `start > end`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Number of blocks covered, saturating for the full `u64` range.
    pub fn width(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A log as returned by the node, reduced to what the scanner needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl LogRecord {
    pub fn leading_topic(&self) -> Option<&B256> {
        self.topics.first()
    }
}

impl From<alloy::rpc::types::Log> for LogRecord {
    fn from(log: alloy::rpc::types::Log) -> Self {
        Self {
            block_number: log.block_number.unwrap_or(0),
            tx_hash: log.transaction_hash.unwrap_or_default(),
            log_index: log.log_index.unwrap_or(0),
            address: log.inner.address,
            topics: log.inner.data.topics().to_vec(),
            data: log.inner.data.data.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Native,
    Token,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Native => "native",
            TransferKind::Token => "token",
        }
    }
}

/// What was moved: the chain's native asset or an ERC-20 style token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Native { symbol: String },
    Token {
        address: Address,
        symbol: Option<String>,
    },
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native { symbol } => f.write_str(symbol),
            Asset::Token {
                symbol: Some(symbol),
                ..
            } => f.write_str(symbol),
            Asset::Token { address, .. } => write!(f, "{address}"),
        }
    }
}

/// A decoded transfer payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFact {
    pub kind: TransferKind,
    pub selector: Selector,
    pub from: Address,
    pub to: Address,
    pub asset: Asset,
    pub raw_amount: U256,
    /// `raw_amount / 10^decimals`, normalized.
    pub amount: BigDecimal,
}

/// A fact joined with the position of the log it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTransfer {
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
    pub nonce: Option<U256>,
    pub fact: TransferFact,
}

impl ScannedTransfer {
    pub fn join(record: &LogRecord, nonce: Option<U256>, fact: TransferFact) -> Self {
        Self {
            block_number: record.block_number,
            tx_hash: record.tx_hash,
            log_index: record.log_index,
            nonce,
            fact,
        }
    }
}

/// `<asset> <sender> <receiver> <amount> <tx>`
impl fmt::Display for ScannedTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.fact.asset,
            self.fact.from,
            self.fact.to,
            self.fact.amount.to_plain_string(),
            self.tx_hash
        )
    }
}
