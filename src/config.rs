use alloy::primitives::{Address, B256};
use serde::Deserialize;
use std::str::FromStr;

use crate::indexer::client::LogFilter;
use crate::indexer::decoder::NativeAsset;
use crate::indexer::driver::{ScanSettings, DEFAULT_CHUNK_SIZE, DEFAULT_LOOKBACK};
use crate::indexer::envelope;
use crate::output::OutputFormat;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub contract: ContractConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub native: NativeConfig,
    #[serde(default = "default_token_decimals")]
    pub default_token_decimals: u8,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NodeConfig {
    pub rpc_http: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContractConfig {
    pub address: String,
    /// Topic 0 to filter on. Defaults to the `TransferLogicEntered` signature hash.
    pub event_topic: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_lookback")]
    pub lookback: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

fn default_lookback() -> u64 {
    DEFAULT_LOOKBACK
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct NativeConfig {
    #[serde(default = "default_native_symbol")]
    pub symbol: String,
    #[serde(default = "default_token_decimals")]
    pub decimals: u8,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            symbol: default_native_symbol(),
            decimals: default_token_decimals(),
        }
    }
}

fn default_native_symbol() -> String {
    "ETH".to_string()
}

fn default_token_decimals() -> u8 {
    18
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        Self::parse(&content).map_err(|e| eyre::eyre!("Invalid config file '{}': {}", path, e))
    }

    pub fn parse(content: &str) -> eyre::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if !is_hex_address(&self.contract.address) {
            return Err(eyre::eyre!(
                "Invalid contract address '{}'",
                self.contract.address
            ));
        }
        if let Some(topic) = &self.contract.event_topic {
            if !topic.starts_with("0x") || topic.len() != 66 || B256::from_str(topic).is_err() {
                return Err(eyre::eyre!("Invalid event topic '{}'", topic));
            }
        }
        if self.scan.chunk_size == 0 {
            return Err(eyre::eyre!("scan.chunk_size must be at least 1"));
        }
        if self.native.symbol.trim().is_empty() {
            return Err(eyre::eyre!("native.symbol must not be empty"));
        }
        for token in &self.tokens {
            if !is_hex_address(&token.address) {
                return Err(eyre::eyre!(
                    "Invalid token address '{}' for {}",
                    token.address,
                    token.symbol
                ));
            }
        }
        Ok(())
    }

    pub fn contract_address(&self) -> eyre::Result<Address> {
        Address::from_str(&self.contract.address)
            .map_err(|e| eyre::eyre!("Invalid contract address '{}': {}", self.contract.address, e))
    }

    pub fn event_topic(&self) -> eyre::Result<B256> {
        match &self.contract.event_topic {
            Some(topic) => B256::from_str(topic)
                .map_err(|e| eyre::eyre!("Invalid event topic '{}': {}", topic, e)),
            None => Ok(envelope::event_topic()),
        }
    }

    pub fn scan_settings(&self) -> eyre::Result<ScanSettings> {
        Ok(ScanSettings {
            filter: LogFilter {
                address: self.contract_address()?,
                topic: self.event_topic()?,
            },
            lookback: self.scan.lookback,
            chunk_size: self.scan.chunk_size,
        })
    }

    pub fn native_asset(&self) -> NativeAsset {
        NativeAsset {
            symbol: self.native.symbol.clone(),
            decimals: self.native.decimals,
        }
    }
}

fn is_hex_address(s: &str) -> bool {
    s.starts_with("0x") && s.len() == 42 && Address::from_str(s).is_ok()
}
