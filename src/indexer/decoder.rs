use alloy::primitives::{Address, B256, U256};
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::str::FromStr;

use super::selector::{DecodeStrategy, SelectorRegistry, SELECTOR_LEN, WORD};
use super::types::{Asset, Selector, TransferFact};
use crate::tokens::registry::TokenMeta;

/// Why a payload produced no fact. Never fatal to a scan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is {len} bytes, too short to hold a selector")]
    TooShort { len: usize },
    #[error("unknown selector 0x{}", hex::encode(.0))]
    UnknownSelector(Selector),
    #[error("{strategy} payload needs at least {needed} bytes, got {got}")]
    Truncated {
        strategy: &'static str,
        needed: usize,
        got: usize,
    },
    #[error("{strategy} amount does not fit in 256 bits")]
    AmountOverflow { strategy: &'static str },
}

/// Symbol and decimal scale of the chain's native asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAsset {
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeAsset {
    fn default() -> Self {
        Self {
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Turns selector-prefixed transfer payloads into [`TransferFact`]s.
#[derive(Debug, Clone)]
pub struct PayloadDecoder {
    registry: SelectorRegistry,
    native: NativeAsset,
    tokens: HashMap<Address, TokenMeta>,
    default_token_decimals: u8,
}

impl PayloadDecoder {
    pub fn new(registry: SelectorRegistry, native: NativeAsset) -> Self {
        Self {
            registry,
            native,
            tokens: HashMap::new(),
            default_token_decimals: 18,
        }
    }

    /// Known tokens are labelled by symbol and scaled by their own decimals.
    pub fn with_tokens(mut self, tokens: HashMap<Address, TokenMeta>, default_decimals: u8) -> Self {
        self.tokens = tokens;
        self.default_token_decimals = default_decimals;
        self
    }

    /// Decode a payload, returning `None` for anything that should be skipped.
    pub fn decode(&self, payload: &[u8]) -> Option<TransferFact> {
        match self.try_decode(payload) {
            Ok(fact) => Some(fact),
            Err(e) => {
                log_skip(&e);
                None
            }
        }
    }

    pub fn try_decode(&self, payload: &[u8]) -> Result<TransferFact, DecodeError> {
        if payload.len() < SELECTOR_LEN {
            return Err(DecodeError::TooShort { len: payload.len() });
        }

        let (head, body) = payload.split_at(SELECTOR_LEN);
        let selector = Selector::from_slice(head);
        let strategy = self
            .registry
            .lookup(&selector)
            .ok_or(DecodeError::UnknownSelector(selector))?;

        if body.len() < strategy.min_body_len() {
            return Err(DecodeError::Truncated {
                strategy: strategy.name(),
                needed: SELECTOR_LEN + strategy.min_body_len(),
                got: payload.len(),
            });
        }

        let from = address_word(body, 0);
        let to = address_word(body, 1);

        let (asset, decimals, amount_bytes) = match strategy {
            DecodeStrategy::NativeTransfer => (
                Asset::Native {
                    symbol: self.native.symbol.clone(),
                },
                self.native.decimals,
                &body[2 * WORD..],
            ),
            DecodeStrategy::TokenTransfer => {
                let token = address_word(body, 2);
                let meta = self.tokens.get(&token);
                (
                    Asset::Token {
                        address: token,
                        symbol: meta.map(|m| m.symbol.clone()),
                    },
                    meta.map_or(self.default_token_decimals, |m| m.decimals),
                    &body[3 * WORD..4 * WORD],
                )
            }
        };

        let raw_amount =
            U256::try_from_be_slice(amount_bytes).ok_or(DecodeError::AmountOverflow {
                strategy: strategy.name(),
            })?;

        Ok(TransferFact {
            kind: strategy.kind(),
            selector,
            from,
            to,
            asset,
            raw_amount,
            amount: scale_amount(raw_amount, decimals),
        })
    }
}

/// Address right-aligned in the `index`-th word. Caller checks the length.
fn address_word(body: &[u8], index: usize) -> Address {
    Address::from_word(B256::from_slice(&body[index * WORD..(index + 1) * WORD]))
}

/// `raw / 10^decimals` as an exact decimal with trailing zeros stripped.
pub fn scale_amount(raw: U256, decimals: u8) -> BigDecimal {
    // U256 renders as plain decimal digits, which always parse
    let scaled = BigDecimal::from_str(&format!("{raw}e-{decimals}")).unwrap_or_default();
    let normalized = scaled.normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    if scale < 0 {
        normalized.with_scale(0)
    } else {
        normalized
    }
}

fn log_skip(error: &DecodeError) {
    match error {
        DecodeError::UnknownSelector(_) => {
            tracing::debug!(error = %error, "Skipping payload with unregistered selector");
        }
        _ => {
            tracing::warn!(error = %error, "Skipping malformed transfer payload");
        }
    }
}
