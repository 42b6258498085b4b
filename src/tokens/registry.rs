use alloy::primitives::Address;
use std::collections::HashMap;
use std::str::FromStr;

use crate::config::TokenConfig;

/// Metadata for a token the decoder knows how to scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMeta {
    pub symbol: String,
    pub decimals: u8,
}

/// Index the configured tokens by address for the decoder's token path.
///
/// A token transfer whose address is not in this map keeps its raw address
/// as the asset label and is scaled by `default_token_decimals`. Entries with
/// an unparsable address are logged and left out.
pub fn build_known_tokens(tokens: &[TokenConfig]) -> HashMap<Address, TokenMeta> {
    tokens
        .iter()
        .filter_map(|token| match Address::from_str(&token.address) {
            Ok(address) => Some((
                address,
                TokenMeta {
                    symbol: token.symbol.clone(),
                    decimals: token.decimals,
                },
            )),
            Err(e) => {
                tracing::warn!(
                    symbol = %token.symbol,
                    address = %token.address,
                    error = %e,
                    "Ignoring token with unparsable address"
                );
                None
            }
        })
        .collect()
}
