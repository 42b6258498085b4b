use alloy::primitives::keccak256;
use std::collections::HashMap;

use super::types::{Selector, TransferKind};

/// Length of a selector prefix.
pub const SELECTOR_LEN: usize = 4;

/// Size of one ABI word in the payload body.
pub const WORD: usize = 32;

/// Derive the 4-byte selector of a canonical signature such as
/// `transferEth(address,address,uint256)`.
pub fn selector_for(signature: &str) -> Selector {
    Selector::from_slice(&keccak256(signature.as_bytes())[..SELECTOR_LEN])
}

/// How the body of a payload (everything after the selector) is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStrategy {
    /// `from, to` in words 0 and 1, amount in the remaining bytes.
    ///
    /// No trailing bytes means an amount of zero. The amount is capped at
    /// uint256; anything wider is rejected as an overflow.
    NativeTransfer,
    /// `from, to, token` in words 0..3, amount in word 3.
    TokenTransfer,
}

impl DecodeStrategy {
    pub const ALL: [DecodeStrategy; 2] = [
        DecodeStrategy::NativeTransfer,
        DecodeStrategy::TokenTransfer,
    ];

    pub fn signature(&self) -> &'static str {
        match self {
            DecodeStrategy::NativeTransfer => "transferEth(address,address,uint256)",
            DecodeStrategy::TokenTransfer => "transferErc20(address,address,address,uint256)",
        }
    }

    pub fn selector(&self) -> Selector {
        selector_for(self.signature())
    }

    pub fn kind(&self) -> TransferKind {
        match self {
            DecodeStrategy::NativeTransfer => TransferKind::Native,
            DecodeStrategy::TokenTransfer => TransferKind::Token,
        }
    }

    /// Minimum body length in bytes, selector excluded.
    pub fn min_body_len(&self) -> usize {
        match self {
            // the amount may be empty
            DecodeStrategy::NativeTransfer => 2 * WORD,
            DecodeStrategy::TokenTransfer => 4 * WORD,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DecodeStrategy::NativeTransfer => "transferEth",
            DecodeStrategy::TokenTransfer => "transferErc20",
        }
    }
}

/// Immutable selector → strategy table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct SelectorRegistry {
    strategies: HashMap<Selector, DecodeStrategy>,
}

impl SelectorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding every known transfer strategy.
    pub fn standard() -> eyre::Result<Self> {
        let mut registry = Self::empty();
        for strategy in DecodeStrategy::ALL {
            registry.register(strategy)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, strategy: DecodeStrategy) -> eyre::Result<()> {
        let selector = strategy.selector();
        if let Some(existing) = self.strategies.insert(selector, strategy) {
            return Err(eyre::eyre!(
                "Selector 0x{} registered twice ({} and {})",
                hex::encode(selector),
                existing.name(),
                strategy.name()
            ));
        }
        tracing::debug!(
            selector = %hex::encode(selector),
            signature = strategy.signature(),
            "Registered transfer selector"
        );
        Ok(())
    }

    pub fn lookup(&self, selector: &Selector) -> Option<DecodeStrategy> {
        self.strategies.get(selector).copied()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol;
    use alloy::sol_types::SolCall;

    sol! {
        function transferEth(address _from, address _to, uint256 _amount);
        function transferErc20(address _from, address _to, address _token, uint256 _amount);
    }

    #[test]
    fn test_selectors_match_abi() {
        assert_eq!(
            DecodeStrategy::NativeTransfer.selector().0,
            transferEthCall::SELECTOR
        );
        assert_eq!(
            DecodeStrategy::TokenTransfer.selector().0,
            transferErc20Call::SELECTOR
        );
    }

    #[test]
    fn test_standard_registry_lookup() {
        let registry = SelectorRegistry::standard().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.lookup(&selector_for("transferEth(address,address,uint256)")),
            Some(DecodeStrategy::NativeTransfer)
        );
        assert_eq!(
            registry.lookup(&Selector::from([0xde, 0xad, 0xbe, 0xef])),
            None
        );
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = SelectorRegistry::empty();
        registry.register(DecodeStrategy::NativeTransfer).unwrap();
        assert!(registry.register(DecodeStrategy::NativeTransfer).is_err());
    }
}
