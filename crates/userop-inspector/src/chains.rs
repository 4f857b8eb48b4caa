//! Chains the inspector knows how to trace and link against.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors resolving a chain from an id or name
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("Unsupported chain id: {0}")]
    UnsupportedId(u64),

    #[error("Unsupported chain name: {0}")]
    UnsupportedName(String),
}

/// A supported EVM network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SupportedChain {
    /// Base mainnet
    #[default]
    Base,
    /// Base Sepolia testnet
    BaseSepolia,
    /// Ethereum mainnet
    Mainnet,
    /// OP mainnet
    Optimism,
    /// Arbitrum One
    Arbitrum,
    /// Polygon PoS
    Polygon,
}

impl SupportedChain {
    /// Every supported chain, Base first
    pub const ALL: [Self; 6] = [
        Self::Base,
        Self::BaseSepolia,
        Self::Mainnet,
        Self::Optimism,
        Self::Arbitrum,
        Self::Polygon,
    ];

    /// EIP-155 chain id
    pub const fn id(self) -> u64 {
        match self {
            Self::Base => 8453,
            Self::BaseSepolia => 84532,
            Self::Mainnet => 1,
            Self::Optimism => 10,
            Self::Arbitrum => 42161,
            Self::Polygon => 137,
        }
    }

    /// Short kebab-case name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::BaseSepolia => "base-sepolia",
            Self::Mainnet => "mainnet",
            Self::Optimism => "optimism",
            Self::Arbitrum => "arbitrum",
            Self::Polygon => "polygon",
        }
    }
}

impl TryFrom<u64> for SupportedChain {
    type Error = ChainError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::ALL.into_iter().find(|chain| chain.id() == id).ok_or(ChainError::UnsupportedId(id))
    }
}

impl FromStr for SupportedChain {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|chain| chain.name() == needle)
            .ok_or_else(|| ChainError::UnsupportedName(s.to_string()))
    }
}

impl fmt::Display for SupportedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(8453, SupportedChain::Base)]
    #[case(84532, SupportedChain::BaseSepolia)]
    #[case(1, SupportedChain::Mainnet)]
    #[case(10, SupportedChain::Optimism)]
    #[case(42161, SupportedChain::Arbitrum)]
    #[case(137, SupportedChain::Polygon)]
    fn test_chain_ids(#[case] id: u64, #[case] chain: SupportedChain) {
        assert_eq!(SupportedChain::try_from(id).unwrap(), chain);
        assert_eq!(chain.id(), id);
        assert_eq!(chain.to_string().parse::<SupportedChain>().unwrap(), chain);
    }

    #[test]
    fn test_unsupported_chain() {
        assert_eq!(SupportedChain::try_from(5), Err(ChainError::UnsupportedId(5)));
        assert!("goerli".parse::<SupportedChain>().is_err());
    }

    #[test]
    fn test_name_parsing_is_lenient() {
        assert_eq!("Base_Sepolia".parse::<SupportedChain>().unwrap(), SupportedChain::BaseSepolia);
        assert_eq!(SupportedChain::default(), SupportedChain::Base);
    }
}
