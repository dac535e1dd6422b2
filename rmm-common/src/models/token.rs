use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::Amount;

/// ERC-20 token metadata as used by RMM pools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

impl Token {
    pub fn new(address: Address, decimals: u8, symbol: &str, name: &str) -> Self {
        Self { address, decimals, symbol: symbol.to_string(), name: name.to_string() }
    }

    /// One whole token.
    pub fn one(&self) -> Amount {
        Amount::from_units(1, self.decimals)
    }

    /// Zero amount in this token's decimals.
    pub fn zero(&self) -> Amount {
        Amount::zero(self.decimals)
    }
}
