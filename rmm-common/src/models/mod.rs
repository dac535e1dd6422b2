pub mod blockchain;
pub mod error;
pub mod pool;
pub mod position;
pub mod token;

use std::fmt::Display;

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::RmmError;

/// Transaction hash literal type to uniquely identify a transaction in the chain.
pub type TxHash = B256;

/// Pool id literal type. Doubles as the ERC-1155 token id of the liquidity token.
pub type PoolId = B256;

/// Decimals used by RMM liquidity tokens.
pub const LIQUIDITY_DECIMALS: u8 = 18;

/// Denominator of basis point values.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// A fixed point token amount: `raw / 10^decimals` whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self { raw: U256::ZERO, decimals }
    }

    /// An amount of `units` whole tokens.
    pub fn from_units(units: u64, decimals: u8) -> Self {
        Self { raw: U256::from(units) * Self::scale(decimals), decimals }
    }

    /// Liquidity amount, always denominated with [`LIQUIDITY_DECIMALS`].
    pub fn liquidity(raw: U256) -> Self {
        Self { raw, decimals: LIQUIDITY_DECIMALS }
    }

    /// `10^decimals` as a `U256`.
    pub fn scale(decimals: u8) -> U256 {
        U256::from(10u64).pow(U256::from(decimals))
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Reduces the amount by a slippage tolerance given in basis points, rounding down.
    ///
    /// Tolerances above 100% clamp to a zero amount.
    pub fn with_slippage(&self, tolerance_bps: u32) -> Self {
        let keep = BPS_DENOMINATOR.saturating_sub(tolerance_bps);
        Self {
            raw: self.raw * U256::from(keep) / U256::from(BPS_DENOMINATOR),
            decimals: self.decimals,
        }
    }

    /// Checks that the amount is expressed with the `expected` decimals.
    pub fn ensure_decimals(&self, expected: u8, what: &str) -> Result<(), RmmError> {
        if self.decimals != expected {
            return Err(RmmError::Validation(format!(
                "{what} uses {} decimals, expected {expected}",
                self.decimals
            )));
        }
        Ok(())
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scale = Self::scale(self.decimals);
        let whole = self.raw / scale;
        let fraction = self.raw % scale;
        if fraction.is_zero() {
            write!(f, "{whole}")
        } else {
            let digits = format!("{:0>width$}", fraction.to_string(), width = self.decimals as usize);
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_from_units() {
        let one = Amount::from_units(1, 18);
        assert_eq!(one.raw, U256::from(1_000_000_000_000_000_000u128));
        assert_eq!(one, Amount::liquidity(U256::from(10u64).pow(U256::from(18))));
    }

    #[rstest]
    #[case::one_percent(100, 9_900)]
    #[case::none(0, 10_000)]
    #[case::all(10_000, 0)]
    #[case::above_all(20_000, 0)]
    fn test_with_slippage(#[case] tolerance_bps: u32, #[case] expected: u64) {
        let amount = Amount::new(U256::from(10_000u64), 6);
        assert_eq!(amount.with_slippage(tolerance_bps).raw, U256::from(expected));
    }

    #[test]
    fn test_ensure_decimals() {
        let amount = Amount::from_units(5, 6);
        assert!(amount.ensure_decimals(6, "delRisky").is_ok());
        let err = amount
            .ensure_decimals(18, "delRisky")
            .unwrap_err();
        assert!(matches!(err, RmmError::Validation(_)));
    }

    #[rstest]
    #[case(Amount::from_units(3, 18), "3")]
    #[case(Amount::new(U256::from(1_500_000u64), 6), "1.5")]
    #[case(Amount::new(U256::from(1u64), 6), "0.000001")]
    fn test_display(#[case] amount: Amount, #[case] expected: &str) {
        assert_eq!(amount.to_string(), expected);
    }
}
