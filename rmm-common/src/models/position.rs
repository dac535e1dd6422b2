use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::{pool::Pool, Amount};

/// A holder's liquidity in a specific pool.
///
/// Nothing beyond the liquidity amount is stored; token balances and value are derived
/// from the pool's reserves whenever they are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub pool: Pool,
    pub liquidity: Amount,
}

impl Position {
    pub fn new(pool: Pool, liquidity: Amount) -> Self {
        Self { pool, liquidity }
    }

    /// An empty position, used when the chain did not report any liquidity change.
    pub fn empty(pool: Pool) -> Self {
        Self { pool, liquidity: Amount::liquidity(U256::ZERO) }
    }

    pub fn is_empty(&self) -> bool {
        self.liquidity.is_zero()
    }

    /// Risky tokens redeemable by burning this position's liquidity.
    pub fn redeemable_risky(&self) -> Amount {
        Amount::new(self.pro_rata(self.pool.reserves.reserve_risky), self.pool.risky.decimals)
    }

    /// Stable tokens redeemable by burning this position's liquidity.
    pub fn redeemable_stable(&self) -> Amount {
        Amount::new(self.pro_rata(self.pool.reserves.reserve_stable), self.pool.stable.decimals)
    }

    /// Value of the position denominated in the stable token.
    ///
    /// `price_of_risky` is the price of one whole risky token in stable token units.
    pub fn value_in_stable(&self, price_of_risky: Amount) -> Amount {
        let risky_value = self.redeemable_risky().raw * price_of_risky.raw
            / Amount::scale(self.pool.risky.decimals);
        Amount::new(risky_value + self.redeemable_stable().raw, self.pool.stable.decimals)
    }

    /// Sums the liquidity of both positions.
    pub fn add(&self, other: &Position) -> Position {
        Position::new(
            self.pool.clone(),
            Amount::liquidity(self.liquidity.raw.saturating_add(other.liquidity.raw)),
        )
    }

    /// Subtracts `other`'s liquidity, flooring at zero.
    pub fn sub(&self, other: &Position) -> Position {
        Position::new(
            self.pool.clone(),
            Amount::liquidity(self.liquidity.raw.saturating_sub(other.liquidity.raw)),
        )
    }

    fn pro_rata(&self, reserve: U256) -> U256 {
        let total = self.pool.reserves.liquidity;
        if total.is_zero() {
            return U256::ZERO;
        }
        reserve * self.liquidity.raw / total
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.pool.pool_id == other.pool.pool_id && self.liquidity == other.liquidity
    }
}

impl Eq for Position {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::pool::fixtures::pool;

    fn half() -> Amount {
        Amount::liquidity(U256::from(500_000_000_000_000_000u128))
    }

    #[test]
    fn test_redeemable_amounts_are_pro_rata() {
        let position = Position::new(pool(), half());

        assert_eq!(position.redeemable_risky().raw, U256::from(250_000_000_000_000_000u128));
        assert_eq!(position.redeemable_stable(), Amount::new(U256::from(2_000_000u64), 6));
    }

    #[test]
    fn test_redeemable_with_empty_pool() {
        let mut pool = pool();
        pool.reserves.liquidity = U256::ZERO;
        let position = Position::new(pool, half());

        assert!(position.redeemable_risky().is_zero());
        assert!(position.redeemable_stable().is_zero());
    }

    #[test]
    fn test_value_in_stable() {
        let position = Position::new(pool(), half());
        // 0.25 risky at 8 stable each plus 2 stable
        let value = position.value_in_stable(Amount::from_units(8, 6));

        assert_eq!(value, Amount::from_units(4, 6));
    }

    #[test]
    fn test_equality_ignores_reserves() {
        let a = Position::new(pool(), half());
        let mut moved = pool();
        moved.reserves.reserve_risky = U256::from(1u64);
        let b = Position::new(moved, half());

        assert_eq!(a, b);
        assert_ne!(a, Position::empty(pool()));
    }

    #[test]
    fn test_add_and_sub() {
        let a = Position::new(pool(), half());
        let sum = a.add(&a);
        assert_eq!(sum.liquidity, pool().liquidity());

        let diff = a.sub(&sum);
        assert!(diff.is_empty());
    }
}
