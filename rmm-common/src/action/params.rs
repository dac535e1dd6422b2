use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::{
    error::RmmError,
    models::{pool::Pool, Amount, PoolId, BPS_DENOMINATOR, LIQUIDITY_DECIMALS},
};

fn ensure_address(address: Address, what: &str) -> Result<(), RmmError> {
    if address.is_zero() {
        return Err(RmmError::InvalidAddress(format!("{what} must not be the zero address")));
    }
    Ok(())
}

fn ensure_liquidity(amount: &Amount, what: &str) -> Result<(), RmmError> {
    amount.ensure_decimals(LIQUIDITY_DECIMALS, what)?;
    if amount.is_zero() {
        return Err(RmmError::Validation(format!("{what} must be greater than zero")));
    }
    Ok(())
}

fn ensure_tolerance(tolerance_bps: u32) -> Result<(), RmmError> {
    if tolerance_bps > BPS_DENOMINATOR {
        return Err(RmmError::Validation(format!(
            "Slippage tolerance of {tolerance_bps} bps exceeds 100%"
        )));
    }
    Ok(())
}

/// Options of an allocate transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocateOptions {
    /// Receiver of the liquidity tokens.
    pub recipient: Address,
    pub del_risky: Amount,
    pub del_stable: Amount,
    pub del_liquidity: Amount,
    /// Pay with the sender's margin account instead of token transfers.
    pub from_margin: bool,
    pub slippage_tolerance_bps: u32,
    /// Create the pool with this allocation instead of adding to an existing one.
    pub create_pool: bool,
}

/// Parameters of an allocate transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionAllocateParams {
    pub pool: Pool,
    pub options: AllocateOptions,
}

impl PositionAllocateParams {
    pub fn new(pool: Pool, options: AllocateOptions) -> Self {
        Self { pool, options }
    }

    pub fn validate(&self) -> Result<(), RmmError> {
        let options = &self.options;
        ensure_address(options.recipient, "Recipient")?;
        ensure_liquidity(&options.del_liquidity, "delLiquidity")?;
        options
            .del_risky
            .ensure_decimals(self.pool.risky.decimals, "delRisky")?;
        options
            .del_stable
            .ensure_decimals(self.pool.stable.decimals, "delStable")?;
        ensure_tolerance(options.slippage_tolerance_bps)?;
        if options.create_pool && options.del_risky.is_zero() {
            return Err(RmmError::Validation("Creating a pool requires delRisky".to_string()));
        }
        Ok(())
    }

    /// Minimum liquidity accepted from an allocation into an existing pool.
    pub fn min_liquidity_out(&self) -> Amount {
        self.options
            .del_liquidity
            .with_slippage(self.options.slippage_tolerance_bps)
    }

    /// Risky reserves per unit of liquidity, as expected by pool creation.
    pub fn risky_per_liquidity(&self) -> U256 {
        let del_liquidity = self.options.del_liquidity.raw;
        if del_liquidity.is_zero() {
            return U256::ZERO;
        }
        self.options.del_risky.raw * Amount::scale(LIQUIDITY_DECIMALS) / del_liquidity
    }
}

/// Options of a remove transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOptions {
    pub del_liquidity: Amount,
    /// Risky tokens the caller expects back, before slippage.
    pub expected_risky: Amount,
    /// Stable tokens the caller expects back, before slippage.
    pub expected_stable: Amount,
    pub slippage_tolerance_bps: u32,
}

/// Parameters of a remove liquidity transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRemoveParams {
    pub pool: Pool,
    pub options: RemoveOptions,
}

impl PositionRemoveParams {
    pub fn new(pool: Pool, options: RemoveOptions) -> Self {
        Self { pool, options }
    }

    /// Only structural checks: removing more than the caller owns is left to the chain.
    pub fn validate(&self) -> Result<(), RmmError> {
        let options = &self.options;
        ensure_liquidity(&options.del_liquidity, "delLiquidity")?;
        options
            .expected_risky
            .ensure_decimals(self.pool.risky.decimals, "expectedRisky")?;
        options
            .expected_stable
            .ensure_decimals(self.pool.stable.decimals, "expectedStable")?;
        ensure_tolerance(options.slippage_tolerance_bps)?;
        ensure_address(self.pool.engine, "Engine")
    }

    pub fn min_risky_out(&self) -> Amount {
        self.options
            .expected_risky
            .with_slippage(self.options.slippage_tolerance_bps)
    }

    pub fn min_stable_out(&self) -> Amount {
        self.options
            .expected_stable
            .with_slippage(self.options.slippage_tolerance_bps)
    }
}

/// Parameters of an ERC-1155 liquidity token transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTransferParams {
    pub sender: Address,
    pub recipient: Address,
    pub pool_id: PoolId,
    pub amount: Amount,
    pub data: Bytes,
}

impl PositionTransferParams {
    pub fn validate(&self) -> Result<(), RmmError> {
        ensure_address(self.sender, "Sender")?;
        ensure_address(self.recipient, "Recipient")?;
        ensure_liquidity(&self.amount, "amount")
    }
}

/// Parameters of a batched ERC-1155 liquidity token transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionBatchTransferParams {
    pub sender: Address,
    pub recipient: Address,
    pub pool_ids: Vec<PoolId>,
    pub amounts: Vec<Amount>,
    pub data: Bytes,
}

impl PositionBatchTransferParams {
    pub fn validate(&self) -> Result<(), RmmError> {
        ensure_address(self.sender, "Sender")?;
        ensure_address(self.recipient, "Recipient")?;
        if self.pool_ids.is_empty() {
            return Err(RmmError::Validation("Batch transfer without any pool ids".to_string()));
        }
        if self.pool_ids.len() != self.amounts.len() {
            return Err(RmmError::Validation(format!(
                "Batch transfer has {} pool ids but {} amounts",
                self.pool_ids.len(),
                self.amounts.len()
            )));
        }
        self.amounts
            .iter()
            .try_for_each(|amount| ensure_liquidity(amount, "amount"))
    }
}

/// Parameters of an engine deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCreationParams {
    pub risky: Address,
    pub stable: Address,
}

impl EngineCreationParams {
    pub fn validate(&self) -> Result<(), RmmError> {
        ensure_address(self.risky, "Risky token")?;
        ensure_address(self.stable, "Stable token")?;
        if self.risky == self.stable {
            return Err(RmmError::Validation(format!(
                "Risky and stable token are the same: {}",
                self.risky
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use rstest::rstest;

    use super::*;
    use crate::models::pool::fixtures::pool;

    fn allocate_options() -> AllocateOptions {
        AllocateOptions {
            recipient: Address::repeat_byte(0x0a),
            del_risky: Amount::new(U256::from(500_000_000_000_000_000u128), 18),
            del_stable: Amount::from_units(4, 6),
            del_liquidity: Amount::from_units(1, 18),
            from_margin: false,
            slippage_tolerance_bps: 100,
            create_pool: false,
        }
    }

    #[test]
    fn test_allocate_validates() {
        let params = PositionAllocateParams::new(pool(), allocate_options());
        assert!(params.validate().is_ok());
        assert_eq!(params.min_liquidity_out().raw, U256::from(990_000_000_000_000_000u128));
        assert_eq!(params.risky_per_liquidity(), U256::from(500_000_000_000_000_000u128));
    }

    #[rstest]
    #[case::zero_liquidity(AllocateOptions { del_liquidity: Amount::liquidity(U256::ZERO), ..allocate_options() })]
    #[case::stable_decimals(AllocateOptions { del_stable: Amount::from_units(4, 18), ..allocate_options() })]
    #[case::risky_decimals(AllocateOptions { del_risky: Amount::from_units(1, 8), ..allocate_options() })]
    #[case::tolerance(AllocateOptions { slippage_tolerance_bps: 10_001, ..allocate_options() })]
    #[case::create_without_risky(AllocateOptions { create_pool: true, del_risky: Amount::zero(18), ..allocate_options() })]
    fn test_allocate_rejects(#[case] options: AllocateOptions) {
        let err = PositionAllocateParams::new(pool(), options)
            .validate()
            .unwrap_err();
        assert!(matches!(err, RmmError::Validation(_)), "unexpected error {err:?}");
    }

    #[test]
    fn test_allocate_rejects_zero_recipient() {
        let options = AllocateOptions { recipient: Address::ZERO, ..allocate_options() };
        let err = PositionAllocateParams::new(pool(), options)
            .validate()
            .unwrap_err();
        assert!(matches!(err, RmmError::InvalidAddress(_)));
    }

    #[test]
    fn test_remove_minimum_outputs() {
        let params = PositionRemoveParams::new(
            pool(),
            RemoveOptions {
                del_liquidity: Amount::from_units(1, 18),
                expected_risky: Amount::from_units(1, 18),
                expected_stable: Amount::from_units(10, 6),
                slippage_tolerance_bps: 50,
            },
        );

        assert!(params.validate().is_ok());
        assert_eq!(params.min_risky_out().raw, U256::from(995_000_000_000_000_000u128));
        assert_eq!(params.min_stable_out().raw, U256::from(9_950_000u64));
    }

    #[test]
    fn test_batch_transfer_length_mismatch() {
        let params = PositionBatchTransferParams {
            sender: Address::repeat_byte(1),
            recipient: Address::repeat_byte(2),
            pool_ids: vec![B256::repeat_byte(3), B256::repeat_byte(4)],
            amounts: vec![Amount::from_units(1, 18)],
            data: Bytes::new(),
        };
        assert!(matches!(params.validate(), Err(RmmError::Validation(_))));
    }

    #[rstest]
    #[case::zero_risky(Address::ZERO, Address::repeat_byte(2), false)]
    #[case::same_tokens(Address::repeat_byte(2), Address::repeat_byte(2), false)]
    #[case::valid(Address::repeat_byte(1), Address::repeat_byte(2), true)]
    fn test_engine_creation_validation(
        #[case] risky: Address,
        #[case] stable: Address,
        #[case] valid: bool,
    ) {
        assert_eq!(EngineCreationParams { risky, stable }.validate().is_ok(), valid);
    }
}
