use rmm_common::models::blockchain::TransactionRequest;
use serde::Serialize;

/// Priority fee offered when the node does not suggest one: 1.5 gwei.
pub const DEFAULT_PRIORITY_FEE_PER_GAS: u128 = 1_500_000_000;

/// Represents gas pricing information for EVM blockchain transactions.
///
/// Different EVM networks use different gas pricing models:
/// - Most modern chains use EIP-1559 (base fee + priority fee model)
/// - Legacy chains (e.g., pre-London Ethereum) use a simple gas price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GasPrice {
    /// Legacy gas pricing model with a single gas price value in wei.
    Legacy { gas_price: u128 },
    /// EIP-1559 gas pricing model with base fee and priority fee, both in wei.
    Eip1559 { base_fee_per_gas: u128, max_priority_fee_per_gas: u128 },
}

impl GasPrice {
    /// Returns the effective gas price (base + priority).
    pub fn effective_gas_price(&self) -> u128 {
        match self {
            GasPrice::Legacy { gas_price } => *gas_price,
            GasPrice::Eip1559 { base_fee_per_gas, max_priority_fee_per_gas } => {
                base_fee_per_gas.saturating_add(*max_priority_fee_per_gas)
            }
        }
    }

    /// Fee cap that keeps the transaction includable while the base fee doubles once.
    pub fn max_fee_per_gas(&self) -> u128 {
        match self {
            GasPrice::Legacy { gas_price } => *gas_price,
            GasPrice::Eip1559 { base_fee_per_gas, max_priority_fee_per_gas } => base_fee_per_gas
                .saturating_mul(2)
                .saturating_add(*max_priority_fee_per_gas),
        }
    }

    /// Writes the fee fields of this pricing model into `request`, clearing the others.
    pub fn apply_to(&self, request: &mut TransactionRequest) {
        match self {
            GasPrice::Legacy { gas_price } => {
                request.gas_price = Some(*gas_price);
                request.max_fee_per_gas = None;
                request.max_priority_fee_per_gas = None;
            }
            GasPrice::Eip1559 { max_priority_fee_per_gas, .. } => {
                request.gas_price = None;
                request.max_fee_per_gas = Some(self.max_fee_per_gas());
                request.max_priority_fee_per_gas = Some(*max_priority_fee_per_gas);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, Bytes, U256};

    use super::*;

    fn request() -> TransactionRequest {
        TransactionRequest {
            from: None,
            to: Address::repeat_byte(1),
            data: Bytes::new(),
            value: U256::ZERO,
            gas_limit: None,
            nonce: None,
            chain_id: None,
            gas_price: Some(1),
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        }
    }

    #[test]
    fn test_legacy_effective_gas_price() {
        let legacy = GasPrice::Legacy { gas_price: 50_000_000_000 };
        assert_eq!(legacy.effective_gas_price(), 50_000_000_000);
        assert_eq!(legacy.max_fee_per_gas(), 50_000_000_000);
    }

    #[test]
    fn test_eip1559_fees() {
        let eip1559 = GasPrice::Eip1559 {
            base_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 2_000_000_000,
        };

        assert_eq!(eip1559.effective_gas_price(), 32_000_000_000);
        assert_eq!(eip1559.max_fee_per_gas(), 62_000_000_000);
    }

    #[test]
    fn test_apply_eip1559_clears_legacy_price() {
        let mut request = request();
        GasPrice::Eip1559 { base_fee_per_gas: 10, max_priority_fee_per_gas: 2 }
            .apply_to(&mut request);

        assert_eq!(request.gas_price, None);
        assert_eq!(request.max_fee_per_gas, Some(22));
        assert_eq!(request.max_priority_fee_per_gas, Some(2));
    }

    #[test]
    fn test_serialize_eip1559_gas_price() {
        let gas_price = GasPrice::Eip1559 {
            base_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 2_000_000_000,
        };

        let json = serde_json::to_string(&gas_price).unwrap();
        assert_eq!(
            json,
            r#"{"type":"eip1559","base_fee_per_gas":30000000000,"max_priority_fee_per_gas":2000000000}"#
        );
    }
}
