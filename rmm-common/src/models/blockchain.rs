use alloy_primitives::{Address, Bytes, B256, U256};

use super::TxHash;

/// A contract call before any transaction fields have been filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCall {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl RawCall {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self { from: None, to, data: data.into(), value: U256::ZERO }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

/// Caller supplied transaction fields. Anything set here takes precedence over values
/// the library would otherwise estimate or fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOverrides {
    pub from: Option<Address>,
    pub gas_limit: Option<u64>,
    pub nonce: Option<u64>,
    pub value: Option<U256>,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl TransactionOverrides {
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Whether the caller already decided on a fee model.
    pub fn has_fee_fields(&self) -> bool {
        self.gas_price.is_some() ||
            self.max_fee_per_gas.is_some() ||
            self.max_priority_fee_per_gas.is_some()
    }
}

/// A transaction ready to be broadcast by an account credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: Option<u64>,
    pub nonce: Option<u64>,
    pub chain_id: Option<u64>,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl TransactionRequest {
    /// Merges a call with the caller's overrides. Fields neither side knows stay unset.
    pub fn from_call(call: &RawCall, overrides: &TransactionOverrides) -> Self {
        Self {
            from: overrides.from.or(call.from),
            to: call.to,
            data: call.data.clone(),
            value: overrides.value.unwrap_or(call.value),
            gas_limit: overrides.gas_limit,
            nonce: overrides.nonce,
            chain_id: None,
            gas_price: overrides.gas_price,
            max_fee_per_gas: overrides.max_fee_per_gas,
            max_priority_fee_per_gas: overrides.max_priority_fee_per_gas,
        }
    }
}

/// Identifies one broadcast attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
    pub hash: TxHash,
    pub from: Address,
    pub nonce: Option<u64>,
}

/// An event record from a mined receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// A receipt as reported by the network, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReceipt {
    pub transaction_hash: TxHash,
    pub block_hash: Option<B256>,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// `false` if execution reverted.
    pub status: bool,
    pub contract_address: Option<Address>,
    pub logs: Vec<RawLog>,
}

impl RawReceipt {
    /// Logs emitted by `address`, in receipt order.
    pub fn logs_from(&self, address: Address) -> impl Iterator<Item = &RawLog> {
        self.logs
            .iter()
            .filter(move |log| log.address == address)
    }
}
