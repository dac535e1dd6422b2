//! ABI bindings of the Primitive RMM contracts and the handles binding them to deployed
//! addresses.

use alloy::{
    core::sol,
    primitives::{Address, U256},
    sol_types::{SolCall, SolEvent},
};
use rmm_common::{
    action::{
        EngineCreationParams, PositionAllocateParams, PositionBatchTransferParams,
        PositionRemoveParams, PositionTransferParams,
    },
    models::{
        blockchain::{RawCall, RawReceipt},
        pool::Pool,
        PoolId,
    },
    RmmError,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

// Subset of the PrimitiveFactory and PrimitiveManager interfaces used by the client.
// https://github.com/primitivefinance/rmm-core and https://github.com/primitivefinance/rmm-manager
sol! {
    interface IPrimitiveFactory {
        event DeployEngine(address indexed from, address indexed risky, address indexed stable, address engine);

        function deploy(address risky, address stable) external returns (address engine);
        function getEngine(address risky, address stable) external view returns (address engine);
    }

    interface IPrimitiveManager {
        event Create(
            address indexed payer,
            address indexed engine,
            bytes32 indexed poolId,
            uint128 strike,
            uint32 sigma,
            uint32 maturity,
            uint32 gamma,
            uint256 delLiquidity
        );
        event Allocate(
            address indexed payer,
            address indexed engine,
            bytes32 indexed poolId,
            uint256 delLiquidity,
            uint256 delRisky,
            uint256 delStable,
            bool fromMargin
        );
        event Remove(
            address indexed payer,
            address indexed engine,
            bytes32 indexed poolId,
            uint256 delLiquidity,
            uint256 delRisky,
            uint256 delStable
        );

        function create(
            address risky,
            address stable,
            uint128 strike,
            uint32 sigma,
            uint32 maturity,
            uint32 gamma,
            uint256 riskyPerLp,
            uint256 delLiquidity
        ) external payable returns (bytes32 poolId, uint256 delRisky, uint256 delStable);
        function allocate(
            address recipient,
            bytes32 poolId,
            address risky,
            address stable,
            uint256 delRisky,
            uint256 delStable,
            bool fromMargin,
            uint256 minLiquidityOut
        ) external payable returns (uint256 delLiquidity);
        function remove(
            address engine,
            bytes32 poolId,
            uint256 delLiquidity,
            uint256 minRiskyOut,
            uint256 minStableOut
        ) external returns (uint256 delRisky, uint256 delStable);
        function safeTransferFrom(address from, address to, uint256 id, uint256 amount, bytes data) external;
        function safeBatchTransferFrom(address from, address to, uint256[] ids, uint256[] amounts, bytes data) external;
        function balanceOf(address account, uint256 id) external view returns (uint256);
        function uri(uint256 id) external view returns (string);
    }
}

pub use IPrimitiveFactory::DeployEngine;
pub use IPrimitiveManager::{Allocate, Create, Remove};

/// Addresses of one RMM deployment, keyed the way deployment files name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub primitive_factory: Address,
    pub primitive_manager: Address,
    pub position_renderer: Address,
    pub position_descriptor: Address,
}

impl ContractAddresses {
    /// Contract names as they appear in deployment files, with their addresses.
    pub fn named(&self) -> [(&'static str, Address); 4] {
        [
            ("primitiveFactory", self.primitive_factory),
            ("primitiveManager", self.primitive_manager),
            ("positionRenderer", self.position_renderer),
            ("positionDescriptor", self.position_descriptor),
        ]
    }
}

/// A deployed contract the client only needs to know the address of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHandle {
    pub name: &'static str,
    pub address: Address,
}

fn decoding_error(what: &str, err: alloy::sol_types::Error) -> RmmError {
    RmmError::Decoding(format!("Failed to decode {what} result: {err}"))
}

/// The engine factory bound to its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryContract {
    address: Address,
}

impl FactoryContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn encode_deploy(&self, params: &EngineCreationParams) -> RawCall {
        let call = IPrimitiveFactory::deployCall { risky: params.risky, stable: params.stable };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn encode_get_engine(&self, risky: Address, stable: Address) -> RawCall {
        let call = IPrimitiveFactory::getEngineCall { risky, stable };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn decode_get_engine(data: &[u8]) -> Result<Address, RmmError> {
        IPrimitiveFactory::getEngineCall::abi_decode_returns(data)
            .map_err(|e| decoding_error("getEngine", e))
    }
}

/// The position manager bound to its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerContract {
    address: Address,
}

impl ManagerContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Creates the pool described by `params.pool` and mints its first liquidity.
    pub fn encode_create(&self, params: &PositionAllocateParams) -> RawCall {
        let pool = &params.pool;
        let call = IPrimitiveManager::createCall {
            risky: pool.risky.address,
            stable: pool.stable.address,
            strike: pool.calibration.strike,
            sigma: pool.calibration.sigma,
            maturity: pool.calibration.maturity,
            gamma: pool.calibration.gamma,
            riskyPerLp: params.risky_per_liquidity(),
            delLiquidity: params.options.del_liquidity.raw,
        };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn encode_allocate(&self, params: &PositionAllocateParams) -> RawCall {
        let pool = &params.pool;
        let options = &params.options;
        let call = IPrimitiveManager::allocateCall {
            recipient: options.recipient,
            poolId: pool.pool_id,
            risky: pool.risky.address,
            stable: pool.stable.address,
            delRisky: options.del_risky.raw,
            delStable: options.del_stable.raw,
            fromMargin: options.from_margin,
            minLiquidityOut: params.min_liquidity_out().raw,
        };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn encode_remove(&self, params: &PositionRemoveParams) -> RawCall {
        let call = IPrimitiveManager::removeCall {
            engine: params.pool.engine,
            poolId: params.pool.pool_id,
            delLiquidity: params.options.del_liquidity.raw,
            minRiskyOut: params.min_risky_out().raw,
            minStableOut: params.min_stable_out().raw,
        };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn encode_safe_transfer(&self, params: &PositionTransferParams) -> RawCall {
        let call = IPrimitiveManager::safeTransferFromCall {
            from: params.sender,
            to: params.recipient,
            id: Pool::token_id_of(params.pool_id),
            amount: params.amount.raw,
            data: params.data.clone(),
        };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn encode_safe_batch_transfer(&self, params: &PositionBatchTransferParams) -> RawCall {
        let call = IPrimitiveManager::safeBatchTransferFromCall {
            from: params.sender,
            to: params.recipient,
            ids: params
                .pool_ids
                .iter()
                .copied()
                .map(Pool::token_id_of)
                .collect(),
            amounts: params
                .amounts
                .iter()
                .map(|amount| amount.raw)
                .collect(),
            data: params.data.clone(),
        };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn encode_balance_of(&self, owner: Address, pool_id: PoolId) -> RawCall {
        let call =
            IPrimitiveManager::balanceOfCall { account: owner, id: Pool::token_id_of(pool_id) };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn decode_balance_of(data: &[u8]) -> Result<U256, RmmError> {
        IPrimitiveManager::balanceOfCall::abi_decode_returns(data)
            .map_err(|e| decoding_error("balanceOf", e))
    }

    pub fn encode_uri(&self, pool_id: PoolId) -> RawCall {
        let call = IPrimitiveManager::uriCall { id: Pool::token_id_of(pool_id) };
        RawCall::new(self.address, call.abi_encode())
    }

    pub fn decode_uri(data: &[u8]) -> Result<String, RmmError> {
        IPrimitiveManager::uriCall::abi_decode_returns(data).map_err(|e| decoding_error("uri", e))
    }
}

/// Every contract of a deployment, bound to its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmmContracts {
    pub factory: FactoryContract,
    pub manager: ManagerContract,
    pub position_renderer: ContractHandle,
    pub position_descriptor: ContractHandle,
}

impl From<&ContractAddresses> for RmmContracts {
    fn from(addresses: &ContractAddresses) -> Self {
        Self {
            factory: FactoryContract::new(addresses.primitive_factory),
            manager: ManagerContract::new(addresses.primitive_manager),
            position_renderer: ContractHandle {
                name: "positionRenderer",
                address: addresses.position_renderer,
            },
            position_descriptor: ContractHandle {
                name: "positionDescriptor",
                address: addresses.position_descriptor,
            },
        }
    }
}

/// Decodes every `E` event emitted by `emitter` in the receipt, in log order.
///
/// Logs from other addresses are ignored even if their signature matches. Matching logs
/// that fail to decode are skipped with a warning.
pub fn decode_events<E: SolEvent>(receipt: &RawReceipt, emitter: Address) -> Vec<E> {
    receipt
        .logs_from(emitter)
        .filter(|log| log.topics.first() == Some(&E::SIGNATURE_HASH))
        .filter_map(|log| {
            E::decode_raw_log(log.topics.iter().copied(), &log.data)
                .map_err(|err| {
                    warn!(
                        event = E::SIGNATURE,
                        tx = %receipt.transaction_hash,
                        %err,
                        "Skipping undecodable event"
                    )
                })
                .ok()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use alloy::primitives::{Bytes, B256};
    use rmm_common::models::blockchain::RawLog;

    use super::*;

    pub(crate) fn raw_log<E: SolEvent>(emitter: Address, event: &E) -> RawLog {
        let data = event.encode_log_data();
        RawLog { address: emitter, topics: data.topics().to_vec(), data: data.data }
    }

    pub(crate) fn receipt_with(logs: Vec<RawLog>, status: bool) -> RawReceipt {
        RawReceipt {
            transaction_hash: B256::repeat_byte(0x0f),
            block_hash: Some(B256::repeat_byte(0x0b)),
            block_number: Some(100),
            gas_used: 150_000,
            status,
            contract_address: None,
            logs,
        }
    }

    #[test]
    fn test_encode_deploy() {
        let factory = FactoryContract::new(Address::repeat_byte(0xfa));
        let params =
            EngineCreationParams { risky: Address::repeat_byte(1), stable: Address::repeat_byte(2) };

        let call = factory.encode_deploy(&params);

        assert_eq!(call.to, factory.address());
        assert_eq!(&call.data[..4], IPrimitiveFactory::deployCall::SELECTOR.as_slice());
        assert_eq!(call.data.len(), 4 + 32 * 2);
    }

    #[test]
    fn test_decode_get_engine() {
        let engine = Address::repeat_byte(0xe0);
        let encoded = IPrimitiveFactory::getEngineCall::abi_encode_returns(&engine);

        assert_eq!(FactoryContract::decode_get_engine(&encoded).unwrap(), engine);
        assert!(matches!(FactoryContract::decode_get_engine(&[0u8; 3]), Err(RmmError::Decoding(_))));
    }

    #[test]
    fn test_manager_reads_use_liquidity_token_id() {
        let manager = ManagerContract::new(Address::repeat_byte(0x3a));
        let pool_id = B256::with_last_byte(0x2a);

        let balance_call = IPrimitiveManager::balanceOfCall::abi_decode(
            &manager
                .encode_balance_of(Address::repeat_byte(1), pool_id)
                .data,
        )
        .unwrap();
        let uri_call =
            IPrimitiveManager::uriCall::abi_decode(&manager.encode_uri(pool_id).data).unwrap();

        assert_eq!(balance_call.id, U256::from(0x2a));
        assert_eq!(uri_call.id, U256::from(0x2a));
    }

    #[test]
    fn test_decode_events_filters_emitter_and_signature() {
        let manager = Address::repeat_byte(0x3a);
        let event = Remove {
            payer: Address::repeat_byte(1),
            engine: Address::repeat_byte(2),
            poolId: B256::repeat_byte(3),
            delLiquidity: U256::from(10u64),
            delRisky: U256::from(4u64),
            delStable: U256::from(5u64),
        };
        let receipt = receipt_with(
            vec![
                raw_log(Address::repeat_byte(0x99), &event),
                RawLog {
                    address: manager,
                    topics: vec![B256::repeat_byte(0x77)],
                    data: Bytes::new(),
                },
                raw_log(manager, &event),
            ],
            true,
        );

        let decoded: Vec<Remove> = decode_events(&receipt, manager);

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].delLiquidity, U256::from(10u64));
        assert_eq!(decoded[0].poolId, B256::repeat_byte(3));
    }

    #[test]
    fn test_truncated_event_is_skipped() {
        let manager = Address::repeat_byte(0x3a);
        let receipt = receipt_with(
            vec![RawLog {
                address: manager,
                topics: vec![Allocate::SIGNATURE_HASH],
                data: Bytes::from(vec![0u8; 5]),
            }],
            true,
        );

        assert!(decode_events::<Allocate>(&receipt, manager).is_empty());
    }
}
