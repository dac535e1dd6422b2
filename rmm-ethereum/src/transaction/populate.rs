use std::sync::Arc;

use rmm_common::{
    action::{
        EngineCreationDetails, EngineCreationParams, PositionAdjustmentDetails,
        PositionAllocateParams, PositionBatchTransferParams, PositionRemoveParams,
        PositionTransferParams,
    },
    models::blockchain::{RawCall, RawReceipt, TransactionOverrides},
    RmmError,
};
use tracing::{debug, instrument};

use super::{decode, DecodeFn, PopulatedTransaction};
use crate::connection::Connection;

/// Gas ceiling for an estimate: `ceil(estimate * 1.5)`.
pub fn apply_gas_margin(estimate: u64) -> u64 {
    let ceiling = (u128::from(estimate) * 3 + 1) / 2;
    u64::try_from(ceiling).unwrap_or(u64::MAX)
}

/// Turns validated action parameters into transactions ready to be sent.
#[derive(Debug, Clone)]
pub struct TransactionPopulator {
    connection: Connection,
}

impl TransactionPopulator {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Adds liquidity to a pool, creating it first if `create_pool` is set.
    #[instrument(level = "debug", skip_all, fields(pool = %params.pool.pool_id))]
    pub async fn populate_allocate(
        &self,
        params: PositionAllocateParams,
        overrides: TransactionOverrides,
    ) -> Result<PopulatedTransaction<PositionAdjustmentDetails>, RmmError> {
        params.validate()?;
        let manager = self.connection.contracts().manager;
        let call = if params.options.create_pool {
            manager.encode_create(&params)
        } else {
            manager.encode_allocate(&params)
        };
        let emitter = manager.address();
        let decode: DecodeFn<PositionAdjustmentDetails> = Arc::new(move |receipt: &RawReceipt| {
            decode::decode_allocate(receipt, emitter, &params)
        });
        self.populate_call(call, overrides, decode)
            .await
    }

    #[instrument(level = "debug", skip_all, fields(pool = %params.pool.pool_id))]
    pub async fn populate_remove(
        &self,
        params: PositionRemoveParams,
        overrides: TransactionOverrides,
    ) -> Result<PopulatedTransaction<PositionAdjustmentDetails>, RmmError> {
        params.validate()?;
        let manager = self.connection.contracts().manager;
        let call = manager.encode_remove(&params);
        let emitter = manager.address();
        let decode: DecodeFn<PositionAdjustmentDetails> = Arc::new(move |receipt: &RawReceipt| {
            decode::decode_remove(receipt, emitter, &params)
        });
        self.populate_call(call, overrides, decode)
            .await
    }

    #[instrument(level = "debug", skip_all, fields(pool = %params.pool_id))]
    pub async fn populate_safe_transfer(
        &self,
        params: PositionTransferParams,
        overrides: TransactionOverrides,
    ) -> Result<PopulatedTransaction<()>, RmmError> {
        params.validate()?;
        let call = self
            .connection
            .contracts()
            .manager
            .encode_safe_transfer(&params);
        let decode: DecodeFn<()> = Arc::new(|_: &RawReceipt| ());
        self.populate_call(call, overrides, decode)
            .await
    }

    #[instrument(level = "debug", skip_all, fields(pools = params.pool_ids.len()))]
    pub async fn populate_safe_batch_transfer(
        &self,
        params: PositionBatchTransferParams,
        overrides: TransactionOverrides,
    ) -> Result<PopulatedTransaction<()>, RmmError> {
        params.validate()?;
        let call = self
            .connection
            .contracts()
            .manager
            .encode_safe_batch_transfer(&params);
        let decode: DecodeFn<()> = Arc::new(|_: &RawReceipt| ());
        self.populate_call(call, overrides, decode)
            .await
    }

    #[instrument(level = "debug", skip_all, fields(risky = %params.risky, stable = %params.stable))]
    pub async fn populate_create_engine(
        &self,
        params: EngineCreationParams,
        overrides: TransactionOverrides,
    ) -> Result<PopulatedTransaction<EngineCreationDetails>, RmmError> {
        params.validate()?;
        let factory = self.connection.contracts().factory;
        let call = factory.encode_deploy(&params);
        let emitter = factory.address();
        let decode: DecodeFn<EngineCreationDetails> = Arc::new(move |receipt: &RawReceipt| {
            decode::decode_create_engine(receipt, emitter, &params)
        });
        self.populate_call(call, overrides, decode)
            .await
    }

    async fn populate_call<T>(
        &self,
        call: RawCall,
        mut overrides: TransactionOverrides,
        decode: DecodeFn<T>,
    ) -> Result<PopulatedTransaction<T>, RmmError> {
        let from = overrides
            .from
            .unwrap_or_else(|| self.connection.signer_address());
        let call = call.with_from(from);
        let network = self.connection.network();

        if overrides.gas_limit.is_none() {
            let estimate = network
                .estimate_gas(&call)
                .await
                .map_err(RmmError::GasEstimation)?;
            let gas_limit = apply_gas_margin(estimate);
            debug!(estimate, gas_limit, "Estimated gas");
            overrides.gas_limit = Some(gas_limit);
        }

        let raw_request = network
            .populate_transaction(&call, &overrides)
            .await?;
        Ok(PopulatedTransaction::new(raw_request, self.connection.clone(), decode))
    }
}
