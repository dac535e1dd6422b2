//! High level entry point of the client.
//!
//! [`Rmm`] wraps a [`Connection`] and exposes two flavours of every action: `send_*`
//! methods returning the [`SentTransaction`] for callers that track receipts themselves,
//! and plain methods that wait for the transaction and return its decoded details.

use std::sync::Arc;

use alloy::primitives::Address;
use rmm_common::{
    action::{
        EngineCreationDetails, EngineCreationParams, PositionAdjustmentDetails,
        PositionAllocateParams, PositionBatchTransferParams, PositionRemoveParams,
        PositionTransferParams,
    },
    models::{
        blockchain::TransactionOverrides, pool::Pool, position::Position, Amount, PoolId,
    },
    receipt::MinedReceipt,
    traits::{AccountCredential, NetworkConnection},
    RmmError,
};
use tracing::{debug, info, instrument};

use crate::{
    connection::{self, Connection, DeploymentRegistry},
    contracts::{FactoryContract, ManagerContract},
    transaction::{SentTransaction, TransactionPopulator},
};

#[derive(Debug, Clone)]
pub struct Rmm {
    connection: Connection,
    populator: TransactionPopulator,
}

impl Rmm {
    pub fn new(connection: Connection) -> Self {
        let populator = TransactionPopulator::new(connection.clone());
        Self { connection, populator }
    }

    /// Connects to the deployment of the network `network` is attached to.
    pub async fn connect(
        registry: &DeploymentRegistry,
        network: Arc<dyn NetworkConnection>,
        credential: Arc<dyn AccountCredential>,
    ) -> Result<Self, RmmError> {
        let connection = connection::connect(registry, network, credential).await?;
        Ok(Self::new(connection))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn populator(&self) -> &TransactionPopulator {
        &self.populator
    }

    pub async fn send_allocate(
        &self,
        params: PositionAllocateParams,
        overrides: TransactionOverrides,
    ) -> Result<SentTransaction<PositionAdjustmentDetails>, RmmError> {
        self.populator
            .populate_allocate(params, overrides)
            .await?
            .send()
            .await
    }

    pub async fn send_remove(
        &self,
        params: PositionRemoveParams,
        overrides: TransactionOverrides,
    ) -> Result<SentTransaction<PositionAdjustmentDetails>, RmmError> {
        self.populator
            .populate_remove(params, overrides)
            .await?
            .send()
            .await
    }

    pub async fn send_safe_transfer(
        &self,
        params: PositionTransferParams,
        overrides: TransactionOverrides,
    ) -> Result<SentTransaction<()>, RmmError> {
        self.populator
            .populate_safe_transfer(params, overrides)
            .await?
            .send()
            .await
    }

    pub async fn send_safe_batch_transfer(
        &self,
        params: PositionBatchTransferParams,
        overrides: TransactionOverrides,
    ) -> Result<SentTransaction<()>, RmmError> {
        self.populator
            .populate_safe_batch_transfer(params, overrides)
            .await?
            .send()
            .await
    }

    pub async fn send_create_engine(
        &self,
        params: EngineCreationParams,
        overrides: TransactionOverrides,
    ) -> Result<SentTransaction<EngineCreationDetails>, RmmError> {
        self.populator
            .populate_create_engine(params, overrides)
            .await?
            .send()
            .await
    }

    /// Adds liquidity and waits for it to be mined.
    pub async fn allocate(
        &self,
        params: PositionAllocateParams,
        overrides: TransactionOverrides,
    ) -> Result<PositionAdjustmentDetails, RmmError> {
        wait_for_success(self.send_allocate(params, overrides).await?).await
    }

    /// Creates a pool with its first liquidity.
    ///
    /// Only accepts allocations flagged with `create_pool`.
    pub async fn create_pool(
        &self,
        params: PositionAllocateParams,
        overrides: TransactionOverrides,
    ) -> Result<PositionAdjustmentDetails, RmmError> {
        if !params.options.create_pool {
            return Err(RmmError::Validation(
                "Pool creation requires the create_pool option".to_string(),
            ));
        }
        self.allocate(params, overrides)
            .await
    }

    pub async fn remove(
        &self,
        params: PositionRemoveParams,
        overrides: TransactionOverrides,
    ) -> Result<PositionAdjustmentDetails, RmmError> {
        wait_for_success(self.send_remove(params, overrides).await?).await
    }

    pub async fn safe_transfer(
        &self,
        params: PositionTransferParams,
        overrides: TransactionOverrides,
    ) -> Result<(), RmmError> {
        wait_for_success(
            self.send_safe_transfer(params, overrides)
                .await?,
        )
        .await
    }

    pub async fn safe_batch_transfer(
        &self,
        params: PositionBatchTransferParams,
        overrides: TransactionOverrides,
    ) -> Result<(), RmmError> {
        wait_for_success(
            self.send_safe_batch_transfer(params, overrides)
                .await?,
        )
        .await
    }

    /// Deploys the engine of a token pair, or returns the already deployed one.
    ///
    /// A reused engine is reported with no transaction hash.
    #[instrument(level = "debug", skip(self, overrides))]
    pub async fn create_engine(
        &self,
        params: EngineCreationParams,
        overrides: TransactionOverrides,
    ) -> Result<EngineCreationDetails, RmmError> {
        params.validate()?;
        if let Some(engine) = self
            .get_engine(params.risky, params.stable)
            .await?
        {
            debug!(%engine, "Engine already deployed");
            return Ok(EngineCreationDetails { params, engine, transaction_hash: None });
        }
        let details = wait_for_success(
            self.send_create_engine(params, overrides)
                .await?,
        )
        .await?;
        info!(engine = %details.engine, risky = %params.risky, stable = %params.stable, "Deployed engine");
        Ok(details)
    }

    /// Engine deployed for the pair, if any.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_engine(
        &self,
        risky: Address,
        stable: Address,
    ) -> Result<Option<Address>, RmmError> {
        let call = self
            .connection
            .contracts()
            .factory
            .encode_get_engine(risky, stable);
        let data = self
            .connection
            .network()
            .call(&call)
            .await?;
        let engine = FactoryContract::decode_get_engine(&data)?;
        Ok((!engine.is_zero()).then_some(engine))
    }

    /// Liquidity tokens of `pool_id` held by `owner`.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_liquidity_balance(
        &self,
        pool_id: PoolId,
        owner: Address,
    ) -> Result<Amount, RmmError> {
        let call = self
            .connection
            .contracts()
            .manager
            .encode_balance_of(owner, pool_id);
        let data = self
            .connection
            .network()
            .call(&call)
            .await?;
        Ok(Amount::liquidity(ManagerContract::decode_balance_of(&data)?))
    }

    pub async fn get_position(&self, pool: &Pool, owner: Address) -> Result<Position, RmmError> {
        let liquidity = self
            .get_liquidity_balance(pool.pool_id, owner)
            .await?;
        Ok(Position::new(pool.clone(), liquidity))
    }

    /// Reads a pool from the metadata of its liquidity token.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_pool(&self, pool_id: PoolId, engine: Address) -> Result<Pool, RmmError> {
        let call = self
            .connection
            .contracts()
            .manager
            .encode_uri(pool_id);
        let data = self
            .connection
            .network()
            .call(&call)
            .await?;
        let pool = Pool::from_token_uri(&ManagerContract::decode_uri(&data)?, engine)?;
        if pool.pool_id != pool_id {
            return Err(RmmError::Decoding(format!(
                "Token uri of pool {pool_id} describes pool {}",
                pool.pool_id
            )));
        }
        Ok(pool)
    }
}

async fn wait_for_success<T>(sent: SentTransaction<T>) -> Result<T, RmmError> {
    match sent.wait_for_receipt().await? {
        MinedReceipt::Succeeded { details, .. } => Ok(details),
        MinedReceipt::Failed { raw_receipt } => {
            Err(RmmError::TransactionFailed(Box::new(raw_receipt)))
        }
    }
}
