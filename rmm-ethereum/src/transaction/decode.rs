//! Receipt decoders of the RMM actions.
//!
//! Decoding never fails: a receipt without the expected event yields an empty position or
//! a zero engine address, and the gap is logged.

use alloy::primitives::Address;
use rmm_common::{
    action::{
        AdjustmentParams, EngineCreationDetails, EngineCreationParams, PositionAdjustmentDetails,
        PositionAllocateParams, PositionRemoveParams,
    },
    models::{blockchain::RawReceipt, position::Position, Amount},
};
use tracing::{debug, warn};

use crate::contracts::{decode_events, Allocate, Create, DeployEngine, Remove};

pub(crate) fn decode_allocate(
    receipt: &RawReceipt,
    manager: Address,
    params: &PositionAllocateParams,
) -> PositionAdjustmentDetails {
    let (new_position, created_pool) = if let Some(created) =
        decode_events::<Create>(receipt, manager)
            .into_iter()
            .next()
    {
        debug!(pool = %created.poolId, engine = %created.engine, "Pool created");
        let pool = params
            .pool
            .with_id(created.poolId, created.engine);
        (Position::new(pool, Amount::liquidity(created.delLiquidity)), Some(true))
    } else if let Some(allocated) = decode_events::<Allocate>(receipt, manager)
        .into_iter()
        .find(|event| event.poolId == params.pool.pool_id)
    {
        (
            Position::new(params.pool.clone(), Amount::liquidity(allocated.delLiquidity)),
            Some(false),
        )
    } else {
        warn!(
            tx = %receipt.transaction_hash,
            pool = %params.pool.pool_id,
            "No Create or Allocate event in receipt"
        );
        (Position::empty(params.pool.clone()), None)
    };

    PositionAdjustmentDetails {
        params: AdjustmentParams::Allocate(params.clone()),
        new_position,
        created_pool,
        transaction_hash: receipt.transaction_hash,
    }
}

pub(crate) fn decode_remove(
    receipt: &RawReceipt,
    manager: Address,
    params: &PositionRemoveParams,
) -> PositionAdjustmentDetails {
    let removed = decode_events::<Remove>(receipt, manager)
        .into_iter()
        .find(|event| event.poolId == params.pool.pool_id);
    let (new_position, created_pool) = match removed {
        Some(removed) => (
            Position::new(params.pool.clone(), Amount::liquidity(removed.delLiquidity)),
            Some(false),
        ),
        None => {
            warn!(
                tx = %receipt.transaction_hash,
                pool = %params.pool.pool_id,
                "No Remove event in receipt"
            );
            (Position::empty(params.pool.clone()), None)
        }
    };

    PositionAdjustmentDetails {
        params: AdjustmentParams::Remove(params.clone()),
        new_position,
        created_pool,
        transaction_hash: receipt.transaction_hash,
    }
}

pub(crate) fn decode_create_engine(
    receipt: &RawReceipt,
    factory: Address,
    params: &EngineCreationParams,
) -> EngineCreationDetails {
    let engine = decode_events::<DeployEngine>(receipt, factory)
        .into_iter()
        .find(|event| event.risky == params.risky && event.stable == params.stable)
        .map(|event| event.engine)
        .unwrap_or_else(|| {
            warn!(tx = %receipt.transaction_hash, "No DeployEngine event in receipt");
            Address::ZERO
        });

    EngineCreationDetails {
        params: *params,
        engine,
        transaction_hash: Some(receipt.transaction_hash),
    }
}
