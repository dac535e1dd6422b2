use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::params::{EngineCreationParams, PositionAllocateParams, PositionRemoveParams};
use crate::models::{position::Position, TxHash};

/// The parameters a position adjustment was requested with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentParams {
    Allocate(PositionAllocateParams),
    Remove(PositionRemoveParams),
}

/// Receipt details of a transaction adjusting a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAdjustmentDetails {
    pub params: AdjustmentParams,
    /// Liquidity moved by the transaction, in the pool it was moved in. Empty if the
    /// receipt did not contain the expected event.
    pub new_position: Position,
    /// `Some(true)` if the transaction created the pool, `None` if unknown.
    pub created_pool: Option<bool>,
    pub transaction_hash: TxHash,
}

/// Receipt details of an engine deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCreationDetails {
    pub params: EngineCreationParams,
    /// Zero if the receipt did not contain the deployment event.
    pub engine: Address,
    /// `None` when an already deployed engine was reused.
    pub transaction_hash: Option<TxHash>,
}
