//! Parameter and result shapes of the supported RMM actions.
//!
//! Every parameter type validates itself synchronously so that malformed requests are
//! rejected before any network call is made.

pub mod details;
pub mod params;

pub use details::{AdjustmentParams, EngineCreationDetails, PositionAdjustmentDetails};
pub use params::{
    AllocateOptions, EngineCreationParams, PositionAllocateParams, PositionBatchTransferParams,
    PositionRemoveParams, PositionTransferParams, RemoveOptions,
};
