use strum_macros::Display;
use thiserror::Error;

use super::{blockchain::RawReceipt, TxHash};

/// Why the network reported a transaction as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FailureReason {
    /// Mined, but execution reverted.
    Reverted,
    /// Another transaction with the same nonce was mined instead.
    Replaced,
}

/// Errors produced at the network-connection boundary.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// The network gave up on a transaction. Reverts carry the mined receipt,
    /// replacements do not.
    #[error("Transaction {hash} failed: {reason}")]
    TransactionFailed { hash: TxHash, reason: FailureReason, receipt: Option<Box<RawReceipt>> },
    #[error("Network setup error: {0}")]
    Setup(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}
