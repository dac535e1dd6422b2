use thiserror::Error;

use crate::models::{
    blockchain::RawReceipt,
    error::{FailureReason, NetworkError},
    TxHash,
};

#[derive(Error, Debug)]
pub enum RmmError {
    /// Bad action parameters, raised before any network call.
    #[error("Invalid parameters: {0}")]
    Validation(String),
    #[error("No deployment found for chain id {0}")]
    UnknownNetwork(u64),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// A deployment file that cannot be parsed or holds impossible values.
    #[error("Invalid deployment configuration: {0}")]
    InvalidDeployment(String),
    #[error("Gas estimation failed: {0}")]
    GasEstimation(#[source] NetworkError),
    /// The wait primitive returned without the transaction being mined.
    #[error("Transaction {0} still pending after waiting for it")]
    StillPending(TxHash),
    /// The network dropped the transaction without a receipt.
    #[error("Transaction {hash} was {reason}")]
    TransactionUnclassified { hash: TxHash, reason: FailureReason },
    /// Raised by the convenience methods that only return the decoded details.
    #[error("Transaction {} reverted", .0.transaction_hash)]
    TransactionFailed(Box<RawReceipt>),
    #[error("Decoding error: {0}")]
    Decoding(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
}
