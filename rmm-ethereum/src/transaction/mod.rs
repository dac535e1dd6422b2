//! Lifecycle of a single RMM transaction: populated, sent, then classified from its
//! receipt.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use rmm_common::{
    models::{
        blockchain::{RawReceipt, TransactionHandle, TransactionRequest},
        error::NetworkError,
        TxHash,
    },
    receipt::{MinedReceipt, Receipt},
    RmmError,
};
use tracing::{debug, instrument, warn};

use crate::connection::Connection;

pub mod decode;
pub mod populate;

pub use populate::{apply_gas_margin, TransactionPopulator};

/// Turns a successful receipt into the action's details.
pub type DecodeFn<T> = Arc<dyn Fn(&RawReceipt) -> T + Send + Sync>;

/// A transaction ready to be broadcast, together with the way to decode its receipt.
pub struct PopulatedTransaction<T> {
    raw_request: TransactionRequest,
    connection: Connection,
    decode: DecodeFn<T>,
}

impl<T> fmt::Debug for PopulatedTransaction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopulatedTransaction")
            .field("raw_request", &self.raw_request)
            .finish_non_exhaustive()
    }
}

impl<T> PopulatedTransaction<T> {
    pub fn new(raw_request: TransactionRequest, connection: Connection, decode: DecodeFn<T>) -> Self {
        Self { raw_request, connection, decode }
    }

    pub fn raw_request(&self) -> &TransactionRequest {
        &self.raw_request
    }

    pub fn gas_limit(&self) -> Option<u64> {
        self.raw_request.gas_limit
    }

    /// Broadcasts the transaction through the connection's account.
    ///
    /// Returns as soon as the network accepted it. Every call is a separate broadcast.
    #[instrument(level = "debug", skip_all, fields(to = %self.raw_request.to))]
    pub async fn send(&self) -> Result<SentTransaction<T>, RmmError> {
        let handle = self
            .connection
            .credential()
            .send_transaction(&self.raw_request)
            .await?;
        debug!(hash = %handle.hash, nonce = ?handle.nonce, "Transaction sent");
        Ok(SentTransaction::new(handle, self.connection.clone(), self.decode.clone()))
    }
}

#[derive(Debug, Clone)]
struct Settled {
    raw_receipt: RawReceipt,
    succeeded: bool,
}

/// A broadcast transaction.
///
/// The first terminal outcome observed is kept, later checks never reclassify it.
pub struct SentTransaction<T> {
    handle: TransactionHandle,
    connection: Connection,
    decode: DecodeFn<T>,
    settled: OnceLock<Settled>,
}

impl<T> fmt::Debug for SentTransaction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentTransaction")
            .field("handle", &self.handle)
            .field("settled", &self.settled.get().is_some())
            .finish_non_exhaustive()
    }
}

impl<T> SentTransaction<T> {
    pub fn new(handle: TransactionHandle, connection: Connection, decode: DecodeFn<T>) -> Self {
        Self { handle, connection, decode, settled: OnceLock::new() }
    }

    pub fn hash(&self) -> TxHash {
        self.handle.hash
    }

    pub fn handle(&self) -> &TransactionHandle {
        &self.handle
    }

    /// Checks once whether the transaction is mined, without waiting.
    #[instrument(level = "debug", skip(self), fields(hash = %self.handle.hash))]
    pub async fn get_receipt(&self) -> Result<Receipt<T>, RmmError> {
        match self.observe(0).await? {
            Some(settled) => Ok(self.classify(settled).into()),
            None => Ok(Receipt::Pending),
        }
    }

    /// Waits for the transaction to be mined with one confirmation.
    ///
    /// Fails with [`RmmError::StillPending`] if the network gave up waiting.
    #[instrument(level = "debug", skip(self), fields(hash = %self.handle.hash))]
    pub async fn wait_for_receipt(&self) -> Result<MinedReceipt<T>, RmmError> {
        match self.observe(1).await? {
            Some(settled) => Ok(self.classify(settled)),
            None => Err(RmmError::StillPending(self.handle.hash)),
        }
    }

    async fn observe(&self, confirmations: u64) -> Result<Option<&Settled>, RmmError> {
        if let Some(settled) = self.settled.get() {
            return Ok(Some(settled));
        }
        let outcome = self
            .connection
            .network()
            .wait(&self.handle, confirmations)
            .await;
        let settled = match outcome {
            Ok(None) => return Ok(None),
            Ok(Some(raw_receipt)) => {
                let succeeded = raw_receipt.status;
                Settled { raw_receipt, succeeded }
            }
            Err(NetworkError::TransactionFailed { reason, receipt: Some(raw_receipt), .. }) => {
                debug!(%reason, "Network reported failure with receipt");
                Settled { raw_receipt: *raw_receipt, succeeded: false }
            }
            Err(NetworkError::TransactionFailed { hash, reason, receipt: None }) => {
                warn!(%hash, %reason, "Transaction dropped without receipt");
                return Err(RmmError::TransactionUnclassified { hash, reason });
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Some(self.settled.get_or_init(|| settled)))
    }

    fn classify(&self, settled: &Settled) -> MinedReceipt<T> {
        let raw_receipt = settled.raw_receipt.clone();
        if settled.succeeded {
            let details = (self.decode)(&raw_receipt);
            MinedReceipt::Succeeded { raw_receipt, details }
        } else {
            MinedReceipt::Failed { raw_receipt }
        }
    }
}
