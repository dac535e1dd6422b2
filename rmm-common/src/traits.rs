use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::models::{
    blockchain::{RawCall, RawReceipt, TransactionHandle, TransactionOverrides, TransactionRequest},
    error::NetworkError,
};

/// RPC capability used to estimate, populate and track transactions.
///
/// Implementations are shared by every in-flight transaction of a connection and must not
/// rely on per-transaction mutable state.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait NetworkConnection: Send + Sync {
    /// Chain id of the connected network.
    async fn chain_id(&self) -> Result<u64, NetworkError>;

    /// Gas the call would consume if executed now.
    async fn estimate_gas(&self, call: &RawCall) -> Result<u64, NetworkError>;

    /// Fills nonce, chain id and fee fields for the call. Values present in `overrides`
    /// must be kept as they are.
    async fn populate_transaction(
        &self,
        call: &RawCall,
        overrides: &TransactionOverrides,
    ) -> Result<TransactionRequest, NetworkError>;

    /// Executes a read-only call against the latest block.
    async fn call(&self, call: &RawCall) -> Result<Bytes, NetworkError>;

    /// Looks up the receipt of a sent transaction.
    ///
    /// With `confirmations == 0` this is a single check returning `None` when the
    /// transaction is not mined yet. Otherwise it waits until the transaction has that
    /// many confirmations, returning `None` only if the implementation gave up waiting.
    ///
    /// A reverted transaction may be reported either as a receipt with `status == false`
    /// or as [`NetworkError::TransactionFailed`] carrying the receipt.
    async fn wait(
        &self,
        handle: &TransactionHandle,
        confirmations: u64,
    ) -> Result<Option<RawReceipt>, NetworkError>;

    /// Deployed bytecode at `address`, empty for accounts without code.
    async fn get_code(&self, address: Address) -> Result<Bytes, NetworkError>;
}

/// Capability to sign and broadcast transactions on behalf of an address.
///
/// Signing and nonce sequencing are entirely the credential's business.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait AccountCredential: Send + Sync {
    fn address(&self) -> Address;

    async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionHandle, NetworkError>;
}
