use alloy::primitives::Address;
use async_trait::async_trait;
use rmm_common::{
    models::{
        blockchain::{TransactionHandle, TransactionRequest},
        error::NetworkError,
    },
    traits::AccountCredential,
};
use tracing::{debug, instrument};

use super::{errors::RPCError, EthereumRpcClient};

/// An account unlocked on the node itself, signing through `eth_sendTransaction`.
///
/// Suited for development chains. Nonces are whatever the caller populated, or the
/// node's own sequencing when left empty.
#[derive(Clone, Debug)]
pub struct NodeAccount {
    client: EthereumRpcClient,
    address: Address,
}

impl NodeAccount {
    pub fn new(client: EthereumRpcClient, address: Address) -> Self {
        Self { client, address }
    }

    /// Uses the first account the node manages.
    pub async fn first_available(client: EthereumRpcClient) -> Result<Self, RPCError> {
        let address = client
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RPCError::other("Node does not manage any account"))?;
        Ok(Self::new(client, address))
    }
}

#[async_trait]
impl AccountCredential for NodeAccount {
    fn address(&self) -> Address {
        self.address
    }

    #[instrument(level = "debug", skip_all, fields(from = %self.address, to = %request.to))]
    async fn send_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionHandle, NetworkError> {
        let request = TransactionRequest { from: Some(self.address), ..request.clone() };
        let hash = self
            .client
            .send_transaction(&request)
            .await?;
        debug!(%hash, nonce = ?request.nonce, "Transaction broadcast");
        Ok(TransactionHandle { hash, from: self.address, nonce: request.nonce })
    }
}
