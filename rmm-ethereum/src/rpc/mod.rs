use std::time::Duration;

use alloy::{
    primitives::{Address, Bytes, B256, U256, U64},
    rpc::{
        client::{ClientBuilder, ReqwestClient},
        types::{Block, Transaction, TransactionReceipt},
    },
    transports::http::reqwest,
};
use async_trait::async_trait;
use rmm_common::{
    models::{
        blockchain::{RawCall, RawReceipt, TransactionHandle, TransactionOverrides, TransactionRequest},
        error::{FailureReason, NetworkError},
    },
    traits::NetworkConnection,
};
use tokio::time::Instant;
use tracing::{debug, instrument, trace, warn};

pub mod account;
pub mod config;
pub mod errors;
mod retry;
pub(crate) mod types;

use crate::{
    gas::{GasPrice, DEFAULT_PRIORITY_FEE_PER_GAS},
    rpc::{
        config::{RPCRetryConfig, ReceiptPollingConfig},
        errors::{RPCError, RpcResultExt},
        retry::RetryPolicy,
        types::{call_request, raw_receipt, transaction_request},
    },
};

/// This struct wraps the ReqwestClient and provides the Ethereum RPC methods needed to
/// populate, broadcast and track transactions, with retry logic on the reads.
/// It is cheap to clone, as the `inner` internally uses an Arc for the ReqwestClient.
#[derive(Clone, Debug)]
pub struct EthereumRpcClient {
    inner: ReqwestClient,
    retry_policy: RetryPolicy,
    polling: ReceiptPollingConfig,
    url: String,
}

impl EthereumRpcClient {
    /// Creates a new EthereumRpcClient with the given RPC URL.
    ///
    /// Retry: enabled with defaults (max retries 3, initial backoff 100ms, max backoff 5000ms).
    /// Receipt polling: every 4s, giving up after 5 minutes.
    pub fn new(rpc_url: &str) -> Result<Self, RPCError> {
        let url = rpc_url
            .parse()
            .map_err(|e| RPCError::SetupError(format!("Invalid RPC URL: {e}")))?;

        let http_client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RPCError::SetupError(format!("Failed to create HTTP client: {e}")))?;

        let rpc = ClientBuilder::default().http_with_client(http_client, url);

        Ok(Self {
            inner: rpc,
            retry_policy: RetryPolicy::default(),
            polling: ReceiptPollingConfig::default(),
            url: rpc_url.to_string(),
        })
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    pub fn get_retry_config(&self) -> RPCRetryConfig {
        (&self.retry_policy).into()
    }

    pub fn get_polling_config(&self) -> &ReceiptPollingConfig {
        &self.polling
    }

    pub fn with_retry(mut self, retry_config: RPCRetryConfig) -> Self {
        self.retry_policy = retry_config.into();
        self
    }

    pub fn with_polling(mut self, polling: ReceiptPollingConfig) -> Self {
        self.polling = polling;
        self
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_chain_id(&self) -> Result<u64, RPCError> {
        let chain_id: U64 = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request_noparams("eth_chainId")
                    .await
            })
            .await
            .rpc_context("Failed to get chain id")?;

        Ok(chain_id.to::<u64>())
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_block_number(&self) -> Result<u64, RPCError> {
        let block_number: U64 = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request_noparams("eth_blockNumber")
                    .await
            })
            .await
            .rpc_context("Failed to get block number")?;

        Ok(block_number.to::<u64>())
    }

    /// Gets the gas price from the node using eth_gasPrice RPC method.
    ///
    /// Returns the gas price in wei as a u128.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_gas_price(&self) -> Result<u128, RPCError> {
        let gas_price: U256 = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request_noparams("eth_gasPrice")
                    .await
            })
            .await
            .rpc_context("Failed to get gas price")?;

        Ok(gas_price.saturating_to::<u128>())
    }

    #[instrument(level = "debug", skip(self))]
    pub(crate) async fn get_latest_block(&self) -> Result<Block, RPCError> {
        let full_tx_objects = false;

        let block: Option<Block> = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getBlockByNumber", ("latest", full_tx_objects))
                    .await
            })
            .await
            .rpc_context("Failed to get latest block")?;

        block.ok_or_else(|| RPCError::other("Failed to get latest block: Block not found"))
    }

    /// Current fee market of the network.
    ///
    /// Networks reporting a base fee get EIP-1559 pricing with a fixed priority fee,
    /// everything else falls back to the legacy gas price.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_fee_data(&self) -> Result<GasPrice, RPCError> {
        let block = self.get_latest_block().await?;
        match block.header.inner.base_fee_per_gas {
            Some(base_fee) => Ok(GasPrice::Eip1559 {
                base_fee_per_gas: u128::from(base_fee),
                max_priority_fee_per_gas: DEFAULT_PRIORITY_FEE_PER_GAS,
            }),
            None => Ok(GasPrice::Legacy { gas_price: self.get_gas_price().await? }),
        }
    }

    /// Number of transactions sent from `address`, counting the mempool if `block_tag`
    /// is `"pending"`.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction_count(
        &self,
        address: Address,
        block_tag: &'static str,
    ) -> Result<u64, RPCError> {
        let count: U64 = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getTransactionCount", (address, block_tag))
                    .await
            })
            .await
            .with_rpc_context(|| format!("Failed to get transaction count of {address}"))?;

        Ok(count.to::<u64>())
    }

    /// Not retried: estimation failures surface to the caller as they are.
    #[instrument(level = "debug", skip(self, call), fields(to = %call.to))]
    pub async fn eth_estimate_gas(&self, call: &RawCall) -> Result<u64, RPCError> {
        let gas: U64 = self
            .inner
            .request("eth_estimateGas", (call_request(call),))
            .await
            .with_rpc_context(|| format!("Failed to estimate gas for call to {}", call.to))?;

        Ok(gas.to::<u64>())
    }

    #[instrument(level = "debug", skip(self, call), fields(to = %call.to))]
    pub async fn eth_call(&self, call: &RawCall) -> Result<Bytes, RPCError> {
        let request = call_request(call);
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_call", (request.clone(), "latest"))
                    .await
            })
            .await
            .with_rpc_context(|| format!("Failed to call {}", call.to))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn eth_get_code(&self, address: Address) -> Result<Bytes, RPCError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getCode", (address, "latest"))
                    .await
            })
            .await
            .with_rpc_context(|| format!("Failed to get code for address {address}"))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<RawReceipt>, RPCError> {
        let receipt: Option<TransactionReceipt> = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getTransactionReceipt", (hash,))
                    .await
            })
            .await
            .with_rpc_context(|| format!("Failed to get receipt of transaction {hash}"))?;

        Ok(receipt.map(raw_receipt))
    }

    #[instrument(level = "debug", skip(self))]
    pub(crate) async fn get_transaction(
        &self,
        hash: B256,
    ) -> Result<Option<Transaction>, RPCError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getTransactionByHash", (hash,))
                    .await
            })
            .await
            .with_rpc_context(|| format!("Failed to get transaction {hash}"))
    }

    /// Accounts managed by the node.
    #[instrument(level = "debug", skip(self))]
    pub async fn accounts(&self) -> Result<Vec<Address>, RPCError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request_noparams("eth_accounts")
                    .await
            })
            .await
            .rpc_context("Failed to get accounts")
    }

    /// Asks the node to sign and broadcast `request` with one of its unlocked accounts.
    ///
    /// Not retried: a broadcast that timed out may still have reached the mempool.
    #[instrument(level = "debug", skip(self, request), fields(to = %request.to))]
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, RPCError> {
        self.inner
            .request("eth_sendTransaction", (transaction_request(request),))
            .await
            .rpc_context("Failed to send transaction")
    }

    /// A sender's confirmed nonce moving past the transaction's nonce while the transaction
    /// itself is unknown means another transaction took its place.
    async fn was_replaced(&self, handle: &TransactionHandle) -> Result<bool, RPCError> {
        let Some(nonce) = handle.nonce else {
            return Ok(false);
        };
        if self
            .get_transaction(handle.hash)
            .await?
            .is_some()
        {
            return Ok(false);
        }
        let confirmed = self
            .get_transaction_count(handle.from, "latest")
            .await?;
        Ok(confirmed > nonce)
    }
}

#[async_trait]
impl NetworkConnection for EthereumRpcClient {
    async fn chain_id(&self) -> Result<u64, NetworkError> {
        Ok(self.get_chain_id().await?)
    }

    async fn estimate_gas(&self, call: &RawCall) -> Result<u64, NetworkError> {
        Ok(self.eth_estimate_gas(call).await?)
    }

    #[instrument(level = "debug", skip_all, fields(to = %call.to))]
    async fn populate_transaction(
        &self,
        call: &RawCall,
        overrides: &TransactionOverrides,
    ) -> Result<TransactionRequest, NetworkError> {
        let mut request = TransactionRequest::from_call(call, overrides);
        request.chain_id = Some(self.get_chain_id().await?);

        if request.nonce.is_none() {
            if let Some(from) = request.from {
                request.nonce = Some(
                    self.get_transaction_count(from, "pending")
                        .await?,
                );
            }
        }
        if request.gas_limit.is_none() {
            let estimate_call = RawCall {
                from: request.from,
                to: request.to,
                data: request.data.clone(),
                value: request.value,
            };
            request.gas_limit = Some(
                self.eth_estimate_gas(&estimate_call)
                    .await?,
            );
        }
        if !overrides.has_fee_fields() {
            let fees = self.get_fee_data().await?;
            trace!(?fees, "Applying network fees");
            fees.apply_to(&mut request);
        }

        Ok(request)
    }

    async fn call(&self, call: &RawCall) -> Result<Bytes, NetworkError> {
        Ok(self.eth_call(call).await?)
    }

    #[instrument(level = "debug", skip(self), fields(hash = %handle.hash))]
    async fn wait(
        &self,
        handle: &TransactionHandle,
        confirmations: u64,
    ) -> Result<Option<RawReceipt>, NetworkError> {
        let started = Instant::now();
        loop {
            match self
                .get_transaction_receipt(handle.hash)
                .await?
            {
                Some(receipt) if confirmations == 0 => return Ok(Some(receipt)),
                Some(receipt) if !receipt.status => {
                    return Err(NetworkError::TransactionFailed {
                        hash: handle.hash,
                        reason: FailureReason::Reverted,
                        receipt: Some(Box::new(receipt)),
                    });
                }
                Some(receipt) => {
                    let head = self.get_block_number().await?;
                    let mined_at = receipt.block_number.unwrap_or(head);
                    if head.saturating_sub(mined_at) + 1 >= confirmations {
                        return Ok(Some(receipt));
                    }
                    trace!(head, mined_at, "Waiting for more confirmations");
                }
                None if confirmations == 0 => return Ok(None),
                None => {
                    if self.was_replaced(handle).await? {
                        return Err(NetworkError::TransactionFailed {
                            hash: handle.hash,
                            reason: FailureReason::Replaced,
                            receipt: None,
                        });
                    }
                }
            }

            if let Some(timeout) = self.polling.timeout {
                if started.elapsed() >= timeout {
                    warn!(?timeout, "Gave up waiting for transaction receipt");
                    return Ok(None);
                }
            }
            debug!(interval = ?self.polling.interval, "Receipt not final yet");
            tokio::time::sleep(self.polling.interval).await;
        }
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, NetworkError> {
        Ok(self.eth_get_code(address).await?)
    }
}
