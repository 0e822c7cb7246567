//! Chain client backed by an ethers HTTP provider

use super::{ChainClient, Receipt};
use crate::config::ChainConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::tx::BridgeTransaction;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Bound on each individual RPC call, separate from the receipt wait
const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// ethers provider for one network, HTTP unless a transport is given
pub struct EthersChainClient<P = Http> {
    name: String,
    chain_id: u64,
    provider: Provider<P>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl EthersChainClient<Http> {
    /// Create a client; no network access happens here
    pub fn new(config: &ChainConfig) -> BridgeResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str()).map_err(|e| {
            BridgeError::Connectivity {
                chain_id: config.chain_id,
                message: format!("Invalid RPC URL {}: {}", config.rpc_url, e),
            }
        })?;

        debug!("Created HTTP provider for {} ({})", config.name, config.chain_id);

        Ok(Self::with_provider(
            config.name.clone(),
            config.chain_id,
            provider.interval(config.receipt_poll_interval()),
            config.receipt_timeout(),
            config.receipt_poll_interval(),
        ))
    }
}

impl<P: JsonRpcClient> EthersChainClient<P> {
    pub fn with_provider(
        name: String,
        chain_id: u64,
        provider: Provider<P>,
        receipt_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            name,
            chain_id,
            provider,
            receipt_timeout,
            poll_interval,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn connectivity_error(&self, message: impl Into<String>) -> BridgeError {
        BridgeError::Connectivity {
            chain_id: self.chain_id,
            message: message.into(),
        }
    }

    /// Poll until the receipt shows up with a block number
    async fn poll_receipt(&self, tx_hash: H256) -> BridgeResult<Receipt> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| BridgeError::rpc(self.chain_id, "get_transaction_receipt", e))?;

            if let Some(receipt) = receipt {
                if let Some(block_number) = receipt.block_number {
                    return Ok(Receipt {
                        tx_hash,
                        block_number: block_number.as_u64(),
                        status: receipt.status.map(|s| s.as_u64()),
                    });
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> ChainClient for EthersChainClient<P> {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn check_connectivity(&self) -> BridgeResult<()> {
        let block = timeout(RPC_TIMEOUT, self.provider.get_block_number())
            .await
            .map_err(|_| self.connectivity_error("Timed out fetching block number"))?
            .map_err(|e| self.connectivity_error(e.to_string()))?;

        let reported = timeout(RPC_TIMEOUT, self.provider.get_chainid())
            .await
            .map_err(|_| self.connectivity_error("Timed out fetching chain id"))?
            .map_err(|e| self.connectivity_error(e.to_string()))?;

        if reported != U256::from(self.chain_id) {
            error!(
                "{} endpoint reports chain {}, expected {}",
                self.name, reported, self.chain_id
            );
            return Err(self.connectivity_error(format!(
                "Endpoint serves chain {}, expected {}",
                reported, self.chain_id
            )));
        }

        info!(
            "Connected to {} (chain {}) at block {}",
            self.name, self.chain_id, block
        );
        Ok(())
    }

    async fn get_nonce(&self, address: Address) -> BridgeResult<u64> {
        let nonce = timeout(
            RPC_TIMEOUT,
            self.provider
                .get_transaction_count(address, Some(BlockNumber::Pending.into())),
        )
        .await
        .map_err(|_| BridgeError::rpc(self.chain_id, "get_nonce", "request timed out"))?
        .map_err(|e| BridgeError::rpc(self.chain_id, "get_nonce", e))?;

        Ok(nonce.as_u64())
    }

    async fn sign(&self, tx: &BridgeTransaction, wallet: &LocalWallet) -> BridgeResult<Bytes> {
        let typed = tx.to_typed();
        let wallet = wallet.clone().with_chain_id(self.chain_id);

        let signature = wallet
            .sign_transaction(&typed)
            .await
            .map_err(|e| BridgeError::Wallet(format!("Failed to sign transaction: {}", e)))?;

        Ok(typed.rlp_signed(&signature))
    }

    async fn send(&self, raw: Bytes) -> BridgeResult<H256> {
        let pending = timeout(RPC_TIMEOUT, self.provider.send_raw_transaction(raw))
            .await
            .map_err(|_| BridgeError::rpc(self.chain_id, "send", "request timed out"))?
            .map_err(|e| BridgeError::rpc(self.chain_id, "send", e))?;

        Ok(pending.tx_hash())
    }

    async fn await_receipt(&self, tx_hash: H256) -> BridgeResult<Receipt> {
        match timeout(self.receipt_timeout, self.poll_receipt(tx_hash)).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::ReceiptTimeout {
                chain_id: self.chain_id,
                tx_hash: format!("{:?}", tx_hash),
                waited_secs: self.receipt_timeout.as_secs(),
            }),
        }
    }
}
