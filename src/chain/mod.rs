//! Chain module - per-network client used by the orchestrator
//!
//! This module provides:
//! - The `ChainClient` capability surface (nonce, sign, send, confirm)
//! - An ethers-backed implementation with bounded receipt waits

pub mod provider;

pub use provider::EthersChainClient;

use crate::error::BridgeResult;
use crate::tx::BridgeTransaction;

use async_trait::async_trait;
use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes, H256};

/// Inclusion record for a submitted transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub tx_hash: H256,
    pub block_number: u64,
    /// `Some(1)` success, `Some(0)` reverted, `None` pre-byzantium
    pub status: Option<u64>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status != Some(0)
    }
}

/// Operations against a single network
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain ID this client is bound to
    fn chain_id(&self) -> u64;

    /// Verify the endpoint is reachable and serves the expected chain
    async fn check_connectivity(&self) -> BridgeResult<()>;

    /// Next nonce for `address`, pending transactions included
    async fn get_nonce(&self, address: Address) -> BridgeResult<u64>;

    /// Sign and RLP-encode a transaction
    async fn sign(&self, tx: &BridgeTransaction, wallet: &LocalWallet) -> BridgeResult<Bytes>;

    /// Submit a signed transaction
    async fn send(&self, raw: Bytes) -> BridgeResult<H256>;

    /// Wait until the transaction is mined or the receipt timeout expires
    async fn await_receipt(&self, tx_hash: H256) -> BridgeResult<Receipt>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording in-memory chain used by orchestration tests

    use super::*;
    use crate::error::BridgeError;

    use std::sync::{Arc, Mutex};

    /// One recorded call: (chain id, operation)
    pub(crate) type CallLog = Arc<Mutex<Vec<(u64, &'static str)>>>;

    struct FakeState {
        nonce: u64,
        block: u64,
        sent_nonces: Vec<u64>,
        pending_nonce: Option<u64>,
    }

    /// In-memory chain: nonce advances on every accepted send
    pub(crate) struct FakeChain {
        chain_id: u64,
        log: CallLog,
        state: Mutex<FakeState>,
        fail_send: bool,
        revert: bool,
        stall: bool,
    }

    impl FakeChain {
        pub(crate) fn new(chain_id: u64, log: CallLog) -> Self {
            Self {
                chain_id,
                log,
                state: Mutex::new(FakeState {
                    nonce: 0,
                    block: 100,
                    sent_nonces: Vec::new(),
                    pending_nonce: None,
                }),
                fail_send: false,
                revert: false,
                stall: false,
            }
        }

        pub(crate) fn failing_sends(mut self) -> Self {
            self.fail_send = true;
            self
        }

        pub(crate) fn reverting(mut self) -> Self {
            self.revert = true;
            self
        }

        /// Receipts never arrive
        pub(crate) fn stalled(mut self) -> Self {
            self.stall = true;
            self
        }

        pub(crate) fn sent_nonces(&self) -> Vec<u64> {
            self.state.lock().unwrap().sent_nonces.clone()
        }

        fn record(&self, op: &'static str) {
            self.log.lock().unwrap().push((self.chain_id, op));
        }
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        fn chain_id(&self) -> u64 {
            self.chain_id
        }

        async fn check_connectivity(&self) -> BridgeResult<()> {
            self.record("check_connectivity");
            Ok(())
        }

        async fn get_nonce(&self, _address: Address) -> BridgeResult<u64> {
            self.record("get_nonce");
            Ok(self.state.lock().unwrap().nonce)
        }

        async fn sign(&self, tx: &BridgeTransaction, _wallet: &LocalWallet) -> BridgeResult<Bytes> {
            self.record("sign");
            self.state.lock().unwrap().pending_nonce = Some(tx.nonce);
            Ok(tx.data.clone())
        }

        async fn send(&self, _raw: Bytes) -> BridgeResult<H256> {
            self.record("send");
            if self.fail_send {
                return Err(BridgeError::rpc(self.chain_id, "send", "insufficient funds"));
            }

            let mut state = self.state.lock().unwrap();
            let nonce = state.pending_nonce.take().unwrap_or(state.nonce);
            state.sent_nonces.push(nonce);
            state.nonce = nonce + 1;
            Ok(H256::from_low_u64_be(self.chain_id * 1_000 + nonce))
        }

        async fn await_receipt(&self, tx_hash: H256) -> BridgeResult<Receipt> {
            self.record("await_receipt");
            if self.stall {
                std::future::pending::<()>().await;
            }
            let mut state = self.state.lock().unwrap();
            state.block += 1;
            Ok(Receipt {
                tx_hash,
                block_number: state.block,
                status: Some(if self.revert { 0 } else { 1 }),
            })
        }
    }
}
