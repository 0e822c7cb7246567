//! Transaction composition for bridge legs

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};

/// Per-network values copied into every transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ChainConstants {
    pub chain_id: u64,
    /// Bridge contract address
    pub contract: Address,
    pub gas_limit: U256,
    pub gas_price: U256,
}

/// Unsigned bridge transaction
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeTransaction {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub nonce: u64,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub chain_id: u64,
    pub data: Bytes,
}

impl BridgeTransaction {
    /// Legacy (EIP-155) request ready for signing
    pub fn to_typed(&self) -> TypedTransaction {
        let request = TransactionRequest::new()
            .from(self.from)
            .to(self.to)
            .value(self.value)
            .nonce(self.nonce)
            .gas(self.gas_limit)
            .gas_price(self.gas_price)
            .chain_id(self.chain_id)
            .data(self.data.clone());

        TypedTransaction::Legacy(request)
    }
}

/// Builds bridge transactions; no network access
pub struct TransactionComposer;

impl TransactionComposer {
    pub fn compose(
        constants: &ChainConstants,
        from: Address,
        calldata: &Bytes,
        value_wei: U256,
        nonce: u64,
    ) -> BridgeTransaction {
        BridgeTransaction {
            from,
            to: constants.contract,
            value: value_wei,
            nonce,
            gas_limit: constants.gas_limit,
            gas_price: constants.gas_price,
            chain_id: constants.chain_id,
            data: calldata.clone(),
        }
    }
}
