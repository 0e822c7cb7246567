//! Error types for the bridge shuttle

use thiserror::Error;

/// Main error type for the shuttle
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain connection error for chain {chain_id}: {message}")]
    Connectivity { chain_id: u64, message: String },

    #[error("Calldata template error: {0}")]
    Template(String),

    #[error("RPC error on chain {chain_id} during {operation}: {message}")]
    Rpc {
        chain_id: u64,
        operation: &'static str,
        message: String,
    },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Timed out after {waited_secs}s waiting for receipt of {tx_hash} on chain {chain_id}")]
    ReceiptTimeout {
        chain_id: u64,
        tx_hash: String,
        waited_secs: u64,
    },

    #[error("Transaction {tx_hash} reverted on chain {chain_id} in block {block_number}")]
    Reverted {
        chain_id: u64,
        tx_hash: String,
        block_number: u64,
    },
}

impl BridgeError {
    /// Whether the error belongs to a single leg and the run can carry on.
    ///
    /// Everything else is a startup problem and aborts the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BridgeError::Rpc { .. }
                | BridgeError::Wallet(_)
                | BridgeError::ReceiptTimeout { .. }
                | BridgeError::Reverted { .. }
        )
    }

    pub(crate) fn rpc(chain_id: u64, operation: &'static str, err: impl ToString) -> Self {
        BridgeError::Rpc {
            chain_id,
            operation,
            message: err.to_string(),
        }
    }
}

/// Result type for shuttle operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leg_errors_are_recoverable() {
        assert!(BridgeError::rpc(10, "send", "boom").is_recoverable());
        assert!(BridgeError::ReceiptTimeout {
            chain_id: 10,
            tx_hash: "0xabc".to_string(),
            waited_secs: 5,
        }
        .is_recoverable());
        assert!(!BridgeError::Template("missing placeholder".to_string()).is_recoverable());
        assert!(!BridgeError::Connectivity {
            chain_id: 1,
            message: "refused".to_string(),
        }
        .is_recoverable());
    }

    #[test]
    fn test_rpc_error_message() {
        let err = BridgeError::rpc(1301, "get_nonce", "connection reset");
        assert_eq!(
            err.to_string(),
            "RPC error on chain 1301 during get_nonce: connection reset"
        );
    }
}
