//! Transaction module - composition of bridge transactions and the signing account

mod composer;
mod wallet;

pub use composer::{BridgeTransaction, ChainConstants, TransactionComposer};
pub use wallet::Account;

#[cfg(test)]
pub(crate) use wallet::tests::DEV_KEY;
