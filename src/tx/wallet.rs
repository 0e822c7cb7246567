//! Signing account

use crate::calldata::AddressCodec;
use crate::config::WalletConfig;
use crate::error::{BridgeError, BridgeResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;

/// The account both legs are sent from
#[derive(Debug, Clone)]
pub struct Account {
    wallet: LocalWallet,
}

impl Account {
    /// Load the private key from the configured environment variable
    pub fn load(config: &WalletConfig) -> BridgeResult<Self> {
        let key = std::env::var(&config.private_key_env).map_err(|_| {
            BridgeError::Wallet(format!(
                "No wallet configured. Set {} to a hex private key",
                config.private_key_env
            ))
        })?;

        Self::from_private_key(&key)
    }

    pub fn from_private_key(key: &str) -> BridgeResult<Self> {
        let wallet = key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| BridgeError::Wallet(format!("Invalid private key: {}", e)))?;

        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Address as injected into calldata
    pub fn address_hex(&self) -> String {
        AddressCodec::address_hex(&self.address())
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // Well-known development key (anvil account 0)
    pub(crate) const DEV_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_from_private_key() {
        let account = Account::from_private_key(DEV_KEY).unwrap();
        assert_eq!(
            account.address_hex(),
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_key_without_prefix() {
        let account = Account::from_private_key(&DEV_KEY[2..]).unwrap();
        assert_eq!(
            account.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(matches!(
            Account::from_private_key("0x123456789"),
            Err(BridgeError::Wallet(_))
        ));
    }

    #[test]
    fn test_load_reads_configured_variable() {
        let config = WalletConfig {
            private_key_env: "SHUTTLE_TEST_PRIVATE_KEY".to_string(),
        };
        std::env::remove_var("SHUTTLE_TEST_PRIVATE_KEY");
        assert!(matches!(Account::load(&config), Err(BridgeError::Wallet(_))));

        std::env::set_var("SHUTTLE_TEST_PRIVATE_KEY", DEV_KEY);
        let account = Account::load(&config).unwrap();
        assert_eq!(account.address_hex(), "f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    }
}
