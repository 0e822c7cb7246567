//! Configuration management for the bridge shuttle
//!
//! Loads configuration from a TOML file with environment variable substitution.
//! Everything is read once at startup and handed to the components that need it.

use crate::coordination::RoundLimit;
use crate::error::{BridgeError, BridgeResult};
use crate::tx::ChainConstants;

use anyhow::{Context, Result};
use ethers::types::{Address, U256};
use ethers::utils::{parse_ether, parse_units};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at the configuration file
pub const CONFIG_PATH_ENV: &str = "BRIDGE_SHUTTLE_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub shuttle: ShuttleConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Network the outbound leg is sent on
    pub outbound: ChainConfig,
    /// Network the return leg is sent on
    #[serde(rename = "return")]
    pub return_leg: ChainConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShuttleConfig {
    /// Amount bridged per leg, in ETH (decimal string, e.g. "0.3")
    pub amount_eth: String,
    /// Number of rounds; omit to run until stopped
    pub rounds: Option<u64>,
    /// Pause between rounds
    #[serde(default)]
    pub round_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Name of the environment variable holding the hex private key
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: default_private_key_env(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    /// Bridge contract receiving the call
    pub contract_address: String,
    pub gas_limit: u64,
    /// Fixed legacy gas price, in gwei (decimal string)
    pub gas_price_gwei: String,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    /// Hex calldata with a single `{address}` placeholder
    pub calldata_template: String,
    /// Optional destination tag swap applied after address injection
    pub retag: Option<RetagConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetagConfig {
    /// Hex bytes expected exactly once in the template
    pub from: String,
    /// Hex bytes of the same length written in their place
    pub to: String,
}

fn default_private_key_env() -> String {
    "BRIDGE_PRIVATE_KEY".to_string()
}

fn default_metrics_port() -> u16 {
    9464
}

fn default_receipt_timeout_secs() -> u64 {
    180
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

impl Settings {
    /// Load settings from the configured file
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(input);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.shuttle.rounds == Some(0) {
            anyhow::bail!("shuttle.rounds must be at least 1 (omit it to run until stopped)");
        }

        self.value_wei()?;

        for chain in [&self.outbound, &self.return_leg] {
            chain.constants()?;

            if chain.rpc_url.is_empty() {
                anyhow::bail!("Chain {} has no RPC URL configured", chain.name);
            }
            if chain.receipt_timeout_secs == 0 {
                anyhow::bail!("Chain {} must have a non-zero receipt timeout", chain.name);
            }
            if chain.receipt_poll_interval_ms == 0 {
                anyhow::bail!("Chain {} must have a non-zero receipt poll interval", chain.name);
            }
        }

        if self.outbound.chain_id == self.return_leg.chain_id {
            tracing::warn!(
                "Outbound and return legs both target chain {}",
                self.outbound.chain_id
            );
        }

        Ok(())
    }

    /// Transfer amount in wei
    pub fn value_wei(&self) -> BridgeResult<U256> {
        parse_ether(self.shuttle.amount_eth.trim()).map_err(|e| {
            BridgeError::Config(format!(
                "Invalid amount_eth {:?}: {}",
                self.shuttle.amount_eth, e
            ))
        })
    }

    pub fn round_limit(&self) -> RoundLimit {
        match self.shuttle.rounds {
            Some(n) => RoundLimit::Count(n),
            None => RoundLimit::UntilStopped,
        }
    }

    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.shuttle.round_delay_ms)
    }
}

impl ChainConfig {
    /// Per-network transaction constants
    pub fn constants(&self) -> BridgeResult<ChainConstants> {
        let contract: Address = self.contract_address.parse().map_err(|e| {
            BridgeError::Config(format!(
                "Invalid contract address for {}: {}",
                self.name, e
            ))
        })?;

        if self.gas_limit == 0 {
            return Err(BridgeError::Config(format!(
                "Chain {} must have a non-zero gas limit",
                self.name
            )));
        }

        let gas_price: U256 = parse_units(self.gas_price_gwei.trim(), "gwei")
            .map_err(|e| {
                BridgeError::Config(format!("Invalid gas price for {}: {}", self.name, e))
            })?
            .into();

        Ok(ChainConstants {
            chain_id: self.chain_id,
            contract,
            gas_limit: U256::from(self.gas_limit),
            gas_price,
        })
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

lazy_static! {
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid");
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE: &str = r#"
[shuttle]
amount_eth = "1"
rounds = 3

[outbound]
name = "op-sepolia"
chain_id = 11155420
rpc_url = "http://127.0.0.1:8545"
contract_address = "0xb6Def636914Ae60173d9007E732684a9eEDEF26E"
gas_limit = 250000
gas_price_gwei = "0.1"
calldata_template = "0x56591d59756e6974{address}0000000000000000000000000000000000000000000000000de0b6b3a7640000"

[outbound.retag]
from = "756e6974"
to = "61726274"

[return]
name = "unichain-sepolia"
chain_id = 1301
rpc_url = "http://127.0.0.1:8546"
contract_address = "0x1cEAb5967E5f078Fa0FEC3DFfD0394Af1fEeBCC9"
gas_limit = 400000
gas_price_gwei = "0.1"
receipt_timeout_secs = 30
calldata_template = "0x56591d596f707374{address}0000000000000000000000000000000000000000000000000de0b6b3a7640000"
"#;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("SHUTTLE_TEST_VAR", "test_value");
        let input = "url = \"https://rpc.example.com/${SHUTTLE_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://rpc.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_parse_sample() {
        let settings = Settings::from_toml_str(SAMPLE).unwrap();

        assert_eq!(settings.round_limit(), RoundLimit::Count(3));
        assert_eq!(
            settings.value_wei().unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(settings.wallet.private_key_env, "BRIDGE_PRIVATE_KEY");
        assert!(!settings.metrics.enabled);

        let outbound = settings.outbound.constants().unwrap();
        assert_eq!(outbound.chain_id, 11155420);
        assert_eq!(outbound.gas_limit, U256::from(250_000));
        assert_eq!(outbound.gas_price, U256::from(100_000_000u64));
        assert_eq!(
            settings.outbound.retag,
            Some(RetagConfig {
                from: "756e6974".to_string(),
                to: "61726274".to_string(),
            })
        );

        assert_eq!(settings.return_leg.receipt_timeout(), Duration::from_secs(30));
        assert_eq!(
            settings.return_leg.receipt_poll_interval(),
            Duration::from_millis(1_000)
        );
        assert!(settings.return_leg.retag.is_none());
    }

    #[test]
    fn test_missing_rounds_runs_until_stopped() {
        let input = SAMPLE.replace("rounds = 3\n", "");
        let settings = Settings::from_toml_str(&input).unwrap();
        assert_eq!(settings.round_limit(), RoundLimit::UntilStopped);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let zero_rounds = SAMPLE.replace("rounds = 3", "rounds = 0");
        assert!(Settings::from_toml_str(&zero_rounds).is_err());

        let bad_amount = SAMPLE.replace("amount_eth = \"1\"", "amount_eth = \"one\"");
        assert!(Settings::from_toml_str(&bad_amount).is_err());

        let zero_gas = SAMPLE.replace("gas_limit = 250000", "gas_limit = 0");
        assert!(Settings::from_toml_str(&zero_gas).is_err());

        let bad_contract = SAMPLE.replace(
            "0xb6Def636914Ae60173d9007E732684a9eEDEF26E",
            "0xnot-an-address",
        );
        assert!(Settings::from_toml_str(&bad_contract).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.outbound.name, "op-sepolia");
        assert_eq!(settings.return_leg.chain_id, 1301);
    }
}
