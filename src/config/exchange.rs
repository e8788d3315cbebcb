use crate::config::read_env_or_file;
use anyhow::Result;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Credentials and network selection for the exchange session.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Signing key. Optional for dry runs, which only need prices.
    pub private_key: Option<String>,
    /// Account traded on behalf of when the key belongs to an agent wallet.
    pub account_address: Option<String>,
    pub network: String,
}

impl ExchangeConfig {
    pub fn has_credentials(&self) -> bool {
        self.private_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn is_mainnet(&self) -> bool {
        self.network == "mainnet"
    }
}

// Keeps the key out of debug logs
impl std::fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("account_address", &self.account_address)
            .field("network", &self.network)
            .finish()
    }
}

pub fn load_exchange_config() -> Result<ExchangeConfig> {
    dotenv().ok(); // Load .env file if it exists, ignore if missing (env vars might be set otherwise)

    let private_key = read_env_or_file("BITSPLIT_PRIVATE_KEY").ok();
    let account_address = env::var("BITSPLIT_ACCOUNT_ADDRESS").ok();
    let network = env::var("BITSPLIT_NETWORK").unwrap_or_else(|_| "mainnet".to_string());

    if network != "mainnet" && network != "testnet" {
        return Err(anyhow::anyhow!(
            "BITSPLIT_NETWORK must be 'mainnet' or 'testnet', got '{}'",
            network
        ));
    }

    Ok(ExchangeConfig {
        private_key,
        account_address,
        network,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let config = ExchangeConfig {
            private_key: Some("0xdeadbeef".to_string()),
            account_address: None,
            network: "testnet".to_string(),
        };
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("deadbeef"));
        assert!(dbg.contains("<redacted>"));
        assert!(config.has_credentials());
        assert!(!config.is_mainnet());
    }

    #[test]
    fn test_empty_key_is_not_credentials() {
        let config = ExchangeConfig {
            private_key: Some(String::new()),
            account_address: None,
            network: "mainnet".to_string(),
        };
        assert!(!config.has_credentials());
    }
}
