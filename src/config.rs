use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deployment::confirmation::{
    DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
};
use crate::deployment::ConfirmationSettings;
use crate::error::DeployError;
use crate::network::{NetworkProfile, NetworkRegistry};
use crate::parameters::{DeploymentParameterSet, ParameterOverrides};
use crate::types::Confirmations;

pub const DEFAULT_CONFIG_PATH: &str = "deploy.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_network: Option<String>,
    pub networks: Vec<NetworkProfile>,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    /// Overrides of the built-in constructor parameter defaults
    #[serde(default)]
    pub parameters: ParameterOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationConfig {
    #[serde(default = "default_confirmations")]
    pub confirmations: Confirmations,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_confirmations() -> Confirmations {
    Confirmations(1)
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            confirmations: default_confirmations(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ConfirmationConfig {
    pub fn settings(&self) -> ConfirmationSettings {
        ConfirmationSettings {
            confirmations: self.confirmations,
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

impl Config {
    pub fn registry(&self) -> Result<NetworkRegistry, DeployError> {
        NetworkRegistry::from_profiles(self.networks.iter().cloned())
    }

    /// Built-in defaults with the configured overrides applied.
    pub fn parameters(&self) -> Result<DeploymentParameterSet, DeployError> {
        DeploymentParameterSet::default().with_overrides(self.parameters.iter())
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::U256;
    use indoc::indoc;

    use super::*;
    use crate::serde_utils;
    use crate::types::ChainId;

    const CONFIG: &str = indoc! {r#"
        defaultNetwork: shimmerEvmTestnet
        networks:
          - id: shimmerEvmTestnet
            chainId: 1073
            rpcEndpointUrl: https://json-rpc.evm.testnet.shimmer.network
            signingCredentialRef: PRIV_KEY
            explorerApiUrl: https://json-rpc.evm.testnet.shimmer.network
            explorerBrowserUrl: https://explorer.evm.testnet.shimmer.network
          - id: iotaEvmMainnet
            chainId: 8822
            rpcEndpointUrl: https://json-rpc.evm.iotaledger.net
            signingCredentialRef: PRIV_KEY
            legacyTransactions: true
        confirmation:
          confirmations: 2
        parameters:
          _fuelRate: "7000000000000000"
    "#};

    #[test]
    fn parses_configuration_document() {
        let config: Config = serde_yaml::from_str(CONFIG).unwrap();

        assert_eq!(config.default_network.as_deref(), Some("shimmerEvmTestnet"));

        let registry = config.registry().unwrap();
        let testnet = registry.resolve("shimmerEvmTestnet").unwrap();
        assert_eq!(testnet.chain_id, ChainId(1073));
        assert!(!testnet.legacy_transactions);
        assert!(registry.resolve("iotaEvmMainnet").unwrap().legacy_transactions);

        let settings = config.confirmation.settings();
        assert_eq!(settings.confirmations, Confirmations(2));
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);

        let params = config.parameters().unwrap();
        assert_eq!(params.fuel_rate, U256::from(7_000_000_000_000_000u64));
    }

    #[test]
    fn duplicate_network_ids_are_rejected() {
        let config: Config = serde_yaml::from_str(indoc! {r#"
            networks:
              - id: hardhat
                chainId: 31337
                rpcEndpointUrl: http://127.0.0.1:8545
                signingCredentialRef: PRIV_KEY
              - id: hardhat
                chainId: 1
                rpcEndpointUrl: http://127.0.0.1:8546
                signingCredentialRef: PRIV_KEY
        "#})
        .unwrap();

        assert!(matches!(
            config.registry(),
            Err(DeployError::DuplicateNetwork(id)) if id == "hardhat"
        ));
    }

    #[tokio::test]
    async fn shipped_config_covers_all_networks() -> eyre::Result<()> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/deploy.yml");
        let config: Config = serde_utils::read_deserialize(path).await?;

        let registry = config.registry()?;
        let chain_ids: Vec<_> = [
            "hardhat",
            "shimmerEvmTestnet",
            "shimmerEvmMainnet",
            "iotaEvmTestnet",
            "iotaEvmMainnet",
        ]
        .iter()
        .map(|id| registry.resolve(id).map(|p| p.chain_id.0))
        .collect::<Result<_, _>>()?;

        assert_eq!(chain_ids, vec![31337, 1073, 148, 1075, 8822]);
        assert_eq!(config.parameters()?, DeploymentParameterSet::default());

        Ok(())
    }

    #[tokio::test]
    async fn config_round_trips_through_disk() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("deploy.yml");

        let config: Config = serde_yaml::from_str(CONFIG)?;
        serde_utils::write_serialize(&path, &config).await?;

        let reread: Config = serde_utils::read_deserialize(&path).await?;
        assert_eq!(reread.networks, config.networks);
        assert_eq!(reread.parameters, config.parameters);

        Ok(())
    }
}
