use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::deployment::DeploymentResult;
use crate::network::NetworkProfile;
use crate::parameters::DeploymentParameterSet;
use crate::serde_utils;

/// What a deployment run leaves behind for the operator.
///
/// Written for confirmed and failed runs alike, a failed run may still have a
/// broadcast transaction worth tracking.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub deployment: DeploymentResult,
    pub parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl Report {
    pub fn new(
        deployment: DeploymentResult,
        parameters: &DeploymentParameterSet,
        profile: Option<&NetworkProfile>,
    ) -> Self {
        let explorer_url = profile.and_then(|profile| {
            deployment
                .contract_address
                .and_then(|address| {
                    profile.explorer_address_url(&format!("{address:?}"))
                })
        });

        Self {
            deployment,
            parameters: parameters
                .entries()
                .into_iter()
                .map(|(name, value)| (name, value.to_string()))
                .collect(),
            explorer_url,
        }
    }

    pub async fn write(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        let path = path.as_ref();

        serde_utils::write_serialize(path, self).await?;

        info!("Report written to {}", path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::{Address, H256};

    use super::*;
    use crate::deployment::DeploymentStatus;
    use crate::types::ChainId;

    fn profile() -> NetworkProfile {
        NetworkProfile {
            id: "shimmerEvmTestnet".to_string(),
            chain_id: ChainId(1073),
            rpc_endpoint_url: "https://json-rpc.evm.testnet.shimmer.network"
                .to_string(),
            signing_credential_ref: "PRIV_KEY".to_string(),
            explorer_api_url: None,
            explorer_browser_url: Some(
                "https://explorer.evm.testnet.shimmer.network".to_string(),
            ),
            legacy_transactions: false,
        }
    }

    #[tokio::test]
    async fn confirmed_report_links_the_explorer() -> eyre::Result<()> {
        let mut result = DeploymentResult::pending(
            "shimmerEvmTestnet",
            ChainId(1073),
            "EZIOTAMarketV1",
            H256::repeat_byte(7),
        );
        result.confirm(Address::repeat_byte(0xab), 42);

        let report =
            Report::new(result, &DeploymentParameterSet::default(), Some(&profile()));

        assert_eq!(
            report.explorer_url.as_deref(),
            Some("https://explorer.evm.testnet.shimmer.network/address/0xabababababababababababababababababababab")
        );
        assert_eq!(
            report.parameters.get("fuelRate").map(String::as_str),
            Some("6300000000000000")
        );

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("reports").join("report.yml");
        report.write(&path).await?;

        let reread: Report = serde_utils::read_deserialize(&path).await?;
        assert_eq!(reread.deployment.status(), DeploymentStatus::Confirmed);
        assert_eq!(reread.deployment.block_number, Some(42));

        Ok(())
    }

    #[test]
    fn failed_report_has_no_explorer_link() {
        let mut result = DeploymentResult::pending(
            "shimmerEvmTestnet",
            ChainId(1073),
            "EZIOTAMarketV1",
            H256::repeat_byte(7),
        );
        result.fail();

        let report =
            Report::new(result, &DeploymentParameterSet::default(), Some(&profile()));

        assert_eq!(report.explorer_url, None);
        assert_eq!(report.deployment.status(), DeploymentStatus::Failed);
    }
}
