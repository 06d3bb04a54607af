use std::sync::Arc;

use reqwest::Url;
use tracing::{info, instrument};

use crate::artifact::ContractArtifact;
use crate::chain::Connector;
use crate::error::DeployError;
use crate::network::NetworkRegistry;
use crate::parameters::DeploymentParameterSet;
use crate::secrets::SecretResolver;

pub mod confirmation;
pub mod result;

pub use self::confirmation::ConfirmationSettings;
pub use self::result::{DeploymentResult, DeploymentStatus};

/// Deploys one contract instance per call.
///
/// Calls are not idempotent: the same request twice yields two contracts.
/// Nothing here sequences nonces either, so deployments signed by the same
/// credential on the same network must not overlap. Deployments to different
/// networks share nothing but the read-only registry and can run concurrently.
pub struct Deployer {
    registry: Arc<NetworkRegistry>,
    secrets: Arc<dyn SecretResolver>,
    connector: Arc<dyn Connector>,
    settings: ConfirmationSettings,
}

#[derive(Debug, Clone)]
pub struct DeploymentRequest<'a> {
    pub network: &'a str,
    pub parameters: &'a DeploymentParameterSet,
    pub artifact: &'a ContractArtifact,
    /// Replaces the profile's endpoint, the chain id check still applies.
    pub rpc_url_override: Option<Url>,
}

impl Deployer {
    pub fn new(
        registry: Arc<NetworkRegistry>,
        secrets: Arc<dyn SecretResolver>,
        connector: Arc<dyn Connector>,
        settings: ConfirmationSettings,
    ) -> Self {
        Self {
            registry,
            secrets,
            connector,
            settings,
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    #[instrument(skip_all, fields(network = request.network, contract = %request.artifact.contract_name))]
    pub async fn deploy(
        &self,
        request: DeploymentRequest<'_>,
    ) -> Result<DeploymentResult, DeployError> {
        let profile = self.registry.resolve(request.network)?;

        let key = self
            .secrets
            .resolve(&profile.signing_credential_ref)?
            .into_private_key(&profile.signing_credential_ref)?;

        let endpoint = match request.rpc_url_override {
            Some(url) => url,
            None => profile.rpc_url()?,
        };

        let client = self.connector.connect(profile, endpoint, key).await?;

        let actual = client.chain_id().await?;
        if actual != profile.chain_id {
            return Err(DeployError::ChainIdMismatch {
                network: profile.id.clone(),
                expected: profile.chain_id,
                actual,
            });
        }

        let args = request
            .parameters
            .bind(request.artifact.constructor())?;
        let data = request.artifact.creation_data(&args)?;

        let transaction_hash = client.submit_creation(data).await?;

        info!(tx = ?transaction_hash, "Submitted contract creation");

        let result = DeploymentResult::pending(
            &profile.id,
            profile.chain_id,
            &request.artifact.contract_name,
            transaction_hash,
        );

        confirmation::wait_for_confirmation(client.as_ref(), result, &self.settings)
            .await
    }
}
