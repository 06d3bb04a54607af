use std::collections::BTreeMap;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::DeployError;
use crate::types::ChainId;

/// Connection and chain identity of one deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub id: String,
    pub chain_id: ChainId,
    pub rpc_endpoint_url: String,
    /// Name looked up in the secret store, never the key itself.
    pub signing_credential_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_browser_url: Option<String>,
    /// Send pre-EIP-1559 transactions
    #[serde(default)]
    pub legacy_transactions: bool,
}

impl NetworkProfile {
    pub fn rpc_url(&self) -> Result<Url, DeployError> {
        Url::parse(&self.rpc_endpoint_url).map_err(|err| {
            DeployError::InvalidProfile {
                id: self.id.clone(),
                reason: format!("rpc endpoint url: {err}"),
            }
        })
    }

    pub fn explorer_address_url(&self, address: &str) -> Option<String> {
        self.explorer_browser_url.as_ref().map(|browser| {
            format!("{}/address/{address}", browser.trim_end_matches('/'))
        })
    }

    fn validate(&self) -> Result<(), DeployError> {
        let invalid = |reason: &str| DeployError::InvalidProfile {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }

        if self.chain_id.0 == 0 {
            return Err(invalid("chain id must be non-zero"));
        }

        if self.signing_credential_ref.trim().is_empty() {
            return Err(invalid("empty signing credential reference"));
        }

        self.rpc_url()?;

        Ok(())
    }
}

/// Read-only lookup table of network profiles, keyed by id.
///
/// Built once at startup; profiles cannot be replaced once registered so a
/// network id always maps to the same chain id for the lifetime of the process.
#[derive(Debug, Default, Clone)]
pub struct NetworkRegistry {
    profiles: BTreeMap<String, NetworkProfile>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profiles(
        profiles: impl IntoIterator<Item = NetworkProfile>,
    ) -> Result<Self, DeployError> {
        let mut registry = Self::new();

        for profile in profiles {
            registry.register(profile)?;
        }

        Ok(registry)
    }

    pub fn register(&mut self, profile: NetworkProfile) -> Result<(), DeployError> {
        if self.profiles.contains_key(&profile.id) {
            return Err(DeployError::DuplicateNetwork(profile.id));
        }

        profile.validate()?;

        self.profiles.insert(profile.id.clone(), profile);

        Ok(())
    }

    pub fn resolve(&self, id: &str) -> Result<&NetworkProfile, DeployError> {
        self.profiles
            .get(id)
            .ok_or_else(|| DeployError::UnknownNetwork(id.to_string()))
    }

    pub fn profiles(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
