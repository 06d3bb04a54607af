use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::types::ChainId;

/// `Pending` is the only non-terminal state. An attempt that never reached
/// submission has no result at all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Confirmed,
    Failed,
}

impl DeploymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub network: String,
    pub chain_id: ChainId,
    pub contract_name: String,
    pub transaction_hash: H256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    status: DeploymentStatus,
}

impl DeploymentResult {
    pub fn pending(
        network: impl ToString,
        chain_id: ChainId,
        contract_name: impl ToString,
        transaction_hash: H256,
    ) -> Self {
        Self {
            network: network.to_string(),
            chain_id,
            contract_name: contract_name.to_string(),
            transaction_hash,
            contract_address: None,
            block_number: None,
            status: DeploymentStatus::Pending,
        }
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status
    }

    /// Returns `false` and leaves the result untouched if it is already terminal.
    pub fn confirm(&mut self, address: Address, block_number: u64) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.contract_address = Some(address);
        self.block_number = Some(block_number);
        self.status = DeploymentStatus::Confirmed;

        true
    }

    /// Returns `false` and leaves the result untouched if it is already terminal.
    pub fn fail(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.status = DeploymentStatus::Failed;

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> DeploymentResult {
        DeploymentResult::pending(
            "testnet",
            ChainId(1073),
            "EZIOTAMarketV1",
            H256::repeat_byte(1),
        )
    }

    #[test]
    fn confirmed_is_terminal() {
        let mut result = pending();

        assert!(result.confirm(Address::repeat_byte(2), 10));
        assert_eq!(result.status(), DeploymentStatus::Confirmed);

        assert!(!result.fail());
        assert!(!result.confirm(Address::repeat_byte(3), 11));

        assert_eq!(result.status(), DeploymentStatus::Confirmed);
        assert_eq!(result.contract_address, Some(Address::repeat_byte(2)));
        assert_eq!(result.block_number, Some(10));
    }

    #[test]
    fn failed_is_terminal() {
        let mut result = pending();

        assert!(result.fail());
        assert!(!result.confirm(Address::repeat_byte(2), 10));

        assert_eq!(result.status(), DeploymentStatus::Failed);
        assert_eq!(result.contract_address, None);
        assert_eq!(result.transaction_hash, H256::repeat_byte(1));
    }
}
