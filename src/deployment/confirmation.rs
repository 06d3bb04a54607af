use std::time::Duration;

use ethers::types::{TransactionReceipt, H256};
use indicatif::ProgressStyle;
use tracing::{debug, info, instrument, warn, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use super::DeploymentResult;
use crate::chain::ChainClient;
use crate::error::DeployError;
use crate::types::Confirmations;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationSettings {
    /// Blocks counted from (and including) the one holding the transaction.
    pub confirmations: Confirmations,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            confirmations: Confirmations(1),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Waits for the pending deployment to reach its terminal state.
///
/// A timeout only stops the local wait. The transaction stays broadcast and
/// may still be mined later, so the failed result keeps its hash.
#[instrument(skip_all, fields(tx = ?result.transaction_hash))]
pub async fn wait_for_confirmation(
    client: &dyn ChainClient,
    mut result: DeploymentResult,
    settings: &ConfirmationSettings,
) -> Result<DeploymentResult, DeployError> {
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner} {span_name}{{{span_fields}}} [{elapsed}]",
    ) {
        Span::current().pb_set_style(&style);
    }

    let wait = poll_receipt(client, result.transaction_hash, settings);

    match tokio::time::timeout(settings.timeout, wait).await {
        Ok(Ok((receipt, included))) => finalize(result, receipt, included),
        Ok(Err(err)) => {
            warn!(
                tx = ?result.transaction_hash,
                "Lost track of a broadcast transaction: {err}"
            );
            Err(untracked(result, err))
        }
        Err(_elapsed) => {
            result.fail();
            warn!(timeout = ?settings.timeout, "Gave up waiting for confirmation");

            Err(DeployError::DeploymentTimeout {
                result: Box::new(result),
                timeout: settings.timeout,
            })
        }
    }
}

async fn poll_receipt(
    client: &dyn ChainClient,
    hash: H256,
    settings: &ConfirmationSettings,
) -> Result<(TransactionReceipt, u64), DeployError> {
    let required = settings.confirmations.0.max(1);

    loop {
        if let Some(receipt) = client.transaction_receipt(hash).await? {
            if let Some(included) = receipt.block_number.map(|b| b.as_u64()) {
                if receipt.status == Some(0.into()) {
                    return Ok((receipt, included));
                }

                let head = client.block_number().await?;
                let depth = (head + 1).saturating_sub(included);

                if depth >= required {
                    return Ok((receipt, included));
                }

                debug!(included, head, depth, required, "Awaiting confirmations");
            }
        }

        tokio::time::sleep(settings.poll_interval).await;
    }
}

fn finalize(
    mut result: DeploymentResult,
    receipt: TransactionReceipt,
    included: u64,
) -> Result<DeploymentResult, DeployError> {
    if receipt.status != Some(1.into()) {
        result.fail();
        return Err(DeployError::DeploymentReverted {
            result: Box::new(result),
        });
    }

    let Some(address) = receipt.contract_address else {
        return Err(untracked(result, "receipt carries no contract address"));
    };

    result.confirm(address, included);

    info!(?address, block = included, "Deployment confirmed");

    Ok(result)
}

/// The transaction is out there but its outcome is unknown, the hash has to
/// survive in the error.
fn untracked(
    mut result: DeploymentResult,
    reason: impl std::fmt::Display,
) -> DeployError {
    result.fail();

    DeployError::Untracked {
        result: Box::new(result),
        reason: reason.to_string(),
    }
}
