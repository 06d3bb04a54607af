use std::sync::Arc;

use async_trait::async_trait;
use ethers::prelude::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer, Wallet};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Bytes, Eip1559TransactionRequest, TransactionReceipt,
    TransactionRequest, H256,
};
use reqwest::Url;
use tracing::{info, instrument};

use crate::error::DeployError;
use crate::network::NetworkProfile;
use crate::secrets::PrivateKey;
use crate::types::ChainId;

/// The JSON-RPC calls a deployment needs from one endpoint.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<ChainId, DeployError>;

    /// Broadcasts a contract creation transaction and returns its hash
    /// without waiting for inclusion.
    async fn submit_creation(&self, data: Bytes) -> Result<H256, DeployError>;

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, DeployError>;

    async fn block_number(&self) -> Result<u64, DeployError>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        profile: &NetworkProfile,
        endpoint: Url,
        key: PrivateKey,
    ) -> Result<Arc<dyn ChainClient>, DeployError>;
}

pub struct RpcSigner(pub Arc<SignerMiddleware<Provider<Http>, LocalWallet>>);

pub struct EthersChainClient {
    signer: RpcSigner,
    legacy: bool,
}

impl EthersChainClient {
    pub fn address(&self) -> Address {
        self.signer.0.address()
    }
}

#[async_trait]
impl ChainClient for EthersChainClient {
    async fn chain_id(&self) -> Result<ChainId, DeployError> {
        let chain_id = self
            .signer
            .0
            .get_chainid()
            .await
            .map_err(DeployError::submission)?;

        Ok(ChainId(chain_id.as_u64()))
    }

    #[instrument(skip_all, fields(legacy = self.legacy))]
    async fn submit_creation(&self, data: Bytes) -> Result<H256, DeployError> {
        let mut tx: TypedTransaction = if self.legacy {
            TransactionRequest::new().data(data).into()
        } else {
            Eip1559TransactionRequest::new().data(data).into()
        };

        self.signer
            .0
            .fill_transaction(&mut tx, None)
            .await
            .map_err(DeployError::submission)?;

        let pending = self
            .signer
            .0
            .send_transaction(tx, None)
            .await
            .map_err(DeployError::submission)?;

        Ok(pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, DeployError> {
        self.signer
            .0
            .get_transaction_receipt(hash)
            .await
            .map_err(DeployError::submission)
    }

    async fn block_number(&self) -> Result<u64, DeployError> {
        let block_number = self
            .signer
            .0
            .get_block_number()
            .await
            .map_err(DeployError::submission)?;

        Ok(block_number.as_u64())
    }
}

/// Connects over HTTP JSON-RPC with a local wallet.
///
/// Nonces are filled in from the node's pending count for every submission.
/// Two concurrent deployments signed by the same key can therefore collide,
/// callers must serialize them.
#[derive(Debug, Default, Clone, Copy)]
pub struct EthersConnector;

#[async_trait]
impl Connector for EthersConnector {
    #[instrument(skip_all, fields(network = %profile.id))]
    async fn connect(
        &self,
        profile: &NetworkProfile,
        endpoint: Url,
        key: PrivateKey,
    ) -> Result<Arc<dyn ChainClient>, DeployError> {
        let provider = Provider::<Http>::try_from(endpoint.as_str())
            .map_err(DeployError::submission)?;

        let wallet = Wallet::from(key.key).with_chain_id(profile.chain_id.0);

        let client = EthersChainClient {
            signer: RpcSigner(Arc::new(SignerMiddleware::new(provider, wallet))),
            legacy: profile.legacy_transactions,
        };

        info!(deployer = ?client.address(), "Connected");

        Ok(Arc::new(client))
    }
}
