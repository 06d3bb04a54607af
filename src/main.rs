use std::sync::Arc;
use std::time::Duration;

use artifact::ContractArtifact;
use chain::EthersConnector;
use clap::Parser;
use cli::{Args, Command, DeployArgs};
use config::Config;
use deployment::{Deployer, DeploymentRequest};
use error::DeployError;
use ethers::utils::to_checksum;
use eyre::ContextCompat;
use network::NetworkRegistry;
use report::Report;
use secrets::EnvSecretStore;
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub mod artifact;
pub mod chain;
pub mod error;
pub mod network;
pub mod parameters;
pub mod secrets;
pub mod serde_utils;
pub mod types;

mod cli;
mod config;
mod report;

mod deployment;

async fn deploy(config: Config, args: DeployArgs) -> eyre::Result<()> {
    let registry = Arc::new(config.registry()?);

    let network = args
        .network
        .or_else(|| config.default_network.clone())
        .context("No network selected, pass --network or set defaultNetwork")?;

    let parameters = config.parameters()?.with_overrides(
        args.params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    )?;

    let artifact_path = args
        .artifact
        .unwrap_or_else(artifact::default_artifact_path);
    let artifact = ContractArtifact::load(&artifact_path).await?;

    let mut settings = config.confirmation.settings();
    if let Some(confirmations) = args.confirmations {
        settings.confirmations = confirmations;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.timeout = Duration::from_secs(timeout_secs);
    }

    let mut secrets = EnvSecretStore::new();
    if let Some(prefix) = args.secret_prefix {
        secrets = secrets.with_prefix(prefix);
    }

    let deployer = Deployer::new(
        registry,
        Arc::new(secrets),
        Arc::new(EthersConnector),
        settings,
    );

    info!(%network, "Deploying {}", artifact.contract_name);

    let outcome = deployer
        .deploy(DeploymentRequest {
            network: &network,
            parameters: &parameters,
            artifact: &artifact,
            rpc_url_override: args.rpc_url,
        })
        .await;

    let profile = deployer.registry().resolve(&network).ok();

    if let Some(report_path) = args.report.as_ref() {
        let result = match &outcome {
            Ok(result) => Some(result.clone()),
            Err(err) => err.result().cloned(),
        };

        if let Some(result) = result {
            if let Err(err) =
                Report::new(result, &parameters, profile).write(report_path).await
            {
                warn!("Failed to write report: {err:?}");
            }
        }
    }

    let result = outcome?;

    let address = result
        .contract_address
        .context("Confirmed deployment without contract address")?;

    info!(status = %result.status(), tx = ?result.transaction_hash, "Done");

    println!("Contract address: {}", to_checksum(&address, None));

    if let Some(url) =
        profile.and_then(|p| p.explorer_address_url(&format!("{address:?}")))
    {
        println!("Explorer: {url}");
    }

    Ok(())
}

fn print_networks(registry: &NetworkRegistry, default_network: Option<&str>) {
    println!("Networks ({}):", registry.len());
    for profile in registry.profiles() {
        let marker = if Some(profile.id.as_str()) == default_network {
            " (default)"
        } else {
            ""
        };

        println!("  {}{marker}", profile.id);
        println!("    Chain id: {}", profile.chain_id);
        println!("    RPC: {}", profile.rpc_endpoint_url);
        println!("    Credential: {}", profile.signing_credential_ref);
        if let Some(browser) = profile.explorer_browser_url.as_ref() {
            println!("    Explorer: {browser}");
        }
    }
}

async fn start(args: Args) -> eyre::Result<()> {
    let config: Config = serde_utils::read_deserialize(&args.config).await?;

    match args.command {
        Command::Deploy(deploy_args) => deploy(config, deploy_args).await?,
        Command::Networks => {
            let registry = config.registry()?;
            print_networks(&registry, config.default_network.as_deref());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    dotenv::dotenv().ok();

    let indicatif_layer = IndicatifLayer::new();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(indicatif_layer.get_stderr_writer())
                .with_filter(filter),
        )
        .with(indicatif_layer)
        .with(ErrorLayer::default())
        .init();

    let args = Args::parse();

    match start(args).await {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(deploy_err) = err.downcast_ref::<DeployError>() {
                eprintln!("{}: {deploy_err}", deploy_err.kind());
            }

            tracing::error!("{:?}", err);
            std::process::exit(1)
        }
    }
}
