use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::Url;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::parameters::parse_key_value;
use crate::types::Confirmations;

#[derive(Debug, Clone, Parser)]
#[clap(rename_all = "kebab-case", version, about)]
pub struct Args {
    /// Path to the deployment configuration file
    #[clap(short, long, env, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Deploy the marketplace contract to a network
    Deploy(DeployArgs),
    /// List the configured networks
    Networks,
}

#[derive(Debug, Clone, clap::Args)]
#[clap(rename_all = "kebab-case")]
pub struct DeployArgs {
    /// Network id from the configuration, defaults to `defaultNetwork`
    #[clap(short, long, env = "DEPLOY_NETWORK")]
    pub network: Option<String>,

    /// Constructor parameter override, e.g. `--param fuelRate=6300000000000000`
    #[clap(short, long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Compiled contract artifact (Hardhat or Foundry JSON)
    #[clap(short, long, env)]
    pub artifact: Option<PathBuf>,

    /// Use this endpoint instead of the one in the network profile
    #[clap(long, env)]
    pub rpc_url: Option<Url>,

    /// Prefix prepended to credential references when reading the environment
    #[clap(long, env)]
    pub secret_prefix: Option<String>,

    #[clap(long)]
    pub confirmations: Option<Confirmations>,

    /// Give up waiting for confirmation after this many seconds
    #[clap(long)]
    pub timeout_secs: Option<u64>,

    /// Write the deployment outcome to this YAML file
    #[clap(short, long, env)]
    pub report: Option<PathBuf>,
}
