use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

use eth_transfer_sync::chain::{ChainRpc, RpcClient};
use eth_transfer_sync::config::{load_config, WatcherConfig};
use eth_transfer_sync::observability::logging;
use eth_transfer_sync::transfer::Asset;
use eth_transfer_sync::wallet::address::new_address;
use eth_transfer_sync::wallet::keystore::KEYSTORE_PASSWORD_ENV_VAR;
use eth_transfer_sync::wallet::{
    ChainNonceSource, KeySigner, KeystoreSigner, TransferRequest, TransferSigner, TxBuilder,
};

const NATIVE_GAS_LIMIT: u64 = 21_000;
const TOKEN_GAS_LIMIT: u64 = 100_000;

#[derive(Parser)]
#[command(name = "transfer-cli")]
#[command(about = "Balances, transfers and status for the transfer sync daemon", long_about = None)]
struct Cli {
    /// Daemon configuration; supplies the RPC endpoint and gas settings.
    #[arg(short, long, env = "TRANSFER_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// RPC endpoint, overrides the configuration.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Admin endpoint of a running daemon.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key.
    #[arg(short, long, env = "TRANSFER_SYNC_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show sync progress of a running daemon
    Status,
    /// Native or token balance of an address
    Balance {
        address: String,
        /// ERC20 contract; native balance when omitted
        #[arg(long)]
        token: Option<String>,
        /// Block height; latest when omitted
        #[arg(long)]
        height: Option<u64>,
    },
    /// Sign and broadcast a native or token transfer
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Amount in the asset's smallest unit
        #[arg(long)]
        value: String,
        /// ERC20 contract; native transfer when omitted
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        gas_limit: Option<u64>,
        /// Fixed gas price in wei
        #[arg(long)]
        gas_price: Option<u128>,
        /// Keystore directory; the key comes from the environment when omitted
        #[arg(long)]
        keystore: Option<PathBuf>,
    },
    /// Generate a new key pair
    NewAddress,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init("warn");

    match cli.command {
        Commands::Status => {
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
            );
            let res = reqwest::Client::new()
                .get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Balance {
            ref address,
            ref token,
            height,
        } => {
            let owner = parse_address("address", address)?;
            let asset = parse_asset(token.as_deref())?;
            let config = load(&cli)?;
            let builder = connect_builder(&config).await?;

            let balance = match asset {
                Asset::Native => builder.native_balance(owner, height).await?,
                Asset::Token(token) => builder.token_balance(token, owner, height).await?,
            };
            print_json(&json!({
                "address": owner,
                "asset": asset,
                "balance": balance.to_string(),
            }))?;
        }
        Commands::Send {
            ref from,
            ref to,
            ref value,
            ref token,
            gas_limit,
            gas_price,
            ref keystore,
        } => {
            let from = parse_address("from", from)?;
            let to = parse_address("to", to)?;
            let value: U256 = value
                .parse()
                .map_err(|e| format!("invalid value '{}': {}", value, e))?;
            let asset = parse_asset(token.as_deref())?;
            let gas_limit = gas_limit.unwrap_or(match asset {
                Asset::Native => NATIVE_GAS_LIMIT,
                Asset::Token(_) => TOKEN_GAS_LIMIT,
            });

            let signer: Box<dyn TransferSigner> = match keystore {
                Some(dir) => {
                    let password = std::env::var(KEYSTORE_PASSWORD_ENV_VAR)
                        .map_err(|_| format!("{} not set", KEYSTORE_PASSWORD_ENV_VAR))?;
                    Box::new(KeystoreSigner::open_in_dir(dir, from, password)?)
                }
                None => Box::new(KeySigner::from_env()?),
            };

            let config = load(&cli)?;
            let mut builder = connect_builder(&config).await?;
            if gas_price.is_some() {
                builder = builder.with_gas_price(gas_price);
            }

            let request = TransferRequest {
                from,
                to,
                gas_limit,
                value,
                asset,
            };
            let sent = builder.transfer(&request, signer.as_ref()).await?;
            print_json(&json!({
                "tx_hash": sent.tx_hash,
                "nonce": sent.nonce,
                "asset": asset,
            }))?;
        }
        Commands::NewAddress => {
            let (private_key, address) = new_address();
            print_json(&json!({
                "address": address,
                "private_key": private_key,
            }))?;
        }
    }

    Ok(())
}

fn load(cli: &Cli) -> Result<WatcherConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => WatcherConfig::default(),
    };
    if let Some(url) = &cli.rpc_url {
        config.chain.rpc_url = url.clone();
    }
    Ok(config)
}

async fn connect_builder(config: &WatcherConfig) -> Result<TxBuilder, Box<dyn std::error::Error>> {
    let chain: Arc<dyn ChainRpc> = Arc::new(RpcClient::connect(config.chain.clone()).await?);
    let nonces = Arc::new(ChainNonceSource::new(chain.clone()));
    let builder = TxBuilder::connect(chain, nonces)
        .await?
        .with_gas_price(config.transactions.gas_price_wei.map(u128::from))
        .with_max_gas_price_gwei(config.transactions.max_gas_price_gwei);
    Ok(builder)
}

fn parse_address(name: &str, value: &str) -> Result<Address, String> {
    value
        .parse()
        .map_err(|e| format!("invalid {} address '{}': {}", name, value, e))
}

fn parse_asset(token: Option<&str>) -> Result<Asset, String> {
    match token {
        Some(token) => parse_address("token", token).map(Asset::Token),
        None => Ok(Asset::Native),
    }
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    print_json(&json)
}
