//! Example tool to batch an ERC-20 approval through a proxy account.
//!
//! Usage:
//!   cargo run --example submit_batch -- \
//!     --rpc-url <url> \
//!     --private-key <private_key> \
//!     --token <token_address> \
//!     --spender <spender_address> \
//!     --amount <base_units>

use std::sync::Arc;
use std::time::Duration;

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, U256};
use alloy_provider::ProviderBuilder;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, SolCall};
use clap::Parser;
use eyre::Result;
use proxy_batcher::{
    AlloyChainClient, DeploymentRegistry, DirectBackend, LocalHashSigner, Operation, ProxyBatcher,
};

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

#[derive(Parser, Debug)]
#[command(name = "submit_batch")]
#[command(about = "Batch an ERC-20 approval through a proxy account")]
struct Args {
    /// JSON-RPC endpoint to submit through
    #[arg(long)]
    rpc_url: String,

    /// Private key of the proxy owner
    #[arg(long)]
    private_key: String,

    /// ERC-20 token contract
    #[arg(long)]
    token: Address,

    /// Spender to approve
    #[arg(long)]
    spender: Address,

    /// Allowance in token base units
    #[arg(long)]
    amount: U256,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let key: PrivateKeySigner = args.private_key.parse()?;
    let owner = key.address();
    let wallet = EthereumWallet::from(key.clone());
    let provider = ProviderBuilder::new().wallet(wallet).connect(&args.rpc_url).await?;

    let chain = Arc::new(AlloyChainClient::new(provider));
    let backend = Arc::new(DirectBackend::new(chain.clone()));
    let signer = Arc::new(LocalHashSigner::new(key));
    let batcher = ProxyBatcher::connect(
        &DeploymentRegistry::with_default_networks(),
        chain,
        signer,
        backend,
    )
    .await?;

    println!("proxy account: {}", batcher.proxy_address(owner)?);

    let approve = IERC20::approveCall { spender: args.spender, amount: args.amount };
    let batch = [Operation::call_with_payload(args.token, approve.abi_encode().into())];
    let reference = batcher.submit_batch(&batch, owner).await?;
    println!("submitted: {}", reference.hash);

    match batcher.wait_for_inclusion(&reference, Duration::from_secs(2), 30).await? {
        Some(block) => println!("included in block {block}"),
        None => println!("still pending; check the hash manually"),
    }
    Ok(())
}
