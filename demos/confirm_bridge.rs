// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Prepares a native ETH bridge from Ethereum to Polygon zkEVM and prints
//! the confirmation screen values as they update with each block.
//!
//! Environment variables (set these in .env file):
//! - BRIDGE_PRIVATE_KEY: Your wallet private key (must start with 0x)
//! - BRIDGE_RPC_URL: Ethereum RPC endpoint
//! - BRIDGE_AMOUNT: Amount of ETH to bridge (default: 0.01)
//! - BRIDGE_PRICE_API_URL: Price API base URL (optional, fiat values are skipped without it)
//! - BRIDGE_SUBMIT: Set to `true` to actually send the bridge transaction
//!
//! Run with: `cargo run --example confirm_bridge`

use alloy_chains::{Chain, NamedChain};
use alloy_network::EthereumWallet;
use alloy_primitives::{address, utils::parse_ether, Address};
use alloy_provider::ProviderBuilder;
use alloy_signer_local::PrivateKeySigner;
use bridge_readiness::providers::{
    AlloyBridgeClient, AlloyChainRpc, AlloyTokenService, AlloyWallet, BlockPoller, HttpPriceOracle,
    TokioClock,
};
use bridge_readiness::{
    format_token_amount, BridgeIntent, BridgeSession, ChainConfig, Collaborators,
    ReadinessConfig, Token,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const ZKEVM_BRIDGE: Address = address!("2a3DD3EB832aF982ec71669E178424b10Dca2EDe");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🌉 Bridge confirmation: Ethereum → Polygon zkEVM");
    println!("================================================\n");

    let private_key =
        std::env::var("BRIDGE_PRIVATE_KEY").expect("BRIDGE_PRIVATE_KEY must be set in .env file");
    let rpc_url = std::env::var("BRIDGE_RPC_URL").expect("BRIDGE_RPC_URL must be set in .env file");
    let amount = std::env::var("BRIDGE_AMOUNT").unwrap_or_else(|_| "0.01".to_string());
    let price_api = std::env::var("BRIDGE_PRICE_API_URL").ok();
    let submit = std::env::var("BRIDGE_SUBMIT").is_ok_and(|value| value == "true");

    let signer: PrivateKeySigner = private_key.parse().expect("Invalid BRIDGE_PRIVATE_KEY format");
    let account = signer.address();
    println!("📍 Wallet: {account}");

    let mut config = ReadinessConfig::from_env()?;
    if price_api.is_none() {
        config = config.with_fiat_enabled(false);
    }

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(rpc_url.parse()?);

    // 1. Collaborators
    println!("1️⃣  Connecting...");
    let chain_id = NamedChain::Mainnet as u64;
    let rpc = AlloyChainRpc::new(provider.clone(), TokioClock, &config);
    let poller = BlockPoller::new(
        rpc.clone(),
        TokioClock,
        rpc.block_feed(),
        config.block_poll_interval,
    );
    tokio::spawn(async move { poller.run().await });

    let prices = HttpPriceOracle::new(
        price_api.as_deref().unwrap_or("http://localhost"),
        config.fiat_precision,
    )?;
    let collaborators = Collaborators::builder()
        .wallet(Arc::new(AlloyWallet::connect(provider.clone(), account).await?))
        .rpc(Arc::new(rpc))
        .tokens(Arc::new(AlloyTokenService::new(provider.clone(), chain_id)))
        .bridge(Arc::new(
            AlloyBridgeClient::new(provider, chain_id).with_config(&config),
        ))
        .prices(Arc::new(prices))
        .build();
    let session = Arc::new(BridgeSession::new(collaborators, config));

    // 2. Selection
    let intent = BridgeIntent::builder()
        .source(
            ChainConfig::builder()
                .chain(NamedChain::Mainnet)
                .name("Ethereum")
                .bridge_contract(ZKEVM_BRIDGE)
                .build(),
        )
        .destination(
            ChainConfig::builder()
                .chain(Chain::from_id(1101))
                .name("Polygon zkEVM")
                .bridge_contract(ZKEVM_BRIDGE)
                .network_id(1)
                .build(),
        )
        .token(Token::native())
        .amount(parse_ether(&amount)?)
        .destination_address(account)
        .build();

    println!("2️⃣  Preparing {amount} ETH...\n");
    let runner = session.clone();
    let run = tokio::spawn(async move { runner.run(intent).await });

    // 3. Confirmation screen
    let mut updates = session.subscribe();
    let state = updates
        .wait_for(|state| state.is_ready() || state.estimated_gas.error().is_some())
        .await?
        .clone();

    if let Some(error) = state.estimated_gas.error() {
        println!("❌ {error}");
        session.abandon();
        run.await??;
        return Ok(());
    }

    let balance = state.balance.unwrap_or_default();
    println!("3️⃣  Confirmation:");
    println!("   Balance: {} ETH", format_token_amount(balance, 18)?);
    if let Some(fee) = state.fee_summary(session.config().fiat_precision, "$") {
        println!("   Fee: {fee}");
    }
    if let Some(limit) = state.max_ether_bridge {
        println!("   Bridge limit: {} ETH", format_token_amount(limit, 18)?);
    }
    match state.transferable.and_then(|amount| amount.to_submit()) {
        Some(amount) => println!("   You will bridge: {} ETH", format_token_amount(amount, 18)?),
        None => {
            if let Some(warning) = state.fee_warning() {
                println!("\n⚠️  {warning}");
            }
        }
    }
    if state.amount_changed {
        println!("   (amount adjusted to leave room for the fee)");
    }

    if !submit || !state.can_bridge() {
        println!("\n✅ Dry run complete. Set BRIDGE_SUBMIT=true to send the transaction.");
        session.abandon();
        run.await??;
        return Ok(());
    }

    // 4. Submit
    println!("\n4️⃣  Sending bridge transaction...");
    match session.bridge().await {
        Some(tx_hash) => println!("   ✅ Bridge TX: {tx_hash}"),
        None => {
            println!("   ❌ Bridge transaction was not sent");
            session.abandon();
        }
    }
    run.await??;

    Ok(())
}
