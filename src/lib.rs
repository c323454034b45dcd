// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! # bridge-readiness
//!
//! Transaction-readiness core for bridging tokens between EVM chains.
//!
//! Given what the user wants to bridge, a [`BridgeSession`] keeps track of:
//!
//! - the spendable balance of the token on the source chain
//! - whether an `approve` transaction is needed first (or a permit suffices)
//! - a gas estimate refreshed on every new block, debounced
//! - the amount left to bridge once the fee is paid
//! - fiat prices for the fee and the amount
//!
//! and drives the approve and bridge transactions, classifying failures into
//! user cancellations, wrong-network prompts, missing gas funds and generic
//! errors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bridge_readiness::providers::{
//!     AlloyBridgeClient, AlloyChainRpc, AlloyTokenService, AlloyWallet, BlockPoller,
//!     HttpPriceOracle, TokioClock,
//! };
//! use bridge_readiness::{BridgeIntent, BridgeSession, ChainConfig, Collaborators, ReadinessConfig, Token};
//! use alloy_chains::{Chain, NamedChain};
//! use alloy_primitives::{address, utils::parse_ether};
//! use alloy_provider::ProviderBuilder;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReadinessConfig::from_env()?;
//! let account = address!("742d35Cc6634C0532925a3b844Bc9e7595f8fA0d");
//! let provider = ProviderBuilder::new().connect("http://localhost:8545").await?;
//!
//! let rpc = AlloyChainRpc::new(provider.clone(), TokioClock, &config);
//! let poller = BlockPoller::new(rpc.clone(), TokioClock, rpc.block_feed(), config.block_poll_interval);
//! tokio::spawn(async move { poller.run().await });
//!
//! let collaborators = Collaborators::builder()
//!     .wallet(Arc::new(AlloyWallet::connect(provider.clone(), account).await?))
//!     .rpc(Arc::new(rpc))
//!     .tokens(Arc::new(AlloyTokenService::new(provider.clone(), 1)))
//!     .bridge(Arc::new(AlloyBridgeClient::new(provider, 1).with_config(&config)))
//!     .prices(Arc::new(HttpPriceOracle::new("https://prices.example.com", config.fiat_precision)?))
//!     .build();
//! let session = Arc::new(BridgeSession::new(collaborators, config));
//!
//! let bridge_contract = address!("2a3DD3EB832aF982ec71669E178424b10Dca2EDe");
//! let intent = BridgeIntent::builder()
//!     .source(ChainConfig::builder().chain(NamedChain::Mainnet).name("Ethereum").bridge_contract(bridge_contract).build())
//!     .destination(ChainConfig::builder().chain(Chain::from_id(1101)).name("Polygon zkEVM").bridge_contract(bridge_contract).network_id(1).build())
//!     .token(Token::native())
//!     .amount(parse_ether("0.5")?)
//!     .destination_address(account)
//!     .build();
//!
//! let runner = session.clone();
//! tokio::spawn(async move { runner.run(intent).await });
//!
//! let mut updates = session.subscribe();
//! updates.wait_for(|state| state.can_bridge()).await?;
//! let tx_hash = session.bridge().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Public API
//!
//! - [`BridgeSession`], [`Collaborators`] and [`ReadinessState`] - the orchestration core
//! - [`BridgeIntent`], [`ChainConfig`], [`Token`] and [`Connection`] - what is bridged, from where
//! - [`AsyncResult`] - lifecycle of async-derived values
//! - [`Gas`], [`TransferableAmount`] and [`max_transferable_amount`] - fee arithmetic
//! - [`ErrorClassifier`] and [`ErrorKind`] - failure classification
//! - [`BridgeError`] and [`Result`] - error types
//! - [`traits`] - collaborator interfaces, [`providers`] - their alloy/reqwest implementations
//! - [`testing`] - fakes for tests

mod classify;
mod config;
mod context;
mod error;
mod fee;
mod intent;
mod readiness;
mod task;

pub mod contracts;
pub mod provider;
pub mod providers;
pub mod testing;
pub mod traits;

pub use classify::{classify_message, DefaultErrorClassifier, ErrorClassifier, ErrorKind};
pub use config::{
    ReadinessConfig, DEFAULT_BLOCK_POLL_INTERVAL, DEFAULT_GAS_BUFFER_PERCENT,
    DEFAULT_MAX_ETHER_BRIDGE,
};
pub use context::{ContextToken, SelectionEpoch};
pub use error::{BridgeError, Result};
pub use fee::{
    format_token_amount, max_transferable_amount, Gas, TransferableAmount, FEE_BASE_ERROR,
    GAS_DATA_UNAVAILABLE, INSUFFICIENT_FUNDS_FOR_FEES,
};
pub use intent::{BridgeIntent, ChainConfig, Connection, Token, NATIVE_DECIMALS, NATIVE_SYMBOL};
pub use readiness::{
    fiat_value, format_fiat_amount, lookup_price, resolve_approval_requirement, resolve_balance,
    BridgeSession, Collaborators, ReadinessState,
};
pub use task::AsyncResult;

// Public module for advanced users who need custom instrumentation
pub mod spans;
