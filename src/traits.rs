// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Collaborator interfaces consumed by the readiness core.
//!
//! The core never talks to a node, wallet or price feed directly. Each
//! capability sits behind one of these traits so production code can plug in
//! the alloy-backed implementations from [`crate::providers`] while tests use
//! the fakes from [`crate::testing`] to script races and failures.
//!
//! # Example: Implementing a Test Fake
//!
//! ```rust,ignore
//! use bridge_readiness::traits::PriceOracle;
//!
//! struct FixedPrice(U256);
//!
//! #[async_trait::async_trait]
//! impl PriceOracle for FixedPrice {
//!     async fn token_price(&self, _chain: &ChainConfig, _token: &Token) -> Result<U256> {
//!         Ok(self.0)
//!     }
//! }
//! ```

use alloy_primitives::{Address, TxHash, U256};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::error;

use crate::error::Result;
use crate::fee::Gas;
use crate::intent::{BridgeIntent, ChainConfig, Connection, Token};

/// The connected wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Current account and chain, `None` while disconnected
    fn connection(&self) -> Option<Connection>;

    /// Signs and broadcasts a transaction, returning its hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the user rejects the prompt, the wallet is on the
    /// wrong chain, or the node refuses the transaction.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;
}

/// Read access to the source chain.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Native asset balance of `account`
    async fn native_balance(&self, account: Address) -> Result<U256>;

    /// Latest block number
    async fn block_number(&self) -> Result<u64>;

    /// Subscribes to the chain's shared new-block feed.
    ///
    /// All subscribers share one underlying listener; dropping the receiver
    /// unsubscribes.
    fn subscribe_blocks(&self) -> broadcast::Receiver<u64>;

    /// Waits until `tx_hash` is mined.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction reverted or was not mined in time.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<()>;
}

/// ERC-20 operations on the source chain.
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn balance_of(&self, chain: &ChainConfig, token: Address, account: Address)
        -> Result<U256>;

    async fn allowance(
        &self,
        chain: &ChainConfig,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256>;

    /// Whether `token` accepts EIP-2612 permits signed by `account`
    async fn is_permit_supported(
        &self,
        chain: &ChainConfig,
        token: Address,
        account: Address,
    ) -> Result<bool>;

    /// Builds, but does not send, an `approve(spender, amount)` transaction
    fn approve_transaction(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> TransactionRequest;
}

/// The bridge contract on the source chain.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Estimates the cost of bridging `intent` from `from`.
    ///
    /// # Errors
    ///
    /// Fails with a message containing "insufficient funds" when `from`
    /// cannot pay for gas.
    async fn estimate_bridge_gas(&self, intent: &BridgeIntent, from: Address) -> Result<Gas>;

    /// Builds the bridge transaction for `amount` using a previous estimate
    fn bridge_transaction(
        &self,
        intent: &BridgeIntent,
        from: Address,
        amount: U256,
        gas: &Gas,
    ) -> Result<TransactionRequest>;

    /// Upper bound on native asset bridges enforced by the contract
    async fn max_ether_bridge(&self, chain: &ChainConfig) -> Result<U256>;
}

/// Fiat prices.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Fiat price of one whole `token`, as a fixed-point value
    async fn token_price(&self, chain: &ChainConfig, token: &Token) -> Result<U256>;
}

/// Time source for polling loops.
///
/// Lets tests drive the block poller and receipt polling without real sleeps.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);

    fn now(&self) -> Instant;
}

/// Process-wide sink for failures the user must see.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Receives control once a bridge transaction has been submitted.
pub trait Navigator: Send + Sync {
    fn bridge_submitted(&self, intent: &BridgeIntent, tx_hash: TxHash);
}

/// Reporter that emits failures as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, message: &str) {
        error!(error = %message, event = "error_reported");
    }
}
