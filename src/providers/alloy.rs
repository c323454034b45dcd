// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Alloy-backed chain access and wallet.

use alloy_network::{Ethereum, ReceiptResponse};
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, trace};

use super::block_poller::BlockFeed;
use super::tokio_clock::TokioClock;
use crate::config::ReadinessConfig;
use crate::error::{BridgeError, Result};
use crate::intent::Connection;
use crate::traits::{ChainRpc, Clock, WalletProvider};

/// Read access to one chain through an alloy [`Provider`].
///
/// New blocks are delivered through a shared [`BlockFeed`]; pair it with a
/// [`BlockPoller`](super::BlockPoller) to keep the feed running.
///
/// # Examples
///
/// ```rust,no_run
/// use bridge_readiness::providers::{AlloyChainRpc, TokioClock};
/// use bridge_readiness::ReadinessConfig;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new()
///     .connect("https://eth.llamarpc.com")
///     .await?;
///
/// let rpc = AlloyChainRpc::new(provider, TokioClock, &ReadinessConfig::default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AlloyChainRpc<P, C = TokioClock> {
    provider: P,
    clock: C,
    feed: BlockFeed,
    confirmation_max_attempts: u32,
    confirmation_poll_interval: Duration,
}

impl<P, C> AlloyChainRpc<P, C>
where
    P: Provider<Ethereum> + Clone,
    C: Clock,
{
    pub fn new(provider: P, clock: C, config: &ReadinessConfig) -> Self {
        Self {
            provider,
            clock,
            feed: BlockFeed::default(),
            confirmation_max_attempts: config.confirmation_max_attempts,
            confirmation_poll_interval: config.confirmation_poll_interval,
        }
    }

    /// The feed [`subscribe_blocks`](ChainRpc::subscribe_blocks) hands out
    pub fn block_feed(&self) -> BlockFeed {
        self.feed.clone()
    }

    pub fn inner(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P, C> ChainRpc for AlloyChainRpc<P, C>
where
    P: Provider<Ethereum> + Clone + Send + Sync,
    C: Clock,
{
    #[instrument(skip(self), fields(account = %account))]
    async fn native_balance(&self, account: Address) -> Result<U256> {
        trace!("Fetching native balance");
        let balance = self.provider.get_balance(account).await?;

        debug!(balance = %balance, "Native balance retrieved");
        Ok(balance)
    }

    #[instrument(skip(self))]
    async fn block_number(&self) -> Result<u64> {
        trace!("Fetching current block number");
        let block_number = self.provider.get_block_number().await?;

        debug!(
            block_number = block_number,
            "Current block number retrieved"
        );
        Ok(block_number)
    }

    fn subscribe_blocks(&self) -> broadcast::Receiver<u64> {
        self.feed.subscribe()
    }

    #[instrument(skip(self), fields(tx_hash = %tx_hash))]
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<()> {
        for attempt in 1..=self.confirmation_max_attempts {
            let receipt = self.provider.get_transaction_receipt(tx_hash).await?;

            match receipt {
                Some(receipt) if receipt.status() => {
                    info!(
                        attempt = attempt,
                        block_number = ?receipt.block_number(),
                        event = "transaction_confirmed"
                    );
                    return Ok(());
                }
                Some(_) => {
                    return Err(BridgeError::TransactionFailed {
                        reason: format!("transaction {tx_hash} reverted"),
                    });
                }
                None => {
                    trace!(attempt = attempt, event = "receipt_pending");
                    self.clock.sleep(self.confirmation_poll_interval).await;
                }
            }
        }

        Err(BridgeError::TransactionFailed {
            reason: format!(
                "transaction {tx_hash} not mined after {} attempts",
                self.confirmation_max_attempts
            ),
        })
    }
}

/// Wallet backed by an alloy provider with a signer attached.
///
/// The connection snapshot is refreshed with [`refresh`](Self::refresh)
/// whenever the host application learns the wallet changed.
#[derive(Debug)]
pub struct AlloyWallet<P> {
    provider: P,
    connection: watch::Sender<Option<Connection>>,
}

impl<P> AlloyWallet<P>
where
    P: Provider<Ethereum>,
{
    /// Connects `account`, reading the chain id from the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain id cannot be read.
    pub async fn connect(provider: P, account: Address) -> Result<Self> {
        let chain_id = provider.get_chain_id().await?;

        info!(account = %account, chain_id, event = "wallet_connected");
        Ok(Self {
            provider,
            connection: watch::Sender::new(Some(Connection { account, chain_id })),
        })
    }

    /// Re-reads the chain id and returns the new connection
    pub async fn refresh(&self) -> Result<Option<Connection>> {
        let chain_id = self.provider.get_chain_id().await?;

        self.connection.send_if_modified(|connection| match connection {
            Some(current) if current.chain_id != chain_id => {
                current.chain_id = chain_id;
                true
            }
            _ => false,
        });
        Ok(*self.connection.borrow())
    }

    pub fn disconnect(&self) {
        self.connection.send_replace(None);
    }

    /// Receiver notified when the connection changes
    pub fn watch(&self) -> watch::Receiver<Option<Connection>> {
        self.connection.subscribe()
    }
}

#[async_trait]
impl<P> WalletProvider for AlloyWallet<P>
where
    P: Provider<Ethereum> + Send + Sync,
{
    fn connection(&self) -> Option<Connection> {
        *self.connection.borrow()
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let connection = self.connection().ok_or(BridgeError::NotConnected)?;
        if let Some(expected) = tx.chain_id.filter(|id| *id != connection.chain_id) {
            return Err(BridgeError::WrongNetwork {
                expected,
                actual: connection.chain_id,
            });
        }

        let pending = self.provider.send_transaction(tx).await?;

        let tx_hash = *pending.tx_hash();
        info!(tx_hash = %tx_hash, event = "transaction_sent");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_provider::ProviderBuilder;

    fn wallet_on(chain_id: u64) -> AlloyWallet<impl Provider<Ethereum>> {
        AlloyWallet {
            provider: ProviderBuilder::new().connect_http("http://localhost:8545".parse().unwrap()),
            connection: watch::Sender::new(Some(Connection {
                account: address!("742d35Cc6634C0532925a3b844Bc9e7595f8fA0d"),
                chain_id,
            })),
        }
    }

    #[tokio::test]
    async fn test_send_refuses_transaction_for_other_chain() {
        let wallet = wallet_on(137);
        let tx = TransactionRequest {
            chain_id: Some(1),
            ..Default::default()
        };

        let error = wallet.send_transaction(tx).await.unwrap_err();

        assert!(matches!(
            error,
            BridgeError::WrongNetwork {
                expected: 1,
                actual: 137
            }
        ));
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let wallet = wallet_on(1);
        wallet.disconnect();

        let error = wallet
            .send_transaction(TransactionRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(error, BridgeError::NotConnected));
        assert!(wallet.watch().borrow().is_none());
    }
}
