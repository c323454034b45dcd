// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Transaction-readiness session
//!
//! A [`BridgeSession`] keeps an up-to-date picture of whether a
//! [`BridgeIntent`] can be submitted: the spendable balance, whether an
//! approval transaction is needed, the current fee estimate and the amount
//! that is left to bridge once that fee is paid. It also drives the approve
//! and bridge transactions.
//!
//! Every selection (a call to [`BridgeSession::run`]) starts a new epoch.
//! Async work carries the epoch's [`ContextToken`] and only writes to the
//! shared [`ReadinessState`] while that token is still active.

mod approval;
mod balance;
mod estimator;
mod price;
mod submission;

pub use approval::resolve_approval_requirement;
pub use balance::resolve_balance;
pub use price::{fiat_value, format_fiat_amount, lookup_price};

use alloy_primitives::{Address, U256};
use bon::Builder;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::classify::{DefaultErrorClassifier, ErrorClassifier};
use crate::config::ReadinessConfig;
use crate::context::{ContextToken, SelectionEpoch};
use crate::error::{BridgeError, Result};
use crate::fee::{format_token_amount, Gas, TransferableAmount};
use crate::intent::{BridgeIntent, Connection, NATIVE_DECIMALS, NATIVE_SYMBOL};
use crate::task::AsyncResult;
use crate::traits::{
    BridgeClient, ChainRpc, ErrorReporter, Navigator, PriceOracle, TokenService,
    TracingErrorReporter, WalletProvider,
};

use estimator::GasEstimator;

/// External capabilities a session works with.
#[derive(Builder, Clone)]
pub struct Collaborators {
    wallet: Arc<dyn WalletProvider>,
    rpc: Arc<dyn ChainRpc>,
    tokens: Arc<dyn TokenService>,
    bridge: Arc<dyn BridgeClient>,
    prices: Arc<dyn PriceOracle>,
    #[builder(default = default_classifier())]
    classifier: Arc<dyn ErrorClassifier>,
    #[builder(default = default_reporter())]
    reporter: Arc<dyn ErrorReporter>,
    navigator: Option<Arc<dyn Navigator>>,
}

fn default_classifier() -> Arc<dyn ErrorClassifier> {
    Arc::new(DefaultErrorClassifier)
}

fn default_reporter() -> Arc<dyn ErrorReporter> {
    Arc::new(TracingErrorReporter)
}

/// Everything derived for the current selection.
///
/// Each field has exactly one producer inside the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessState {
    /// Spendable balance of the bridged token, `None` while unknown
    pub balance: Option<U256>,
    /// Whether an approval transaction must precede the bridge, `None` while unknown
    pub approval_required: Option<bool>,
    pub approval: AsyncResult<(), String>,
    pub estimated_gas: AsyncResult<Gas, String>,
    /// Fee-adjusted amount, recomputed with every estimate
    pub transferable: Option<TransferableAmount>,
    /// Whether the last recomputation changed `transferable`
    pub amount_changed: bool,
    /// Fiat price of the source chain's native asset
    pub native_price: Option<U256>,
    /// Fiat price of the bridged token
    pub token_price: Option<U256>,
    pub max_ether_bridge: Option<U256>,
    pub bridge_in_progress: bool,
    /// Chain-switch prompt, set after a wrong-network failure
    pub network_error: Option<String>,
}

impl ReadinessState {
    /// Fee of the latest usable estimate, including while a newer one is loading
    pub fn fee(&self) -> Option<U256> {
        self.estimated_gas.data().and_then(Gas::fee)
    }

    /// Balance, estimate and transferable amount are all known
    pub fn is_ready(&self) -> bool {
        self.balance.is_some()
            && self.estimated_gas.is_data_available()
            && self.transferable.is_some()
    }

    /// Whether the bridge action would do anything right now
    pub fn can_bridge(&self) -> bool {
        self.is_ready()
            && !self.bridge_in_progress
            && self.approval_required == Some(false)
            && self.transferable.is_some_and(|amount| amount.is_positive())
    }

    /// Remediation text when the fee leaves nothing to bridge
    pub fn fee_warning(&self) -> Option<String> {
        self.transferable?.warning().ok().flatten()
    }

    pub fn fiat_fee(&self) -> Option<U256> {
        fiat_value(self.native_price?, self.fee()?, NATIVE_DECIMALS)
    }

    pub fn fiat_amount(&self, token_decimals: u8) -> Option<U256> {
        let amount = self.transferable?.to_submit()?;
        fiat_value(self.token_price?, amount, token_decimals)
    }

    /// Fee line as shown to the user, e.g. `0.0021 ETH ~ $4.20`
    pub fn fee_summary(&self, fiat_precision: u8, currency_symbol: &str) -> Option<String> {
        let fee = format_token_amount(self.fee()?, NATIVE_DECIMALS).ok()?;
        let fee = format!("{fee} {NATIVE_SYMBOL}");
        match self
            .fiat_fee()
            .and_then(|fiat| format_fiat_amount(fiat, fiat_precision).ok())
        {
            Some(fiat) => Some(format!("{fee} ~ {currency_symbol}{fiat}")),
            None => Some(fee),
        }
    }
}

#[derive(Debug, Clone)]
struct Selection {
    intent: BridgeIntent,
    connection: Connection,
    token: ContextToken,
}

/// Readiness orchestration for a single in-flight bridge intent.
///
/// # Example
///
/// ```rust,ignore
/// let session = Arc::new(BridgeSession::new(collaborators, ReadinessConfig::default()));
///
/// let runner = session.clone();
/// tokio::spawn(async move { runner.run(intent).await });
///
/// let mut updates = session.subscribe();
/// let state = updates.wait_for(|state| state.is_ready()).await?.clone();
/// if state.approval_required == Some(true) {
///     session.approve().await;
/// }
/// let tx_hash = session.bridge().await;
/// ```
pub struct BridgeSession {
    collaborators: Collaborators,
    config: ReadinessConfig,
    epoch: SelectionEpoch,
    selection: watch::Sender<Option<Selection>>,
    state: watch::Sender<ReadinessState>,
}

impl BridgeSession {
    pub fn new(collaborators: Collaborators, config: ReadinessConfig) -> Self {
        Self {
            collaborators,
            config,
            epoch: SelectionEpoch::new(),
            selection: watch::Sender::new(None),
            state: watch::Sender::new(ReadinessState::default()),
        }
    }

    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ReadinessState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.state.subscribe()
    }

    /// The intent currently being prepared, if any
    pub fn intent(&self) -> Option<BridgeIntent> {
        self.active_selection().map(|selection| selection.intent)
    }

    /// Resolves everything needed to bridge `intent` and keeps the fee
    /// estimate fresh until the selection is superseded.
    ///
    /// Starting a new run cancels the previous one: its in-flight results
    /// are discarded on arrival. The future completes once the selection
    /// ends (a new `run`, [`abandon`](Self::abandon), a connection change or
    /// a submitted bridge transaction).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotConnected`] if no wallet is connected.
    pub async fn run(&self, intent: BridgeIntent) -> Result<()> {
        let connection = self
            .collaborators
            .wallet
            .connection()
            .ok_or(BridgeError::NotConnected)?;

        let token = self.epoch.advance();
        let carried_prompt = self
            .state
            .borrow()
            .network_error
            .clone()
            .filter(|_| connection.chain_id != intent.source().chain_id());
        self.state.send_replace(ReadinessState {
            network_error: carried_prompt,
            ..Default::default()
        });
        self.selection.send_replace(Some(Selection {
            intent: intent.clone(),
            connection,
            token: token.clone(),
        }));

        info!(
            account = %connection.account,
            source_chain = %intent.source().chain(),
            destination_chain = %intent.destination().chain(),
            token = %intent.token().address(),
            amount = %intent.amount(),
            event = "selection_started"
        );

        // subscribe before the balance lookup so no block is missed
        let blocks = self.collaborators.rpc.subscribe_blocks();
        let estimation = async {
            match self.refresh_balance(&intent, connection.account, &token).await {
                Some(balance) => {
                    GasEstimator::builder()
                        .bridge(self.collaborators.bridge.as_ref())
                        .classifier(self.collaborators.classifier.as_ref())
                        .reporter(self.collaborators.reporter.as_ref())
                        .state(&self.state)
                        .intent(&intent)
                        .account(connection.account)
                        .balance(balance)
                        .token(token.clone())
                        .build()
                        .run(blocks)
                        .await
                }
                None => token.cancelled().await,
            }
        };

        tokio::join!(
            estimation,
            self.refresh_approval(&intent, connection.account, &token),
            self.refresh_prices(&intent, &token),
            self.refresh_max_ether_bridge(&intent, &token),
        );

        debug!(event = "selection_finished");
        Ok(())
    }

    /// Re-reads the wallet connection.
    ///
    /// Clears the chain-switch prompt once the wallet is on the source chain.
    /// Returns `true` when the account or chain differs from the one the
    /// current selection was started with; that selection is torn down,
    /// everything derived for it is cleared and the caller should `run` the
    /// intent again. A chain-switch prompt survives the teardown while the
    /// wallet is still off the source chain.
    pub fn connection_changed(&self) -> bool {
        let Some(selection) = self.active_selection() else {
            return false;
        };
        let current = self.collaborators.wallet.connection();

        if current.is_some_and(|c| c.chain_id == selection.intent.source().chain_id()) {
            self.apply(&selection.token, |state| state.network_error = None);
        }

        if current == Some(selection.connection) {
            return false;
        }

        info!(
            previous_account = %selection.connection.account,
            previous_chain_id = selection.connection.chain_id,
            event = "connection_changed"
        );
        let prompt = self.state.borrow().network_error.clone();
        self.end_selection(prompt);
        true
    }

    /// Drops the current intent and everything derived from it
    pub fn abandon(&self) {
        self.end_selection(None);
        debug!(event = "selection_abandoned");
    }

    fn end_selection(&self, network_error: Option<String>) {
        self.epoch.invalidate();
        self.selection.send_replace(None);
        self.state.send_replace(ReadinessState {
            network_error,
            ..Default::default()
        });
    }

    fn active_selection(&self) -> Option<Selection> {
        self.selection
            .borrow()
            .as_ref()
            .filter(|selection| selection.token.is_active())
            .cloned()
    }

    /// Applies `update` only while `token` belongs to the current selection.
    fn apply(&self, token: &ContextToken, update: impl FnOnce(&mut ReadinessState)) -> bool {
        if !token.is_active() {
            debug!(event = "stale_result_discarded");
            return false;
        }
        self.state.send_modify(update);
        true
    }

    async fn refresh_balance(
        &self,
        intent: &BridgeIntent,
        account: Address,
        token: &ContextToken,
    ) -> Option<U256> {
        let result = resolve_balance(
            self.collaborators.rpc.as_ref(),
            self.collaborators.tokens.as_ref(),
            intent,
            account,
        )
        .await;

        let balance = match result {
            Ok(balance) => Some(balance),
            Err(error) => {
                if intent.token().is_native() && token.is_active() {
                    self.collaborators.reporter.report(&error.to_string());
                }
                None
            }
        };

        self.apply(token, |state| state.balance = balance)
            .then_some(balance)
            .flatten()
    }

    async fn refresh_approval(
        &self,
        intent: &BridgeIntent,
        account: Address,
        token: &ContextToken,
    ) {
        let result = resolve_approval_requirement(
            self.collaborators.tokens.as_ref(),
            intent.source(),
            intent.token(),
            account,
            intent.amount(),
        )
        .await;

        match result {
            Ok(required) => {
                self.apply(token, |state| state.approval_required = Some(required));
            }
            Err(error) => {
                if token.is_active() {
                    self.collaborators.reporter.report(&error.to_string());
                }
            }
        }
    }

    async fn refresh_prices(&self, intent: &BridgeIntent, token: &ContextToken) {
        if !self.config.fiat_enabled {
            return;
        }

        let oracle = self.collaborators.prices.as_ref();
        let chain = intent.source();
        let native = chain.native_token();

        if intent.token().is_native() {
            let price = lookup_price(oracle, chain, &native).await;
            self.apply(token, |state| {
                state.native_price = price;
                state.token_price = price;
            });
            return;
        }

        let native_lookup = async {
            let price = lookup_price(oracle, chain, &native).await;
            self.apply(token, |state| state.native_price = price);
        };
        let token_lookup = async {
            let price = lookup_price(oracle, chain, intent.token()).await;
            self.apply(token, |state| state.token_price = price);
        };
        tokio::join!(native_lookup, token_lookup);
    }

    async fn refresh_max_ether_bridge(&self, intent: &BridgeIntent, token: &ContextToken) {
        let chain = intent.source();
        let limit = match self.collaborators.bridge.max_ether_bridge(chain).await {
            Ok(limit) => limit,
            Err(error) => {
                debug!(
                    error = %error,
                    fallback = %self.config.max_ether_bridge_fallback,
                    event = "max_ether_bridge_fallback"
                );
                self.config.max_ether_bridge_fallback
            }
        };
        self.apply(token, |state| state.max_ether_bridge = Some(limit));
    }
}
