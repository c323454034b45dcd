// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test utilities and fake implementations of the collaborator traits
//!
//! These fakes let tests script wallet prompts, RPC failures, block arrivals
//! and slow gas estimates without a node. Every fake is cheaply cloneable:
//! clones share state, so a test can keep one handle while the session owns
//! another.
//!
//! [`FakeBridgeClient`] holds gas estimates until the test releases them,
//! which is how races between blocks, cancellation and late responses are
//! reproduced deterministically.

use alloy_primitives::{Address, TxHash, B256, U256};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, oneshot};

use crate::error::{BridgeError, Result};
use crate::fee::Gas;
use crate::intent::{BridgeIntent, ChainConfig, Connection, Token};
use crate::providers::BlockFeed;
use crate::traits::{
    BridgeClient, ChainRpc, Clock, ErrorReporter, Navigator, PriceOracle, TokenService,
    WalletProvider,
};

fn simulated(message: &str) -> BridgeError {
    BridgeError::Provider(message.to_string())
}

// ============================================================================
// Fake Wallet
// ============================================================================

#[derive(Debug, Default)]
struct WalletState {
    connection: Option<Connection>,
    send_results: VecDeque<Result<TxHash>>,
    sent: Vec<TransactionRequest>,
    hold_sends: bool,
    held: VecDeque<oneshot::Sender<()>>,
}

/// A fake wallet with a scriptable connection and send outcomes.
///
/// Sends succeed with sequential hashes unless a result was queued with
/// [`push_send_result`](Self::push_send_result). After
/// [`hold_sends`](Self::hold_sends) each send stays open until
/// [`release_send`](Self::release_send), so a test can act while the user
/// is still looking at the wallet prompt.
#[derive(Clone, Debug, Default)]
pub struct FakeWallet {
    state: Arc<Mutex<WalletState>>,
}

impl FakeWallet {
    pub fn connected(account: Address, chain_id: u64) -> Self {
        let wallet = Self::default();
        wallet.state.lock().unwrap().connection = Some(Connection { account, chain_id });
        wallet
    }

    pub fn disconnect(&self) {
        self.state.lock().unwrap().connection = None;
    }

    pub fn switch_chain(&self, chain_id: u64) {
        if let Some(connection) = self.state.lock().unwrap().connection.as_mut() {
            connection.chain_id = chain_id;
        }
    }

    pub fn switch_account(&self, account: Address) {
        if let Some(connection) = self.state.lock().unwrap().connection.as_mut() {
            connection.account = account;
        }
    }

    /// Queue the outcome of the next `send_transaction`
    pub fn push_send_result(&self, result: Result<TxHash>) {
        self.state.lock().unwrap().send_results.push_back(result);
    }

    /// Queue a user rejection for the next `send_transaction`
    pub fn reject_next(&self) {
        self.push_send_result(Err(simulated(
            "user rejected transaction (action=\"sendTransaction\", code=ACTION_REJECTED)",
        )));
    }

    /// Every transaction handed to the wallet, including failed ones
    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Keep every following send open until released
    pub fn hold_sends(&self) {
        self.state.lock().unwrap().hold_sends = true;
    }

    /// Sends currently held open
    pub fn held_sends(&self) -> usize {
        self.state.lock().unwrap().held.len()
    }

    /// Lets the oldest held send return. Returns whether one was waiting.
    pub fn release_send(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        while let Some(waiter) = state.held.pop_front() {
            if waiter.send(()).is_ok() {
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    fn connection(&self) -> Option<Connection> {
        self.state.lock().unwrap().connection
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let (result, release) = {
            let mut state = self.state.lock().unwrap();
            state.sent.push(tx);
            let sequence = state.sent.len() as u8;
            let result = state
                .send_results
                .pop_front()
                .unwrap_or_else(|| Ok(B256::with_last_byte(sequence)));
            let release = state.hold_sends.then(|| {
                let (tx, rx) = oneshot::channel();
                state.held.push_back(tx);
                rx
            });
            (result, release)
        };

        if let Some(release) = release {
            release
                .await
                .map_err(|_| simulated("wallet prompt dismissed"))?;
        }
        result
    }
}

// ============================================================================
// Fake Chain RPC
// ============================================================================

#[derive(Debug)]
struct ChainState {
    native_balance: std::result::Result<U256, String>,
    block_number: std::result::Result<u64, String>,
    confirmations: VecDeque<std::result::Result<(), String>>,
    native_balance_calls: usize,
    block_number_calls: usize,
    confirmed: Vec<TxHash>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            native_balance: Ok(U256::ZERO),
            block_number: Ok(0),
            confirmations: VecDeque::new(),
            native_balance_calls: 0,
            block_number_calls: 0,
            confirmed: Vec::new(),
        }
    }
}

/// A fake chain with a test-driven block feed.
///
/// Blocks are only delivered when the test calls [`emit_block`](Self::emit_block).
#[derive(Clone, Debug, Default)]
pub struct FakeChainRpc {
    state: Arc<Mutex<ChainState>>,
    feed: BlockFeed,
}

impl FakeChainRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_balance(self, balance: U256) -> Self {
        self.state.lock().unwrap().native_balance = Ok(balance);
        self
    }

    pub fn with_native_balance_error(self, message: &str) -> Self {
        self.state.lock().unwrap().native_balance = Err(message.to_string());
        self
    }

    pub fn with_block_number(self, block: u64) -> Self {
        self.set_block_number(block);
        self
    }

    pub fn with_block_number_error(self, message: &str) -> Self {
        self.state.lock().unwrap().block_number = Err(message.to_string());
        self
    }

    pub fn set_block_number(&self, block: u64) {
        self.state.lock().unwrap().block_number = Ok(block);
    }

    /// Publish a new block to every subscriber, returning how many received it
    pub fn emit_block(&self, block: u64) -> usize {
        self.set_block_number(block);
        self.feed.publish(block)
    }

    /// Make the next confirmation wait fail with `message`
    pub fn fail_next_confirmation(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .confirmations
            .push_back(Err(message.to_string()));
    }

    pub fn native_balance_calls(&self) -> usize {
        self.state.lock().unwrap().native_balance_calls
    }

    pub fn block_number_calls(&self) -> usize {
        self.state.lock().unwrap().block_number_calls
    }

    pub fn block_subscribers(&self) -> usize {
        self.feed.subscriber_count()
    }

    pub fn confirmed(&self) -> Vec<TxHash> {
        self.state.lock().unwrap().confirmed.clone()
    }
}

#[async_trait]
impl ChainRpc for FakeChainRpc {
    async fn native_balance(&self, _account: Address) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.native_balance_calls += 1;
        state.native_balance.clone().map_err(|e| simulated(&e))
    }

    async fn block_number(&self) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.block_number_calls += 1;
        state.block_number.clone().map_err(|e| simulated(&e))
    }

    fn subscribe_blocks(&self) -> broadcast::Receiver<u64> {
        self.feed.subscribe()
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.confirmations.pop_front() {
            Some(Err(reason)) => Err(BridgeError::TransactionFailed { reason }),
            Some(Ok(())) | None => {
                state.confirmed.push(tx_hash);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Fake Token Service
// ============================================================================

#[derive(Debug)]
struct TokenState {
    balance: std::result::Result<U256, String>,
    allowance: std::result::Result<U256, String>,
    permit: std::result::Result<bool, String>,
    balance_calls: usize,
    allowance_calls: usize,
    permit_checks: usize,
    approvals: Vec<(Address, Address, Address, U256)>,
}

impl Default for TokenState {
    fn default() -> Self {
        Self {
            balance: Ok(U256::ZERO),
            allowance: Ok(U256::ZERO),
            permit: Ok(false),
            balance_calls: 0,
            allowance_calls: 0,
            permit_checks: 0,
            approvals: Vec::new(),
        }
    }
}

/// A fake ERC-20 service with call counters.
#[derive(Clone, Debug, Default)]
pub struct FakeTokenService {
    state: Arc<Mutex<TokenState>>,
}

impl FakeTokenService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, balance: U256) -> Self {
        self.state.lock().unwrap().balance = Ok(balance);
        self
    }

    pub fn with_balance_error(self, message: &str) -> Self {
        self.state.lock().unwrap().balance = Err(message.to_string());
        self
    }

    pub fn with_allowance(self, allowance: U256) -> Self {
        self.state.lock().unwrap().allowance = Ok(allowance);
        self
    }

    pub fn with_allowance_error(self, message: &str) -> Self {
        self.state.lock().unwrap().allowance = Err(message.to_string());
        self
    }

    pub fn with_permit_support(self, supported: bool) -> Self {
        self.state.lock().unwrap().permit = Ok(supported);
        self
    }

    pub fn with_permit_error(self, message: &str) -> Self {
        self.state.lock().unwrap().permit = Err(message.to_string());
        self
    }

    pub fn balance_calls(&self) -> usize {
        self.state.lock().unwrap().balance_calls
    }

    pub fn allowance_calls(&self) -> usize {
        self.state.lock().unwrap().allowance_calls
    }

    pub fn permit_checks(&self) -> usize {
        self.state.lock().unwrap().permit_checks
    }

    /// `(token, owner, spender, amount)` of every approval built
    pub fn approvals(&self) -> Vec<(Address, Address, Address, U256)> {
        self.state.lock().unwrap().approvals.clone()
    }
}

#[async_trait]
impl TokenService for FakeTokenService {
    async fn balance_of(
        &self,
        _chain: &ChainConfig,
        _token: Address,
        _account: Address,
    ) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.balance_calls += 1;
        state.balance.clone().map_err(|e| simulated(&e))
    }

    async fn allowance(
        &self,
        _chain: &ChainConfig,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.allowance_calls += 1;
        state.allowance.clone().map_err(|e| simulated(&e))
    }

    async fn is_permit_supported(
        &self,
        _chain: &ChainConfig,
        _token: Address,
        _account: Address,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.permit_checks += 1;
        state.permit.clone().map_err(|e| simulated(&e))
    }

    fn approve_transaction(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> TransactionRequest {
        self.state
            .lock()
            .unwrap()
            .approvals
            .push((token, owner, spender, amount));
        TransactionRequest::default().from(owner).to(token)
    }
}

// ============================================================================
// Fake Bridge Client
// ============================================================================

#[derive(Debug)]
struct BridgeState {
    ready: VecDeque<Result<Gas>>,
    waiting: VecDeque<oneshot::Sender<Result<Gas>>>,
    fixed_estimate: Option<Gas>,
    estimate_calls: usize,
    max_ether_bridge: std::result::Result<U256, String>,
    build_error: Option<String>,
    built: Vec<(U256, Gas)>,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self {
            ready: VecDeque::new(),
            waiting: VecDeque::new(),
            fixed_estimate: None,
            estimate_calls: 0,
            max_ether_bridge: Err("execution reverted".to_string()),
            build_error: None,
            built: Vec::new(),
        }
    }
}

/// A fake bridge contract whose gas estimates are released by the test.
///
/// Unless configured with [`with_fixed_estimate`](Self::with_fixed_estimate),
/// each estimate stays pending until [`resolve_next`](Self::resolve_next)
/// supplies its result, in call order.
#[derive(Clone, Debug, Default)]
pub struct FakeBridgeClient {
    state: Arc<Mutex<BridgeState>>,
}

impl FakeBridgeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every estimate immediately with `gas`
    pub fn with_fixed_estimate(self, gas: Gas) -> Self {
        self.state.lock().unwrap().fixed_estimate = Some(gas);
        self
    }

    pub fn with_max_ether_bridge(self, limit: U256) -> Self {
        self.state.lock().unwrap().max_ether_bridge = Ok(limit);
        self
    }

    pub fn with_build_error(self, message: &str) -> Self {
        self.state.lock().unwrap().build_error = Some(message.to_string());
        self
    }

    /// Completes the oldest pending estimate with `result`.
    ///
    /// Estimates abandoned by their caller are skipped. If nothing is
    /// pending, the result answers the next call instead. Returns whether a
    /// pending estimate received it.
    pub fn resolve_next(&self, result: Result<Gas>) -> bool {
        let mut state = self.state.lock().unwrap();
        let mut result = result;
        while let Some(waiter) = state.waiting.pop_front() {
            match waiter.send(result) {
                Ok(()) => return true,
                Err(returned) => result = returned,
            }
        }
        state.ready.push_back(result);
        false
    }

    pub fn estimate_calls(&self) -> usize {
        self.state.lock().unwrap().estimate_calls
    }

    /// Estimates currently waiting for [`resolve_next`](Self::resolve_next)
    pub fn pending_estimates(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .waiting
            .iter()
            .filter(|waiter| !waiter.is_closed())
            .count()
    }

    /// `(amount, gas)` of every bridge transaction built
    pub fn built(&self) -> Vec<(U256, Gas)> {
        self.state.lock().unwrap().built.clone()
    }
}

#[async_trait]
impl BridgeClient for FakeBridgeClient {
    async fn estimate_bridge_gas(&self, _intent: &BridgeIntent, _from: Address) -> Result<Gas> {
        let pending = {
            let mut state = self.state.lock().unwrap();
            state.estimate_calls += 1;
            if let Some(result) = state.ready.pop_front() {
                return result;
            }
            if let Some(gas) = state.fixed_estimate {
                return Ok(gas);
            }
            let (tx, rx) = oneshot::channel();
            state.waiting.push_back(tx);
            rx
        };

        pending
            .await
            .unwrap_or_else(|_| Err(simulated("estimate abandoned")))
    }

    fn bridge_transaction(
        &self,
        intent: &BridgeIntent,
        from: Address,
        amount: U256,
        gas: &Gas,
    ) -> Result<TransactionRequest> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.build_error {
            return Err(BridgeError::ContractCall(message.clone()));
        }
        state.built.push((amount, *gas));

        let mut tx = TransactionRequest::default()
            .from(from)
            .to(intent.source().bridge_contract())
            .gas_limit(gas.gas_limit);
        tx.chain_id = Some(intent.source().chain_id());
        if intent.token().is_native() {
            tx = tx.value(amount);
        }
        Ok(tx)
    }

    async fn max_ether_bridge(&self, _chain: &ChainConfig) -> Result<U256> {
        self.state
            .lock()
            .unwrap()
            .max_ether_bridge
            .clone()
            .map_err(|e| simulated(&e))
    }
}

// ============================================================================
// Fake Price Oracle
// ============================================================================

/// A fake price oracle keyed by token address.
///
/// Tokens without a configured price fail with [`BridgeError::PriceUnavailable`].
#[derive(Clone, Debug, Default)]
pub struct FakePriceOracle {
    prices: Arc<Mutex<HashMap<Address, std::result::Result<U256, String>>>>,
    calls: Arc<Mutex<Vec<Address>>>,
}

impl FakePriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, token: Address, price: U256) -> Self {
        self.prices.lock().unwrap().insert(token, Ok(price));
        self
    }

    pub fn with_error(self, token: Address, message: &str) -> Self {
        self.prices
            .lock()
            .unwrap()
            .insert(token, Err(message.to_string()));
        self
    }

    /// Token addresses looked up, in call order
    pub fn calls(&self) -> Vec<Address> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceOracle for FakePriceOracle {
    async fn token_price(&self, _chain: &ChainConfig, token: &Token) -> Result<U256> {
        self.calls.lock().unwrap().push(token.address());
        match self.prices.lock().unwrap().get(&token.address()) {
            Some(Ok(price)) => Ok(*price),
            Some(Err(message)) => Err(simulated(message)),
            None => Err(BridgeError::PriceUnavailable(token.symbol().to_string())),
        }
    }
}

// ============================================================================
// Recording collaborators
// ============================================================================

/// Error reporter that keeps every reported message.
#[derive(Clone, Debug, Default)]
pub struct RecordingReporter {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Navigator that keeps every submitted bridge.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    submissions: Arc<Mutex<Vec<(BridgeIntent, TxHash)>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<(BridgeIntent, TxHash)> {
        self.submissions.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn bridge_submitted(&self, intent: &BridgeIntent, tx_hash: TxHash) {
        self.submissions
            .lock()
            .unwrap()
            .push((intent.clone(), tx_hash));
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock that allows fast-forwarding time in tests.
///
/// Sleeping returns immediately and advances the clock.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }

    /// Get the total time "slept" by this clock
    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    /// Get the number of times sleep was called
    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }

    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}
