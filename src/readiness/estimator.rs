// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Block-driven gas estimation.
//!
//! At most one estimate is in flight. Blocks arriving meanwhile collapse into
//! a single queued follow-up that starts once the active request settles.

use alloy_primitives::{Address, U256};
use bon::Builder;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn, Instrument};

use super::ReadinessState;
use crate::classify::{ErrorClassifier, ErrorKind};
use crate::context::ContextToken;
use crate::error::Result;
use crate::fee::{max_transferable_amount, Gas, GAS_DATA_UNAVAILABLE, INSUFFICIENT_FUNDS_FOR_FEES};
use crate::intent::BridgeIntent;
use crate::spans;
use crate::task::AsyncResult;
use crate::traits::{BridgeClient, ErrorReporter};

type EstimateFuture<'a> = Pin<Box<dyn Future<Output = Result<Gas>> + Send + 'a>>;

struct InFlight<'a> {
    block: Option<u64>,
    /// Estimate state before this request started, restored on generic failure
    previous: AsyncResult<Gas, String>,
    future: EstimateFuture<'a>,
}

struct Settled {
    block: Option<u64>,
    previous: AsyncResult<Gas, String>,
    result: Result<Gas>,
}

#[derive(Builder)]
pub(super) struct GasEstimator<'a> {
    bridge: &'a dyn BridgeClient,
    classifier: &'a dyn ErrorClassifier,
    reporter: &'a dyn ErrorReporter,
    state: &'a watch::Sender<ReadinessState>,
    intent: &'a BridgeIntent,
    account: Address,
    balance: U256,
    token: ContextToken,
}

impl<'a> GasEstimator<'a> {
    /// Estimates once for the current head, then once per new block, until
    /// the selection is cancelled.
    pub(super) async fn run(self, mut blocks: broadcast::Receiver<u64>) {
        let mut in_flight = self.begin(None);
        let mut queued: Option<u64> = None;
        let mut feed_open = true;

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    debug!(event = "estimator_cancelled");
                    break;
                }
                received = blocks.recv(), if feed_open => match received {
                    Ok(block) if in_flight.is_some() => {
                        trace!(block, event = "estimate_debounced");
                        queued = Some(block);
                    }
                    Ok(block) => in_flight = self.begin(Some(block)),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, event = "block_feed_lagged");
                    }
                    Err(RecvError::Closed) => {
                        warn!(event = "block_feed_closed");
                        feed_open = false;
                    }
                },
                settled = next_settled(&mut in_flight) => {
                    self.settle(settled);
                    if let Some(block) = queued.take() {
                        in_flight = self.begin(Some(block));
                    }
                }
            }
        }
    }

    /// Moves the estimate to `Loading`/`Reloading` and starts a request.
    fn begin(&self, block: Option<u64>) -> Option<InFlight<'a>> {
        if !self.token.is_active() {
            return None;
        }

        let mut previous = AsyncResult::Pending;
        self.state.send_modify(|state| {
            previous = state.estimated_gas.clone();
            state.estimated_gas = std::mem::take(&mut state.estimated_gas).into_reloading();
        });

        let bridge: &'a dyn BridgeClient = self.bridge;
        let intent: &'a BridgeIntent = self.intent;
        let span = spans::estimate_gas(&intent.source().chain(), block);
        trace!(?block, event = "estimate_started");

        Some(InFlight {
            block,
            previous,
            future: Box::pin(bridge.estimate_bridge_gas(intent, self.account).instrument(span)),
        })
    }

    fn settle(&self, settled: Settled) {
        let Settled {
            block,
            previous,
            result,
        } = settled;

        if !self.token.is_active() {
            debug!(?block, event = "stale_estimate_discarded");
            return;
        }

        match result {
            Ok(gas) => self.apply(gas),
            Err(error) => match self.classifier.classify(&error) {
                ErrorKind::InsufficientNativeFunds => {
                    warn!(?block, error = %error, event = "estimate_insufficient_funds");
                    self.state.send_modify(|state| {
                        state.estimated_gas = AsyncResult::Failed {
                            error: INSUFFICIENT_FUNDS_FOR_FEES.to_string(),
                        };
                    });
                }
                _ => {
                    warn!(?block, error = %error, event = "estimate_failed");
                    self.reporter.report(&error.to_string());
                    self.state
                        .send_modify(|state| state.estimated_gas = previous);
                }
            },
        }
    }

    fn apply(&self, gas: Gas) {
        let Some(fee) = gas.fee() else {
            self.state.send_modify(|state| {
                state.estimated_gas = AsyncResult::Failed {
                    error: GAS_DATA_UNAVAILABLE.to_string(),
                };
            });
            return;
        };

        let amount = match max_transferable_amount(
            self.intent.amount(),
            self.balance,
            fee,
            self.intent.token().is_native(),
        ) {
            Ok(amount) => amount,
            Err(error) => {
                self.reporter.report(&error.to_string());
                self.state.send_modify(|state| {
                    state.estimated_gas = AsyncResult::Failed {
                        error: error.to_string(),
                    };
                });
                return;
            }
        };

        info!(
            fee = %fee,
            transferable = %amount.value(),
            event = "estimate_applied"
        );
        self.state.send_modify(|state| {
            state.amount_changed = state.transferable.is_some_and(|prev| prev != amount);
            state.transferable = Some(amount);
            state.estimated_gas = AsyncResult::Successful { data: gas };
        });
    }
}

/// Resolves when the in-flight request settles; never resolves when idle.
///
/// The request stays in `in_flight` until it completes, so dropping this
/// future (another `select!` branch won) loses nothing.
async fn next_settled(in_flight: &mut Option<InFlight<'_>>) -> Settled {
    let Some(job) = in_flight.as_mut() else {
        return std::future::pending().await;
    };
    let result = job.future.as_mut().await;

    let (block, previous) = in_flight
        .take()
        .map(|job| (job.block, job.previous))
        .unwrap_or_default();
    Settled {
        block,
        previous,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DefaultErrorClassifier;
    use crate::context::SelectionEpoch;
    use crate::error::BridgeError;
    use crate::intent::{ChainConfig, Token};
    use crate::testing::{FakeBridgeClient, RecordingReporter};
    use alloy_chains::Chain;
    use alloy_primitives::utils::parse_ether;
    use std::time::Duration;

    fn eth(value: &str) -> U256 {
        parse_ether(value).unwrap()
    }

    fn intent() -> BridgeIntent {
        let chain = |chain, name: &str| {
            ChainConfig::builder()
                .chain(chain)
                .name(name)
                .bridge_contract(Address::repeat_byte(0xbb))
                .build()
        };
        BridgeIntent::builder()
            .source(chain(Chain::mainnet(), "Ethereum"))
            .destination(chain(Chain::from_id(1101), "Polygon zkEVM"))
            .token(Token::native())
            .amount(eth("1.0"))
            .destination_address(Address::repeat_byte(0x11))
            .build()
    }

    /// 0.1 ETH: 100k gas at 1000 gwei
    fn tenth_of_eth() -> Gas {
        Gas::legacy(100_000, 1_000_000_000_000)
    }

    async fn settle_tasks() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    struct Harness {
        bridge: FakeBridgeClient,
        reporter: RecordingReporter,
        state: watch::Sender<ReadinessState>,
        epoch: SelectionEpoch,
        blocks: broadcast::Sender<u64>,
        intent: BridgeIntent,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                bridge: FakeBridgeClient::new(),
                reporter: RecordingReporter::new(),
                state: watch::Sender::new(ReadinessState::default()),
                epoch: SelectionEpoch::new(),
                blocks: broadcast::channel(16).0,
                intent: intent(),
            }
        }

        fn estimator(&self, balance: U256) -> GasEstimator<'_> {
            GasEstimator::builder()
                .bridge(&self.bridge)
                .classifier(&DefaultErrorClassifier)
                .reporter(&self.reporter)
                .state(&self.state)
                .intent(&self.intent)
                .account(Address::repeat_byte(0x11))
                .balance(balance)
                .token(self.epoch.token())
                .build()
        }
    }

    #[tokio::test]
    async fn test_block_burst_is_debounced() {
        let harness = Harness::new();
        let run = harness
            .estimator(eth("2.0"))
            .run(harness.blocks.subscribe());

        let driver = async {
            settle_tasks().await;
            assert_eq!(harness.bridge.estimate_calls(), 1);

            for block in 1..=5 {
                harness.blocks.send(block).unwrap();
            }
            settle_tasks().await;
            assert_eq!(harness.bridge.estimate_calls(), 1);

            harness.bridge.resolve_next(Ok(tenth_of_eth()));
            settle_tasks().await;
            assert_eq!(harness.bridge.estimate_calls(), 2);

            harness.bridge.resolve_next(Ok(tenth_of_eth()));
            settle_tasks().await;
            assert_eq!(harness.bridge.estimate_calls(), 2);

            harness.epoch.invalidate();
        };

        tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(run, driver) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reload_keeps_previous_estimate() {
        let harness = Harness::new();
        let run = harness
            .estimator(eth("2.0"))
            .run(harness.blocks.subscribe());

        let driver = async {
            settle_tasks().await;
            assert_eq!(harness.state.borrow().estimated_gas, AsyncResult::Loading);

            harness.bridge.resolve_next(Ok(tenth_of_eth()));
            settle_tasks().await;
            harness.blocks.send(1).unwrap();
            settle_tasks().await;

            assert_eq!(
                harness.state.borrow().estimated_gas,
                AsyncResult::Reloading {
                    data: tenth_of_eth()
                }
            );
            harness.epoch.invalidate();
        };

        tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(run, driver) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_estimate_is_discarded() {
        let harness = Harness::new();
        let estimator = harness.estimator(eth("2.0"));
        let mut in_flight = estimator.begin(None);

        harness.bridge.resolve_next(Ok(tenth_of_eth()));
        let settled = next_settled(&mut in_flight).await;
        harness.epoch.invalidate();
        estimator.settle(settled);

        let state = harness.state.borrow();
        assert_eq!(state.estimated_gas, AsyncResult::Loading);
        assert_eq!(state.transferable, None);
    }

    #[tokio::test]
    async fn test_estimate_feeds_transferable_amount() {
        let harness = Harness::new();
        let estimator = harness.estimator(eth("1.0"));
        let mut in_flight = estimator.begin(Some(7));

        harness.bridge.resolve_next(Ok(tenth_of_eth()));
        estimator.settle(next_settled(&mut in_flight).await);

        let state = harness.state.borrow();
        assert_eq!(
            state.estimated_gas,
            AsyncResult::Successful {
                data: tenth_of_eth()
            }
        );
        assert_eq!(
            state.transferable.and_then(|amount| amount.to_submit()),
            Some(eth("0.9"))
        );
        assert!(!state.amount_changed);
    }

    #[tokio::test]
    async fn test_insufficient_funds_fails_estimate() {
        let harness = Harness::new();
        let estimator = harness.estimator(eth("0.0"));
        let mut in_flight = estimator.begin(None);

        harness.bridge.resolve_next(Err(BridgeError::Provider(
            "insufficient funds for gas * price + value".to_string(),
        )));
        estimator.settle(next_settled(&mut in_flight).await);

        assert_eq!(
            harness.state.borrow().estimated_gas,
            AsyncResult::Failed {
                error: INSUFFICIENT_FUNDS_FOR_FEES.to_string()
            }
        );
        assert!(harness.reporter.messages().is_empty());
    }

    #[tokio::test]
    async fn test_generic_failure_restores_previous_estimate() {
        let harness = Harness::new();
        let estimator = harness.estimator(eth("2.0"));

        let mut in_flight = estimator.begin(None);
        harness.bridge.resolve_next(Ok(tenth_of_eth()));
        estimator.settle(next_settled(&mut in_flight).await);

        let mut in_flight = estimator.begin(Some(8));
        assert!(harness.state.borrow().estimated_gas.is_in_flight());
        harness
            .bridge
            .resolve_next(Err(BridgeError::Provider("upstream timeout".to_string())));
        estimator.settle(next_settled(&mut in_flight).await);

        assert_eq!(
            harness.state.borrow().estimated_gas,
            AsyncResult::Successful {
                data: tenth_of_eth()
            }
        );
        assert_eq!(
            harness.reporter.messages(),
            vec!["Provider error: upstream timeout".to_string()]
        );
    }

    #[tokio::test]
    async fn test_estimate_without_price_is_unusable() {
        let harness = Harness::new();
        let estimator = harness.estimator(eth("2.0"));
        let mut in_flight = estimator.begin(None);

        harness.bridge.resolve_next(Ok(Gas {
            gas_limit: 100_000,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        }));
        estimator.settle(next_settled(&mut in_flight).await);

        assert_eq!(
            harness.state.borrow().estimated_gas,
            AsyncResult::Failed {
                error: GAS_DATA_UNAVAILABLE.to_string()
            }
        );
    }
}
