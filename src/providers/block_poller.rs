// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Shared new-block feed for one chain.

use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::traits::{ChainRpc, Clock};

/// Buffered block numbers per subscriber before it starts lagging
pub const DEFAULT_BLOCK_FEED_CAPACITY: usize = 16;

/// Fan-out of new block numbers to every subscriber of a chain.
///
/// Clones share the same channel, so a chain has one feed no matter how many
/// readers subscribe.
#[derive(Debug, Clone)]
pub struct BlockFeed {
    tx: broadcast::Sender<u64>,
}

impl Default for BlockFeed {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_FEED_CAPACITY)
    }
}

impl BlockFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Publishes `block` and returns how many subscribers received it
    pub fn publish(&self, block: u64) -> usize {
        self.tx.send(block).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Polls the latest block number and publishes increases on a [`BlockFeed`].
///
/// Polling pauses while the feed has no subscribers.
///
/// # Example
///
/// ```rust,ignore
/// let rpc = AlloyChainRpc::new(provider, TokioClock, &config);
/// let poller = BlockPoller::new(rpc.clone(), TokioClock, rpc.block_feed(), config.block_poll_interval);
/// tokio::spawn(async move { poller.run().await });
/// ```
pub struct BlockPoller<R, C> {
    rpc: R,
    clock: C,
    feed: BlockFeed,
    interval: Duration,
}

impl<R: ChainRpc, C: Clock> BlockPoller<R, C> {
    pub fn new(rpc: R, clock: C, feed: BlockFeed, interval: Duration) -> Self {
        Self {
            rpc,
            clock,
            feed,
            interval,
        }
    }

    /// Polls forever; drop or abort the task to stop.
    pub async fn run(&self) {
        let mut last_seen = None;
        loop {
            last_seen = self.poll_once(last_seen).await;
            self.clock.sleep(self.interval).await;
        }
    }

    /// One poll: publishes the head if it moved past `last_seen` and returns
    /// the newest block seen so far.
    pub async fn poll_once(&self, last_seen: Option<u64>) -> Option<u64> {
        if self.feed.subscriber_count() == 0 {
            trace!(event = "block_poll_skipped");
            return last_seen;
        }

        match self.rpc.block_number().await {
            Ok(block) if last_seen.map_or(true, |last| block > last) => {
                let delivered = self.feed.publish(block);
                debug!(block, subscribers = delivered, event = "new_block_published");
                Some(block)
            }
            Ok(_) => last_seen,
            Err(e) => {
                warn!(error = %e, event = "block_poll_failed");
                last_seen
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChainRpc, FakeClock};

    #[tokio::test]
    async fn test_publishes_only_new_blocks() {
        let rpc = FakeChainRpc::new().with_block_number(100);
        let feed = BlockFeed::default();
        let mut blocks = feed.subscribe();
        let poller = BlockPoller::new(rpc.clone(), FakeClock::new(), feed, Duration::from_secs(4));

        let last = poller.poll_once(None).await;
        assert_eq!(last, Some(100));
        assert_eq!(blocks.try_recv().unwrap(), 100);

        let last = poller.poll_once(last).await;
        assert_eq!(last, Some(100));
        assert!(blocks.try_recv().is_err());

        rpc.set_block_number(101);
        assert_eq!(poller.poll_once(last).await, Some(101));
        assert_eq!(blocks.try_recv().unwrap(), 101);
    }

    #[tokio::test]
    async fn test_no_rpc_calls_without_subscribers() {
        let rpc = FakeChainRpc::new().with_block_number(100);
        let poller = BlockPoller::new(
            rpc.clone(),
            FakeClock::new(),
            BlockFeed::default(),
            Duration::from_secs(4),
        );

        assert_eq!(poller.poll_once(None).await, None);
        assert_eq!(rpc.block_number_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_last_seen() {
        let rpc = FakeChainRpc::new().with_block_number_error("rate limited");
        let feed = BlockFeed::default();
        let _blocks = feed.subscribe();
        let poller = BlockPoller::new(rpc, FakeClock::new(), feed, Duration::from_secs(4));

        assert_eq!(poller.poll_once(Some(7)).await, Some(7));
    }
}
