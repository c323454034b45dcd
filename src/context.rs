// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Selection-scoped cancellation.
//!
//! Every account/chain/token selection gets a fresh epoch. Async work started
//! under an epoch carries a [`ContextToken`] and checks it before applying its
//! result, so a late answer from an older selection is dropped on arrival.

use tokio::sync::watch;

/// Source of selection epochs.
#[derive(Debug)]
pub struct SelectionEpoch {
    tx: watch::Sender<u64>,
}

impl Default for SelectionEpoch {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionEpoch {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    /// Token for the current epoch
    pub fn token(&self) -> ContextToken {
        ContextToken {
            epoch: *self.tx.borrow(),
            rx: self.tx.subscribe(),
        }
    }

    /// Starts a new epoch and returns its token. All older tokens become inactive.
    pub fn advance(&self) -> ContextToken {
        self.invalidate();
        self.token()
    }

    /// Ends the current epoch without handing out a new token
    pub fn invalidate(&self) {
        self.tx.send_modify(|epoch| *epoch += 1);
    }
}

/// Guard carried by every async chain started for a selection.
#[derive(Debug, Clone)]
pub struct ContextToken {
    epoch: u64,
    rx: watch::Receiver<u64>,
}

impl ContextToken {
    pub fn is_active(&self) -> bool {
        *self.rx.borrow() == self.epoch
    }

    /// Resolves once the selection this token belongs to has been superseded
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // a dropped epoch source counts as cancellation
        let _ = rx.wait_for(|epoch| *epoch != self.epoch).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_advance_deactivates_older_tokens() {
        let epoch = SelectionEpoch::new();
        let first = epoch.token();
        assert!(first.is_active());

        let second = epoch.advance();
        assert!(!first.is_active());
        assert!(second.is_active());

        epoch.invalidate();
        assert!(!second.is_active());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_advance() {
        let epoch = SelectionEpoch::new();
        let token = epoch.token();

        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };

        tokio::task::yield_now().await;
        epoch.advance();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancellation should be observed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_when_source_dropped() {
        let epoch = SelectionEpoch::new();
        let token = epoch.token();
        drop(epoch);

        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("dropped epoch source should cancel");
    }
}
