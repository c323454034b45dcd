// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Approve and bridge transaction lifecycles.

use alloy_primitives::TxHash;
use tracing::{debug, field, info, warn, Instrument, Span};

use super::{BridgeSession, Selection};
use crate::classify::ErrorKind;
use crate::context::ContextToken;
use crate::error::{BridgeError, Result};
use crate::intent::BridgeIntent;
use crate::spans;
use crate::task::AsyncResult;

fn switch_network_prompt(intent: &BridgeIntent) -> String {
    format!("Switch to {} to continue", intent.source().name())
}

impl BridgeSession {
    /// Sends the `approve` transaction for the current intent and waits for
    /// it to be mined.
    ///
    /// Outcome is reflected in [`ReadinessState::approval`](super::ReadinessState::approval):
    ///
    /// - confirmed: `Successful`, and the approval requirement is cleared
    /// - user rejected the prompt: back to `Pending`
    /// - wrong network: back to `Pending` with a chain-switch prompt
    /// - anything else: `Failed`, and the error is reported
    ///
    /// Does nothing without an active selection, a connected wallet or an
    /// outstanding approval requirement, or while an approval is in flight.
    pub async fn approve(&self) {
        let Some(Selection { intent, token, .. }) = self.active_selection() else {
            return;
        };
        let Some(connection) = self.collaborators.wallet.connection() else {
            debug!(event = "approve_without_connection");
            return;
        };
        // check and claim under one lock so concurrent callers send once
        let claimed = self.state.send_if_modified(|state| {
            if !token.is_active()
                || state.approval.is_in_flight()
                || state.approval_required != Some(true)
            {
                return false;
            }
            state.approval = AsyncResult::Loading;
            true
        });
        if !claimed {
            return;
        }

        let spender = intent.source().bridge_contract();
        let token_address = intent.token().address();
        let span = spans::approve(&connection.account, &spender, &token_address, &intent.amount());

        let result = async {
            let tx = self.collaborators.tokens.approve_transaction(
                token_address,
                connection.account,
                spender,
                intent.amount(),
            );
            let tx_hash = self.collaborators.wallet.send_transaction(tx).await?;
            Span::current().record("tx_hash", field::display(tx_hash));
            info!(tx_hash = %tx_hash, event = "approval_submitted");

            let span = spans::wait_for_confirmation(tx_hash, self.config.confirmation_max_attempts);
            self.collaborators
                .rpc
                .wait_for_confirmation(tx_hash)
                .instrument(span)
                .await
        }
        .instrument(span.clone())
        .await;

        let _guard = span.enter();
        match result {
            Ok(()) => {
                info!(event = "approval_confirmed");
                self.apply(&token, |state| {
                    state.approval = AsyncResult::Successful { data: () };
                    state.approval_required = Some(false);
                });
            }
            Err(error) => self.approval_failed(&token, &intent, error),
        }
    }

    fn approval_failed(&self, token: &ContextToken, intent: &BridgeIntent, error: BridgeError) {
        match self.collaborators.classifier.classify(&error) {
            ErrorKind::UserRejected => {
                debug!(event = "approval_rejected_by_user");
                self.apply(token, |state| state.approval = AsyncResult::Pending);
            }
            ErrorKind::WrongNetwork => {
                warn!(error = %error, event = "approval_wrong_network");
                let prompt = switch_network_prompt(intent);
                self.apply(token, |state| {
                    state.approval = AsyncResult::Pending;
                    state.network_error = Some(prompt);
                });
            }
            ErrorKind::InsufficientNativeFunds | ErrorKind::Other(_) => {
                spans::record_error_with_context(
                    "ApprovalFailed",
                    &error.to_string(),
                    Some("approve transaction was not confirmed"),
                );
                let message = error.to_string();
                if self.apply(token, |state| {
                    state.approval = AsyncResult::Failed {
                        error: message.clone(),
                    };
                }) {
                    self.collaborators.reporter.report(&message);
                }
            }
        }
    }

    /// Submits the bridge transaction for the fee-adjusted amount.
    ///
    /// Returns the transaction hash on success, after handing the intent to
    /// the navigator and ending the selection. A sent transaction is handed
    /// over even if the selection was superseded while the wallet prompt was
    /// open. Returns `None` when the transaction was not sent: preconditions
    /// unmet (no connection, no usable estimate, nothing to transfer,
    /// approval outstanding or a submission already in flight), or the
    /// submission failed.
    pub async fn bridge(&self) -> Option<TxHash> {
        let Selection { intent, token, .. } = self.active_selection()?;
        let Some(connection) = self.collaborators.wallet.connection() else {
            debug!(event = "bridge_without_connection");
            return None;
        };

        let mut claimed = None;
        self.state.send_if_modified(|state| {
            if !token.is_active() || !state.can_bridge() {
                return false;
            }
            let gas = state.estimated_gas.data().copied();
            let amount = state.transferable.and_then(|amount| amount.to_submit());
            let (Some(gas), Some(amount)) = (gas, amount) else {
                return false;
            };
            state.bridge_in_progress = true;
            claimed = Some((gas, amount));
            true
        });
        let Some((gas, amount)) = claimed else {
            debug!(event = "bridge_preconditions_unmet");
            return None;
        };

        let span = spans::bridge(
            &connection.account,
            &intent.source().chain(),
            &intent.destination().chain(),
            &amount,
        );

        let result: Result<TxHash> = async {
            let tx = self.collaborators.bridge.bridge_transaction(
                &intent,
                connection.account,
                amount,
                &gas,
            )?;
            let tx_hash = self.collaborators.wallet.send_transaction(tx).await?;
            Span::current().record("tx_hash", field::display(tx_hash));
            Ok(tx_hash)
        }
        .instrument(span.clone())
        .await;

        let _guard = span.enter();
        match result {
            Ok(tx_hash) => {
                info!(
                    tx_hash = %tx_hash,
                    superseded = !token.is_active(),
                    event = "bridge_submitted"
                );
                if let Some(navigator) = &self.collaborators.navigator {
                    navigator.bridge_submitted(&intent, tx_hash);
                }
                self.end_selection(None);
                Some(tx_hash)
            }
            Err(error) => {
                self.bridge_failed(&token, &intent, error);
                None
            }
        }
    }

    fn bridge_failed(&self, token: &ContextToken, intent: &BridgeIntent, error: BridgeError) {
        match self.collaborators.classifier.classify(&error) {
            ErrorKind::UserRejected => {
                debug!(event = "bridge_rejected_by_user");
                self.apply(token, |state| state.bridge_in_progress = false);
            }
            ErrorKind::WrongNetwork => {
                warn!(error = %error, event = "bridge_wrong_network");
                let prompt = switch_network_prompt(intent);
                self.apply(token, |state| {
                    state.bridge_in_progress = false;
                    state.network_error = Some(prompt);
                });
            }
            ErrorKind::InsufficientNativeFunds | ErrorKind::Other(_) => {
                spans::record_error(&error);
                if self.apply(token, |state| state.bridge_in_progress = false) {
                    self.collaborators.reporter.report(&error.to_string());
                }
            }
        }
    }
}
