// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! OpenTelemetry span helpers for readiness operations
//!
//! Static span names, structured attributes, kept apart from business logic.
//! The session attaches these spans to its futures with
//! [`tracing::Instrument`], so they stay correct across await points.
//!
//! # Example
//!
//! ```rust,no_run
//! use bridge_readiness::spans;
//! use alloy_primitives::{Address, U256};
//! use alloy_chains::Chain;
//! use tracing::Instrument;
//!
//! # async fn example() {
//! let span = spans::resolve_balance(&Address::ZERO, &Chain::mainnet(), &Address::ZERO);
//! async {
//!     // custom balance lookup
//! }
//! .instrument(span)
//! .await;
//! # }
//! ```

use alloy_chains::Chain;
use alloy_primitives::{Address, TxHash, U256};
use tracing::Span;

/// Create span for resolving the spendable balance of the bridged token.
///
/// Parent: Session span
/// Children: Provider RPC calls
#[inline]
pub fn resolve_balance(account: &Address, chain: &Chain, token: &Address) -> Span {
    tracing::info_span!(
        "bridge_readiness.resolve_balance",
        account = %account,
        chain = %chain,
        token = %token,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for deciding whether an approval transaction is needed.
///
/// Parent: Session span
/// Children: Permit and allowance contract reads
#[inline]
pub fn resolve_approval(
    account: &Address,
    chain: &Chain,
    token: &Address,
    amount: &U256,
) -> Span {
    tracing::info_span!(
        "bridge_readiness.resolve_approval",
        account = %account,
        chain = %chain,
        token = %token,
        amount = %amount,
        permit_supported = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for one block-triggered gas estimate.
///
/// Parent: Session span
/// Children: Provider estimate calls
#[inline]
pub fn estimate_gas(chain: &Chain, block: Option<u64>) -> Span {
    tracing::debug_span!(
        "bridge_readiness.estimate_gas",
        chain = %chain,
        block = ?block,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for a fiat price lookup.
///
/// Parent: Session span
/// Children: HTTP client request spans
#[inline]
pub fn token_price(chain: &Chain, token: &Address) -> Span {
    tracing::debug_span!(
        "bridge_readiness.token_price",
        chain = %chain,
        token = %token,
    )
}

/// Create span for the approval transaction lifecycle.
///
/// Parent: Caller span
/// Children: Transaction submission and confirmation
#[inline]
pub fn approve(account: &Address, spender: &Address, token: &Address, amount: &U256) -> Span {
    tracing::info_span!(
        "bridge_readiness.approve",
        account = %account,
        spender = %spender,
        token = %token,
        amount = %amount,
        tx_hash = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for the bridge transaction submission.
///
/// Parent: Caller span
/// Children: Transaction submission
#[inline]
pub fn bridge(
    account: &Address,
    source_chain: &Chain,
    destination_chain: &Chain,
    amount: &U256,
) -> Span {
    tracing::info_span!(
        "bridge_readiness.bridge",
        account = %account,
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        amount = %amount,
        tx_hash = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for waiting on a transaction receipt.
///
/// Parent: approve
/// Children: Provider RPC calls (polling)
#[inline]
pub fn wait_for_confirmation(tx_hash: TxHash, max_attempts: u32) -> Span {
    tracing::debug_span!(
        "bridge_readiness.wait_for_confirmation",
        tx_hash = %tx_hash,
        max_attempts = max_attempts,
    )
}

/// Record error attributes on the current span.
///
/// Follows OpenTelemetry semantic conventions for error tracking:
/// - error.type: The error type/variant
/// - error.message: Human-readable error message
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = tracing::Span::current();
    current_span.record(
        "error.type",
        error.to_string().split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", error.to_string());
    current_span.record("otel.status_code", "ERROR");
}

/// Record error attributes with custom context on the current span.
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = tracing::Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}
