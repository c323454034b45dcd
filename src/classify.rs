// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Classification of provider and contract failures.
//!
//! Wallets and RPC nodes report cancellations, chain mismatches and funding
//! problems as free-form errors. Every async boundary in the readiness core
//! runs its failure through an [`ErrorClassifier`] before touching state.

use crate::error::BridgeError;

/// Recovery-relevant class of a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user dismissed the signature or transaction prompt
    UserRejected,
    /// The wallet is connected to a different chain than the one required
    WrongNetwork,
    /// Not enough native asset to pay for gas
    InsufficientNativeFunds,
    Other(String),
}

/// Maps raw failures into an [`ErrorKind`].
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &BridgeError) -> ErrorKind;
}

const USER_REJECTED_MARKERS: &[&str] = &[
    "user rejected",
    "user denied",
    "rejected by user",
    "action_rejected",
    "code: 4001",
    "code 4001",
];

const WRONG_NETWORK_MARKERS: &[&str] = &[
    "underlying network changed",
    "network changed",
    "chain mismatch",
    "wrong network",
    "does not match the target chain",
];

const INSUFFICIENT_FUNDS_MARKERS: &[&str] = &["insufficient funds", "insufficient balance for gas"];

/// Classifier used unless the caller supplies its own.
///
/// Typed variants map directly; everything else is matched on the
/// lowercased error message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorClassifier;

impl ErrorClassifier for DefaultErrorClassifier {
    fn classify(&self, error: &BridgeError) -> ErrorKind {
        match error {
            BridgeError::UserRejected(_) => ErrorKind::UserRejected,
            BridgeError::WrongNetwork { .. } => ErrorKind::WrongNetwork,
            BridgeError::InsufficientNativeFunds(_) => ErrorKind::InsufficientNativeFunds,
            other => classify_message(&other.to_string()),
        }
    }
}

/// Classifies a raw provider message
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();

    if USER_REJECTED_MARKERS.iter().any(|m| lower.contains(m)) {
        return ErrorKind::UserRejected;
    }

    if WRONG_NETWORK_MARKERS.iter().any(|m| lower.contains(m)) {
        return ErrorKind::WrongNetwork;
    }

    if INSUFFICIENT_FUNDS_MARKERS.iter().any(|m| lower.contains(m)) {
        return ErrorKind::InsufficientNativeFunds;
    }

    ErrorKind::Other(message.to_string())
}
