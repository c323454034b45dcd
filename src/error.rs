// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::utils::UnitsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("No wallet connected")]
    NotConnected,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Balance unavailable: {0}")]
    BalanceUnavailable(String),

    #[error("Price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Wrong network: expected chain {expected}, connected to chain {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Insufficient native funds: {0}")]
    InsufficientNativeFunds(String),

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("Amount does not fit in a signed 256-bit value")]
    AmountOverflow,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("Contract error: {0}")]
    Contract(#[from] alloy_contract::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unit conversion error: {0}")]
    Units(#[from] UnitsError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
