// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider utilities for bridge transactions.

use crate::config::DEFAULT_GAS_BUFFER_PERCENT;
use crate::error::{BridgeError, Result};
use crate::fee::Gas;
use alloy_network::Ethereum;
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;

/// Estimate gas for a transaction with an optional safety buffer.
///
/// The provider error text is kept in the returned message, so a node
/// answering "insufficient funds" is still recognisable downstream.
///
/// # Example
///
/// ```rust,ignore
/// use bridge_readiness::provider::estimate_gas_with_buffer;
///
/// let gas_limit = estimate_gas_with_buffer(&provider, &tx, Some(20)).await?;
/// let tx = tx.with_gas_limit(gas_limit);
/// ```
pub async fn estimate_gas_with_buffer<P: Provider<Ethereum>>(
    provider: &P,
    tx: &TransactionRequest,
    buffer_percent: Option<u64>,
) -> Result<u64> {
    let buffer = buffer_percent.unwrap_or(DEFAULT_GAS_BUFFER_PERCENT);

    let estimate = provider
        .estimate_gas(tx.clone())
        .await
        .map_err(|e| BridgeError::Provider(format!("Gas estimation failed: {e}")))?;

    Ok(apply_buffer(estimate, buffer))
}

/// Full bridge cost: buffered gas limit plus current EIP-1559 fee data.
pub async fn estimate_eip1559_gas<P: Provider<Ethereum>>(
    provider: &P,
    tx: &TransactionRequest,
    buffer_percent: u64,
) -> Result<Gas> {
    let gas_limit = estimate_gas_with_buffer(provider, tx, Some(buffer_percent)).await?;
    let fees = provider
        .estimate_eip1559_fees()
        .await
        .map_err(|e| BridgeError::Provider(format!("Fee estimation failed: {e}")))?;

    Ok(Gas::eip1559(
        gas_limit,
        fees.max_fee_per_gas,
        fees.max_priority_fee_per_gas,
    ))
}

// estimate * (100 + buffer) / 100
fn apply_buffer(estimate: u64, buffer_percent: u64) -> u64 {
    estimate.saturating_mul(100 + buffer_percent) / 100
}
