// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Production implementations of the collaborator traits.
//!
//! These providers talk to real nodes, wallets and price endpoints through
//! alloy and reqwest. Test code uses the fakes in [`crate::testing`] instead.

mod alloy;
mod block_poller;
mod bridge;
mod price;
mod tokens;
mod tokio_clock;

pub use self::alloy::{AlloyChainRpc, AlloyWallet};
pub use self::block_poller::{BlockFeed, BlockPoller, DEFAULT_BLOCK_FEED_CAPACITY};
pub use self::bridge::{AlloyBridgeClient, DEFAULT_BRIDGE_GAS_LIMIT};
pub use self::price::{HttpPriceOracle, PriceResponse};
pub use self::tokens::AlloyTokenService;
pub use self::tokio_clock::TokioClock;

use crate::error::{BridgeError, Result};
use crate::intent::ChainConfig;

/// Providers are bound to one chain; calls for any other chain are refused.
fn ensure_chain(expected: u64, chain: &ChainConfig) -> Result<()> {
    if chain.chain_id() == expected {
        Ok(())
    } else {
        Err(BridgeError::InvalidConfig(format!(
            "provider is bound to chain {expected}, not {} ({})",
            chain.chain_id(),
            chain.name()
        )))
    }
}
