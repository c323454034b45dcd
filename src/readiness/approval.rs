// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, U256};
use tracing::{debug, info, Instrument, Span};

use crate::error::Result;
use crate::intent::{ChainConfig, Token};
use crate::spans;
use crate::traits::TokenService;

/// Decides whether an `approve` transaction must precede the bridge.
///
/// The native asset never needs one. Tokens accepting EIP-2612 permits are
/// authorised inside the bridge call itself, so their allowance is not even
/// read. Everything else needs approval when the bridge contract's allowance
/// is below `amount`.
///
/// # Errors
///
/// Propagates failures of the permit probe or the allowance read.
pub async fn resolve_approval_requirement<T>(
    tokens: &T,
    chain: &ChainConfig,
    token: &Token,
    account: Address,
    amount: U256,
) -> Result<bool>
where
    T: TokenService + ?Sized,
{
    if token.is_native() {
        return Ok(false);
    }

    let span = spans::resolve_approval(&account, &chain.chain(), &token.address(), &amount);
    async move {
        let permit_supported = tokens
            .is_permit_supported(chain, token.address(), account)
            .await
            .inspect_err(spans::record_error)?;
        Span::current().record("permit_supported", permit_supported);

        if permit_supported {
            debug!(event = "permit_supported");
            return Ok(false);
        }

        let allowance = tokens
            .allowance(chain, token.address(), account, chain.bridge_contract())
            .await
            .inspect_err(spans::record_error)?;
        let required = allowance < amount;

        info!(
            allowance = %allowance,
            required = required,
            event = "approval_requirement_resolved"
        );
        Ok(required)
    }
    .instrument(span)
    .await
}
