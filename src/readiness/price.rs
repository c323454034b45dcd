// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::utils::format_units;
use alloy_primitives::U256;
use tracing::{debug, warn, Instrument};

use crate::error::Result;
use crate::intent::{ChainConfig, Token};
use crate::spans;
use crate::traits::PriceOracle;

/// Fiat price of `token`, `None` if the oracle cannot provide one.
pub async fn lookup_price<O>(oracle: &O, chain: &ChainConfig, token: &Token) -> Option<U256>
where
    O: PriceOracle + ?Sized,
{
    let span = spans::token_price(&chain.chain(), &token.address());
    async move {
        match oracle.token_price(chain, token).await {
            Ok(price) => {
                debug!(symbol = token.symbol(), price = %price, event = "price_resolved");
                Some(price)
            }
            Err(e) => {
                warn!(symbol = token.symbol(), error = %e, event = "price_unavailable");
                None
            }
        }
    }
    .instrument(span)
    .await
}

/// Converts `amount` base units of a token with `decimals` into fiat, using a
/// price with the oracle's fixed-point precision.
pub fn fiat_value(price: U256, amount: U256, decimals: u8) -> Option<U256> {
    let scale = U256::from(10u64).checked_pow(U256::from(decimals))?;
    price.checked_mul(amount).map(|value| value / scale)
}

/// Formats a fixed-point fiat value with two decimals, truncating the rest
pub fn format_fiat_amount(value: U256, precision: u8) -> Result<String> {
    let formatted = format_units(value, precision)?;
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), ""));
    let cents: String = fraction.chars().chain("00".chars()).take(2).collect();
    Ok(format!("{whole}.{cents}"))
}
