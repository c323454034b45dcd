// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Gas estimates and the fee-adjusted transferable amount.

use alloy_primitives::utils::format_units;
use alloy_primitives::{Sign, I256, U256};

use crate::error::{BridgeError, Result};
use crate::intent::{NATIVE_DECIMALS, NATIVE_SYMBOL};

/// Shown when the native balance cannot cover the bridged amount plus fee
pub const FEE_BASE_ERROR: &str = "You don't have enough ETH to cover the transaction fee";

/// Shown when gas estimation itself fails for lack of native funds
pub const INSUFFICIENT_FUNDS_FOR_FEES: &str = "You don't have enough ETH to pay for the fees";

/// Shown when an estimate carries no usable price component
pub const GAS_DATA_UNAVAILABLE: &str = "Gas data is not available";

/// Cost estimate for a bridge transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gas {
    pub gas_limit: u64,
    /// Legacy gas price, in wei
    pub gas_price: Option<u128>,
    /// EIP-1559 fee cap, in wei
    pub max_fee_per_gas: Option<u128>,
    /// EIP-1559 tip, in wei
    pub max_priority_fee_per_gas: Option<u128>,
}

impl Gas {
    pub fn legacy(gas_limit: u64, gas_price: u128) -> Self {
        Self {
            gas_limit,
            gas_price: Some(gas_price),
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        }
    }

    pub fn eip1559(gas_limit: u64, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        Self {
            gas_limit,
            gas_price: None,
            max_fee_per_gas: Some(max_fee_per_gas),
            max_priority_fee_per_gas: Some(max_priority_fee_per_gas),
        }
    }

    /// Worst-case fee in wei: gas limit times the fee cap (or legacy price).
    ///
    /// `None` when the estimate has no price component.
    pub fn fee(&self) -> Option<U256> {
        let price = self.max_fee_per_gas.or(self.gas_price)?;
        U256::from(self.gas_limit).checked_mul(U256::from(price))
    }
}

/// Amount that can actually be bridged once the fee is accounted for.
///
/// Zero and negative values are valid: they tell the user the fee leaves no
/// headroom, or how much extra native asset is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransferableAmount(I256);

impl TransferableAmount {
    pub fn value(&self) -> I256 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// The amount to submit, if there is anything to bridge
    pub fn to_submit(&self) -> Option<U256> {
        self.is_positive().then(|| self.0.unsigned_abs())
    }

    /// Extra native asset needed to reach zero, for negative amounts
    pub fn shortfall(&self) -> U256 {
        if self.is_negative() {
            self.0.unsigned_abs()
        } else {
            U256::ZERO
        }
    }

    /// Remediation text for amounts the user cannot bridge
    pub fn warning(&self) -> Result<Option<String>> {
        if self.is_negative() {
            let extra = format_token_amount(self.shortfall(), NATIVE_DECIMALS)?;
            Ok(Some(format!(
                "{FEE_BASE_ERROR}\nYou need at least {extra} extra {NATIVE_SYMBOL}"
            )))
        } else if self.is_zero() {
            Ok(Some(format!(
                "{FEE_BASE_ERROR}\nThe maximum transferable amount is 0 after considering the fee"
            )))
        } else {
            Ok(None)
        }
    }
}

fn signed(sign: Sign, abs: U256) -> Result<TransferableAmount> {
    I256::checked_from_sign_and_abs(sign, abs)
        .map(TransferableAmount)
        .ok_or(BridgeError::AmountOverflow)
}

/// Derives the amount that can be bridged given the balance and the fee.
///
/// For non-native tokens the fee is paid in a different asset and the
/// requested amount is returned unchanged. For the native asset, whatever
/// part of `requested + fee` the balance cannot cover is taken off the
/// requested amount, possibly driving it to zero or below.
pub fn max_transferable_amount(
    requested: U256,
    balance: U256,
    fee: U256,
    is_native: bool,
) -> Result<TransferableAmount> {
    if !is_native {
        return signed(Sign::Positive, requested);
    }

    let total_needed = requested
        .checked_add(fee)
        .ok_or(BridgeError::AmountOverflow)?;
    if total_needed <= balance {
        return signed(Sign::Positive, requested);
    }

    let uncovered = total_needed - balance;
    if uncovered <= requested {
        signed(Sign::Positive, requested - uncovered)
    } else {
        signed(Sign::Negative, uncovered - requested)
    }
}

/// Formats a token amount with trailing zeros trimmed (`0.050000` -> `0.05`)
pub fn format_token_amount(amount: U256, decimals: u8) -> Result<String> {
    let formatted = format_units(amount, decimals)?;
    if !formatted.contains('.') {
        return Ok(formatted);
    }
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::utils::parse_ether;
    use rstest::rstest;

    fn eth(value: &str) -> U256 {
        parse_ether(value).unwrap()
    }

    fn signed_eth(value: &str) -> I256 {
        match value.strip_prefix('-') {
            Some(abs) => -I256::from_raw(eth(abs)),
            None => I256::from_raw(eth(value)),
        }
    }

    #[rstest]
    #[case::fee_fits("2.0", "1.0", "0.1", "1.0")]
    #[case::exactly_covered("1.1", "1.0", "0.1", "1.0")]
    #[case::balance_equals_amount("1.0", "1.0", "0.1", "0.9")]
    #[case::partial_balance("0.5", "1.0", "0.1", "0.4")]
    #[case::fee_consumes_everything("0.1", "1.0", "0.1", "0")]
    #[case::negative_headroom("0.05", "1.0", "0.1", "-0.05")]
    #[case::empty_balance("0", "1.0", "0.1", "-0.1")]
    fn test_native_amount_is_fee_adjusted(
        #[case] balance: &str,
        #[case] requested: &str,
        #[case] fee: &str,
        #[case] expected: &str,
    ) {
        let amount = max_transferable_amount(eth(requested), eth(balance), eth(fee), true).unwrap();
        assert_eq!(amount.value(), signed_eth(expected));
    }

    #[rstest]
    #[case::plenty("100", "0.1")]
    #[case::no_balance("0", "0.1")]
    #[case::huge_fee("1", "1000")]
    fn test_erc20_amount_ignores_fee(#[case] balance: &str, #[case] fee: &str) {
        let requested = eth("1.0");
        let amount = max_transferable_amount(requested, eth(balance), eth(fee), false).unwrap();
        assert_eq!(amount.to_submit(), Some(requested));
    }

    #[test]
    fn test_reduced_amount_is_not_negative() {
        let amount = max_transferable_amount(eth("1.0"), eth("1.0"), eth("0.1"), true).unwrap();
        assert!(!amount.is_negative());
        assert!(amount.is_positive());
        assert_eq!(amount.to_submit(), Some(eth("0.9")));
        assert_eq!(amount.warning().unwrap(), None);
    }

    #[test]
    fn test_zero_amount_is_inspectable() {
        let amount = max_transferable_amount(eth("1.0"), eth("0.1"), eth("0.1"), true).unwrap();
        assert!(amount.is_zero());
        assert_eq!(amount.to_submit(), None);
        assert_eq!(amount.shortfall(), U256::ZERO);
        insta::assert_snapshot!(amount.warning().unwrap().unwrap(), @r"
        You don't have enough ETH to cover the transaction fee
        The maximum transferable amount is 0 after considering the fee
        ");
    }

    #[test]
    fn test_negative_amount_cites_extra_needed() {
        let amount = max_transferable_amount(eth("1.0"), eth("0.05"), eth("0.1"), true).unwrap();
        assert!(amount.is_negative());
        assert_eq!(amount.shortfall(), eth("0.05"));
        insta::assert_snapshot!(amount.warning().unwrap().unwrap(), @r"
        You don't have enough ETH to cover the transaction fee
        You need at least 0.05 extra ETH
        ");
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let result = max_transferable_amount(U256::MAX, U256::ZERO, U256::from(1), true);
        assert!(matches!(result, Err(BridgeError::AmountOverflow)));
    }

    #[test]
    fn test_fee_prefers_fee_cap_over_legacy_price() {
        let gas = Gas {
            gas_limit: 21_000,
            gas_price: Some(10),
            max_fee_per_gas: Some(30),
            max_priority_fee_per_gas: Some(2),
        };
        assert_eq!(gas.fee(), Some(U256::from(630_000u64)));
        assert_eq!(Gas::legacy(21_000, 10).fee(), Some(U256::from(210_000u64)));
        assert_eq!(
            Gas::eip1559(100_000, 50_000_000_000, 2_000_000_000).fee(),
            Some(eth("0.005"))
        );
    }

    #[test]
    fn test_fee_unavailable_without_price() {
        let gas = Gas {
            gas_limit: 21_000,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: Some(2),
        };
        assert_eq!(gas.fee(), None);
    }

    #[rstest]
    #[case(eth("0.05"), 18, "0.05")]
    #[case(eth("2"), 18, "2")]
    #[case(U256::from(1_500_000u64), 6, "1.5")]
    #[case(U256::ZERO, 6, "0")]
    fn test_format_token_amount(#[case] amount: U256, #[case] decimals: u8, #[case] expected: &str) {
        assert_eq!(format_token_amount(amount, decimals).unwrap(), expected);
    }
}
