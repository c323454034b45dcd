// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Contract bindings used by the alloy-backed providers
//!
//! - [`Erc20Contract`](erc20::Erc20Contract): balances, allowances, approvals and permit probing
//! - [`BridgeContract`](bridge::BridgeContract): asset bridging and the native bridge limit

pub mod bridge;
pub mod erc20;
