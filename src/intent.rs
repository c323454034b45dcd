// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Bridge intent and the values it is built from.

use alloy_chains::Chain;
use alloy_primitives::{Address, U256};
use bon::Builder;

/// Symbol of the native asset every supported chain pays fees in.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Decimals of the native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// A chain taking part in a bridge, together with its bridge contract.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    #[builder(into)]
    chain: Chain,
    /// Human readable name, shown in chain-switch prompts
    #[builder(into)]
    name: String,
    /// Bridge contract on this chain, the spender for ERC-20 approvals
    bridge_contract: Address,
    /// Network identifier the bridge contract uses for this chain
    #[builder(default)]
    network_id: u32,
}

impl ChainConfig {
    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn chain_id(&self) -> u64 {
        self.chain.id()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bridge_contract(&self) -> Address {
        self.bridge_contract
    }

    pub fn network_id(&self) -> u32 {
        self.network_id
    }

    /// The native asset of this chain
    pub fn native_token(&self) -> Token {
        Token::native()
    }
}

/// A bridgeable token as seen on the source chain.
///
/// The zero address denotes the chain's native asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    address: Address,
    symbol: String,
    decimals: u8,
    balance: Option<U256>,
}

impl Token {
    pub fn native() -> Self {
        Self {
            address: Address::ZERO,
            symbol: NATIVE_SYMBOL.to_string(),
            decimals: NATIVE_DECIMALS,
            balance: None,
        }
    }

    pub fn erc20(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
            balance: None,
        }
    }

    /// Attaches a balance already known to the caller, skipping the balance query
    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn known_balance(&self) -> Option<U256> {
        self.balance
    }

    pub fn is_native(&self) -> bool {
        self.address == Address::ZERO
    }
}

/// What the user asked to bridge. Immutable once handed to a session.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct BridgeIntent {
    source: ChainConfig,
    destination: ChainConfig,
    token: Token,
    amount: U256,
    destination_address: Address,
}

impl BridgeIntent {
    pub fn source(&self) -> &ChainConfig {
        &self.source
    }

    pub fn destination(&self) -> &ChainConfig {
        &self.destination
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }

    pub fn destination_address(&self) -> Address {
        self.destination_address
    }
}

/// Snapshot of the wallet connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub account: Address,
    pub chain_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_chains::NamedChain;
    use alloy_primitives::address;

    fn mainnet() -> ChainConfig {
        ChainConfig::builder()
            .chain(NamedChain::Mainnet)
            .name("Ethereum")
            .bridge_contract(address!("2a3DD3EB832aF982ec71669E178424b10Dca2EDe"))
            .build()
    }

    #[test]
    fn test_chain_config_builder() {
        let chain = ChainConfig::builder()
            .chain(NamedChain::Sepolia)
            .name("Sepolia")
            .bridge_contract(Address::ZERO)
            .network_id(1)
            .build();

        assert_eq!(chain.chain_id(), 11155111);
        assert_eq!(chain.name(), "Sepolia");
        assert_eq!(chain.network_id(), 1);
        assert_eq!(mainnet().network_id(), 0);
    }

    #[test]
    fn test_chain_config_accepts_unnamed_chain() {
        let zkevm = ChainConfig::builder()
            .chain(Chain::from_id(1101))
            .name("Polygon zkEVM")
            .bridge_contract(Address::ZERO)
            .network_id(1)
            .build();

        assert_eq!(zkevm.chain_id(), 1101);
    }

    #[test]
    fn test_native_token_is_zero_address() {
        assert!(Token::native().is_native());
        assert_eq!(mainnet().native_token().symbol(), "ETH");

        let usdc = Token::erc20(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), "USDC", 6);
        assert!(!usdc.is_native());
        assert!(usdc.known_balance().is_none());
        assert_eq!(
            usdc.with_balance(U256::from(5)).known_balance(),
            Some(U256::from(5))
        );
    }

    #[test]
    fn test_bridge_intent_builder() {
        let intent = BridgeIntent::builder()
            .source(mainnet())
            .destination(mainnet())
            .token(Token::native())
            .amount(U256::from(1000))
            .destination_address(Address::ZERO)
            .build();

        assert_eq!(intent.amount(), U256::from(1000));
        assert_eq!(intent.source().chain(), Chain::mainnet());
        assert!(intent.token().is_native());
        assert_eq!(intent.destination_address(), Address::ZERO);
    }
}
