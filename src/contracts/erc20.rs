// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! ERC20 contract bindings for balances, allowances and permit probing
//!
//! The bridge contract pulls tokens from the sender, so it needs either an
//! allowance or an EIP-2612 permit embedded in the bridge call.

use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::{debug, info};

use Erc20::Erc20Instance;

/// Token-side reads and writes the readiness checks need.
///
/// ```rust,no_run
/// use bridge_readiness::contracts::erc20::Erc20Contract;
/// use alloy_primitives::{address, U256};
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new().connect("http://localhost:8545").await?;
/// let token = Erc20Contract::new(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), provider);
///
/// let owner = address!("742d35Cc6634C0532925a3b844Bc9e7595f8fA0d");
/// let bridge = address!("2a3DD3EB832aF982ec71669E178424b10Dca2EDe");
/// let amount = U256::from(5_000_000u64);
///
/// let needs_approval = !token.supports_permit(owner).await?
///     && token.allowance(owner, bridge).await? < amount;
/// if needs_approval {
///     let tx = token.approve_transaction(owner, bridge, amount);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Erc20Contract<P: Provider<Ethereum>> {
    instance: Erc20Instance<P>,
}

impl<P: Provider<Ethereum>> Erc20Contract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            instance: Erc20Instance::new(address, provider),
        }
    }

    /// Amount `spender` (the bridge contract) may pull from `owner`
    pub async fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, alloy_contract::Error> {
        let allowance = self.instance.allowance(owner, spender).call().await?;

        debug!(
            token = %self.address(),
            owner = %owner,
            spender = %spender,
            allowance = %allowance,
            event = "token_allowance_read"
        );
        Ok(allowance)
    }

    /// Unsigned `approve(spender, amount)` from `owner`
    pub fn approve_transaction(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> TransactionRequest {
        info!(
            token = %self.address(),
            owner = %owner,
            spender = %spender,
            amount = %amount,
            event = "token_approval_built"
        );

        self.instance
            .approve(spender, amount)
            .from(owner)
            .into_transaction_request()
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, alloy_contract::Error> {
        let balance = self.instance.balanceOf(account).call().await?;

        debug!(
            token = %self.address(),
            account = %account,
            balance = %balance,
            event = "token_balance_read"
        );
        Ok(balance)
    }

    /// Whether the token implements EIP-2612 permits for `owner`.
    ///
    /// A token is treated as permit-capable when both `DOMAIN_SEPARATOR()` and
    /// `nonces(owner)` can be read. A revert on either means no permit
    /// support; transport failures are returned as errors.
    pub async fn supports_permit(&self, owner: Address) -> Result<bool, alloy_contract::Error> {
        debug!(
            token = %self.address(),
            owner = %owner,
            event = "permit_probe_started"
        );

        let domain_separator = match self.instance.DOMAIN_SEPARATOR().call().await {
            Ok(separator) => separator,
            Err(e) if is_revert(&e) => return Ok(false),
            Err(e) => return Err(e),
        };

        let supported = match self.instance.nonces(owner).call().await {
            Ok(_) => !domain_separator.is_zero(),
            Err(e) if is_revert(&e) => false,
            Err(e) => return Err(e),
        };

        info!(
            token = %self.address(),
            owner = %owner,
            supported,
            event = "permit_probe_finished"
        );

        Ok(supported)
    }

    /// Returns the contract address
    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

/// A call that reached the contract and reverted or returned no data, as
/// opposed to a transport failure
fn is_revert(error: &alloy_contract::Error) -> bool {
    match error {
        alloy_contract::Error::TransportError(e) => e.as_error_resp().is_some(),
        alloy_contract::Error::ZeroData(..) | alloy_contract::Error::AbiError(_) => true,
        _ => false,
    }
}

// Minimal ERC20 interface with the EIP-2612 views
sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function DOMAIN_SEPARATOR() external view returns (bytes32);
        function nonces(address owner) external view returns (uint256);
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_provider::ProviderBuilder;
    use alloy_sol_types::SolCall;

    #[test]
    fn test_approval_targets_token_with_bridge_as_spender() {
        let provider = ProviderBuilder::new().connect_http("http://localhost:8545".parse().unwrap());
        let token = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        let owner = address!("1111111111111111111111111111111111111111");
        let bridge = address!("2a3DD3EB832aF982ec71669E178424b10Dca2EDe");

        let tx = Erc20Contract::new(token, provider).approve_transaction(
            owner,
            bridge,
            U256::from(5_000_000u64),
        );

        assert_eq!(tx.from, Some(owner));
        assert_eq!(tx.to, Some(token.into()));
        let call = Erc20::approveCall::abi_decode(tx.input.input().unwrap()).unwrap();
        assert_eq!(call.spender, bridge);
        assert_eq!(call.amount, U256::from(5_000_000u64));
    }
}
