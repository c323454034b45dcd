// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, U256};
use tracing::{debug, info, warn, Instrument};

use crate::error::{BridgeError, Result};
use crate::intent::BridgeIntent;
use crate::spans;
use crate::traits::{ChainRpc, TokenService};

/// Spendable balance of the intent's token on its source chain.
///
/// A balance already carried by the token is used as-is. Otherwise the
/// native balance comes from the chain and ERC-20 balances from the token
/// contract.
///
/// # Errors
///
/// Any lookup failure is returned as [`BridgeError::BalanceUnavailable`].
pub async fn resolve_balance<R, T>(
    rpc: &R,
    tokens: &T,
    intent: &BridgeIntent,
    account: Address,
) -> Result<U256>
where
    R: ChainRpc + ?Sized,
    T: TokenService + ?Sized,
{
    let token = intent.token();
    if let Some(balance) = token.known_balance() {
        debug!(balance = %balance, event = "balance_prefilled");
        return Ok(balance);
    }

    let chain = intent.source();
    let span = spans::resolve_balance(&account, &chain.chain(), &token.address());
    async move {
        let result = if token.is_native() {
            rpc.native_balance(account).await
        } else {
            tokens.balance_of(chain, token.address(), account).await
        };

        match result {
            Ok(balance) => {
                info!(balance = %balance, event = "balance_resolved");
                Ok(balance)
            }
            Err(e) => {
                spans::record_error(&e);
                warn!(error = %e, event = "balance_unavailable");
                Err(BridgeError::BalanceUnavailable(e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{ChainConfig, Token};
    use crate::testing::{FakeChainRpc, FakeTokenService};
    use alloy_chains::Chain;
    use alloy_primitives::address;

    const ACCOUNT: Address = address!("1111111111111111111111111111111111111111");
    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

    fn intent(token: Token) -> BridgeIntent {
        let chain = |chain, name: &str| {
            ChainConfig::builder()
                .chain(chain)
                .name(name)
                .bridge_contract(Address::repeat_byte(0xbb))
                .build()
        };
        BridgeIntent::builder()
            .source(chain(Chain::mainnet(), "Ethereum"))
            .destination(chain(Chain::from_id(1101), "Polygon zkEVM"))
            .token(token)
            .amount(U256::from(1_000u64))
            .destination_address(ACCOUNT)
            .build()
    }

    #[tokio::test]
    async fn test_prefilled_balance_skips_lookups() {
        let rpc = FakeChainRpc::new();
        let tokens = FakeTokenService::new();
        let intent = intent(Token::native().with_balance(U256::from(42u64)));

        let balance = resolve_balance(&rpc, &tokens, &intent, ACCOUNT)
            .await
            .unwrap();

        assert_eq!(balance, U256::from(42u64));
        assert_eq!(rpc.native_balance_calls(), 0);
    }

    #[tokio::test]
    async fn test_native_balance_comes_from_chain() {
        let rpc = FakeChainRpc::new().with_native_balance(U256::from(7u64));
        let tokens = FakeTokenService::new().with_balance(U256::from(99u64));

        let balance = resolve_balance(&rpc, &tokens, &intent(Token::native()), ACCOUNT)
            .await
            .unwrap();

        assert_eq!(balance, U256::from(7u64));
    }

    #[tokio::test]
    async fn test_erc20_balance_comes_from_token_contract() {
        let rpc = FakeChainRpc::new().with_native_balance(U256::from(7u64));
        let tokens = FakeTokenService::new().with_balance(U256::from(99u64));
        let intent = intent(Token::erc20(USDC, "USDC", 6));

        let balance = resolve_balance(&rpc, &tokens, &intent, ACCOUNT)
            .await
            .unwrap();

        assert_eq!(balance, U256::from(99u64));
        assert_eq!(rpc.native_balance_calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_balance_unavailable() {
        let rpc = FakeChainRpc::new().with_native_balance_error("connection reset");
        let tokens = FakeTokenService::new();

        let result = resolve_balance(&rpc, &tokens, &intent(Token::native()), ACCOUNT).await;

        assert!(matches!(result, Err(BridgeError::BalanceUnavailable(msg)) if msg.contains("connection reset")));
    }
}
