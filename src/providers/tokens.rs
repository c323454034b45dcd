// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;

use super::ensure_chain;
use crate::contracts::erc20::Erc20Contract;
use crate::error::Result;
use crate::intent::ChainConfig;
use crate::traits::TokenService;

/// ERC-20 reads and approvals on one chain.
#[derive(Debug, Clone)]
pub struct AlloyTokenService<P> {
    provider: P,
    chain_id: u64,
}

impl<P> AlloyTokenService<P>
where
    P: Provider<Ethereum>,
{
    /// Service for the chain identified by `chain_id`
    pub fn new(provider: P, chain_id: u64) -> Self {
        Self { provider, chain_id }
    }

    fn erc20(&self, chain: &ChainConfig, token: Address) -> Result<Erc20Contract<&P>> {
        ensure_chain(self.chain_id, chain)?;
        Ok(Erc20Contract::new(token, &self.provider))
    }
}

#[async_trait]
impl<P> TokenService for AlloyTokenService<P>
where
    P: Provider<Ethereum> + Send + Sync,
{
    async fn balance_of(&self, chain: &ChainConfig, token: Address, account: Address) -> Result<U256> {
        Ok(self.erc20(chain, token)?.balance_of(account).await?)
    }

    async fn allowance(
        &self,
        chain: &ChainConfig,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        Ok(self.erc20(chain, token)?.allowance(owner, spender).await?)
    }

    async fn is_permit_supported(
        &self,
        chain: &ChainConfig,
        token: Address,
        account: Address,
    ) -> Result<bool> {
        Ok(self.erc20(chain, token)?.supports_permit(account).await?)
    }

    fn approve_transaction(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> TransactionRequest {
        Erc20Contract::new(token, &self.provider).approve_transaction(owner, spender, amount)
    }
}
