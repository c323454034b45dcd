// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::ensure_chain;
use crate::config::{ReadinessConfig, DEFAULT_GAS_BUFFER_PERCENT};
use crate::contracts::bridge::{BridgeAssetParams, BridgeContract};
use crate::error::{BridgeError, Result};
use crate::fee::Gas;
use crate::intent::{BridgeIntent, ChainConfig};
use crate::provider::estimate_eip1559_gas;
use crate::traits::BridgeClient;

/// Gas limit assumed when the node cannot simulate the bridge call, e.g.
/// before an ERC-20 allowance has been granted
pub const DEFAULT_BRIDGE_GAS_LIMIT: u64 = 300_000;

/// Native amount used when simulating a native bridge. The gas cost does not
/// depend on the amount, and simulating the full requested amount would fail
/// whenever the fee is meant to come out of it.
const NATIVE_ESTIMATION_AMOUNT: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Bridge contract access on one source chain.
#[derive(Debug, Clone)]
pub struct AlloyBridgeClient<P> {
    provider: P,
    chain_id: u64,
    gas_buffer_percent: u64,
    fallback_gas_limit: u64,
}

impl<P> AlloyBridgeClient<P>
where
    P: Provider<Ethereum>,
{
    pub fn new(provider: P, chain_id: u64) -> Self {
        Self {
            provider,
            chain_id,
            gas_buffer_percent: DEFAULT_GAS_BUFFER_PERCENT,
            fallback_gas_limit: DEFAULT_BRIDGE_GAS_LIMIT,
        }
    }

    pub fn with_config(mut self, config: &ReadinessConfig) -> Self {
        self.gas_buffer_percent = config.gas_buffer_percent;
        self
    }

    pub fn with_fallback_gas_limit(mut self, gas_limit: u64) -> Self {
        self.fallback_gas_limit = gas_limit;
        self
    }

    fn params(intent: &BridgeIntent, from: Address, amount: U256) -> BridgeAssetParams {
        BridgeAssetParams {
            from,
            destination_network: intent.destination().network_id(),
            destination_address: intent.destination_address(),
            token: intent.token().address(),
            amount,
            permit_data: Bytes::new(),
        }
    }
}

#[async_trait]
impl<P> BridgeClient for AlloyBridgeClient<P>
where
    P: Provider<Ethereum> + Send + Sync,
{
    #[instrument(skip(self, intent), fields(from = %from, token = %intent.token().address()))]
    async fn estimate_bridge_gas(&self, intent: &BridgeIntent, from: Address) -> Result<Gas> {
        ensure_chain(self.chain_id, intent.source())?;

        let amount = if intent.token().is_native() {
            NATIVE_ESTIMATION_AMOUNT
        } else {
            intent.amount()
        };
        let contract = BridgeContract::new(intent.source().bridge_contract(), &self.provider);
        let tx = contract.bridge_asset_transaction(&Self::params(intent, from, amount));

        match estimate_eip1559_gas(&self.provider, &tx, self.gas_buffer_percent).await {
            Ok(gas) => Ok(gas),
            Err(BridgeError::Provider(message)) if message.contains("execution reverted") => {
                debug!(
                    error = %message,
                    fallback_gas_limit = self.fallback_gas_limit,
                    event = "bridge_simulation_reverted"
                );
                let fees = self
                    .provider
                    .estimate_eip1559_fees()
                    .await
                    .map_err(|e| BridgeError::Provider(format!("Fee estimation failed: {e}")))?;
                Ok(Gas::eip1559(
                    self.fallback_gas_limit,
                    fees.max_fee_per_gas,
                    fees.max_priority_fee_per_gas,
                ))
            }
            Err(e) => Err(e),
        }
    }

    fn bridge_transaction(
        &self,
        intent: &BridgeIntent,
        from: Address,
        amount: U256,
        gas: &Gas,
    ) -> Result<TransactionRequest> {
        ensure_chain(self.chain_id, intent.source())?;

        let contract = BridgeContract::new(intent.source().bridge_contract(), &self.provider);
        let mut tx = contract.bridge_asset_transaction(&Self::params(intent, from, amount));
        tx.chain_id = Some(intent.source().chain_id());
        tx.gas = Some(gas.gas_limit);
        match (gas.max_fee_per_gas, gas.max_priority_fee_per_gas) {
            (Some(max_fee), Some(priority_fee)) => {
                tx.max_fee_per_gas = Some(max_fee);
                tx.max_priority_fee_per_gas = Some(priority_fee);
            }
            _ => tx.gas_price = gas.gas_price,
        }
        Ok(tx)
    }

    async fn max_ether_bridge(&self, chain: &ChainConfig) -> Result<U256> {
        ensure_chain(self.chain_id, chain)?;
        let contract = BridgeContract::new(chain.bridge_contract(), &self.provider);
        Ok(contract.max_ether_bridge().await?)
    }
}
