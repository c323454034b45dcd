// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Bridge contract bindings and wrapper

use std::marker::PhantomData;

use alloy_contract::CallBuilder;
use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::{debug, info};
use Bridge::{bridgeAssetCall, BridgeInstance};

/// Parameters of one `bridgeAsset` call
#[derive(Debug, Clone)]
pub struct BridgeAssetParams {
    pub from: Address,
    pub destination_network: u32,
    pub destination_address: Address,
    pub token: Address,
    pub amount: U256,
    /// Encoded EIP-2612 permit, empty when an allowance is used instead
    pub permit_data: Bytes,
}

/// Wrapper around the source chain's bridge contract
pub struct BridgeContract<P: Provider<Ethereum>> {
    instance: BridgeInstance<P>,
}

impl<P: Provider<Ethereum>> BridgeContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "bridge_contract_initialized"
        );
        Self {
            instance: BridgeInstance::new(address, provider),
        }
    }

    /// Call builder for `bridgeAsset`.
    ///
    /// Native asset bridges (zero token address) attach `amount` as value.
    pub fn bridge_asset_call_builder(
        &self,
        params: &BridgeAssetParams,
    ) -> CallBuilder<&P, PhantomData<bridgeAssetCall>> {
        let value = if params.token.is_zero() {
            params.amount
        } else {
            U256::ZERO
        };

        self.instance
            .bridgeAsset(
                params.destination_network,
                params.destination_address,
                params.amount,
                params.token,
                true,
                params.permit_data.clone(),
            )
            .from(params.from)
            .value(value)
    }

    /// Transaction request for `bridgeAsset`, ready to be signed and sent
    pub fn bridge_asset_transaction(&self, params: &BridgeAssetParams) -> TransactionRequest {
        info!(
            from = %params.from,
            destination_network = params.destination_network,
            destination_address = %params.destination_address,
            token = %params.token,
            amount = %params.amount,
            contract_address = %self.instance.address(),
            event = "bridge_asset_transaction_created"
        );

        self.bridge_asset_call_builder(params)
            .into_transaction_request()
    }

    /// Upper bound the contract enforces on native asset bridges
    pub async fn max_ether_bridge(&self) -> Result<U256, alloy_contract::Error> {
        let limit = self.instance.maxEtherBridge().call().await?;

        debug!(
            max_ether_bridge = %limit,
            contract_address = %self.instance.address(),
            event = "max_ether_bridge_retrieved"
        );

        Ok(limit)
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Bridge {
        function bridgeAsset(
            uint32 destinationNetwork,
            address destinationAddress,
            uint256 amount,
            address token,
            bool forceUpdateGlobalExitRoot,
            bytes calldata permitData
        ) external payable;

        function maxEtherBridge() external view returns (uint256);
    }
);
