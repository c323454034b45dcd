// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP fiat price oracle.

use alloy_primitives::utils::parse_units;
use alloy_primitives::U256;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::error::{BridgeError, Result};
use crate::intent::{ChainConfig, Token};
use crate::traits::PriceOracle;

/// Body returned by the price endpoint
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PriceResponse {
    /// Decimal fiat price of one whole token, e.g. `"2012.37"`
    pub price: String,
}

/// Price oracle querying `{base_url}/prices/{chain_id}/{token}`.
///
/// Prices are converted to fixed-point values with `precision` decimals.
///
/// # Examples
///
/// ```rust
/// use bridge_readiness::providers::HttpPriceOracle;
///
/// let oracle = HttpPriceOracle::new("https://prices.example.com", 18).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpPriceOracle {
    base_url: Url,
    precision: u8,
    client: Client,
}

impl HttpPriceOracle {
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(base_url: impl AsRef<str>, precision: u8) -> Result<Self> {
        let mut base_url = Url::parse(base_url.as_ref()).map_err(|e| BridgeError::InvalidUrl {
            reason: e.to_string(),
        })?;
        // keep the last path segment when joining
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            base_url,
            precision,
            client: Client::new(),
        })
    }

    fn price_url(&self, chain: &ChainConfig, token: &Token) -> Result<Url> {
        self.base_url
            .join(&format!("prices/{}/{}", chain.chain_id(), token.address()))
            .map_err(|e| BridgeError::InvalidUrl {
                reason: e.to_string(),
            })
    }

    fn parse_price(&self, response: &PriceResponse) -> Result<U256> {
        let price = parse_units(response.price.trim(), self.precision)
            .map_err(|e| BridgeError::PriceUnavailable(format!("{}: {e}", response.price)))?;
        Ok(price.get_absolute())
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    #[instrument(skip(self, chain, token), fields(chain_id = chain.chain_id(), symbol = token.symbol()))]
    async fn token_price(&self, chain: &ChainConfig, token: &Token) -> Result<U256> {
        let url = self.price_url(chain, token)?;
        trace!(url = %url, "Requesting token price");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(BridgeError::Network)?;

        let status_code = response.status();
        trace!(status_code = %status_code, "Received price response");

        if status_code == reqwest::StatusCode::NOT_FOUND {
            return Err(BridgeError::PriceUnavailable(format!(
                "no price for {}",
                token.symbol()
            )));
        }

        response.error_for_status_ref()?;

        let json_value = response.json::<serde_json::Value>().await?;
        let body: PriceResponse = serde_json::from_value(json_value)?;
        let price = self.parse_price(&body)?;
        debug!(price = %price, "Token price parsed");

        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_chains::NamedChain;
    use alloy_primitives::{address, Address};

    fn mainnet() -> ChainConfig {
        ChainConfig::builder()
            .chain(NamedChain::Mainnet)
            .name("Ethereum")
            .bridge_contract(Address::ZERO)
            .build()
    }

    #[test]
    fn test_price_url_keeps_base_path() {
        let oracle = HttpPriceOracle::new("https://api.example.com/v1", 18).unwrap();
        let token = Token::erc20(
            address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            "USDC",
            6,
        );

        let url = oracle.price_url(&mainnet(), &token).unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/prices/1/0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
        );
    }

    #[test]
    fn test_parse_price_to_fixed_point() {
        let oracle = HttpPriceOracle::new("https://api.example.com", 2).unwrap();
        let body: PriceResponse = serde_json::from_str(r#"{"price":"2012.37"}"#).unwrap();

        assert_eq!(oracle.parse_price(&body).unwrap(), U256::from(201_237u64));
    }

    #[test]
    fn test_unparseable_price_is_unavailable() {
        let oracle = HttpPriceOracle::new("https://api.example.com", 2).unwrap();
        let body = PriceResponse {
            price: "n/a".to_string(),
        };

        assert!(matches!(
            oracle.parse_price(&body),
            Err(BridgeError::PriceUnavailable(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpPriceOracle::new("not a url", 18),
            Err(BridgeError::InvalidUrl { .. })
        ));
    }
}
