// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::U256;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Fallback for the native bridge limit when the contract cannot be read (0.25 ETH)
pub const DEFAULT_MAX_ETHER_BRIDGE: U256 = U256::from_limbs([250_000_000_000_000_000, 0, 0, 0]);

/// Default interval between block number polls
pub const DEFAULT_BLOCK_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Default gas buffer percentage (20%)
pub const DEFAULT_GAS_BUFFER_PERCENT: u64 = 20;

/// Runtime settings of a bridge session and its providers.
///
/// # Examples
///
/// ```rust
/// use bridge_readiness::ReadinessConfig;
/// use std::time::Duration;
///
/// let config = ReadinessConfig::default()
///     .with_block_poll_interval(Duration::from_secs(2))
///     .with_fiat_enabled(false);
/// assert!(!config.fiat_enabled);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// How often the block poller asks for the latest block number.
    pub block_poll_interval: Duration,
    /// Safety margin added on top of gas estimates, in percent.
    pub gas_buffer_percent: u64,
    /// Native bridge limit assumed when the contract cannot be read.
    pub max_ether_bridge_fallback: U256,
    /// Decimals of the fixed-point fiat prices returned by the price oracle.
    pub fiat_precision: u8,
    /// Whether fiat prices are looked up at all.
    pub fiat_enabled: bool,
    /// Number of receipt polls before a submitted transaction is given up on.
    pub confirmation_max_attempts: u32,
    /// Delay between receipt polls.
    pub confirmation_poll_interval: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            block_poll_interval: DEFAULT_BLOCK_POLL_INTERVAL,
            gas_buffer_percent: DEFAULT_GAS_BUFFER_PERCENT,
            max_ether_bridge_fallback: DEFAULT_MAX_ETHER_BRIDGE,
            fiat_precision: 18,
            fiat_enabled: true,
            confirmation_max_attempts: 60,
            confirmation_poll_interval: Duration::from_secs(2),
        }
    }
}

impl ReadinessConfig {
    /// Loads overrides from the environment (and a `.env` file, if present).
    ///
    /// Recognised variables:
    ///
    /// - `BRIDGE_BLOCK_POLL_INTERVAL_MS`
    /// - `BRIDGE_GAS_BUFFER_PERCENT`
    /// - `BRIDGE_FIAT_ENABLED`
    /// - `BRIDGE_CONFIRMATION_MAX_ATTEMPTS`
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidConfig`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Some(ms) = env_var::<u64>("BRIDGE_BLOCK_POLL_INTERVAL_MS")? {
            config.block_poll_interval = Duration::from_millis(ms);
        }
        if let Some(percent) = env_var("BRIDGE_GAS_BUFFER_PERCENT")? {
            config.gas_buffer_percent = percent;
        }
        if let Some(enabled) = env_var("BRIDGE_FIAT_ENABLED")? {
            config.fiat_enabled = enabled;
        }
        if let Some(attempts) = env_var("BRIDGE_CONFIRMATION_MAX_ATTEMPTS")? {
            config.confirmation_max_attempts = attempts;
        }
        Ok(config)
    }

    pub fn with_block_poll_interval(mut self, interval: Duration) -> Self {
        self.block_poll_interval = interval;
        self
    }

    pub fn with_gas_buffer_percent(mut self, percent: u64) -> Self {
        self.gas_buffer_percent = percent;
        self
    }

    pub fn with_max_ether_bridge_fallback(mut self, limit: U256) -> Self {
        self.max_ether_bridge_fallback = limit;
        self
    }

    pub fn with_fiat_precision(mut self, precision: u8) -> Self {
        self.fiat_precision = precision;
        self
    }

    pub fn with_fiat_enabled(mut self, enabled: bool) -> Self {
        self.fiat_enabled = enabled;
        self
    }

    pub fn with_confirmation_polling(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.confirmation_max_attempts = max_attempts;
        self.confirmation_poll_interval = interval;
        self
    }
}

fn env_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| BridgeError::InvalidConfig(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::utils::parse_ether;

    #[test]
    fn test_default_config() {
        let config = ReadinessConfig::default();
        assert_eq!(config.block_poll_interval, Duration::from_secs(4));
        assert_eq!(config.gas_buffer_percent, 20);
        assert_eq!(
            config.max_ether_bridge_fallback,
            parse_ether("0.25").unwrap()
        );
        assert!(config.fiat_enabled);
    }

    #[test]
    fn test_builder_methods() {
        let config = ReadinessConfig::default()
            .with_gas_buffer_percent(50)
            .with_fiat_precision(8)
            .with_confirmation_polling(3, Duration::from_millis(10));
        assert_eq!(config.gas_buffer_percent, 50);
        assert_eq!(config.fiat_precision, 8);
        assert_eq!(config.confirmation_max_attempts, 3);
        assert_eq!(config.confirmation_poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_env_var_parsing() {
        std::env::set_var("BRIDGE_READINESS_TEST_PERCENT", " 35 ");
        std::env::set_var("BRIDGE_READINESS_TEST_BAD", "lots");

        assert_eq!(
            env_var::<u64>("BRIDGE_READINESS_TEST_PERCENT").unwrap(),
            Some(35)
        );
        assert_eq!(env_var::<u64>("BRIDGE_READINESS_TEST_UNSET").unwrap(), None);
        assert!(matches!(
            env_var::<u64>("BRIDGE_READINESS_TEST_BAD"),
            Err(BridgeError::InvalidConfig(_))
        ));
    }
}
