use embassy_time::Duration;
use embedded_can::StandardId;
use heapless::String;
use serde::{Deserialize, Serialize};

use crate::address::MAX_NODE_ADDRESS;
use crate::{Error, Result};

pub const DEFAULT_BITRATE: u32 = 500_000;
pub const DEFAULT_BASE_ID: u16 = 0x0A;
pub const DEFAULT_UPDATE_TRIGGER_ID: u16 = 0x00;
pub const DEFAULT_PROVISIONING_ID: u16 = 0x01;
pub const DEFAULT_TX_INTERVAL_MS: u64 = 200;
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
pub const DEFAULT_UPDATE_WINDOW_MS: u64 = 180_000;
pub const DEFAULT_HOSTNAME_PREFIX: &str = "esp32c6-";

pub type HostnamePrefix = String<16>;

/// Tunable parameters of a sensor node.
///
/// The bitrate is only consumed when bringing up the bus driver; everything
/// else drives the node logic directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Bus bit rate (bit/s)
    pub bitrate: u32,
    /// Identifier of address 0, the broadcast range is `base_id..=base_id + 7`
    pub base_id: u16,
    /// Reserved inbound identifier for update triggers
    pub update_trigger_id: u16,
    /// Reserved inbound identifier for credential transfer frames
    pub provisioning_id: u16,
    /// Status broadcast period (ms)
    pub tx_interval_ms: u64,
    /// Debounce window (ms)
    pub debounce_ms: u64,
    /// Input sampling period of the run loop (ms)
    pub poll_interval_ms: u64,
    /// Time budget handed to the update procedure (ms)
    pub update_window_ms: u64,
    /// Prefix of the node identity string
    pub hostname_prefix: HostnamePrefix,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut hostname_prefix = HostnamePrefix::new();
        hostname_prefix.push_str(DEFAULT_HOSTNAME_PREFIX).ok();

        Self {
            bitrate: DEFAULT_BITRATE,
            base_id: DEFAULT_BASE_ID,
            update_trigger_id: DEFAULT_UPDATE_TRIGGER_ID,
            provisioning_id: DEFAULT_PROVISIONING_ID,
            tx_interval_ms: DEFAULT_TX_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            update_window_ms: DEFAULT_UPDATE_WINDOW_MS,
            hostname_prefix,
        }
    }
}

impl NodeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bitrate == 0 || self.tx_interval_ms == 0 || self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig);
        }

        self.update_trigger_id()?;
        self.provisioning_id()?;
        if self.update_trigger_id == self.provisioning_id {
            return Err(Error::InvalidConfig);
        }

        let last = self.base_id as u32 + MAX_NODE_ADDRESS as u32;
        if last > StandardId::MAX.as_raw() as u32 {
            return Err(Error::InvalidIdentifier);
        }

        // Inbound identifiers must stay outside the broadcast range
        let broadcast_range = self.base_id as u32..=last;
        if broadcast_range.contains(&(self.update_trigger_id as u32))
            || broadcast_range.contains(&(self.provisioning_id as u32))
        {
            return Err(Error::InvalidConfig);
        }

        Ok(())
    }

    pub fn update_trigger_id(&self) -> Result<StandardId> {
        StandardId::new(self.update_trigger_id).ok_or(Error::InvalidIdentifier)
    }

    pub fn provisioning_id(&self) -> Result<StandardId> {
        StandardId::new(self.provisioning_id).ok_or(Error::InvalidIdentifier)
    }

    pub fn tx_interval(&self) -> Duration {
        Duration::from_millis(self.tx_interval_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn update_window(&self) -> Duration {
        Duration::from_millis(self.update_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NodeConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.bitrate, 500_000);
        assert_eq!(config.tx_interval(), Duration::from_millis(200));
        assert_eq!(config.debounce_window(), Duration::from_millis(50));
        assert_eq!(config.hostname_prefix.as_str(), "esp32c6-");
    }

    #[test]
    fn test_inbound_id_inside_broadcast_range() {
        let config = NodeConfig {
            provisioning_id: 0x0C,
            ..NodeConfig::default()
        };

        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_broadcast_range_overflows_standard_id() {
        let config = NodeConfig {
            base_id: 0x7FC,
            ..NodeConfig::default()
        };

        assert_eq!(config.validate(), Err(Error::InvalidIdentifier));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = NodeConfig {
            tx_interval_ms: 0,
            ..NodeConfig::default()
        };

        assert_eq!(config.validate(), Err(Error::InvalidConfig));
    }
}
