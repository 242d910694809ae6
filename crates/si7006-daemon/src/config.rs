//! Configuration management.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listen address (e.g., "127.0.0.1:8687")
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Reading log interval in milliseconds (0 disables)
    #[serde(default = "default_poll")]
    pub poll: u64,

    /// Sensor binding
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Sensor binding: which bus, which address, and how long samples stay fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name reported to clients
    #[serde(default = "default_name")]
    pub name: String,

    /// I2C bus device node
    #[serde(default = "default_bus")]
    pub bus: String,

    /// 7-bit I2C address
    #[serde(default = "default_address")]
    pub address: u8,

    /// Staleness window in milliseconds
    #[serde(default = "default_refresh")]
    pub refresh: u64,
}

impl DeviceConfig {
    /// Checks values the TOML types alone cannot constrain.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.address <= 0x7F,
            "Device address {:#04x} is not a 7-bit I2C address",
            self.address
        );
        Ok(())
    }

    /// Returns the staleness window.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            bus: default_bus(),
            address: default_address(),
            refresh: default_refresh(),
        }
    }
}

// Default value functions
fn default_listen() -> String {
    "127.0.0.1:8687".to_string()
}

fn default_poll() -> u64 {
    10000
}

fn default_name() -> String {
    si7006_hw::DEFAULT_NAME.to_string()
}

fn default_bus() -> String {
    si7006_hw::DEFAULT_BUS.to_string()
}

fn default_address() -> u8 {
    si7006_hw::DEFAULT_ADDRESS
}

fn default_refresh() -> u64 {
    1000
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse configuration")?;
        config.device.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            poll: default_poll(),
            device: DeviceConfig::default(),
        }
    }
}
