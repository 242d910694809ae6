//! Application state management.

use anyhow::{Context, Result};
use serde::Serialize;
use si7006_hw::hwmon::{self, AttributeFile};
use si7006_hw::{Attribute, HwmonChip, Si7006};
use tracing::info;

use crate::config::DeviceConfig;

/// One attribute file in a snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Reading {
    /// Attribute file name (e.g., "temp1_input")
    pub file: String,

    /// Rendered value, if the read succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Error message, if the read failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every exposed attribute of the chip.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub name: String,
    pub readings: Vec<Reading>,
}

/// Shared application state.
pub struct AppState {
    /// Attached chip
    chip: Box<dyn HwmonChip>,
}

impl AppState {
    /// Creates state around an already attached chip.
    pub fn new(chip: Box<dyn HwmonChip>) -> Self {
        Self { chip }
    }

    /// Opens the configured bus and attaches the sensor.
    pub fn open(config: &DeviceConfig) -> Result<Self> {
        let device = Si7006::open(
            &config.name,
            &config.bus,
            config.address,
            config.refresh_interval(),
        )
        .with_context(|| {
            format!(
                "Failed to attach {} at {}:{:#04x}",
                config.name, config.bus, config.address
            )
        })?;

        info!(
            "{}: sensor on {} at {:#04x}",
            device.name(),
            config.bus,
            config.address
        );
        Ok(Self::new(Box::new(device)))
    }

    /// Returns the chip name.
    pub fn name(&self) -> &str {
        self.chip.name()
    }

    /// Reads one attribute file by name. Blocks on the bus when the cache is stale.
    pub fn read_attribute(&self, name: &str) -> si7006_hw::Result<String> {
        let file: AttributeFile = name.parse()?;
        hwmon::read_file(self.chip.as_ref(), &file)
    }

    /// Reads every exposed attribute file.
    pub fn snapshot(&self) -> Snapshot {
        let readings = hwmon::attribute_files(self.chip.as_ref())
            .into_iter()
            .map(|file| match hwmon::read_file(self.chip.as_ref(), &file) {
                Ok(value) => Reading {
                    file: file.to_string(),
                    value: Some(value),
                    error: None,
                },
                Err(e) => Reading {
                    file: file.to_string(),
                    value: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        Snapshot {
            name: self.name().to_string(),
            readings,
        }
    }

    /// Reads the current value of every input channel.
    pub fn poll(&self) -> si7006_hw::Result<Vec<(AttributeFile, i32)>> {
        hwmon::attribute_files(self.chip.as_ref())
            .into_iter()
            .filter(|file| file.attribute == Attribute::Input)
            .map(|file| {
                self.chip
                    .read(file.kind, file.attribute, file.channel)
                    .map(|value| (file, value))
            })
            .collect()
    }
}
