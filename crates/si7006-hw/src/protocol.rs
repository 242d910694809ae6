//! Si7006 command set and measurement conversion.
//!
//! Protocol structure:
//! - Measurements: 1 command byte, 2 byte big-endian response code
//! - Identification: 2 command bytes, 6 byte response (byte 0 = chip id)
//! - Values are reported as signed milli-units (m°C, m%RH)

use crate::{Error, Result};
use std::str::FromStr;

/// Chip identifier returned by the electronic ID handshake.
pub const CHIP_ID: u8 = 0x06;

/// Electronic ID (second word) read command.
pub const IDENTIFY_COMMAND: [u8; 2] = [0xFC, 0xC9];

/// Length of the identification response.
pub const IDENTIFY_RESPONSE_LEN: usize = 6;

/// Length of a measurement response.
pub const MEASUREMENT_LEN: usize = 2;

/// Measurement commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Measure relative humidity, hold master mode.
    MeasureHumidity = 0xE5,
    /// Measure temperature, hold master mode.
    MeasureTemperature = 0xE3,
}

/// A physical quantity measured by the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// Temperature in milli-degrees Celsius.
    Temperature,
    /// Relative humidity in milli-percent.
    Humidity,
}

impl Quantity {
    /// All quantities in channel registration order.
    pub const ALL: [Quantity; 2] = [Quantity::Temperature, Quantity::Humidity];

    /// Returns the measurement command for this quantity.
    pub fn command(&self) -> Command {
        match self {
            Quantity::Temperature => Command::MeasureTemperature,
            Quantity::Humidity => Command::MeasureHumidity,
        }
    }

    /// Converts a raw 16-bit code into milli-units.
    pub fn convert(&self, code: u16) -> i32 {
        match self {
            Quantity::Temperature => temperature_milli_celsius(code),
            Quantity::Humidity => humidity_milli_percent(code),
        }
    }

    /// Returns the fixed channel label.
    pub fn label(&self) -> &'static str {
        match self {
            Quantity::Temperature => "BOARD TEMP",
            Quantity::Humidity => "BOARD HR",
        }
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "temperature" | "temp" => Ok(Quantity::Temperature),
            "humidity" | "rh" => Ok(Quantity::Humidity),
            _ => Err(Error::InvalidQuantity(s.to_string())),
        }
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quantity::Temperature => write!(f, "temperature"),
            Quantity::Humidity => write!(f, "humidity"),
        }
    }
}

/// Applies the datasheet transfer function `code * scale / 65536 - offset`.
///
/// The product needs more than 32 bits (65535 * 175720 is about 1.15e10).
fn linear(code: u16, scale: i64, offset: i64) -> i32 {
    ((i64::from(code) * scale) / 65536 - offset) as i32
}

/// Converts a temperature code to milli-degrees Celsius.
pub fn temperature_milli_celsius(code: u16) -> i32 {
    linear(code, 175_720, 46_850)
}

/// Converts a humidity code to milli-percent relative humidity.
pub fn humidity_milli_percent(code: u16) -> i32 {
    linear(code, 125_000, 6_000)
}

/// Decodes a big-endian measurement response.
pub fn decode_code(response: [u8; MEASUREMENT_LEN]) -> u16 {
    u16::from_be_bytes(response)
}
