//! Error types for the Si7006 hardware library.

use crate::protocol::Quantity;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the sensor.
#[derive(Error, Debug)]
pub enum Error {
    /// I2C bus transfer failed.
    #[error("I2C bus error: {0}")]
    Bus(embedded_hal::i2c::ErrorKind),

    /// I2C bus device node could not be opened.
    #[error("Failed to open I2C bus {path}: {reason}")]
    Open { path: String, reason: String },

    /// The bus accepted fewer bytes than the command holds.
    #[error("Short write: sent {sent} of {expected} bytes")]
    ShortWrite { expected: usize, sent: usize },

    /// The identification handshake returned an unexpected chip id.
    #[error("Si7006 not found (expected chip id {expected:#04x}, got {found:#04x})")]
    ChipMismatch { expected: u8, found: u8 },

    /// No sample has been taken yet; carries the bus error of the last attempt, if any.
    #[error("No {quantity} data available")]
    NoData {
        quantity: Quantity,
        #[source]
        source: Option<Box<Error>>,
    },

    /// The requested sensor type, attribute or channel is not exposed.
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Unparseable attribute file name or attribute value.
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Unparseable quantity name.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

impl Error {
    /// Returns true if this error means the request itself can never succeed.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported(_) | Error::InvalidAttribute(_))
    }
}
