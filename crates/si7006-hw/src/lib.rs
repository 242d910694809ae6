//! Si7006 Hardware Library
//!
//! Provides a cached, hwmon-style read interface for the Silicon Labs Si7006
//! I2C humidity and temperature sensor.

pub mod clock;
pub mod device;
pub mod error;
pub mod hwmon;
pub mod protocol;
pub mod sampling;
pub mod transport;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use device::Si7006;
pub use error::{Error, Result};
pub use hwmon::{Attribute, AttributeFile, ChannelInfo, HwmonChip, SensorType};
pub use protocol::Quantity;
pub use sampling::{Measurement, Sampler, SensorState};
pub use transport::{I2cTransport, Transport};

/// Default I2C bus device node.
pub const DEFAULT_BUS: &str = "/dev/i2c-1";

/// Fixed 7-bit bus address of the Si7006.
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Default device name reported to the host.
pub const DEFAULT_NAME: &str = "si7006";
