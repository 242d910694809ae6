//! Bus transport to the sensor.
//!
//! The sampling engine only needs a request/response channel; addressing is
//! fixed when the transport is built and stays opaque to the rest of the crate.

use crate::{Error, Result};
use embedded_hal::i2c::{Error as _, I2c};
use linux_embedded_hal::I2cdev;
use tracing::debug;

pub use embedded_hal::i2c::ErrorKind as BusErrorKind;

/// Point-to-point request/response channel to the chip.
pub trait Transport {
    /// Sends a command, returning the number of bytes accepted.
    fn send(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Fills `buf` with the chip's response.
    fn receive(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Sends a command and reads back a fixed-size response.
    fn query(&mut self, command: &[u8], response: &mut [u8]) -> Result<()> {
        let sent = self.send(command)?;
        if sent < command.len() {
            return Err(Error::ShortWrite {
                expected: command.len(),
                sent,
            });
        }
        self.receive(response)
    }
}

/// Transport over an `embedded-hal` I2C bus at a fixed address.
pub struct I2cTransport<I2C> {
    bus: I2C,
    address: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    /// Wraps a bus for the device at `address`.
    pub fn new(bus: I2C, address: u8) -> Self {
        Self { bus, address }
    }

    /// Releases the underlying bus.
    pub fn release(self) -> I2C {
        self.bus
    }
}

impl I2cTransport<I2cdev> {
    /// Opens a Linux I2C character device.
    pub fn open(path: &str, address: u8) -> Result<Self> {
        let bus = I2cdev::new(path).map_err(|e| Error::Open {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Opened I2C bus {} for device {:#04x}", path, address);
        Ok(Self::new(bus, address))
    }
}

impl<I2C: I2c> Transport for I2cTransport<I2C> {
    fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        self.bus
            .write(self.address, bytes)
            .map_err(|e| Error::Bus(e.kind()))?;
        debug!("I2C {:#04x} <- {:02X?}", self.address, bytes);
        Ok(bytes.len())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        self.bus
            .read(self.address, buf)
            .map_err(|e| Error::Bus(e.kind()))?;
        debug!("I2C {:#04x} -> {:02X?}", self.address, buf);
        Ok(())
    }
}
