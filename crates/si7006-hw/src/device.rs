//! Si7006 device: identification at attach time plus the sampling cache.

use crate::protocol::{CHIP_ID, IDENTIFY_COMMAND, IDENTIFY_RESPONSE_LEN};
use crate::sampling::DEFAULT_REFRESH;
use crate::{
    Clock, Error, I2cTransport, MonotonicClock, Quantity, Result, Sampler, SensorState, Transport,
};
use linux_embedded_hal::I2cdev;
use std::time::Duration;
use tracing::{debug, error, info};

/// An attached and identified Si7006.
pub struct Si7006<T, C = MonotonicClock> {
    name: String,
    sampler: Sampler<T, C>,
}

impl<T: Transport, C: Clock> Si7006<T, C> {
    /// Identifies the chip behind `transport` and builds the sampling cache.
    ///
    /// Fails if the identification transaction fails or returns a chip id
    /// other than the Si7006's.
    pub fn attach(name: &str, mut transport: T, clock: C, refresh: Duration) -> Result<Self> {
        let found = identify(&mut transport)?;
        if found != CHIP_ID {
            error!("{}: Si7006 not found (chip id {:#04x})", name, found);
            return Err(Error::ChipMismatch {
                expected: CHIP_ID,
                found,
            });
        }

        info!("{}: sensor attached (refresh {:?})", name, refresh);

        Ok(Self {
            name: name.to_string(),
            sampler: Sampler::new(transport, clock, refresh),
        })
    }

    /// Returns the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current temperature in m°C.
    pub fn temperature(&self) -> Result<i32> {
        self.sampler.current(Quantity::Temperature)
    }

    /// Current relative humidity in m%RH.
    pub fn humidity(&self) -> Result<i32> {
        self.sampler.current(Quantity::Humidity)
    }

    /// Returns the sampling cache.
    pub fn sampler(&self) -> &Sampler<T, C> {
        &self.sampler
    }

    /// Returns a consistent copy of the cached state.
    pub fn snapshot(&self) -> SensorState {
        self.sampler.snapshot()
    }
}

impl Si7006<I2cTransport<I2cdev>, MonotonicClock> {
    /// Opens the Linux I2C bus at `path` and attaches the chip at `address`.
    pub fn open(name: &str, path: &str, address: u8, refresh: Duration) -> Result<Self> {
        let transport = I2cTransport::open(path, address)?;
        Self::attach(name, transport, MonotonicClock, refresh)
    }

    /// Opens the chip at its fixed address with the default refresh interval.
    pub fn open_default(path: &str) -> Result<Self> {
        Self::open(crate::DEFAULT_NAME, path, crate::DEFAULT_ADDRESS, DEFAULT_REFRESH)
    }
}

/// Reads the chip id from the electronic ID registers.
fn identify<T: Transport>(transport: &mut T) -> Result<u8> {
    let mut response = [0u8; IDENTIFY_RESPONSE_LEN];
    transport.query(&IDENTIFY_COMMAND, &mut response)?;
    debug!("Identification response: {:02X?}", response);
    Ok(response[0])
}
