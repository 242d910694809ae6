//! In-memory chip for exercising the daemon without hardware.

use si7006_hw::hwmon::SI7006_CHANNELS;
use si7006_hw::{Attribute, ChannelInfo, Error, HwmonChip, Quantity, Result, SensorType};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Chip answering with fixed readings.
#[derive(Default)]
pub struct StubChip {
    /// Makes every numeric read fail as if the bus never answered.
    pub offline: AtomicBool,
    /// Numeric reads served so far, shared so tests can watch it after the
    /// chip is boxed.
    pub reads: Arc<AtomicUsize>,
}

impl HwmonChip for StubChip {
    fn name(&self) -> &str {
        "stub"
    }

    fn channels(&self) -> &'static [ChannelInfo] {
        SI7006_CHANNELS
    }

    fn is_visible(&self, kind: SensorType, attribute: Attribute, _channel: usize) -> bool {
        matches!(kind, SensorType::Temp | SensorType::Humidity)
            && matches!(attribute, Attribute::Input | Attribute::Max | Attribute::Min)
    }

    fn read(&self, kind: SensorType, attribute: Attribute, _channel: usize) -> Result<i32> {
        let quantity = Quantity::try_from(kind)?;
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::NoData {
                quantity,
                source: None,
            });
        }
        self.reads.fetch_add(1, Ordering::SeqCst);

        let base = match quantity {
            Quantity::Temperature => 23_506,
            Quantity::Humidity => 33_062,
        };
        match attribute {
            Attribute::Input => Ok(base),
            Attribute::Min => Ok(base - 500),
            Attribute::Max => Ok(base + 500),
            other => Err(Error::NotSupported(other.to_string())),
        }
    }

    fn read_string(
        &self,
        kind: SensorType,
        _attribute: Attribute,
        _channel: usize,
    ) -> Result<&'static str> {
        Ok(Quantity::try_from(kind)?.label())
    }
}
