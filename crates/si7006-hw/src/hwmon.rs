//! Hardware-monitoring read interface.
//!
//! Mirrors the shape of a hwmon chip: the host asks for a (sensor type,
//! attribute, channel) triple and the chip either answers or reports the
//! request as not supported. Values are exposed under sysfs-style attribute
//! names such as `temp1_input` or `humidity1_max`.

use crate::{Clock, Error, Quantity, Result, Si7006, Transport};
use std::str::FromStr;

/// Number of channels per quantity.
pub const CHANNEL_COUNT: usize = 1;

/// Sensor types a hwmon host may ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    /// Temperature (`temp`).
    Temp,
    /// Voltage (`in`).
    In,
    /// Current (`curr`).
    Curr,
    /// Power (`power`).
    Power,
    /// Energy (`energy`).
    Energy,
    /// Relative humidity (`humidity`).
    Humidity,
    /// Fan speed (`fan`).
    Fan,
    /// PWM output (`pwm`).
    Pwm,
}

impl SensorType {
    /// Attribute file prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            SensorType::Temp => "temp",
            SensorType::In => "in",
            SensorType::Curr => "curr",
            SensorType::Power => "power",
            SensorType::Energy => "energy",
            SensorType::Humidity => "humidity",
            SensorType::Fan => "fan",
            SensorType::Pwm => "pwm",
        }
    }

    /// First index used in attribute file names. Voltages count from zero.
    pub fn index_base(&self) -> usize {
        match self {
            SensorType::In => 0,
            _ => 1,
        }
    }
}

impl FromStr for SensorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "temp" => Ok(SensorType::Temp),
            "in" => Ok(SensorType::In),
            "curr" => Ok(SensorType::Curr),
            "power" => Ok(SensorType::Power),
            "energy" => Ok(SensorType::Energy),
            "humidity" => Ok(SensorType::Humidity),
            "fan" => Ok(SensorType::Fan),
            "pwm" => Ok(SensorType::Pwm),
            _ => Err(Error::InvalidAttribute(s.to_string())),
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

impl TryFrom<SensorType> for Quantity {
    type Error = Error;

    fn try_from(kind: SensorType) -> Result<Self> {
        match kind {
            SensorType::Temp => Ok(Quantity::Temperature),
            SensorType::Humidity => Ok(Quantity::Humidity),
            other => Err(Error::NotSupported(format!("sensor type {}", other))),
        }
    }
}

/// Per-channel attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Current value.
    Input,
    /// Channel label.
    Label,
    /// Lowest value seen.
    Min,
    /// Highest value seen.
    Max,
    /// Critical limit.
    Crit,
    /// Historical lowest value.
    Lowest,
    /// Historical highest value.
    Highest,
    /// Alarm flag.
    Alarm,
    /// Channel enable.
    Enable,
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "input" => Ok(Attribute::Input),
            "label" => Ok(Attribute::Label),
            "min" => Ok(Attribute::Min),
            "max" => Ok(Attribute::Max),
            "crit" => Ok(Attribute::Crit),
            "lowest" => Ok(Attribute::Lowest),
            "highest" => Ok(Attribute::Highest),
            "alarm" => Ok(Attribute::Alarm),
            "enable" => Ok(Attribute::Enable),
            _ => Err(Error::InvalidAttribute(s.to_string())),
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Attribute::Input => "input",
            Attribute::Label => "label",
            Attribute::Min => "min",
            Attribute::Max => "max",
            Attribute::Crit => "crit",
            Attribute::Lowest => "lowest",
            Attribute::Highest => "highest",
            Attribute::Alarm => "alarm",
            Attribute::Enable => "enable",
        };
        f.write_str(name)
    }
}

/// Static description of the channels of one sensor type.
///
/// `config` holds one attribute set per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    pub kind: SensorType,
    pub config: &'static [&'static [Attribute]],
}

impl ChannelInfo {
    /// Returns true if `channel` declares `attribute`.
    pub fn exposes(&self, channel: usize, attribute: Attribute) -> bool {
        self.config
            .get(channel)
            .is_some_and(|attrs| attrs.contains(&attribute))
    }
}

const SI7006_ATTRIBUTES: &[Attribute] = &[
    Attribute::Input,
    Attribute::Label,
    Attribute::Max,
    Attribute::Min,
];

/// Channel layout of the Si7006: one temperature and one humidity channel.
pub const SI7006_CHANNELS: &[ChannelInfo] = &[
    ChannelInfo {
        kind: SensorType::Temp,
        config: &[SI7006_ATTRIBUTES],
    },
    ChannelInfo {
        kind: SensorType::Humidity,
        config: &[SI7006_ATTRIBUTES],
    },
];

/// Operations a hwmon host calls on a registered chip.
pub trait HwmonChip: Send + Sync {
    /// Chip name as shown to the host.
    fn name(&self) -> &str;

    /// Channel layout.
    fn channels(&self) -> &'static [ChannelInfo];

    /// Returns true if the attribute is exposed read-only.
    fn is_visible(&self, kind: SensorType, attribute: Attribute, channel: usize) -> bool;

    /// Reads a numeric attribute.
    fn read(&self, kind: SensorType, attribute: Attribute, channel: usize) -> Result<i32>;

    /// Reads a string attribute (the channel label).
    fn read_string(
        &self,
        kind: SensorType,
        attribute: Attribute,
        channel: usize,
    ) -> Result<&'static str>;
}

impl<T: Transport, C: Clock> Si7006<T, C> {
    /// Dispatches a numeric read to the sampling cache.
    ///
    /// `input` may sample the chip; `min` and `max` only read the cache.
    pub fn read(&self, kind: SensorType, attribute: Attribute, channel: usize) -> Result<i32> {
        let quantity = Quantity::try_from(kind)?;
        if channel >= CHANNEL_COUNT {
            return Err(Error::NotSupported(format!("{} channel {}", kind, channel)));
        }

        match attribute {
            Attribute::Input => self.sampler().current(quantity),
            Attribute::Max => self.sampler().max(quantity),
            Attribute::Min => self.sampler().min(quantity),
            other => Err(Error::NotSupported(format!("{} attribute {}", kind, other))),
        }
    }

    /// Returns the fixed label of a channel.
    pub fn label(&self, kind: SensorType) -> Result<&'static str> {
        Ok(Quantity::try_from(kind)?.label())
    }

    /// Returns true for the readable quantity/attribute pairs.
    ///
    /// The channel is not checked; hosts ask this before channels are known.
    pub fn is_visible(&self, kind: SensorType, attribute: Attribute, _channel: usize) -> bool {
        matches!(kind, SensorType::Temp | SensorType::Humidity)
            && matches!(attribute, Attribute::Input | Attribute::Max | Attribute::Min)
    }
}

impl<T, C> HwmonChip for Si7006<T, C>
where
    T: Transport + Send,
    C: Clock,
{
    fn name(&self) -> &str {
        Si7006::name(self)
    }

    fn channels(&self) -> &'static [ChannelInfo] {
        SI7006_CHANNELS
    }

    fn is_visible(&self, kind: SensorType, attribute: Attribute, channel: usize) -> bool {
        Si7006::is_visible(self, kind, attribute, channel)
    }

    fn read(&self, kind: SensorType, attribute: Attribute, channel: usize) -> Result<i32> {
        Si7006::read(self, kind, attribute, channel)
    }

    fn read_string(
        &self,
        kind: SensorType,
        _attribute: Attribute,
        _channel: usize,
    ) -> Result<&'static str> {
        self.label(kind)
    }
}

/// A sysfs-style attribute name such as `temp1_input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeFile {
    pub kind: SensorType,
    /// Zero-based channel index.
    pub channel: usize,
    pub attribute: Attribute,
}

impl FromStr for AttributeFile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidAttribute(s.to_string());

        let (head, attribute) = s.split_once('_').ok_or_else(invalid)?;
        let digits = head.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
        let (prefix, index) = head.split_at(digits);

        let kind: SensorType = prefix.parse().map_err(|_| invalid())?;
        let index: usize = index.parse().map_err(|_| invalid())?;
        let channel = index.checked_sub(kind.index_base()).ok_or_else(invalid)?;
        let attribute: Attribute = attribute.parse().map_err(|_| invalid())?;

        Ok(Self {
            kind,
            channel,
            attribute,
        })
    }
}

impl std::fmt::Display for AttributeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}_{}",
            self.kind,
            self.channel + self.kind.index_base(),
            self.attribute
        )
    }
}

fn is_exposed(chip: &dyn HwmonChip, file: &AttributeFile) -> bool {
    let declared = chip
        .channels()
        .iter()
        .any(|info| info.kind == file.kind && info.exposes(file.channel, file.attribute));

    declared
        && (file.attribute == Attribute::Label
            || chip.is_visible(file.kind, file.attribute, file.channel))
}

/// Lists every attribute file the chip exposes, in registration order.
pub fn attribute_files(chip: &dyn HwmonChip) -> Vec<AttributeFile> {
    let mut files = Vec::new();
    for info in chip.channels() {
        for (channel, attributes) in info.config.iter().enumerate() {
            for &attribute in attributes.iter() {
                let file = AttributeFile {
                    kind: info.kind,
                    channel,
                    attribute,
                };
                if is_exposed(chip, &file) {
                    files.push(file);
                }
            }
        }
    }
    files
}

/// Reads an attribute file and renders it the way sysfs would.
pub fn read_file(chip: &dyn HwmonChip, file: &AttributeFile) -> Result<String> {
    if !is_exposed(chip, file) {
        return Err(Error::NotSupported(file.to_string()));
    }

    match file.attribute {
        Attribute::Label => chip
            .read_string(file.kind, file.attribute, file.channel)
            .map(str::to_string),
        attribute => chip
            .read(file.kind, attribute, file.channel)
            .map(|value| value.to_string()),
    }
}
