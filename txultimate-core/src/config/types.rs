//! Configuration type definitions
//!
//! Typed form of the component configuration. Every value arriving from
//! the outside (text, flash, code) goes through [`DeviceConfig::validate`]
//! before a [`Device`](crate::Device) is built from it.

use heapless::{String, Vec};
use txultimate_hal::UartConfig;
use txultimate_protocol::channel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};
use crate::registry::{BinaryObserver, ChannelSet, TouchBinarySensor, MAX_SENSORS};

/// The touch controller only talks at this rate
pub const BAUD_RATE: u32 = 115_200;

/// Maximum sensor name length
pub const MAX_LABEL_LEN: usize = 24;

/// Maximum touch sensors per device
pub const MAX_TOUCH_SENSORS: usize = MAX_SENSORS;

/// Maximum channels listed for one sensor
pub const MAX_CHANNELS_PER_SENSOR: usize = channel::MAX as usize;

/// Output pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO number
    pub pin: u8,
    /// Pin is active-low
    pub inverted: bool,
}

impl PinConfig {
    /// Create an active-high pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }

    /// Electrical level for a logical state
    pub const fn level(&self, active: bool) -> bool {
        active != self.inverted
    }
}

/// UART link to the touch controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Baud rate, must be [`BAUD_RATE`]
    pub baud_rate: u32,
    /// ESP32 TX (controller RX)
    pub tx_pin: Option<u8>,
    /// ESP32 RX (controller TX)
    pub rx_pin: Option<u8>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            tx_pin: None,
            rx_pin: None,
        }
    }
}

impl LinkConfig {
    /// Link on the given TX/RX pins at the fixed baud rate
    pub const fn new(tx_pin: u8, rx_pin: u8) -> Self {
        Self {
            baud_rate: BAUD_RATE,
            tx_pin: Some(tx_pin),
            rx_pin: Some(rx_pin),
        }
    }

    /// Peripheral settings the board must apply to the UART
    pub fn uart_config(&self) -> UartConfig {
        UartConfig {
            baudrate: self.baud_rate,
            ..UartConfig::default()
        }
    }

    /// Check baud rate and that both directions are wired
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate != BAUD_RATE {
            return Err(ConfigError::BaudRate(self.baud_rate));
        }
        let tx = self.tx_pin.ok_or(ConfigError::MissingTx)?;
        let rx = self.rx_pin.ok_or(ConfigError::MissingRx)?;
        if tx == rx {
            return Err(ConfigError::PinConflict(tx));
        }
        Ok(())
    }
}

/// One touch binary sensor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TouchSensorConfig {
    /// Sensor name
    pub name: String<MAX_LABEL_LEN>,
    /// Channels that drive this sensor (1-13)
    pub channels: Vec<u8, MAX_CHANNELS_PER_SENSOR>,
    /// Report presses only, never releases
    pub press_only: bool,
}

impl TouchSensorConfig {
    /// Create a sensor config
    pub fn new(name: &str, channels: &[u8]) -> Result<Self, ConfigError> {
        let name = String::try_from(name).map_err(|_| ConfigError::LabelTooLong)?;
        let channels = Vec::from_slice(channels).map_err(|_| ConfigError::TooManyChannels)?;
        Ok(Self {
            name,
            channels,
            press_only: false,
        })
    }

    /// Set press-only mode
    pub fn with_press_only(mut self, press_only: bool) -> Self {
        self.press_only = press_only;
        self
    }

    /// Check channel list: non-empty, in range, no repeats
    pub fn validate(&self) -> Result<(), Error> {
        self.channel_set().map(|_| ())
    }

    fn channel_set(&self) -> Result<ChannelSet, Error> {
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels.into());
        }
        let mut set = ChannelSet::new();
        for &ch in &self.channels {
            if set.contains(ch) {
                return Err(Error::DuplicateChannel(ch));
            }
            set.insert(ch)?;
        }
        Ok(set)
    }

    /// Build the sensor this config describes
    pub fn build_sensor<O: BinaryObserver>(&self, observer: O) -> Result<TouchBinarySensor<O>, Error> {
        self.validate()?;
        Ok(TouchBinarySensor::with_channels(
            observer,
            &self.channels,
            self.press_only,
        )?)
    }
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    /// Output that powers the touch controller
    pub power_pin: PinConfig,
    /// UART parameters
    pub link: LinkConfig,
    /// Touch sensors to register
    pub touch_sensors: Vec<TouchSensorConfig, MAX_TOUCH_SENSORS>,
}

impl DeviceConfig {
    /// Configuration with no touch sensors
    pub fn new(power_pin: PinConfig, link: LinkConfig) -> Self {
        Self {
            power_pin,
            link,
            touch_sensors: Vec::new(),
        }
    }

    /// Append a touch sensor
    pub fn add_touch_sensor(&mut self, sensor: TouchSensorConfig) -> Result<(), ConfigError> {
        self.touch_sensors
            .push(sensor)
            .map_err(|_| ConfigError::TooManySensors)
    }

    /// Check every invariant
    ///
    /// Channels must be unique across all sensors, not only within one.
    pub fn validate(&self) -> Result<(), Error> {
        self.link.validate()?;

        let power = self.power_pin.pin;
        if self.link.tx_pin == Some(power) || self.link.rx_pin == Some(power) {
            return Err(ConfigError::PinConflict(power).into());
        }

        let mut seen = ChannelSet::new();
        for sensor in &self.touch_sensors {
            let channels = sensor.channel_set()?;
            if let Some(ch) = channels.iter().find(|&ch| seen.contains(ch)) {
                return Err(Error::DuplicateChannel(ch));
            }
            for ch in channels.iter() {
                seen.insert(ch)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DeviceConfig {
        DeviceConfig::new(PinConfig::new(5), LinkConfig::new(19, 22))
    }

    #[test]
    fn test_valid_config() {
        let mut config = base();
        config
            .add_touch_sensor(TouchSensorConfig::new("left", &[1, 2, 3]).unwrap())
            .unwrap();
        config
            .add_touch_sensor(
                TouchSensorConfig::new("swipe", &[12, 13])
                    .unwrap()
                    .with_press_only(true),
            )
            .unwrap();
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_baud_rate_fixed() {
        let mut config = base();
        config.link.baud_rate = 9600;
        assert_eq!(
            config.validate(),
            Err(Error::Configuration(ConfigError::BaudRate(9600)))
        );
    }

    #[test]
    fn test_tx_and_rx_required() {
        let mut config = base();
        config.link.tx_pin = None;
        assert_eq!(
            config.validate(),
            Err(Error::Configuration(ConfigError::MissingTx))
        );

        let mut config = base();
        config.link.rx_pin = None;
        assert_eq!(
            config.validate(),
            Err(Error::Configuration(ConfigError::MissingRx))
        );
    }

    #[test]
    fn test_power_pin_conflicts_with_uart() {
        let config = DeviceConfig::new(PinConfig::new(19), LinkConfig::new(19, 22));
        assert_eq!(
            config.validate(),
            Err(Error::Configuration(ConfigError::PinConflict(19)))
        );
    }

    #[test]
    fn test_channel_shared_between_sensors() {
        let mut config = base();
        config
            .add_touch_sensor(TouchSensorConfig::new("a", &[1, 2]).unwrap())
            .unwrap();
        config
            .add_touch_sensor(TouchSensorConfig::new("b", &[2, 3]).unwrap())
            .unwrap();
        assert_eq!(config.validate(), Err(Error::DuplicateChannel(2)));
    }

    #[test]
    fn test_channel_repeated_in_one_sensor() {
        let sensor = TouchSensorConfig::new("a", &[4, 4]).unwrap();
        assert_eq!(sensor.validate(), Err(Error::DuplicateChannel(4)));
    }

    #[test]
    fn test_channel_out_of_range() {
        let sensor = TouchSensorConfig::new("a", &[14]).unwrap();
        assert_eq!(
            sensor.validate(),
            Err(Error::Configuration(ConfigError::ChannelOutOfRange(14)))
        );
        let sensor = TouchSensorConfig::new("a", &[0]).unwrap();
        assert_eq!(
            sensor.validate(),
            Err(Error::Configuration(ConfigError::ChannelOutOfRange(0)))
        );
    }

    #[test]
    fn test_empty_channel_list() {
        let sensor = TouchSensorConfig::new("a", &[]).unwrap();
        assert_eq!(
            sensor.validate(),
            Err(Error::Configuration(ConfigError::NoChannels))
        );
    }

    #[test]
    fn test_label_too_long() {
        let name = "a_touch_sensor_name_that_is_too_long";
        assert_eq!(
            TouchSensorConfig::new(name, &[1]),
            Err(ConfigError::LabelTooLong)
        );
    }

    #[test]
    fn test_pin_level() {
        assert!(PinConfig::new(5).level(true));
        assert!(!PinConfig::inverted(5).level(true));
        assert!(PinConfig::inverted(5).level(false));
    }

    #[test]
    fn test_uart_config() {
        let uart = LinkConfig::new(19, 22).uart_config();
        assert_eq!(uart.baudrate, BAUD_RATE);
        assert!(uart.is_8n1());
    }

    #[test]
    fn test_build_sensor() {
        let config = TouchSensorConfig::new("a", &[6, 8])
            .unwrap()
            .with_press_only(true);
        let sensor = config.build_sensor(crate::mock::Recorder::default()).unwrap();
        assert!(sensor.press_only());
        assert!(sensor.channels().contains(6));
        assert!(sensor.channels().contains(8));
    }
}
