//! Error types
//!
//! Setup failures ([`Error::Configuration`], [`Error::DuplicateChannel`])
//! abort initialization. Malformed frames never surface here; the link
//! driver records them as [`ProtocolError`](txultimate_protocol::ProtocolError)
//! in its statistics and keeps going.

use core::fmt;

use txultimate_hal::PinError;

/// Errors raised by the device, registry and link driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Invalid or conflicting setup
    Configuration(ConfigError),
    /// Channel already bound to a sensor
    DuplicateChannel(u8),
    /// Link used before `initialize`
    NotInitialized,
    /// UART write failed
    Transport,
}

/// Reasons a configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Channel outside 1-13
    ChannelOutOfRange(u8),
    /// Touch sensor without any channel
    NoChannels,
    /// More touch sensors than the registry holds
    TooManySensors,
    /// Channel list longer than the number of channels
    TooManyChannels,
    /// Baud rate other than 115200
    BaudRate(u32),
    /// UART framing other than 8N1
    UartFraming,
    /// UART TX pin not configured
    MissingTx,
    /// UART RX pin not configured
    MissingRx,
    /// Same GPIO used for power and UART
    PinConflict(u8),
    /// Power pin could not be claimed
    Pin(PinError),
    /// Required key absent from the configuration text
    MissingKey(&'static str),
    /// Sensor name longer than the label capacity
    LabelTooLong,
    /// Configuration text could not be parsed
    Parse {
        /// 1-based line number
        line: u16,
        /// What went wrong on that line
        kind: ParseErrorKind,
    },
    /// Stored configuration has an unknown layout version
    VersionMismatch(u8),
    /// Stored configuration could not be decoded
    Deserialize,
    /// Configuration does not fit the storage buffer
    Serialize,
}

/// Parse failure detail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Line is neither a section header nor `key = value`
    Syntax,
    /// Unknown `[section]` or sensor section without a name
    InvalidSection,
    /// Sensor section name used twice
    DuplicateSection,
    /// Key not valid in the current section
    UnknownKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// List or section count exceeds capacity
    TooManyItems,
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Configuration(e)
    }
}

impl From<PinError> for ConfigError {
    fn from(e: PinError) -> Self {
        ConfigError::Pin(e)
    }
}

impl From<PinError> for Error {
    fn from(e: PinError) -> Self {
        Error::Configuration(ConfigError::Pin(e))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(e) => write!(f, "configuration error: {}", e),
            Error::DuplicateChannel(ch) => write!(f, "channel {} is already registered", ch),
            Error::NotInitialized => f.write_str("link not initialized"),
            Error::Transport => f.write_str("UART write failed"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ChannelOutOfRange(ch) => write!(f, "channel {} not in 1..=13", ch),
            ConfigError::NoChannels => f.write_str("touch sensor has no channels"),
            ConfigError::TooManySensors => f.write_str("too many touch sensors"),
            ConfigError::TooManyChannels => f.write_str("too many channels listed"),
            ConfigError::BaudRate(baud) => write!(f, "baud rate {} (must be 115200)", baud),
            ConfigError::UartFraming => f.write_str("UART framing must be 8N1"),
            ConfigError::MissingTx => f.write_str("UART tx_pin is required"),
            ConfigError::MissingRx => f.write_str("UART rx_pin is required"),
            ConfigError::PinConflict(pin) => write!(f, "GPIO{} used more than once", pin),
            ConfigError::Pin(e) => write!(f, "power pin: {}", e),
            ConfigError::MissingKey(key) => write!(f, "missing required key '{}'", key),
            ConfigError::LabelTooLong => f.write_str("sensor name too long"),
            ConfigError::Parse { line, kind } => write!(f, "line {}: {:?}", line, kind),
            ConfigError::VersionMismatch(v) => write!(f, "stored config version {}", v),
            ConfigError::Deserialize => f.write_str("stored configuration is corrupt"),
            ConfigError::Serialize => f.write_str("configuration does not fit buffer"),
        }
    }
}
