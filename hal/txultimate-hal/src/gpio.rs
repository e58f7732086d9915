//! GPIO pin abstractions
//!
//! Provides the digital output trait used for the touch controller's power
//! line, and a provider trait for claiming pins by number at runtime so the
//! power pin can come from configuration.

use core::fmt;

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Error when claiming a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number does not exist on this chip
    InvalidPin(u8),
    /// Pin already taken by another owner
    AlreadyTaken(u8),
    /// Pin reserved for a special function (flash, strapping, ...)
    Reserved(u8),
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::InvalidPin(pin) => write!(f, "GPIO{} does not exist", pin),
            PinError::AlreadyTaken(pin) => write!(f, "GPIO{} is already in use", pin),
            PinError::Reserved(pin) => write!(f, "GPIO{} is reserved", pin),
        }
    }
}

/// Source of output pins addressed by GPIO number
///
/// Enables config-driven pin assignment where pin numbers come from a
/// configuration file rather than being hardcoded. Each pin can be claimed
/// at most once.
pub trait OutputPinProvider {
    /// Output pin type handed out by this provider
    type Pin: OutputPin;

    /// Claim a pin by number and configure it as a push-pull output
    fn claim_output(&mut self, pin: u8) -> Result<Self::Pin, PinError>;
}
