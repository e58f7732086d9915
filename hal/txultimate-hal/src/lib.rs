//! TX Ultimate Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the touch panel link needs from a
//! board: a UART connected to the touch controller and a GPIO output that
//! powers it. Chip-specific HALs implement these so the link driver can run
//! unchanged on the ESP32 inside the switch or on the host in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  txultimate-core (registry, driver)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  txultimate-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            chip or host implementation
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::OutputPinProvider`] - Power control output
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{OutputPin, OutputPinProvider, PinError};
pub use uart::{DataBits, Parity, StopBits, Uart, UartConfig, UartRx, UartTx};
