//! Board-agnostic core of the TX Ultimate touch panel link
//!
//! This crate contains everything between the UART and the binary sensors
//! that do not depend on a specific chip:
//!
//! - Typed configuration, its text loader and binary persistence
//! - Channel registry binding touch channels to observers
//! - UART link driver: power control, frame decoding, event dispatch
//! - [`Device`], which owns one of each
//!
//! # Example
//!
//! ```ignore
//! let mut device = Device::from_config(uart, config, |sensor| make_sensor(sensor))?;
//! device.setup(&mut pins)?;
//! loop {
//!     device.poll();
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod device;
pub mod error;
pub mod link;
pub mod registry;

#[cfg(test)]
mod mock;

pub use device::Device;
pub use error::{ConfigError, Error, ParseErrorKind};
pub use link::{LinkStats, PollSummary, UartLinkDriver};
pub use registry::{
    BinaryObserver, ChannelEvent, ChannelRegistry, ChannelState, Dispatch, SensorId,
    TouchBinarySensor,
};
pub use txultimate_protocol::ProtocolError;
