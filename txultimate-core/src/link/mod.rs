//! UART link to the touch controller
//!
//! The driver owns the UART and the controller's power pin. Each
//! [`UartLinkDriver::poll`] drains a bounded number of bytes, decodes
//! complete frames and hands touch events to the channel registry.

pub mod driver;
pub mod stats;

pub use driver::{UartLinkDriver, POLL_READ_LIMIT};
pub use stats::{LinkStats, PollSummary};
