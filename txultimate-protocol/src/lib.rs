//! TX Ultimate Touch Controller Protocol
//!
//! The touch panel of the Sonoff TX Ultimate is driven by a CA51F353S3
//! microcontroller that reports touch activity to the ESP32 over UART
//! (115200 baud, 8N1). This crate decodes that byte stream.
//!
//! # Protocol Overview
//!
//! Every report uses the same binary frame:
//! ```text
//! ┌──────┬──────┬─────────┬────────┬─────┬──────────┬──────────┐
//! │ 0xAA │ 0x55 │ VERSION │ OPCODE │ LEN │ DATA     │ CRC16    │
//! │ 1B   │ 1B   │ 1B      │ 1B     │ 1B  │ 1–3B     │ 2B (BE)  │
//! └──────┴──────┴─────────┴────────┴─────┴──────────┴──────────┘
//! ```
//!
//! The data length selects the event shape (release, press/release or
//! swipe); see [`events::TouchEvent::from_frame`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod channel;
pub mod crc;
pub mod events;
pub mod frame;

pub use crc::crc16_ccitt_false;
pub use events::{TouchAction, TouchEvent};
pub use frame::{Frame, FrameParser, ProtocolError, FRAME_MAGIC, MAX_DATA_LEN, MAX_FRAME_SIZE};
