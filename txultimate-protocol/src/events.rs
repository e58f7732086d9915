//! Touch events reported by the panel controller

use crate::channel;
use crate::frame::{Frame, ProtocolError, OPCODE_TOUCH};

// Data lengths, which select the report shape
const DATA_LEN_RELEASE: usize = 1;
const DATA_LEN_PRESS_RELEASE: usize = 2;
const DATA_LEN_SWIPE: usize = 3;

/// Whether a channel went down or up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchAction {
    /// Finger down
    Press,
    /// Finger up, end of a swipe, or gesture completed
    Release,
}

impl TouchAction {
    /// Binary sensor state for this action
    pub fn is_pressed(self) -> bool {
        matches!(self, TouchAction::Press)
    }
}

/// A decoded touch report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchEvent {
    /// Channel with the long-press bit removed
    pub channel: u8,
    /// Press or release
    pub action: TouchAction,
    /// Release after a press held until the controller timed it out
    pub long_press: bool,
    /// Reported as a swipe
    pub swipe: bool,
}

impl TouchEvent {
    /// Create a press event
    pub const fn press(channel: u8) -> Self {
        Self {
            channel,
            action: TouchAction::Press,
            long_press: false,
            swipe: false,
        }
    }

    /// Create a release event
    pub const fn release(channel: u8) -> Self {
        Self {
            channel,
            action: TouchAction::Release,
            long_press: false,
            swipe: false,
        }
    }

    /// Decode a touch report frame
    ///
    /// - 1 data byte: `[ch]`, a release
    /// - 2 data bytes: `[release_marker, ch]`, a release when the marker is
    ///   non-zero (it holds the channel where a short swipe ended), else a press
    /// - 3 data bytes: `[ch, _, _]`, a swipe, always a release
    ///
    /// A long press shows up as a release with [`channel::LONG_PRESS_BIT`]
    /// set; the bit is folded into `long_press`.
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        if frame.opcode != OPCODE_TOUCH {
            return Err(ProtocolError::UnsupportedOpcode(frame.opcode));
        }

        let data = &frame.data;
        let (raw_channel, action, swipe) = match data.len() {
            DATA_LEN_RELEASE => (data[0], TouchAction::Release, false),
            DATA_LEN_PRESS_RELEASE => {
                let action = if data[0] != 0 {
                    TouchAction::Release
                } else {
                    TouchAction::Press
                };
                (data[1], action, false)
            }
            DATA_LEN_SWIPE => (data[0], TouchAction::Release, true),
            0 => return Err(ProtocolError::EmptyPayload),
            len => return Err(ProtocolError::FrameTooLong(len as u8)),
        };

        let long_press = raw_channel & channel::LONG_PRESS_BIT != 0;

        Ok(Self {
            channel: raw_channel & !channel::LONG_PRESS_BIT,
            action,
            long_press,
            swipe,
        })
    }

    /// Encode as the controller would report it
    pub fn to_frame(&self) -> Result<Frame, ProtocolError> {
        let raw_channel = if self.long_press {
            self.channel | channel::LONG_PRESS_BIT
        } else {
            self.channel
        };

        match (self.action, self.swipe) {
            (TouchAction::Press, _) => Frame::touch(&[0x00, raw_channel]),
            (TouchAction::Release, true) => Frame::touch(&[raw_channel, 0x00, 0x00]),
            (TouchAction::Release, false) => Frame::touch(&[raw_channel]),
        }
    }

    /// Returns true if the channel never reports a press of its own
    pub fn is_release_only(&self) -> bool {
        channel::is_release_only(self.channel)
    }
}
