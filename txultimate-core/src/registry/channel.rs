//! Per-channel press state

use txultimate_protocol::TouchAction;

/// Event delivered to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelEvent {
    Press,
    Release,
}

impl From<TouchAction> for ChannelEvent {
    fn from(action: TouchAction) -> Self {
        match action {
            TouchAction::Press => ChannelEvent::Press,
            TouchAction::Release => ChannelEvent::Release,
        }
    }
}

/// Channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Not touched
    #[default]
    Idle,
    /// Finger down, release pending
    Pressed,
}

/// Result of applying an event to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State after the event
    pub next: ChannelState,
    /// Sensor state to publish, if any
    pub notify: Option<bool>,
}

impl ChannelState {
    /// Apply an event
    ///
    /// Press-only channels report the press and stay `Idle`; their releases
    /// are dropped. Every other event is published, even when it repeats
    /// the current state.
    pub fn on_event(self, event: ChannelEvent, press_only: bool) -> Transition {
        match (event, press_only) {
            (ChannelEvent::Press, false) => Transition {
                next: ChannelState::Pressed,
                notify: Some(true),
            },
            (ChannelEvent::Press, true) => Transition {
                next: ChannelState::Idle,
                notify: Some(true),
            },
            (ChannelEvent::Release, false) => Transition {
                next: ChannelState::Idle,
                notify: Some(false),
            },
            (ChannelEvent::Release, true) => Transition {
                next: self,
                notify: None,
            },
        }
    }

    /// Check if the channel is held down
    pub fn is_pressed(self) -> bool {
        self == ChannelState::Pressed
    }
}
