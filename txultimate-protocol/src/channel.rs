//! Touch channel numbering
//!
//! The panel reports positions along its touch strip plus a few gesture
//! channels. Positions are reported on both press and release; gesture
//! channels only ever arrive as a release.

/// Reserved, never a valid channel
pub const INVALID: u8 = 0x0;

/// First touch position
pub const MIN: u8 = 0x1;

/// Last touch position (10 positions, press and release both reported)
pub const TOUCH_MAX: u8 = 0xA;

/// Multi-finger press (release only)
pub const MULTI: u8 = 0xB;

/// Swipe right (release only)
pub const SWIPE_RIGHT: u8 = 0xC;

/// Swipe left (release only)
pub const SWIPE_LEFT: u8 = 0xD;

/// Last channel that can be bound to a sensor
pub const MAX: u8 = SWIPE_LEFT;

/// Set on the release of a touch position held for about 5 seconds
pub const LONG_PRESS_BIT: u8 = 0x10;

/// Check if a channel is in the bindable range
pub const fn is_valid(ch: u8) -> bool {
    ch >= MIN && ch <= MAX
}

/// Check if a channel is a gesture channel that never reports a press
pub const fn is_release_only(ch: u8) -> bool {
    ch > TOUCH_MAX
}
