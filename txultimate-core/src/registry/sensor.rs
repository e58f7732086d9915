//! Touch binary sensors
//!
//! A touch binary sensor is an on/off observer bound to one or more panel
//! channels. It is built by the configuration layer and handed to the
//! registry, which owns it from then on.

use txultimate_protocol::channel;

use crate::error::ConfigError;

/// Receiver of binary sensor state
pub trait BinaryObserver {
    /// Publish a new state (`true` = touched)
    fn publish_state(&mut self, state: bool);
}

impl<T: BinaryObserver + ?Sized> BinaryObserver for &mut T {
    fn publish_state(&mut self, state: bool) {
        (**self).publish_state(state);
    }
}

/// Set of channels in 1-13
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSet(u16);

impl ChannelSet {
    /// Empty set
    pub const fn new() -> Self {
        Self(0)
    }

    /// Add a channel
    pub fn insert(&mut self, ch: u8) -> Result<(), ConfigError> {
        if !channel::is_valid(ch) {
            return Err(ConfigError::ChannelOutOfRange(ch));
        }
        self.0 |= 1 << ch;
        Ok(())
    }

    /// Check membership
    pub fn contains(&self, ch: u8) -> bool {
        channel::is_valid(ch) && self.0 & (1 << ch) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Channels in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (channel::MIN..=channel::MAX).filter(move |&ch| self.contains(ch))
    }
}

/// An observer bound to a set of channels
#[derive(Debug)]
pub struct TouchBinarySensor<O> {
    channels: ChannelSet,
    press_only: bool,
    observer: O,
}

impl<O: BinaryObserver> TouchBinarySensor<O> {
    /// Create a sensor with no channels
    pub fn new(observer: O) -> Self {
        Self {
            channels: ChannelSet::new(),
            press_only: false,
            observer,
        }
    }

    /// Create a sensor bound to `channels`
    pub fn with_channels(observer: O, channels: &[u8], press_only: bool) -> Result<Self, ConfigError> {
        let mut sensor = Self::new(observer);
        for &ch in channels {
            sensor.add_channel(ch)?;
        }
        sensor.set_press_only(press_only);
        Ok(sensor)
    }

    /// Bind another channel
    pub fn add_channel(&mut self, ch: u8) -> Result<(), ConfigError> {
        self.channels.insert(ch)
    }

    /// Drop release events and report each press as a momentary touch
    pub fn set_press_only(&mut self, press_only: bool) {
        self.press_only = press_only;
    }

    pub fn press_only(&self) -> bool {
        self.press_only
    }

    pub fn channels(&self) -> ChannelSet {
        self.channels
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Publish `state` if `ch` belongs to this sensor
    ///
    /// Returns whether the observer was notified.
    pub fn process(&mut self, ch: u8, state: bool) -> bool {
        if !self.channels.contains(ch) {
            return false;
        }
        self.observer.publish_state(state);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::Recorder;

    #[test]
    fn test_channel_set() {
        let mut set = ChannelSet::new();
        assert!(set.is_empty());
        set.insert(1).unwrap();
        set.insert(13).unwrap();
        set.insert(1).unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.contains(13));
        assert!(!set.contains(2));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 13]);
    }

    #[test]
    fn test_channel_set_rejects_out_of_range() {
        let mut set = ChannelSet::new();
        assert_eq!(set.insert(0), Err(ConfigError::ChannelOutOfRange(0)));
        assert_eq!(set.insert(14), Err(ConfigError::ChannelOutOfRange(14)));
        assert_eq!(set.insert(200), Err(ConfigError::ChannelOutOfRange(200)));
        assert!(!set.contains(200));
    }

    #[test]
    fn test_process_filters_channels() {
        let mut sensor = TouchBinarySensor::with_channels(Recorder::default(), &[2, 3], false).unwrap();
        assert!(sensor.process(2, true));
        assert!(!sensor.process(4, true));
        assert!(sensor.process(3, false));
        assert_eq!(sensor.observer().states, vec![true, false]);
    }

    #[test]
    fn test_borrowed_observer() {
        let mut recorder = Recorder::default();
        {
            let mut sensor = TouchBinarySensor::with_channels(&mut recorder, &[9], true).unwrap();
            assert!(sensor.press_only());
            sensor.process(9, true);
        }
        assert_eq!(recorder.states, vec![true]);
    }
}
