//! Channel registry
//!
//! Maps panel channels (1-13) to the touch binary sensors bound to them.
//! Sensors are registered once during setup; afterwards the link driver
//! only dispatches events, so the registry needs no locking.
//!
//! ```text
//!  channel  1  2  3  4  5  6  7  8  9 10 11 12 13
//!  sensor   0  0  0  -  1  -  2  -  -  -  -  3  3
//! ```

pub mod channel;
pub mod sensor;

use heapless::Vec;
use txultimate_protocol::channel as ch;

use crate::error::{ConfigError, Error};

pub use channel::{ChannelEvent, ChannelState, Transition};
pub use sensor::{BinaryObserver, ChannelSet, TouchBinarySensor};

/// Default sensor capacity: one per channel
pub const MAX_SENSORS: usize = ch::MAX as usize;

/// Binding table is indexed by channel number directly
const BINDING_SLOTS: usize = ch::MAX as usize + 1;

/// Handle to a registered sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorId(usize);

impl SensorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Outcome of dispatching an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// Observer received a new state
    Notified,
    /// Release dropped on a press-only channel
    Suppressed,
    /// No sensor bound to the channel
    Unregistered,
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    sensor: SensorId,
    state: ChannelState,
}

/// Registry of touch binary sensors
///
/// `N` is the maximum number of sensors. Each channel belongs to at most
/// one sensor.
#[derive(Debug)]
pub struct ChannelRegistry<O, const N: usize = MAX_SENSORS> {
    sensors: Vec<TouchBinarySensor<O>, N>,
    bindings: [Option<Binding>; BINDING_SLOTS],
}

impl<O: BinaryObserver, const N: usize> Default for ChannelRegistry<O, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: BinaryObserver, const N: usize> ChannelRegistry<O, N> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sensors: Vec::new(),
            bindings: [None; BINDING_SLOTS],
        }
    }

    /// Bind a single channel to an observer
    ///
    /// Fails with [`ConfigError::ChannelOutOfRange`] outside 1-13 and with
    /// [`Error::DuplicateChannel`] if the channel is already bound.
    pub fn register(&mut self, channel: u8, press_only: bool, observer: O) -> Result<SensorId, Error> {
        let mut sensor = TouchBinarySensor::new(observer);
        sensor.add_channel(channel)?;
        sensor.set_press_only(press_only);
        self.register_touch_binary_sensor(sensor)
    }

    /// Register a sensor on all of its channels
    ///
    /// Either every channel is bound or, on error, none is.
    pub fn register_touch_binary_sensor(
        &mut self,
        sensor: TouchBinarySensor<O>,
    ) -> Result<SensorId, Error> {
        let channels = sensor.channels();
        if channels.is_empty() {
            return Err(ConfigError::NoChannels.into());
        }

        if let Some(taken) = channels.iter().find(|&c| self.is_registered(c)) {
            return Err(Error::DuplicateChannel(taken));
        }

        let id = SensorId(self.sensors.len());
        let press_only = sensor.press_only();
        self.sensors
            .push(sensor)
            .map_err(|_| ConfigError::TooManySensors)?;

        for c in channels.iter() {
            self.bindings[c as usize] = Some(Binding {
                sensor: id,
                state: ChannelState::Idle,
            });
        }

        log::debug!(
            "Registered touch sensor {} on {} channel(s){}",
            id.0,
            channels.len(),
            if press_only { " (press only)" } else { "" }
        );
        Ok(id)
    }

    /// Deliver an event to the sensor bound to `channel`
    ///
    /// Unknown channels are ignored.
    pub fn dispatch(&mut self, channel: u8, event: ChannelEvent) -> Dispatch {
        let binding = match self.bindings.get_mut(channel as usize) {
            Some(Some(binding)) => binding,
            _ => {
                log::debug!("Ignoring {:?} on unregistered channel {}", event, channel);
                return Dispatch::Unregistered;
            }
        };

        let sensor = &mut self.sensors[binding.sensor.index()];
        let transition = binding.state.on_event(event, sensor.press_only());
        binding.state = transition.next;

        match transition.notify {
            Some(state) => {
                log::trace!("ch{} -> {}", channel, state);
                sensor.process(channel, state);
                Dispatch::Notified
            }
            None => Dispatch::Suppressed,
        }
    }

    /// Check if a sensor owns `channel`
    pub fn is_registered(&self, channel: u8) -> bool {
        self.owner(channel).is_some()
    }

    /// Sensor bound to `channel`
    pub fn owner(&self, channel: u8) -> Option<SensorId> {
        self.bindings
            .get(channel as usize)
            .copied()
            .flatten()
            .map(|b| b.sensor)
    }

    /// Current state of a registered channel
    pub fn channel_state(&self, channel: u8) -> Option<ChannelState> {
        self.bindings
            .get(channel as usize)
            .copied()
            .flatten()
            .map(|b| b.state)
    }

    /// All bound channels
    pub fn registered_channels(&self) -> ChannelSet {
        let mut set = ChannelSet::new();
        for sensor in &self.sensors {
            for c in sensor.channels().iter() {
                // Channels in a sensor are always in range
                let _ = set.insert(c);
            }
        }
        set
    }

    pub fn sensor(&self, id: SensorId) -> Option<&TouchBinarySensor<O>> {
        self.sensors.get(id.index())
    }

    pub fn sensor_mut(&mut self, id: SensorId) -> Option<&mut TouchBinarySensor<O>> {
        self.sensors.get_mut(id.index())
    }

    pub fn sensors(&self) -> impl Iterator<Item = &TouchBinarySensor<O>> {
        self.sensors.iter()
    }

    /// Number of registered sensors
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
