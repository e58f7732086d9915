//! TX Ultimate touch panel component
//!
//! [`Device`] ties one link driver to one channel registry under one
//! validated configuration. Board code builds it, calls
//! [`setup`](Device::setup) once and then [`poll`](Device::poll) from its
//! main loop.

use txultimate_hal::{OutputPin, OutputPinProvider, UartRx, UartTx};

use crate::config::{DeviceConfig, TouchSensorConfig};
use crate::error::Error;
use crate::link::{LinkStats, PollSummary, UartLinkDriver};
use crate::registry::{BinaryObserver, ChannelRegistry, SensorId, TouchBinarySensor, MAX_SENSORS};

/// Touch panel: configuration, UART link and channel registry
#[derive(Debug)]
pub struct Device<U, P, O, const N: usize = MAX_SENSORS> {
    config: DeviceConfig,
    driver: UartLinkDriver<U, P>,
    registry: ChannelRegistry<O, N>,
}

impl<U, P, O, const N: usize> Device<U, P, O, N>
where
    U: UartRx + UartTx,
    P: OutputPin,
    O: BinaryObserver,
{
    /// Create a device with an empty registry
    ///
    /// The configuration is validated here. Its touch sensors are not
    /// registered; use [`from_config`](Self::from_config) for that, or
    /// register sensors by hand.
    pub fn new(uart: U, config: DeviceConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            driver: UartLinkDriver::new(uart),
            registry: ChannelRegistry::new(),
        })
    }

    /// Create a device and register every configured touch sensor
    ///
    /// `make_observer` is called once per sensor, in configuration order.
    pub fn from_config<F>(uart: U, config: DeviceConfig, mut make_observer: F) -> Result<Self, Error>
    where
        F: FnMut(&TouchSensorConfig) -> O,
    {
        let mut device = Self::new(uart, config)?;
        for sensor_config in &device.config.touch_sensors {
            let sensor = sensor_config.build_sensor(make_observer(sensor_config))?;
            device.registry.register_touch_binary_sensor(sensor)?;
        }
        Ok(device)
    }

    /// Register an additional touch sensor
    pub fn register_touch_binary_sensor(
        &mut self,
        sensor: TouchBinarySensor<O>,
    ) -> Result<SensorId, Error> {
        self.registry.register_touch_binary_sensor(sensor)
    }

    /// Power the controller and open the link
    pub fn setup<S>(&mut self, pins: &mut S) -> Result<(), Error>
    where
        S: OutputPinProvider<Pin = P>,
    {
        self.driver
            .initialize(pins, self.config.power_pin, self.config.link.uart_config())?;
        self.dump_config();
        Ok(())
    }

    /// Service the link once
    pub fn poll(&mut self) -> PollSummary {
        self.driver.poll(&mut self.registry)
    }

    /// Log the active configuration
    pub fn dump_config(&self) {
        let link = &self.config.link;
        log::info!("TX Ultimate touch panel");
        log::info!(
            "  Power pin: GPIO{}{}",
            self.config.power_pin.pin,
            if self.config.power_pin.inverted { " (inverted)" } else { "" }
        );
        log::info!(
            "  UART: TX {:?} RX {:?} @ {} baud",
            link.tx_pin,
            link.rx_pin,
            link.baud_rate
        );
        for sensor in &self.config.touch_sensors {
            log::info!(
                "  Touch sensor '{}': channels {:?}{}",
                sensor.name,
                sensor.channels.as_slice(),
                if sensor.press_only { ", press only" } else { "" }
            );
        }
        log::info!(
            "  {} sensor(s) on {} channel(s)",
            self.registry.len(),
            self.registry.registered_channels().len()
        );
    }

    /// Power the controller down
    ///
    /// The power pin stays claimed, so [`setup`](Self::setup) may be called
    /// again. Returns false if the link was not running.
    pub fn shutdown(&mut self) -> bool {
        self.driver.power_off()
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn registry(&self) -> &ChannelRegistry<O, N> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ChannelRegistry<O, N> {
        &mut self.registry
    }

    pub fn driver(&self) -> &UartLinkDriver<U, P> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut UartLinkDriver<U, P> {
        &mut self.driver
    }

    /// Link counters
    pub fn stats(&self) -> &LinkStats {
        self.driver.stats()
    }

    /// Observer of a registered sensor
    pub fn observer(&self, id: SensorId) -> Option<&O> {
        self.registry.sensor(id).map(|s| s.observer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, LinkConfig, PinConfig};
    use crate::error::ConfigError;
    use crate::mock::{MockPin, MockPins, MockUart, Recorder};
    use txultimate_hal::PinError;
    use txultimate_protocol::TouchEvent;

    type TestDevice = Device<MockUart, MockPin, Recorder>;

    fn config() -> DeviceConfig {
        let mut config = DeviceConfig::new(PinConfig::new(5), LinkConfig::new(19, 22));
        config
            .add_touch_sensor(TouchSensorConfig::new("button_5", &[5]).unwrap())
            .unwrap();
        config
            .add_touch_sensor(
                TouchSensorConfig::new("button_7", &[7])
                    .unwrap()
                    .with_press_only(true),
            )
            .unwrap();
        config
    }

    fn states(device: &TestDevice, channel: u8) -> &[bool] {
        let id = device.registry().owner(channel).unwrap();
        &device.observer(id).unwrap().states
    }

    #[test]
    fn test_from_config_registers_sensors() {
        let device = TestDevice::from_config(MockUart::default(), config(), |_| Recorder::default()).unwrap();
        assert_eq!(device.registry().len(), 2);
        assert!(device.registry().is_registered(5));
        assert!(device.registry().is_registered(7));
        assert!(!device.driver().is_initialized());
    }

    #[test]
    fn test_from_config_calls_factory_in_order() {
        let mut seen = std::vec::Vec::new();
        TestDevice::from_config(MockUart::default(), config(), |sensor| {
            seen.push(sensor.name.clone());
            Recorder::default()
        })
        .unwrap();
        assert_eq!(seen, ["button_5", "button_7"]);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut bad = config();
        bad.link.rx_pin = None;
        assert_eq!(
            TestDevice::new(MockUart::default(), bad).map(|_| ()),
            Err(Error::Configuration(ConfigError::MissingRx))
        );

        let mut bad = config();
        bad.add_touch_sensor(TouchSensorConfig::new("again", &[7]).unwrap())
            .unwrap();
        assert_eq!(
            TestDevice::from_config(MockUart::default(), bad, |_| Recorder::default()).map(|_| ()),
            Err(Error::DuplicateChannel(7))
        );
    }

    #[test]
    fn test_manual_registration_conflicts_with_config() {
        let mut device = TestDevice::from_config(MockUart::default(), config(), |_| Recorder::default()).unwrap();
        let sensor = TouchBinarySensor::with_channels(Recorder::default(), &[4, 5], false).unwrap();
        assert_eq!(
            device.register_touch_binary_sensor(sensor),
            Err(Error::DuplicateChannel(5))
        );
        assert!(!device.registry().is_registered(4));
    }

    #[test]
    fn test_end_to_end() {
        let mut pins = MockPins::default();
        let mut device = TestDevice::from_config(MockUart::default(), config(), |_| Recorder::default()).unwrap();
        device.setup(&mut pins).unwrap();
        assert!(device.driver().is_powered());

        let uart = device.driver_mut().uart_mut();
        uart.push_event(TouchEvent::press(5));
        uart.push_event(TouchEvent::release(5));
        uart.push_event(TouchEvent::press(7));
        uart.push_event(TouchEvent::release(7));
        let summary = device.poll();

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.notified, 3);
        assert_eq!(states(&device, 5), &[true, false]);
        assert_eq!(states(&device, 7), &[true]);
        assert_eq!(device.stats().events_suppressed, 1);
    }

    #[test]
    fn test_setup_pin_failure() {
        let mut pins = MockPins::default();
        pins.reserved.push(5);
        let mut device = TestDevice::from_config(MockUart::default(), config(), |_| Recorder::default()).unwrap();
        assert_eq!(
            device.setup(&mut pins),
            Err(Error::Configuration(ConfigError::Pin(PinError::Reserved(5))))
        );
        assert!(!device.driver().is_initialized());
    }

    #[test]
    fn test_shutdown_and_setup_again() {
        let mut pins = MockPins::default();
        let mut device = TestDevice::from_config(MockUart::default(), config(), |_| Recorder::default()).unwrap();
        device.setup(&mut pins).unwrap();

        assert!(device.shutdown());
        assert!(!device.driver().is_powered());
        assert!(!device.shutdown());

        assert_eq!(device.setup(&mut pins), Ok(()));
        assert!(device.driver().is_powered());

        device
            .driver_mut()
            .uart_mut()
            .push_event(TouchEvent::press(5));
        device.poll();
        assert_eq!(states(&device, 5), &[true]);
    }

    #[test]
    fn test_from_text_config() {
        let text = r#"
[sonoff_tx_ultimate]
power_pin = "GPIO5"

[uart]
tx_pin = 19
rx_pin = 22

[binary_sensor.swipe]
channels = [12, 13]
press_only = true
"#;
        let config = parse_config(text).unwrap();
        let mut pins = MockPins::default();
        let mut device = TestDevice::from_config(MockUart::default(), config, |_| Recorder::default()).unwrap();
        device.setup(&mut pins).unwrap();

        device
            .driver_mut()
            .uart_mut()
            .push_event(TouchEvent::release(12));
        device.poll();

        assert_eq!(states(&device, 12), &[true]);
        assert_eq!(device.registry().owner(12), device.registry().owner(13));
    }
}
