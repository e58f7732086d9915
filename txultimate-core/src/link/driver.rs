//! UART link driver
//!
//! Powers the touch controller, then turns the byte stream it sends into
//! channel events:
//!
//! ```text
//!  UART ──► FrameParser ──► TouchEvent ──► ChannelRegistry ──► observer
//! ```
//!
//! Malformed input never stops the link. A frame that fails its header or
//! CRC check is dropped, logged and counted, and the parser resynchronises
//! on the next `AA 55`.

use txultimate_hal::{OutputPin, OutputPinProvider, UartConfig, UartRx, UartTx};
use txultimate_protocol::{Frame, FrameParser, ProtocolError, TouchAction, TouchEvent, MAX_FRAME_SIZE};

use super::stats::{LinkStats, PollSummary};
use crate::config::{PinConfig, BAUD_RATE};
use crate::error::{ConfigError, Error};
use crate::registry::{BinaryObserver, ChannelEvent, ChannelRegistry, Dispatch};

/// Maximum bytes taken from the UART per poll
pub const POLL_READ_LIMIT: usize = 64;

#[derive(Debug)]
struct PowerPin<P> {
    pin: P,
    config: PinConfig,
}

/// Driver for the touch controller's UART link
#[derive(Debug)]
pub struct UartLinkDriver<U, P> {
    uart: U,
    power: Option<PowerPin<P>>,
    running: bool,
    uart_config: Option<UartConfig>,
    parser: FrameParser,
    stats: LinkStats,
}

impl<U, P> UartLinkDriver<U, P>
where
    U: UartRx + UartTx,
    P: OutputPin,
{
    /// Create a driver around an already configured UART
    ///
    /// Nothing is read until [`initialize`](Self::initialize) succeeds.
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            power: None,
            running: false,
            uart_config: None,
            parser: FrameParser::new(),
            stats: LinkStats::default(),
        }
    }

    /// Claim the power pin, switch the controller on and start listening
    ///
    /// `uart` is the setting the board applied to the peripheral; anything
    /// other than 115200 8N1 is a configuration error. Calling this again
    /// on a running link does nothing. After [`power_off`](Self::power_off)
    /// the pin claimed earlier is reused when `power_pin` names it again.
    pub fn initialize<S>(
        &mut self,
        pins: &mut S,
        power_pin: PinConfig,
        uart: UartConfig,
    ) -> Result<(), Error>
    where
        S: OutputPinProvider<Pin = P>,
    {
        if self.is_initialized() {
            log::debug!("Touch link already initialized");
            return Ok(());
        }

        if uart.baudrate != BAUD_RATE {
            return Err(ConfigError::BaudRate(uart.baudrate).into());
        }
        if !uart.is_8n1() {
            return Err(ConfigError::UartFraming.into());
        }

        let pin = match self.power.take() {
            Some(held) if held.config.pin == power_pin.pin => held.pin,
            held => match pins.claim_output(power_pin.pin) {
                Ok(pin) => pin,
                Err(e) => {
                    self.power = held;
                    return Err(e.into());
                }
            },
        };

        let mut power = PowerPin {
            pin,
            config: power_pin,
        };
        power.pin.set_state(power_pin.level(true));

        self.parser.reset();
        self.uart_config = Some(uart);
        self.power = Some(power);
        self.running = true;

        log::info!(
            "Touch controller powered on GPIO{}{}, UART {} baud",
            power_pin.pin,
            if power_pin.inverted { " (inverted)" } else { "" },
            uart.baudrate
        );
        Ok(())
    }

    /// Service the link once
    ///
    /// Reads at most [`POLL_READ_LIMIT`] bytes and dispatches every frame
    /// they complete. A partial frame stays in the parser until the next
    /// call. Does nothing before `initialize`.
    pub fn poll<O, const N: usize>(&mut self, registry: &mut ChannelRegistry<O, N>) -> PollSummary
    where
        O: BinaryObserver,
    {
        let mut summary = PollSummary::default();
        if !self.is_initialized() || !self.uart.has_data() {
            return summary;
        }

        let mut buf = [0u8; POLL_READ_LIMIT];
        let n = match self.uart.read_available(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                self.stats.read_errors = self.stats.read_errors.wrapping_add(1);
                log::warn!("Touch UART read failed: {:?}", e);
                return summary;
            }
        };
        if n == 0 {
            return summary;
        }

        log::trace!("Touch RX {:02x?}", &buf[..n]);
        summary.bytes_read = n;
        self.stats.bytes_received = self.stats.bytes_received.wrapping_add(n as u32);

        for &byte in &buf[..n] {
            match self.parser.feed(byte) {
                Ok(None) => {}
                Ok(Some(frame)) => self.handle_frame(&frame, registry, &mut summary),
                Err(e) => self.reject(e, &mut summary),
            }
        }

        self.stats.bytes_skipped = self.parser.skipped_bytes();
        summary
    }

    fn handle_frame<O, const N: usize>(
        &mut self,
        frame: &Frame,
        registry: &mut ChannelRegistry<O, N>,
        summary: &mut PollSummary,
    ) where
        O: BinaryObserver,
    {
        let event = match TouchEvent::from_frame(frame) {
            Ok(event) => event,
            Err(e) => return self.reject(e, summary),
        };

        self.stats.frames_received = self.stats.frames_received.wrapping_add(1);
        summary.frames = summary.frames.saturating_add(1);

        log::debug!(
            "Touch ch{} {:?}{}{}",
            event.channel,
            event.action,
            if event.long_press { " long" } else { "" },
            if event.swipe { " swipe" } else { "" }
        );

        // Gesture channels arrive as a bare release
        if event.action == TouchAction::Release && event.is_release_only() {
            let outcome = registry.dispatch(event.channel, ChannelEvent::Press);
            self.record(outcome, summary);
        }
        let outcome = registry.dispatch(event.channel, event.action.into());
        self.record(outcome, summary);
    }

    fn record(&mut self, outcome: Dispatch, summary: &mut PollSummary) {
        let stats = &mut self.stats;
        match outcome {
            Dispatch::Notified => {
                stats.events_notified = stats.events_notified.wrapping_add(1);
                summary.notified = summary.notified.saturating_add(1);
            }
            Dispatch::Suppressed => {
                stats.events_suppressed = stats.events_suppressed.wrapping_add(1);
            }
            Dispatch::Unregistered => {
                stats.events_unregistered = stats.events_unregistered.wrapping_add(1);
            }
        }
    }

    fn reject(&mut self, error: ProtocolError, summary: &mut PollSummary) {
        log::warn!("Dropped touch frame: {}", error);
        self.stats.record_rejected(error);
        summary.rejected = summary.rejected.saturating_add(1);
    }

    /// Send a frame to the controller
    pub fn transmit(&mut self, frame: &Frame) -> Result<(), Error> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = frame.encode(&mut buf).map_err(|_| Error::Transport)?;
        log::trace!("Touch TX {:02x?}", &buf[..len]);

        self.uart
            .write_blocking(&buf[..len])
            .and_then(|_| self.uart.flush())
            .map_err(|e| {
                log::warn!("Touch UART write failed: {:?}", e);
                Error::Transport
            })
    }

    /// Switch the controller off
    ///
    /// The power pin is driven inactive but stays owned by the driver, so
    /// [`initialize`](Self::initialize) can bring the link back up. Any
    /// partial frame is discarded. Returns false if the link was not running.
    pub fn power_off(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if let Some(power) = self.power.as_mut() {
            power.pin.set_state(power.config.level(false));
        }
        self.running = false;
        self.parser.reset();
        self.uart_config = None;
        log::info!("Touch controller powered off");
        true
    }

    /// Give up the power pin
    ///
    /// Powers the controller off first if needed.
    pub fn release_power_pin(&mut self) -> Option<P> {
        self.power_off();
        self.power.take().map(|p| p.pin)
    }

    /// Check if the controller is powered and the link is live
    pub fn is_initialized(&self) -> bool {
        self.running
    }

    /// Power pin settings of the running link
    pub fn power_pin(&self) -> Option<PinConfig> {
        self.power.as_ref().filter(|_| self.running).map(|p| p.config)
    }

    /// Logical power state (inversion already applied)
    pub fn is_powered(&self) -> bool {
        self.power
            .as_ref()
            .map(|p| p.pin.is_set_high() == p.config.level(true))
            .unwrap_or(false)
    }

    /// UART settings accepted by `initialize`
    pub fn uart_config(&self) -> Option<UartConfig> {
        self.uart_config
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }
}
