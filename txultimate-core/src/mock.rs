//! Host-side stand-ins for the board: UART, power pin, pin bank, observer

use std::collections::VecDeque;
use std::vec::Vec;

use txultimate_hal::{OutputPin, OutputPinProvider, PinError, UartRx, UartTx};
use txultimate_protocol::TouchEvent;

use crate::registry::BinaryObserver;

/// Records every published state
#[derive(Debug, Default)]
pub struct Recorder {
    pub states: Vec<bool>,
}

impl BinaryObserver for Recorder {
    fn publish_state(&mut self, state: bool) {
        self.states.push(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockUartError;

/// Loopback-free UART with a scripted receive queue
#[derive(Debug, Default)]
pub struct MockUart {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    /// Calls to `read_available`
    pub reads: usize,
}

impl MockUart {
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Queue the wire encoding of an event
    pub fn push_event(&mut self, event: TouchEvent) {
        let frame = event.to_frame().unwrap();
        self.push_bytes(&frame.encode_to_vec().unwrap());
    }
}

impl UartRx for MockUart {
    type Error = MockUartError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.reads += 1;
        if self.fail_reads {
            return Err(MockUartError);
        }
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn has_data(&mut self) -> bool {
        !self.rx.is_empty()
    }
}

impl UartTx for MockUart {
    type Error = MockUartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MockUartError);
        }
        self.tx.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockPin {
    pub number: u8,
    high: bool,
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.high = true;
    }

    fn set_low(&mut self) {
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// 40-pin bank like the ESP32, with optional reserved pins
#[derive(Debug, Default)]
pub struct MockPins {
    taken: Vec<u8>,
    pub reserved: Vec<u8>,
}

impl OutputPinProvider for MockPins {
    type Pin = MockPin;

    fn claim_output(&mut self, pin: u8) -> Result<MockPin, PinError> {
        if pin >= 40 {
            return Err(PinError::InvalidPin(pin));
        }
        if self.reserved.contains(&pin) {
            return Err(PinError::Reserved(pin));
        }
        if self.taken.contains(&pin) {
            return Err(PinError::AlreadyTaken(pin));
        }
        self.taken.push(pin);
        Ok(MockPin {
            number: pin,
            high: false,
        })
    }
}
