//! Frame encoding and decoding for the touch controller link.
//!
//! Frame format:
//! - MAGIC (2 bytes): 0xAA 0x55 synchronization
//! - VERSION (1 byte): always 0x01
//! - OPCODE (1 byte): 0x02 for touch reports
//! - LEN (1 byte): data length (1-3)
//! - DATA (1-3 bytes): shape selected by LEN
//! - CRC16 (2 bytes, big-endian): CRC-16/CCITT-FALSE over VERSION..DATA

use core::fmt;

use heapless::Vec;

use crate::crc::crc16_ccitt_false;

/// Frame synchronization bytes
pub const FRAME_MAGIC: [u8; 2] = [0xAA, 0x55];

/// Only protocol version spoken by the controller
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Opcode of a touch report
pub const OPCODE_TOUCH: u8 = 0x02;

/// Maximum data size in bytes
pub const MAX_DATA_LEN: usize = 3;

/// MAGIC + VERSION + OPCODE + LEN
pub const HEADER_SIZE: usize = 5;

/// CRC16 footer
pub const FOOTER_SIZE: usize = 2;

/// Maximum complete frame size (HEADER + MAX_DATA + FOOTER)
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_DATA_LEN + FOOTER_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Version byte after the magic is not 0x01
    WrongVersion(u8),
    /// Opcode is not a touch report
    UnsupportedOpcode(u8),
    /// Declared data length is zero
    EmptyPayload,
    /// Declared data length exceeds [`MAX_DATA_LEN`]
    FrameTooLong(u8),
    /// CRC16 footer mismatch
    InvalidCrc {
        /// CRC computed over the received bytes
        expected: u16,
        /// CRC carried in the footer
        received: u16,
    },
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::WrongVersion(v) => write!(f, "wrong protocol version 0x{:02x}", v),
            ProtocolError::UnsupportedOpcode(op) => write!(f, "unsupported opcode 0x{:02x}", op),
            ProtocolError::EmptyPayload => f.write_str("empty payload"),
            ProtocolError::FrameTooLong(len) => {
                write!(f, "data length {} exceeds maximum {}", len, MAX_DATA_LEN)
            }
            ProtocolError::InvalidCrc { expected, received } => write!(
                f,
                "invalid CRC16 (calculated 0x{:04x}, received 0x{:04x})",
                expected, received
            ),
            ProtocolError::BufferTooSmall => f.write_str("buffer too small"),
        }
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Message opcode
    pub opcode: u8,
    /// Frame data
    pub data: Vec<u8, MAX_DATA_LEN>,
}

impl Frame {
    /// Create a new frame with the given opcode and data
    pub fn new(opcode: u8, data: &[u8]) -> Result<Self, ProtocolError> {
        if data.is_empty() {
            return Err(ProtocolError::EmptyPayload);
        }
        if data.len() > MAX_DATA_LEN {
            return Err(ProtocolError::FrameTooLong(data.len().min(u8::MAX as usize) as u8));
        }

        let mut data_vec = Vec::new();
        data_vec
            .extend_from_slice(data)
            .map_err(|_| ProtocolError::FrameTooLong(data.len() as u8))?;

        Ok(Self {
            opcode,
            data: data_vec,
        })
    }

    /// Create a touch report frame
    pub fn touch(data: &[u8]) -> Result<Self, ProtocolError> {
        Self::new(OPCODE_TOUCH, data)
    }

    /// Calculate the footer CRC for frame contents
    fn calculate_crc(opcode: u8, data: &[u8]) -> u16 {
        let mut covered = [0u8; 3 + MAX_DATA_LEN];
        covered[0] = PROTOCOL_VERSION;
        covered[1] = opcode;
        covered[2] = data.len() as u8;
        covered[3..3 + data.len()].copy_from_slice(data);
        crc16_ccitt_false(&covered[..3 + data.len()])
    }

    /// Size of this frame on the wire
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.data.len() + FOOTER_SIZE
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, ProtocolError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(ProtocolError::BufferTooSmall);
        }

        let data_end = HEADER_SIZE + self.data.len();
        let crc = Self::calculate_crc(self.opcode, &self.data);

        buffer[..2].copy_from_slice(&FRAME_MAGIC);
        buffer[2] = PROTOCOL_VERSION;
        buffer[3] = self.opcode;
        buffer[4] = self.data.len() as u8;
        buffer[HEADER_SIZE..data_end].copy_from_slice(&self.data);
        buffer[data_end..frame_len].copy_from_slice(&crc.to_be_bytes());

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, ProtocolError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| ProtocolError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// State machine for parsing incoming frames
///
/// Bytes are fed one at a time, so a frame may arrive split across any
/// number of UART reads. Bytes outside a frame are skipped until the next
/// magic sequence.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_DATA_LEN>,
    expected_length: u8,
    opcode: u8,
    crc_high: u8,
    skipped: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for the first magic byte
    WaitingForMagic,
    /// Got 0xAA, waiting for 0x55
    WaitingForMagic2,
    /// Got magic, waiting for VERSION
    WaitingForVersion,
    /// Got VERSION, waiting for OPCODE
    WaitingForOpcode,
    /// Got OPCODE, waiting for LEN
    WaitingForLength,
    /// Reading data bytes
    ReadingData,
    /// Waiting for the CRC high byte
    WaitingForCrcHigh,
    /// Waiting for the CRC low byte
    WaitingForCrcLow,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForMagic,
            buffer: Vec::new(),
            expected_length: 0,
            opcode: 0,
            crc_high: 0,
            skipped: 0,
        }
    }

    /// Reset the parser state
    ///
    /// Discards any partially received frame. The skipped byte counter is
    /// kept.
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForMagic;
        self.buffer.clear();
        self.expected_length = 0;
        self.opcode = 0;
        self.crc_high = 0;
    }

    /// Check if the parser holds part of a frame
    pub fn is_mid_frame(&self) -> bool {
        self.state != ParseState::WaitingForMagic
    }

    /// Number of bytes dropped while searching for a frame start
    pub fn skipped_bytes(&self) -> u32 {
        self.skipped
    }

    /// Abandon the current frame after a header error
    ///
    /// A rejected byte may itself start the next frame.
    fn reject(&mut self, byte: u8, error: ProtocolError) -> Result<Option<Frame>, ProtocolError> {
        self.reset();
        if byte == FRAME_MAGIC[0] {
            self.state = ParseState::WaitingForMagic2;
        }
        Err(error)
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` when the frame in
    /// progress was discarded.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, ProtocolError> {
        match self.state {
            ParseState::WaitingForMagic => {
                if byte == FRAME_MAGIC[0] {
                    self.state = ParseState::WaitingForMagic2;
                } else {
                    self.skipped = self.skipped.wrapping_add(1);
                }
                Ok(None)
            }
            ParseState::WaitingForMagic2 => {
                if byte == FRAME_MAGIC[1] {
                    self.state = ParseState::WaitingForVersion;
                } else if byte != FRAME_MAGIC[0] {
                    // Lone 0xAA was noise
                    self.skipped = self.skipped.wrapping_add(2);
                    self.state = ParseState::WaitingForMagic;
                } else {
                    self.skipped = self.skipped.wrapping_add(1);
                }
                Ok(None)
            }
            ParseState::WaitingForVersion => {
                if byte != PROTOCOL_VERSION {
                    return self.reject(byte, ProtocolError::WrongVersion(byte));
                }
                self.state = ParseState::WaitingForOpcode;
                Ok(None)
            }
            ParseState::WaitingForOpcode => {
                if byte != OPCODE_TOUCH {
                    return self.reject(byte, ProtocolError::UnsupportedOpcode(byte));
                }
                self.opcode = byte;
                self.state = ParseState::WaitingForLength;
                Ok(None)
            }
            ParseState::WaitingForLength => {
                if byte == 0 {
                    return self.reject(byte, ProtocolError::EmptyPayload);
                }
                if byte as usize > MAX_DATA_LEN {
                    return self.reject(byte, ProtocolError::FrameTooLong(byte));
                }
                self.expected_length = byte;
                self.buffer.clear();
                self.state = ParseState::ReadingData;
                Ok(None)
            }
            ParseState::ReadingData => {
                // Cannot overflow: expected_length <= MAX_DATA_LEN
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForCrcHigh;
                }
                Ok(None)
            }
            ParseState::WaitingForCrcHigh => {
                self.crc_high = byte;
                self.state = ParseState::WaitingForCrcLow;
                Ok(None)
            }
            ParseState::WaitingForCrcLow => {
                let received = u16::from_be_bytes([self.crc_high, byte]);
                let expected = Frame::calculate_crc(self.opcode, &self.buffer);

                if received != expected {
                    self.reset();
                    return Err(ProtocolError::InvalidCrc { expected, received });
                }

                let frame = Frame {
                    opcode: self.opcode,
                    data: self.buffer.clone(),
                };

                self.reset();
                Ok(Some(frame))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, ProtocolError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
