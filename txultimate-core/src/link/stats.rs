//! Link counters

use txultimate_protocol::ProtocolError;

/// Running counters since the driver was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Bytes read from the UART
    pub bytes_received: u32,
    /// Frames that passed the CRC check
    pub frames_received: u32,
    /// Frames discarded by the parser or the event decoder
    pub frames_rejected: u32,
    /// Bytes dropped while hunting for a frame start
    pub bytes_skipped: u32,
    /// Events that reached an observer
    pub events_notified: u32,
    /// Releases dropped on press-only channels
    pub events_suppressed: u32,
    /// Events for channels nobody registered
    pub events_unregistered: u32,
    /// Failed UART reads
    pub read_errors: u32,
    /// Most recent protocol error
    pub last_error: Option<ProtocolError>,
}

impl LinkStats {
    pub(crate) fn record_rejected(&mut self, error: ProtocolError) {
        self.frames_rejected = self.frames_rejected.wrapping_add(1);
        self.last_error = Some(error);
    }
}

/// What a single poll did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSummary {
    /// Bytes taken from the UART
    pub bytes_read: usize,
    /// Complete frames decoded
    pub frames: u8,
    /// Observer notifications
    pub notified: u8,
    /// Frames discarded
    pub rejected: u8,
}

impl PollSummary {
    /// Nothing arrived and nothing happened
    pub fn is_idle(&self) -> bool {
        self.bytes_read == 0
    }
}
