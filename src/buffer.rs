//! Bounded uplink/downlink buffers
//!
//! Both buffers have a fixed capacity checked on every write. The downlink
//! buffer carries its own [`ReceiveStatus`] and is drained by a single
//! destructive read.

use heapless::Vec;

/// Largest application payload carried in one frame
pub const MAX_PAYLOAD_SIZE: usize = 242;

/// Largest frame the radio FIFO can hold
pub const MAX_FRAME_SIZE: usize = 255;

/// A raw frame as moved to or from the radio
pub type RawFrame = Vec<u8, MAX_FRAME_SIZE>;

/// Whether unread downlink data is waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveStatus {
    /// Nothing to read
    NoData,
    /// A downlink payload is waiting
    NewData,
}

/// Payload staged for the next uplink
#[derive(Debug, Default)]
pub struct UplinkBuffer {
    data: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl UplinkBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Replace the buffer contents. Fails without touching the buffer if
    /// `payload` exceeds the capacity.
    pub fn load(&mut self, payload: &[u8]) -> Result<(), usize> {
        let data = Vec::from_slice(payload).map_err(|_| payload.len())?;
        self.data = data;
        Ok(())
    }

    /// Staged payload
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Last received application payload
#[derive(Debug)]
pub struct DownlinkBuffer {
    data: Vec<u8, MAX_PAYLOAD_SIZE>,
    status: ReceiveStatus,
}

impl DownlinkBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            status: ReceiveStatus::NoData,
        }
    }

    /// Store a decoded payload. Empty payloads leave the buffer as it was.
    ///
    /// Returns whether the buffer now holds new data.
    pub fn store(&mut self, payload: &[u8]) -> bool {
        if payload.is_empty() {
            return false;
        }
        match Vec::from_slice(payload) {
            Ok(data) => {
                self.data = data;
                self.status = ReceiveStatus::NewData;
                true
            }
            Err(()) => false,
        }
    }

    /// Copy the pending payload into `out` and clear the buffer.
    ///
    /// Returns the number of bytes copied; 0 when nothing was pending. Bytes
    /// beyond `out.len()` are discarded.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        if self.status == ReceiveStatus::NoData {
            return 0;
        }
        let len = self.data.len().min(out.len());
        out[..len].copy_from_slice(&self.data[..len]);
        self.data.clear();
        self.status = ReceiveStatus::NoData;
        len
    }

    /// Current status
    pub fn status(&self) -> ReceiveStatus {
        self.status
    }

    /// Length of the pending payload
    pub fn len(&self) -> usize {
        match self.status {
            ReceiveStatus::NewData => self.data.len(),
            ReceiveStatus::NoData => 0,
        }
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DownlinkBuffer {
    fn default() -> Self {
        Self::new()
    }
}
