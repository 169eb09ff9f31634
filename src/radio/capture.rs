use crate::buffer::RawFrame;

/// Single-slot mailbox between the receive interrupt and the main loop.
///
/// The interrupt side only posts raw frames; decoding happens when the main
/// loop takes them. A frame posted while the slot is full replaces the older
/// one and counts as an overrun.
#[derive(Debug, Default)]
pub struct CaptureSlot {
    frame: Option<RawFrame>,
    overruns: u32,
}

impl CaptureSlot {
    /// Empty slot
    pub const fn new() -> Self {
        Self {
            frame: None,
            overruns: 0,
        }
    }

    /// Post a captured frame. Returns `false` if an unread frame was dropped.
    pub fn post(&mut self, frame: RawFrame) -> bool {
        let dropped = self.frame.replace(frame).is_some();
        if dropped {
            self.overruns = self.overruns.wrapping_add(1);
        }
        !dropped
    }

    /// Take the pending frame, if any
    pub fn take(&mut self) -> Option<RawFrame> {
        self.frame.take()
    }

    /// Whether a frame is waiting
    pub fn is_occupied(&self) -> bool {
        self.frame.is_some()
    }

    /// Frames lost to overwrites
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(bytes: &[u8]) -> RawFrame {
        RawFrame::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_newest_frame_wins() {
        let mut slot = CaptureSlot::new();
        assert!(slot.post(frame(&[1])));
        assert!(!slot.post(frame(&[2])));
        assert_eq!(slot.overruns(), 1);
        assert_eq!(slot.take().as_deref(), Some(&[2u8][..]));
        assert!(slot.take().is_none());
    }
}
