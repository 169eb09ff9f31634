//! Radio hardware abstraction layer

/// Single-slot handoff from the receive interrupt to the main loop
pub mod capture;
/// SX127x / RFM95 driver
pub mod sx127x;
/// Radio interface traits
pub mod traits;

pub use capture::CaptureSlot;
pub use sx127x::SX127x;
pub use traits::Radio;
