//! LoRaWAN protocol implementation
//!
//! This module contains the core LoRaWAN protocol implementation, including:
//! - Frame encoding and decoding
//! - MAC layer functionality
//! - PHY layer operations
//! - Channel selection and regional parameters
//! - Over-the-air activation

/// Channel selection
pub mod channel;

/// Frame codec
pub mod frame;

/// Over-the-air activation
pub mod join;

/// MAC layer implementation
pub mod mac;

/// PHY layer operations
pub mod phy;

/// Regional parameters and configurations
pub mod region;

pub use frame::Downlink;
pub use join::ActivationError;
pub use mac::{MacError, MacLayer};
pub use phy::{PhyConfig, PhyLayer, TimingParams};
pub use region::{DataRate, Region, AS923, EU868, US915};
