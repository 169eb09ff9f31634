//! Device and network configuration
//!
//! This module contains types and functions for configuring LoRaWAN devices
//! and network parameters. It includes:
//! - Device credentials (DevEUI, AppEUI, keys, address)
//! - Session state management
//! - Radio settings (channel, data rate, power, class)

use core::fmt;

/// Device credentials and session state
pub mod device;

/// Session store with credential setters
pub mod session;

/// Per-transmission radio settings
pub mod settings;

pub use device::{
    AESKey, ActivationMode, ActivationState, DevAddr, DeviceIdentity, SessionState, EUI64,
};
pub use session::SessionStore;
pub use settings::{ChannelPolicy, DeviceClass, RadioSettings, MAX_TX_POWER_INDEX};

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Credential text is not valid hex of the expected length
    InvalidHex,
    /// Value is outside the regional table; previous setting retained
    OutOfRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHex => f.write_str("malformed hex credential"),
            ConfigError::OutOfRange => f.write_str("value outside regional limits"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
