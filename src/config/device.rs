//! Device credentials and session state
//!
//! Credentials are provisioned as hexadecimal text, most significant byte
//! first, the way network consoles print them. They are stored in that order
//! and reversed onto the air where LoRaWAN requires little-endian fields.

use core::fmt;

use super::ConfigError;

/// Decode a fixed-length hexadecimal credential.
///
/// Odd-length input, input of the wrong length, and non-hex characters are all
/// rejected; `out` is only written on success.
pub fn decode_hex<const N: usize>(text: &str) -> Result<[u8; N], ConfigError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text.trim(), &mut out).map_err(|_| ConfigError::InvalidHex)?;
    Ok(out)
}

/// AES-128 key (16 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct AESKey([u8; 16]);

impl AESKey {
    /// Create key from raw bytes
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Parse key from 32 hex characters
    pub fn from_hex(text: &str) -> Result<Self, ConfigError> {
        decode_hex(text).map(Self)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// Keys never end up in logs.
impl fmt::Debug for AESKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AESKey(..)")
    }
}

/// EUI-64 (8 bytes, MSB first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EUI64([u8; 8]);

impl EUI64 {
    /// Create EUI from raw bytes
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Parse EUI from 16 hex characters
    pub fn from_hex(text: &str) -> Result<Self, ConfigError> {
        decode_hex(text).map(Self)
    }

    /// Raw bytes, MSB first
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Bytes in over-the-air (little-endian) order
    pub fn to_le_bytes(&self) -> [u8; 8] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

/// Device address (4 bytes, MSB first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DevAddr([u8; 4]);

impl DevAddr {
    /// Create address from raw bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Parse address from 8 hex characters
    pub fn from_hex(text: &str) -> Result<Self, ConfigError> {
        decode_hex(text).map(Self)
    }

    /// Build from the over-the-air (little-endian) encoding
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes).to_be_bytes())
    }

    /// Raw bytes, MSB first
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Bytes in over-the-air (little-endian) order
    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.as_u32().to_le_bytes()
    }

    /// Address as a number
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Whether the address is all zeroes (unassigned)
    pub fn is_unset(&self) -> bool {
        self.0 == [0; 4]
    }
}

/// Provisioned identity used by over-the-air activation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceIdentity {
    /// Device EUI (unique device identifier)
    pub dev_eui: EUI64,
    /// Application EUI
    pub app_eui: EUI64,
    /// Application key
    pub app_key: AESKey,
}

impl DeviceIdentity {
    /// Create a new identity
    pub fn new(dev_eui: EUI64, app_eui: EUI64, app_key: AESKey) -> Self {
        Self {
            dev_eui,
            app_eui,
            app_key,
        }
    }
}

/// Scratch state of an in-flight join.
///
/// Overwritten by every join attempt; never outlives the attempt that created
/// it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivationState {
    /// Device nonce sent in the join request
    pub dev_nonce: u16,
    /// Application nonce received in the join accept
    pub app_nonce: [u8; 3],
    /// Network identifier received in the join accept
    pub net_id: [u8; 3],
}

impl ActivationState {
    /// Start a join attempt with a fresh device nonce
    pub fn new(dev_nonce: u16) -> Self {
        Self {
            dev_nonce,
            ..Self::default()
        }
    }
}

/// How the current session was established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActivationMode {
    /// Device is not activated
    Idle,
    /// Device is activated through OTAA
    OTAAActivated,
    /// Device is activated through ABP
    ABPActivated,
}

/// Session state for an activated device
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Network session key
    pub nwk_skey: AESKey,
    /// Application session key
    pub app_skey: AESKey,
    /// Device address
    pub dev_addr: DevAddr,
    /// Uplink frame counter
    pub fcnt_up: u16,
    /// Counter of the last accepted downlink
    pub fcnt_down: u16,
}

impl SessionState {
    /// Create a session with both counters at zero
    pub fn new(dev_addr: DevAddr, nwk_skey: AESKey, app_skey: AESKey) -> Self {
        Self {
            nwk_skey,
            app_skey,
            dev_addr,
            fcnt_up: 0,
            fcnt_down: 0,
        }
    }

    /// Advance the uplink frame counter, wrapping at 0xFFFF
    pub fn increment_fcnt_up(&mut self) {
        self.fcnt_up = self.fcnt_up.wrapping_add(1);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DevAddr::default(), AESKey::default(), AESKey::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex::<2>("0aFf"), Ok([0x0A, 0xFF]));
        assert_eq!(decode_hex::<2>("0aF"), Err(ConfigError::InvalidHex));
        assert_eq!(decode_hex::<2>("0aFf00"), Err(ConfigError::InvalidHex));
        assert_eq!(decode_hex::<2>("zz00"), Err(ConfigError::InvalidHex));
    }

    #[test]
    fn test_dev_addr_byte_order() {
        let addr = DevAddr::from_hex("26011BDA").unwrap();
        assert_eq!(addr.as_u32(), 0x2601_1BDA);
        assert_eq!(addr.to_le_bytes(), [0xDA, 0x1B, 0x01, 0x26]);
        assert_eq!(DevAddr::from_le_bytes(addr.to_le_bytes()), addr);
    }

    #[test]
    fn test_eui_byte_order() {
        let eui = EUI64::from_hex("0004A30B001C0530").unwrap();
        assert_eq!(eui.to_le_bytes(), [0x30, 0x05, 0x1C, 0x00, 0x0B, 0xA3, 0x04, 0x00]);
    }

    #[test]
    fn test_frame_counter_wraps() {
        let mut session = SessionState::default();
        session.fcnt_up = 0xFFFF;
        session.increment_fcnt_up();
        assert_eq!(session.fcnt_up, 0);
    }
}
