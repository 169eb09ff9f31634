//! Session store
//!
//! Owns the provisioned identity and the active session. Every credential
//! mutation goes through here so the uplink frame counter can be reset in the
//! same step: a counter must never be reused under a new address or key.

use super::{
    device::decode_hex, AESKey, ActivationMode, ConfigError, DevAddr, DeviceIdentity,
    SessionState, EUI64,
};

const ABP_ADDR: u8 = 0b001;
const ABP_NWK_SKEY: u8 = 0b010;
const ABP_APP_SKEY: u8 = 0b100;
const ABP_COMPLETE: u8 = ABP_ADDR | ABP_NWK_SKEY | ABP_APP_SKEY;

/// Identity and session owner
#[derive(Debug, Clone)]
pub struct SessionStore {
    identity: DeviceIdentity,
    session: SessionState,
    mode: ActivationMode,
    /// ABP credentials provisioned since the last join
    abp_provisioned: u8,
}

impl SessionStore {
    /// Empty store: zeroed credentials, no session
    pub fn new() -> Self {
        Self {
            identity: DeviceIdentity::default(),
            session: SessionState::default(),
            mode: ActivationMode::Idle,
            abp_provisioned: 0,
        }
    }

    /// Provisioned identity
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Active session, if the device joined or was personalized
    pub fn session(&self) -> Option<&SessionState> {
        match self.mode {
            ActivationMode::Idle => None,
            _ => Some(&self.session),
        }
    }

    /// How the active session was established
    pub fn mode(&self) -> ActivationMode {
        self.mode
    }

    /// Set DevEUI from 16 hex characters
    pub fn set_dev_eui(&mut self, text: &str) -> Result<(), ConfigError> {
        self.identity.dev_eui = EUI64::new(decode_hex(text)?);
        self.reset_frame_counter();
        Ok(())
    }

    /// Set AppEUI from 16 hex characters
    pub fn set_app_eui(&mut self, text: &str) -> Result<(), ConfigError> {
        self.identity.app_eui = EUI64::new(decode_hex(text)?);
        self.reset_frame_counter();
        Ok(())
    }

    /// Set AppKey from 32 hex characters
    pub fn set_app_key(&mut self, text: &str) -> Result<(), ConfigError> {
        self.identity.app_key = AESKey::new(decode_hex(text)?);
        self.reset_frame_counter();
        Ok(())
    }

    /// Replace the whole identity
    pub fn set_identity(&mut self, identity: DeviceIdentity) {
        self.identity = identity;
        self.reset_frame_counter();
    }

    /// Set the device address from 8 hex characters
    pub fn set_dev_addr(&mut self, text: &str) -> Result<(), ConfigError> {
        self.session.dev_addr = DevAddr::new(decode_hex(text)?);
        self.mark_abp(ABP_ADDR);
        Ok(())
    }

    /// Set the network session key from 32 hex characters
    pub fn set_nwk_skey(&mut self, text: &str) -> Result<(), ConfigError> {
        self.session.nwk_skey = AESKey::new(decode_hex(text)?);
        self.mark_abp(ABP_NWK_SKEY);
        Ok(())
    }

    /// Set the application session key from 32 hex characters
    pub fn set_app_skey(&mut self, text: &str) -> Result<(), ConfigError> {
        self.session.app_skey = AESKey::new(decode_hex(text)?);
        self.mark_abp(ABP_APP_SKEY);
        Ok(())
    }

    /// Personalize the device in one step
    pub fn provision_abp(&mut self, dev_addr: DevAddr, nwk_skey: AESKey, app_skey: AESKey) {
        self.session = SessionState::new(dev_addr, nwk_skey, app_skey);
        self.mark_abp(ABP_COMPLETE);
    }

    /// Publish a session derived by a successful join
    pub fn commit_join(&mut self, session: SessionState) {
        self.session = session;
        self.session.fcnt_up = 0;
        self.session.fcnt_down = 0;
        self.mode = ActivationMode::OTAAActivated;
        self.abp_provisioned = 0;
    }

    /// Current uplink frame counter
    pub fn frame_counter(&self) -> u16 {
        self.session.fcnt_up
    }

    /// Overwrite the uplink frame counter (session restore, diagnostics)
    pub fn set_frame_counter(&mut self, fcnt: u16) {
        self.session.fcnt_up = fcnt;
    }

    /// Advance the uplink counter after a frame was handed to the radio
    pub fn advance_frame_counter(&mut self) {
        self.session.increment_fcnt_up();
    }

    /// Remember the counter of an accepted downlink
    pub fn record_downlink(&mut self, fcnt: u16) {
        self.session.fcnt_down = fcnt;
    }

    fn mark_abp(&mut self, part: u8) {
        self.abp_provisioned |= part;
        if self.abp_provisioned == ABP_COMPLETE {
            self.mode = ActivationMode::ABPActivated;
        }
        self.reset_frame_counter();
    }

    fn reset_frame_counter(&mut self) {
        self.session.fcnt_up = 0;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abp_needs_all_credentials() {
        let mut store = SessionStore::new();
        store.set_dev_addr("26011BDA").unwrap();
        store.set_nwk_skey("000102030405060708090A0B0C0D0E0F").unwrap();
        assert!(store.session().is_none());
        store.set_app_skey("0F0E0D0C0B0A09080706050403020100").unwrap();
        assert_eq!(store.mode(), ActivationMode::ABPActivated);
        assert_eq!(store.session().unwrap().dev_addr.as_u32(), 0x2601_1BDA);
    }

    #[test]
    fn test_malformed_credential_keeps_state() {
        let mut store = SessionStore::new();
        store.set_dev_addr("26011BDA").unwrap();
        store.set_frame_counter(41);
        assert_eq!(store.set_dev_addr("26011BD"), Err(ConfigError::InvalidHex));
        assert_eq!(store.set_app_key("not a key"), Err(ConfigError::InvalidHex));
        assert_eq!(store.frame_counter(), 41);
    }
}
