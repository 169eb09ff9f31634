use core::fmt;

use rand_core::RngCore;

use super::channel;
use super::frame::{self, Downlink};
use super::phy::{PhyConfig, PhyLayer, TimingParams};
use super::region::Region;
use crate::buffer::RawFrame;
use crate::config::{RadioSettings, SessionStore};
use crate::radio::Radio;

/// MAC layer error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacError<E> {
    /// Radio error
    Radio(E),
    /// Channel or data rate has no entry in the regional plan
    InvalidChannel,
    /// Buffer too small
    BufferTooSmall,
    /// Invalid frame
    InvalidFrame,
    /// Invalid MIC
    InvalidMic,
    /// Downlink addressed to another device
    AddressMismatch,
    /// No session: the device has not joined or been personalized
    NotActivated,
}

impl<E: fmt::Debug> fmt::Display for MacError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacError::Radio(e) => write!(f, "radio error: {:?}", e),
            MacError::InvalidChannel => f.write_str("channel or data rate not in regional plan"),
            MacError::BufferTooSmall => f.write_str("frame does not fit the buffer"),
            MacError::InvalidFrame => f.write_str("malformed frame"),
            MacError::InvalidMic => f.write_str("message integrity check failed"),
            MacError::AddressMismatch => f.write_str("frame addressed to another device"),
            MacError::NotActivated => f.write_str("device is not activated"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for MacError<E> {}

/// MAC layer state
pub struct MacLayer<R: Radio, REG: Region> {
    /// PHY layer
    phy: PhyLayer<R>,
    /// Region configuration
    region: REG,
    /// Channel, data rate and power settings
    settings: RadioSettings,
    /// Identity and session
    session: SessionStore,
}

impl<R: Radio, REG: Region> MacLayer<R, REG> {
    /// Create a new MAC layer with regional defaults and no session
    pub fn new(radio: R, region: REG) -> Self {
        let settings = RadioSettings::new(&region);
        Self {
            phy: PhyLayer::new(radio, PhyConfig::default()),
            region,
            settings,
            session: SessionStore::new(),
        }
    }

    /// Initialize the radio and program the configured power
    pub fn init(&mut self) -> Result<(), MacError<R::Error>> {
        self.phy.init().map_err(MacError::Radio)?;
        self.phy
            .radio
            .set_tx_power(self.settings.tx_power)
            .map_err(MacError::Radio)
    }

    /// Regional plan
    pub fn region(&self) -> &REG {
        &self.region
    }

    /// Current radio settings
    pub fn settings(&self) -> &RadioSettings {
        &self.settings
    }

    /// Mutable radio settings
    pub fn settings_mut(&mut self) -> &mut RadioSettings {
        &mut self.settings
    }

    /// Region and settings together, for validated setters
    pub fn region_and_settings(&mut self) -> (&REG, &mut RadioSettings) {
        (&self.region, &mut self.settings)
    }

    /// Identity and session
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Mutable identity and session
    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    /// Receive window timing
    pub fn timing(&self) -> TimingParams {
        self.phy.config.timing
    }

    /// Replace the receive window timing
    pub fn set_timing(&mut self, timing: TimingParams) {
        self.phy.config.timing = timing;
    }

    /// Radio driver
    pub fn radio(&self) -> &R {
        &self.phy.radio
    }

    /// Mutable radio driver
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.phy.radio
    }

    /// Pick the next transmit channel if hopping is enabled
    pub fn hop<RNG: RngCore>(&mut self, rng: &mut RNG) {
        channel::select_channel(&self.region, &mut self.settings, rng);
    }

    /// Clamp and apply the transmit power index
    pub fn set_tx_power(&mut self, index: u8) -> Result<u8, MacError<R::Error>> {
        let applied = self.settings.set_tx_power(index);
        self.phy
            .radio
            .set_tx_power(applied)
            .map_err(MacError::Radio)?;
        Ok(applied)
    }

    /// Transmit a join request carrying `dev_nonce`
    pub fn send_join_request(&mut self, dev_nonce: u16) -> Result<(), MacError<R::Error>> {
        let request = frame::build_join_request::<R::Error>(self.session.identity(), dev_nonce)?;
        self.phy.configure_tx(&self.region, &self.settings)?;
        debug!(
            "join request on channel {} DR{}",
            self.settings.channel_tx,
            self.settings.datarate_tx
        );
        self.phy.transmit(&request).map_err(MacError::Radio)
    }

    /// Transmit `payload` on the configured port and advance the uplink
    /// counter once the radio accepted the frame
    pub fn send_data(&mut self, payload: &[u8]) -> Result<(), MacError<R::Error>> {
        let session = self.session.session().ok_or(MacError::NotActivated)?;
        let uplink = frame::build_data_uplink::<R::Error>(
            session,
            self.settings.confirm,
            self.settings.port,
            payload,
        )?;
        let fcnt = session.fcnt_up;

        self.phy.configure_tx(&self.region, &self.settings)?;
        self.phy.transmit(&uplink).map_err(MacError::Radio)?;
        self.session.advance_frame_counter();

        debug!(
            "uplink fcnt {} ({} bytes) on channel {} DR{}",
            fcnt,
            payload.len(),
            self.settings.channel_tx,
            self.settings.datarate_tx
        );
        Ok(())
    }

    /// Tune the receiver to the receive channel and data rate
    pub fn configure_rx(&mut self) -> Result<(), MacError<R::Error>> {
        self.phy.configure_rx(&self.region, &self.settings)
    }

    /// Arm a single reception
    pub fn start_receive(&mut self) -> Result<(), MacError<R::Error>> {
        self.phy.radio.start_receive().map_err(MacError::Radio)
    }

    /// Whether the radio signals a received frame
    pub fn is_data_ready(&mut self) -> Result<bool, MacError<R::Error>> {
        self.phy.is_data_ready().map_err(MacError::Radio)
    }

    /// Fetch a received frame, `None` when nothing valid is pending
    pub fn read_frame(&mut self) -> Result<Option<RawFrame>, MacError<R::Error>> {
        self.phy.receive().map_err(MacError::Radio)
    }

    /// Verify and decrypt a downlink for the active session
    pub fn accept_downlink(&mut self, raw: &[u8]) -> Result<Downlink, MacError<R::Error>> {
        let session = self.session.session().ok_or(MacError::NotActivated)?;
        let downlink = frame::parse_data_downlink::<R::Error>(session, raw)?;
        self.session.record_downlink(downlink.fcnt);
        trace!("downlink fcnt {} accepted", downlink.fcnt);
        Ok(downlink)
    }
}
