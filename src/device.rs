//! High-level LoRaWAN device interface
//!
//! This module provides the main device interface for LoRaWAN communication.
//! It handles device configuration, activation, and message handling.
//!
//! # Receive interrupt
//!
//! [`LoRaWANDevice::on_dio0_rise`] may be called from the radio's DIO0
//! interrupt. It only copies the raw frame out of the radio into a
//! single-slot mailbox; decoding and buffer updates happen in
//! [`LoRaWANDevice::update`] on the main path. Share the device between the
//! interrupt and the main loop through a critical-section mutex so the two
//! never run on it at the same time.

use core::fmt;

use rand_core::RngCore;

use crate::{
    buffer::{DownlinkBuffer, ReceiveStatus, UplinkBuffer},
    class::{self, class_a, class_c, DeviceClass},
    clock::Clock,
    config::{ActivationMode, ChannelPolicy, ConfigError, RadioSettings, SessionState},
    lorawan::{
        frame::Downlink,
        join::{self, ActivationError},
        mac::{MacError, MacLayer},
        phy::TimingParams,
        region::Region,
    },
    radio::{traits::Radio, CaptureSlot},
};

/// LoRaWAN device error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError<E> {
    /// Radio error, including failed bring-up
    Radio(E),
    /// Join failed
    Activation(ActivationError<E>),
    /// MAC layer error
    Mac(MacError<E>),
    /// Invalid configuration
    Config(ConfigError),
    /// Payload does not fit the uplink buffer
    PayloadTooLarge,
}

impl<E> From<MacError<E>> for DeviceError<E> {
    fn from(error: MacError<E>) -> Self {
        match error {
            MacError::Radio(e) => DeviceError::Radio(e),
            other => DeviceError::Mac(other),
        }
    }
}

impl<E> From<ActivationError<E>> for DeviceError<E> {
    fn from(error: ActivationError<E>) -> Self {
        DeviceError::Activation(error)
    }
}

impl<E> From<ConfigError> for DeviceError<E> {
    fn from(error: ConfigError) -> Self {
        DeviceError::Config(error)
    }
}

impl<E: fmt::Debug> fmt::Display for DeviceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Radio(e) => write!(f, "radio error: {:?}", e),
            DeviceError::Activation(e) => write!(f, "activation failed: {}", e),
            DeviceError::Mac(e) => write!(f, "{}", e),
            DeviceError::Config(e) => write!(f, "invalid configuration: {}", e),
            DeviceError::PayloadTooLarge => f.write_str("payload exceeds uplink buffer"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for DeviceError<E> {}

/// Counters for events that are not surfaced as errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Downlinks dropped for a bad MIC, wrong address or bad framing
    pub malformed_downlinks: u32,
    /// Captured frames overwritten before `update` drained them
    pub mailbox_overruns: u32,
}

/// LoRaWAN device implementation
pub struct LoRaWANDevice<R, REG, CLK, RNG>
where
    R: Radio,
    REG: Region,
    CLK: Clock,
    RNG: RngCore,
{
    mac: MacLayer<R, REG>,
    clock: CLK,
    rng: RNG,
    uplink: UplinkBuffer,
    downlink: DownlinkBuffer,
    capture: CaptureSlot,
    on_receive: Option<fn(usize)>,
    acknowledged: bool,
    malformed_downlinks: u32,
}

impl<R, REG, CLK, RNG> LoRaWANDevice<R, REG, CLK, RNG>
where
    R: Radio,
    REG: Region,
    CLK: Clock,
    RNG: RngCore,
{
    /// Create a device with regional defaults: Class A, hopping, no session.
    /// The radio is not touched until [`init`](Self::init).
    pub fn new(radio: R, region: REG, clock: CLK, rng: RNG) -> Self {
        Self {
            mac: MacLayer::new(radio, region),
            clock,
            rng,
            uplink: UplinkBuffer::new(),
            downlink: DownlinkBuffer::new(),
            capture: CaptureSlot::new(),
            on_receive: None,
            acknowledged: false,
            malformed_downlinks: 0,
        }
    }

    /// Bring up the radio. A radio that does not respond is reported as
    /// [`DeviceError::Radio`]; the caller decides whether to retry.
    pub fn init(&mut self) -> Result<(), DeviceError<R::Error>> {
        self.mac.init().map_err(|e| {
            error!("radio bring-up failed");
            DeviceError::from(e)
        })?;
        info!("radio ready, region {}", self.mac.region().name());
        Ok(())
    }

    /// Join the network over the air.
    ///
    /// On timeout the previous session (if any) stays in place; retrying
    /// draws a new channel and DevNonce. The result is the outcome of the
    /// join itself, even if the radio could not be put back into the
    /// current class's listening state afterwards.
    pub fn join(&mut self) -> Result<SessionState, DeviceError<R::Error>> {
        let result = join::activate(&mut self.mac, &self.clock, &mut self.rng);
        if class::resume(&mut self.mac).is_err() {
            warn!("radio did not resume after join attempt");
        }
        let session = result?;
        self.acknowledged = false;
        Ok(session)
    }

    /// Send `payload` and run both receive windows.
    ///
    /// Returns the receive status afterwards. Not hearing back is a normal
    /// outcome, not an error.
    pub fn send_uplink(
        &mut self,
        payload: &[u8],
        confirm: bool,
    ) -> Result<ReceiveStatus, DeviceError<R::Error>> {
        if self.mac.session().session().is_none() {
            return Err(DeviceError::Mac(MacError::NotActivated));
        }
        self.uplink
            .load(payload)
            .map_err(|_| DeviceError::PayloadTooLarge)?;
        self.mac.settings_mut().confirm = confirm;

        let outcome = class_a::run_cycle(
            &mut self.mac,
            &self.clock,
            &mut self.rng,
            self.uplink.as_slice(),
        )?;

        self.malformed_downlinks = self.malformed_downlinks.wrapping_add(outcome.discarded);
        self.acknowledged = outcome.acknowledged();
        if let Some(downlink) = outcome.downlink {
            self.deliver(&downlink);
        }

        class::resume(&mut self.mac)?;
        Ok(self.downlink.status())
    }

    /// Copy the pending downlink payload into `out` and clear it.
    /// Returns 0 when nothing was pending.
    pub fn read_data(&mut self, out: &mut [u8]) -> usize {
        self.downlink.read(out)
    }

    /// Whether a downlink payload is waiting
    pub fn receive_status(&self) -> ReceiveStatus {
        self.downlink.status()
    }

    /// Service reception outside the receive windows.
    ///
    /// Drains the interrupt mailbox and, in Class C, polls the data-ready
    /// line. Call periodically.
    pub fn update(&mut self) -> Result<ReceiveStatus, DeviceError<R::Error>> {
        let frame = match self.capture.take() {
            Some(frame) => Some(frame),
            None if self.mac.settings().device_class == DeviceClass::C => {
                class_c::poll(&mut self.mac)?
            }
            None => None,
        };

        if let Some(raw) = frame {
            match self.mac.accept_downlink(&raw) {
                Ok(downlink) => self.deliver(&downlink),
                Err(MacError::Radio(e)) => return Err(DeviceError::Radio(e)),
                Err(_) => {
                    warn!("dropped {} byte frame", raw.len());
                    self.malformed_downlinks = self.malformed_downlinks.wrapping_add(1);
                }
            }
        }
        Ok(self.downlink.status())
    }

    /// Receive-done interrupt entry point.
    ///
    /// Only moves the raw frame from the radio into the mailbox. Returns
    /// whether a frame was captured.
    pub fn on_dio0_rise(&mut self) -> Result<bool, DeviceError<R::Error>> {
        match self.mac.read_frame()? {
            Some(frame) => {
                if !self.capture.post(frame) {
                    warn!("capture mailbox overrun");
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Register a callback invoked with the payload length whenever a new
    /// downlink is stored, routing receive-done to DIO0.
    ///
    /// `None` only drops the callback; DIO0 keeps signalling receive-done so
    /// Class C polling continues.
    pub fn on_receive(&mut self, callback: Option<fn(usize)>) -> Result<(), DeviceError<R::Error>> {
        if callback.is_some() {
            self.mac
                .radio_mut()
                .set_rx_interrupt(true)
                .map_err(DeviceError::Radio)?;
        }
        self.on_receive = callback;
        Ok(())
    }

    fn deliver(&mut self, downlink: &Downlink) {
        let Some(payload) = downlink.application_payload() else {
            return;
        };
        if self.downlink.store(payload) {
            debug!("stored {} byte downlink", payload.len());
            if let Some(callback) = self.on_receive {
                callback(payload.len());
            }
        }
    }

    /// Channel selection policy
    pub fn channel(&self) -> ChannelPolicy {
        self.mac.settings().channel_policy
    }

    /// Channel used by the last (or next, when fixed) transmission
    pub fn tx_channel(&self) -> u8 {
        self.mac.settings().channel_tx
    }

    /// Select a fixed channel (0-7) or enable hopping.
    /// Out-of-range channels leave the settings unchanged.
    pub fn set_channel(&mut self, policy: ChannelPolicy) -> Result<(), DeviceError<R::Error>> {
        let (region, settings) = self.mac.region_and_settings();
        settings.set_channel(region, policy).map_err(|e| {
            warn!("channel {:?} rejected", policy);
            DeviceError::Config(e)
        })
    }

    /// Configured transmit data rate
    pub fn data_rate(&self) -> u8 {
        self.mac.settings().datarate_common
    }

    /// Set the transmit data rate; indices above the regional limit leave
    /// the settings unchanged
    pub fn set_data_rate(&mut self, data_rate: u8) -> Result<(), DeviceError<R::Error>> {
        let (region, settings) = self.mac.region_and_settings();
        settings.set_data_rate(region, data_rate).map_err(|e| {
            warn!("data rate {} rejected", data_rate);
            DeviceError::Config(e)
        })
    }

    /// Transmit power index
    pub fn tx_power(&self) -> u8 {
        self.mac.settings().tx_power
    }

    /// Set the transmit power index, clamped to 15. Returns the applied index.
    pub fn set_tx_power(&mut self, index: u8) -> Result<u8, DeviceError<R::Error>> {
        Ok(self.mac.set_tx_power(index)?)
    }

    /// Set the uplink application port (1-223)
    pub fn set_port(&mut self, port: u8) -> Result<(), DeviceError<R::Error>> {
        self.mac.settings_mut().set_port(port)?;
        Ok(())
    }

    /// Uplink frame counter
    pub fn frame_counter(&self) -> u16 {
        self.mac.session().frame_counter()
    }

    /// Overwrite the uplink frame counter, for restoring a saved session
    pub fn set_frame_counter(&mut self, fcnt: u16) {
        self.mac.session_mut().set_frame_counter(fcnt);
    }

    /// Set DevEUI from 16 hex characters
    pub fn set_dev_eui(&mut self, text: &str) -> Result<(), DeviceError<R::Error>> {
        Ok(self.mac.session_mut().set_dev_eui(text)?)
    }

    /// Set AppEUI from 16 hex characters
    pub fn set_app_eui(&mut self, text: &str) -> Result<(), DeviceError<R::Error>> {
        Ok(self.mac.session_mut().set_app_eui(text)?)
    }

    /// Set AppKey from 32 hex characters
    pub fn set_app_key(&mut self, text: &str) -> Result<(), DeviceError<R::Error>> {
        Ok(self.mac.session_mut().set_app_key(text)?)
    }

    /// Set the device address from 8 hex characters
    pub fn set_dev_addr(&mut self, text: &str) -> Result<(), DeviceError<R::Error>> {
        Ok(self.mac.session_mut().set_dev_addr(text)?)
    }

    /// Set the network session key from 32 hex characters
    pub fn set_nwk_skey(&mut self, text: &str) -> Result<(), DeviceError<R::Error>> {
        Ok(self.mac.session_mut().set_nwk_skey(text)?)
    }

    /// Set the application session key from 32 hex characters
    pub fn set_app_skey(&mut self, text: &str) -> Result<(), DeviceError<R::Error>> {
        Ok(self.mac.session_mut().set_app_skey(text)?)
    }

    /// Switch between Class A and Class C
    pub fn set_device_class(&mut self, class: DeviceClass) -> Result<(), DeviceError<R::Error>> {
        Ok(class::set_device_class(&mut self.mac, class)?)
    }

    /// Current device class
    pub fn device_class(&self) -> DeviceClass {
        self.mac.settings().device_class
    }

    /// Whether the last downlink acknowledged the last uplink
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Dropped-frame counters
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            malformed_downlinks: self.malformed_downlinks,
            mailbox_overruns: self.capture.overruns(),
        }
    }

    /// Active session, `None` until joined or fully personalized
    pub fn session(&self) -> Option<&SessionState> {
        self.mac.session().session()
    }

    /// How the session was established
    pub fn activation_mode(&self) -> ActivationMode {
        self.mac.session().mode()
    }

    /// Current radio settings
    pub fn settings(&self) -> &RadioSettings {
        self.mac.settings()
    }

    /// Receive window timing
    pub fn timing(&self) -> TimingParams {
        self.mac.timing()
    }

    /// Replace the receive window timing
    pub fn set_timing(&mut self, timing: TimingParams) {
        self.mac.set_timing(timing);
    }

    /// Put the radio to sleep until the next operation
    pub fn sleep(&mut self) -> Result<(), DeviceError<R::Error>> {
        self.mac.radio_mut().sleep().map_err(DeviceError::Radio)
    }

    /// Time source
    pub fn clock(&self) -> &CLK {
        &self.clock
    }

    /// Radio driver
    pub fn radio(&self) -> &R {
        self.mac.radio()
    }

    /// Mutable radio driver
    pub fn radio_mut(&mut self) -> &mut R {
        self.mac.radio_mut()
    }
}
