use core::time::Duration;

use super::mac::MacError;
use super::region::{DataRate, Region};
use crate::buffer::RawFrame;
use crate::config::RadioSettings;
use crate::radio::traits::{ModulationParams, Radio, RxConfig, TxConfig};

/// LoRa coding rate 4/5, used for every LoRaWAN frame
const CODING_RATE_4_5: u8 = 5;

/// PHY layer timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingParams {
    /// End of receive window 1, measured from the end of transmission
    pub rx1_delay: Duration,
    /// End of receive window 2, measured from the end of transmission
    pub rx2_delay: Duration,
    /// How long to wait for a join accept
    pub join_accept_timeout: Duration,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            rx1_delay: Duration::from_millis(500),
            rx2_delay: Duration::from_millis(1000),
            join_accept_timeout: Duration::from_millis(6000),
        }
    }
}

/// PHY layer configuration
#[derive(Debug, Clone, Default)]
pub struct PhyConfig {
    /// Timing parameters
    pub timing: TimingParams,
}

/// PHY layer
pub struct PhyLayer<R: Radio> {
    /// Radio driver
    pub radio: R,
    /// Configuration
    pub config: PhyConfig,
}

fn modulation(data_rate: DataRate) -> ModulationParams {
    ModulationParams {
        spreading_factor: data_rate.spreading_factor(),
        bandwidth: data_rate.bandwidth(),
        coding_rate: CODING_RATE_4_5,
    }
}

impl<R: Radio> PhyLayer<R> {
    /// Create new PHY layer
    pub fn new(radio: R, config: PhyConfig) -> Self {
        Self { radio, config }
    }

    /// Initialize radio
    pub fn init(&mut self) -> Result<(), R::Error> {
        self.radio.init()
    }

    /// Program the transmit channel and data rate from the settings
    pub fn configure_tx<REG: Region>(
        &mut self,
        region: &REG,
        settings: &RadioSettings,
    ) -> Result<(), MacError<R::Error>> {
        let frequency = region
            .tx_frequency(settings.channel_tx)
            .ok_or(MacError::InvalidChannel)?;
        let data_rate = region
            .tx_data_rate(settings.datarate_tx)
            .ok_or(MacError::InvalidChannel)?;
        self.radio
            .configure_tx(TxConfig {
                frequency,
                modulation: modulation(data_rate),
            })
            .map_err(MacError::Radio)
    }

    /// Program the receive channel and data rate from the settings
    pub fn configure_rx<REG: Region>(
        &mut self,
        region: &REG,
        settings: &RadioSettings,
    ) -> Result<(), MacError<R::Error>> {
        let frequency = region
            .rx_frequency(settings.channel_rx)
            .ok_or(MacError::InvalidChannel)?;
        let data_rate = region
            .rx_data_rate(settings.datarate_rx)
            .ok_or(MacError::InvalidChannel)?;
        self.radio
            .configure_rx(RxConfig {
                frequency,
                modulation: modulation(data_rate),
            })
            .map_err(MacError::Radio)
    }

    /// Transmit data
    pub fn transmit(&mut self, data: &[u8]) -> Result<(), R::Error> {
        self.radio.transmit(data)
    }

    /// Read a pending frame, `None` when nothing was received
    pub fn receive(&mut self) -> Result<Option<RawFrame>, R::Error> {
        let mut buffer = [0u8; crate::buffer::MAX_FRAME_SIZE];
        match self.radio.read_packet(&mut buffer) {
            Ok(len) => Ok(RawFrame::from_slice(&buffer[..len]).ok()),
            Err(nb::Error::WouldBlock) => Ok(None),
            Err(nb::Error::Other(e)) => Err(e),
        }
    }

    /// Check the data-ready line
    pub fn is_data_ready(&mut self) -> Result<bool, R::Error> {
        self.radio.is_data_ready()
    }
}
