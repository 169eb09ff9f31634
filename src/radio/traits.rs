/// Radio modulation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModulationParams {
    /// Spreading factor (SF7-SF12)
    pub spreading_factor: u8,
    /// Bandwidth in Hz
    pub bandwidth: u32,
    /// Coding rate denominator (4/5 -> 5)
    pub coding_rate: u8,
}

/// Radio transmission parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxConfig {
    /// Frequency in Hz
    pub frequency: u32,
    /// Modulation parameters
    pub modulation: ModulationParams,
}

/// Radio receive parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxConfig {
    /// Frequency in Hz
    pub frequency: u32,
    /// Modulation parameters
    pub modulation: ModulationParams,
}

/// Generic radio interface trait
///
/// Register programming, SPI traffic and the transceiver's own timing live
/// behind this trait. The MAC only programs frequencies and modulation,
/// moves frames, and watches the data-ready (DIO0) line.
pub trait Radio {
    /// Error type for radio operations
    type Error;

    /// Reset and bring up the transceiver.
    ///
    /// Fails if the chip does not answer; there is no automatic retry.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Program frequency and modulation for the next transmission
    fn configure_tx(&mut self, config: TxConfig) -> Result<(), Self::Error>;

    /// Program frequency and modulation for the next reception
    fn configure_rx(&mut self, config: RxConfig) -> Result<(), Self::Error>;

    /// Program the power amplifier with a power index (0-15)
    fn set_tx_power(&mut self, index: u8) -> Result<(), Self::Error>;

    /// Transmit a frame, blocking until the radio reports TX done
    fn transmit(&mut self, buffer: &[u8]) -> Result<(), Self::Error>;

    /// Start listening with the last receive configuration.
    ///
    /// The receiver stays open until the next standby, transmit or
    /// reconfiguration; the caller bounds the wait.
    fn start_receive(&mut self) -> Result<(), Self::Error>;

    /// Enter (or leave) continuous reception with the last receive configuration
    fn set_continuous_receive(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Level of the data-ready line: a frame has been received
    fn is_data_ready(&mut self) -> Result<bool, Self::Error>;

    /// Copy a received frame into `buffer` and return its length.
    ///
    /// Returns `WouldBlock` when no frame is pending. Frames failing the
    /// radio's CRC are dropped and also reported as `WouldBlock`.
    fn read_packet(&mut self, buffer: &mut [u8]) -> nb::Result<usize, Self::Error>;

    /// Route the receive-done event to the data-ready interrupt line.
    ///
    /// Disabling must keep the data-ready line usable for polling.
    fn set_rx_interrupt(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Put the radio into standby mode
    fn standby(&mut self) -> Result<(), Self::Error>;

    /// Put the radio into sleep mode
    fn sleep(&mut self) -> Result<(), Self::Error>;
}
