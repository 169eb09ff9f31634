use embedded_hal::{
    blocking::{
        delay::DelayMs,
        spi::{Transfer, Write},
    },
    digital::v2::{InputPin, OutputPin},
};

use crate::radio::traits::{ModulationParams, Radio, RxConfig, TxConfig};

// SX127x Register Map
const REG_FIFO: u8 = 0x00;
const REG_OP_MODE: u8 = 0x01;
const REG_FRF_MSB: u8 = 0x06;
const REG_FRF_MID: u8 = 0x07;
const REG_FRF_LSB: u8 = 0x08;
const REG_PA_CONFIG: u8 = 0x09;
const REG_LNA: u8 = 0x0C;
const REG_FIFO_ADDR_PTR: u8 = 0x0D;
const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;
const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;
const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
const REG_IRQ_FLAGS: u8 = 0x12;
const REG_RX_NB_BYTES: u8 = 0x13;
const REG_MODEM_CONFIG_1: u8 = 0x1D;
const REG_MODEM_CONFIG_2: u8 = 0x1E;
const REG_SYMB_TIMEOUT_LSB: u8 = 0x1F;
const REG_PREAMBLE_MSB: u8 = 0x20;
const REG_PREAMBLE_LSB: u8 = 0x21;
const REG_PAYLOAD_LENGTH: u8 = 0x22;
const REG_MODEM_CONFIG_3: u8 = 0x26;
const REG_INVERTIQ: u8 = 0x33;
const REG_SYNC_WORD: u8 = 0x39;
const REG_INVERTIQ2: u8 = 0x3B;
const REG_DIO_MAPPING_1: u8 = 0x40;
const REG_VERSION: u8 = 0x42;

// Operating Mode bits
const MODE_LONG_RANGE_MODE: u8 = 0x80;
const MODE_SLEEP: u8 = 0x00;
const MODE_STDBY: u8 = 0x01;
const MODE_TX: u8 = 0x03;
const MODE_RX_CONTINUOUS: u8 = 0x05;

// PA Config: PA_BOOST, max power 0x7 << 4, output power index in the low nibble
const PA_CONFIG_BASE: u8 = 0xF0;
const MAX_POWER_INDEX: u8 = 0x0F;

// DIO0 mapping
const DIO0_RX_DONE: u8 = 0x00;
const DIO0_TX_DONE: u8 = 0x40;

// IRQ Flags
const IRQ_TX_DONE_MASK: u8 = 0x08;
const IRQ_PAYLOAD_CRC_ERROR_MASK: u8 = 0x20;
const IRQ_RX_DONE_MASK: u8 = 0x40;
const IRQ_CLEAR_ALL: u8 = 0xFF;

// IQ polarity: uplinks normal, downlinks inverted
const INVERTIQ_NORMAL: (u8, u8) = (0x27, 0x1D);
const INVERTIQ_INVERTED: (u8, u8) = (0x67, 0x19);

/// LoRaWAN public network sync word
const SYNC_WORD_PUBLIC: u8 = 0x34;
/// Silicon revision reported by SX1276/77/78/79 and RFM95
const EXPECTED_VERSION: u8 = 0x12;
/// Reset line hold time in milliseconds
const RESET_HOLD_MS: u32 = 10;
/// Register polls before giving up on TX done
const TX_DONE_POLLS: u32 = 1_000_000;

/// Possible errors in radio operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// SPI transfer error
    Spi,
    /// GPIO error
    Gpio,
    /// Chip did not answer with the expected version
    Hardware,
    /// TX done never signalled
    Timeout,
    /// Received frame larger than the caller's buffer
    BufferTooSmall,
}

/// SX127x Radio Driver
pub struct SX127x<SPI, CS, RESET, DIO0, DELAY>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DIO0: InputPin,
    DELAY: DelayMs<u32>,
{
    spi: SPI,
    cs: CS,
    reset: RESET,
    dio0: DIO0,
    delay: DELAY,
    rx_config: Option<RxConfig>,
}

impl<SPI, CS, RESET, DIO0, DELAY> SX127x<SPI, CS, RESET, DIO0, DELAY>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DIO0: InputPin,
    DELAY: DelayMs<u32>,
{
    /// Create new instance of SX127x driver. No bus traffic until [`Radio::init`].
    pub fn new(spi: SPI, cs: CS, reset: RESET, dio0: DIO0, delay: DELAY) -> Self {
        Self {
            spi,
            cs,
            reset,
            dio0,
            delay,
            rx_config: None,
        }
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, CS, RESET, DIO0, DELAY) {
        (self.spi, self.cs, self.reset, self.dio0, self.delay)
    }

    /// Pulse the reset line: assert, hold, release, hold
    fn hardware_reset(&mut self) -> Result<(), RadioError> {
        self.reset.set_low().map_err(|_| RadioError::Gpio)?;
        self.delay.delay_ms(RESET_HOLD_MS);
        self.reset.set_high().map_err(|_| RadioError::Gpio)?;
        self.delay.delay_ms(RESET_HOLD_MS);
        Ok(())
    }

    /// Read a radio register
    fn read_register(&mut self, addr: u8) -> Result<u8, RadioError> {
        self.cs.set_low().map_err(|_| RadioError::Gpio)?;
        let mut buffer = [addr & 0x7F, 0];
        let result = self.spi.transfer(&mut buffer).map(|_| ()).map_err(|_| RadioError::Spi);
        self.cs.set_high().map_err(|_| RadioError::Gpio)?;
        result?;
        Ok(buffer[1])
    }

    /// Write to a radio register
    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), RadioError> {
        self.cs.set_low().map_err(|_| RadioError::Gpio)?;
        let result = self.spi.write(&[addr | 0x80, value]).map_err(|_| RadioError::Spi);
        self.cs.set_high().map_err(|_| RadioError::Gpio)?;
        result
    }

    /// Set operating mode
    fn set_mode(&mut self, mode: u8) -> Result<(), RadioError> {
        self.write_register(REG_OP_MODE, MODE_LONG_RANGE_MODE | mode)
    }

    fn set_frequency(&mut self, freq: u32) -> Result<(), RadioError> {
        let frf = (freq as u64 * (1 << 19) / 32_000_000) as u32;
        self.write_register(REG_FRF_MSB, ((frf >> 16) & 0xFF) as u8)?;
        self.write_register(REG_FRF_MID, ((frf >> 8) & 0xFF) as u8)?;
        self.write_register(REG_FRF_LSB, (frf & 0xFF) as u8)?;
        Ok(())
    }

    fn set_modulation(&mut self, modulation: ModulationParams, crc: bool) -> Result<(), RadioError> {
        let sf = modulation.spreading_factor.clamp(6, 12);
        let bw: u8 = match modulation.bandwidth {
            b if b <= 125_000 => 7,
            b if b <= 250_000 => 8,
            _ => 9,
        };
        let cr = modulation.coding_rate.clamp(5, 8) - 4;
        // Explicit header mode
        let modem_config1 = (bw << 4) | (cr << 1);
        let modem_config2 = (sf << 4) | if crc { 0x04 } else { 0x00 };
        // AGC auto, low data rate optimize above 16 ms symbols
        let ldro = if sf >= 11 && bw == 7 { 0x08 } else { 0x00 };

        self.write_register(REG_MODEM_CONFIG_1, modem_config1)?;
        self.write_register(REG_MODEM_CONFIG_2, modem_config2)?;
        self.write_register(REG_MODEM_CONFIG_3, 0x04 | ldro)?;
        Ok(())
    }

    fn set_invert_iq(&mut self, (iq, iq2): (u8, u8)) -> Result<(), RadioError> {
        self.write_register(REG_INVERTIQ, iq)?;
        self.write_register(REG_INVERTIQ2, iq2)
    }

    fn enter_receive(&mut self, mode: u8) -> Result<(), RadioError> {
        self.set_mode(MODE_STDBY)?;
        self.write_register(REG_DIO_MAPPING_1, DIO0_RX_DONE)?;
        self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL)?;
        self.write_register(REG_FIFO_ADDR_PTR, 0x00)?;
        self.set_mode(mode)
    }

    fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<(), RadioError> {
        self.cs.set_low().map_err(|_| RadioError::Gpio)?;
        let result = self
            .spi
            .write(&[REG_FIFO & 0x7F])
            .map_err(|_| RadioError::Spi)
            .and_then(|_| self.spi.transfer(buffer).map(|_| ()).map_err(|_| RadioError::Spi));
        self.cs.set_high().map_err(|_| RadioError::Gpio)?;
        result
    }

    fn write_fifo(&mut self, buffer: &[u8]) -> Result<(), RadioError> {
        self.cs.set_low().map_err(|_| RadioError::Gpio)?;
        let result = self
            .spi
            .write(&[REG_FIFO | 0x80])
            .and_then(|_| self.spi.write(buffer))
            .map_err(|_| RadioError::Spi);
        self.cs.set_high().map_err(|_| RadioError::Gpio)?;
        result
    }
}

impl<SPI, CS, RESET, DIO0, DELAY> Radio for SX127x<SPI, CS, RESET, DIO0, DELAY>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
    RESET: OutputPin,
    DIO0: InputPin,
    DELAY: DelayMs<u32>,
{
    type Error = RadioError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.cs.set_high().map_err(|_| RadioError::Gpio)?;
        self.hardware_reset()?;

        if self.read_register(REG_VERSION)? != EXPECTED_VERSION {
            return Err(RadioError::Hardware);
        }

        // LoRa mode can only be selected from sleep
        self.write_register(REG_OP_MODE, MODE_SLEEP)?;
        self.set_mode(MODE_SLEEP)?;

        self.write_register(REG_FIFO_TX_BASE_ADDR, 0x00)?;
        self.write_register(REG_FIFO_RX_BASE_ADDR, 0x00)?;

        // LNA boost
        let lna = self.read_register(REG_LNA)?;
        self.write_register(REG_LNA, lna | 0x03)?;

        self.write_register(REG_SYMB_TIMEOUT_LSB, 0x25)?;
        self.write_register(REG_PREAMBLE_MSB, 0x00)?;
        self.write_register(REG_PREAMBLE_LSB, 0x08)?;
        self.write_register(REG_SYNC_WORD, SYNC_WORD_PUBLIC)?;
        self.write_register(REG_PA_CONFIG, PA_CONFIG_BASE | MAX_POWER_INDEX)?;

        self.set_mode(MODE_STDBY)
    }

    fn configure_tx(&mut self, config: TxConfig) -> Result<(), Self::Error> {
        self.set_mode(MODE_STDBY)?;
        self.set_frequency(config.frequency)?;
        self.set_modulation(config.modulation, true)?;
        self.set_invert_iq(INVERTIQ_NORMAL)
    }

    fn configure_rx(&mut self, config: RxConfig) -> Result<(), Self::Error> {
        self.set_mode(MODE_STDBY)?;
        self.set_frequency(config.frequency)?;
        // Downlinks carry no payload CRC
        self.set_modulation(config.modulation, false)?;
        self.set_invert_iq(INVERTIQ_INVERTED)?;
        self.rx_config = Some(config);
        Ok(())
    }

    fn set_tx_power(&mut self, index: u8) -> Result<(), Self::Error> {
        self.write_register(REG_PA_CONFIG, PA_CONFIG_BASE | index.min(MAX_POWER_INDEX))
    }

    fn transmit(&mut self, buffer: &[u8]) -> Result<(), Self::Error> {
        self.set_mode(MODE_STDBY)?;
        self.write_register(REG_DIO_MAPPING_1, DIO0_TX_DONE)?;
        self.write_register(REG_PAYLOAD_LENGTH, buffer.len() as u8)?;
        self.write_register(REG_FIFO_ADDR_PTR, 0x00)?;
        self.write_fifo(buffer)?;

        self.set_mode(MODE_TX)?;

        for _ in 0..TX_DONE_POLLS {
            if self.read_register(REG_IRQ_FLAGS)? & IRQ_TX_DONE_MASK != 0 {
                self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL)?;
                return Ok(());
            }
            core::hint::spin_loop();
        }

        self.set_mode(MODE_STDBY)?;
        Err(RadioError::Timeout)
    }

    fn start_receive(&mut self) -> Result<(), Self::Error> {
        if let Some(config) = self.rx_config {
            self.set_invert_iq(INVERTIQ_INVERTED)?;
            self.set_frequency(config.frequency)?;
        }
        // open until standby; the symbol timeout must not end the wait
        self.enter_receive(MODE_RX_CONTINUOUS)
    }

    fn set_continuous_receive(&mut self, enabled: bool) -> Result<(), Self::Error> {
        if enabled {
            self.enter_receive(MODE_RX_CONTINUOUS)
        } else {
            self.set_mode(MODE_STDBY)
        }
    }

    fn is_data_ready(&mut self) -> Result<bool, Self::Error> {
        self.dio0.is_high().map_err(|_| RadioError::Gpio)
    }

    fn read_packet(&mut self, buffer: &mut [u8]) -> nb::Result<usize, Self::Error> {
        let flags = self.read_register(REG_IRQ_FLAGS)?;
        if flags & IRQ_RX_DONE_MASK == 0 {
            return Err(nb::Error::WouldBlock);
        }
        if flags & IRQ_PAYLOAD_CRC_ERROR_MASK != 0 {
            self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL)?;
            return Err(nb::Error::WouldBlock);
        }

        let len = self.read_register(REG_RX_NB_BYTES)? as usize;
        if len > buffer.len() {
            self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL)?;
            return Err(nb::Error::Other(RadioError::BufferTooSmall));
        }

        let rx_addr = self.read_register(REG_FIFO_RX_CURRENT_ADDR)?;
        self.write_register(REG_FIFO_ADDR_PTR, rx_addr)?;
        self.read_fifo(&mut buffer[..len])?;
        self.write_register(REG_IRQ_FLAGS, IRQ_CLEAR_ALL)?;

        Ok(len)
    }

    fn set_rx_interrupt(&mut self, enabled: bool) -> Result<(), Self::Error> {
        // DIO0 doubles as the polled data-ready line, so disabling leaves it
        // on RxDone
        if enabled {
            self.write_register(REG_DIO_MAPPING_1, DIO0_RX_DONE)?;
        }
        Ok(())
    }

    fn standby(&mut self) -> Result<(), Self::Error> {
        self.set_mode(MODE_STDBY)
    }

    fn sleep(&mut self) -> Result<(), Self::Error> {
        self.set_mode(MODE_SLEEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    /// Register file behind a fake SPI bus
    struct RegisterBus {
        regs: [u8; 0x80],
        fifo_pending: bool,
    }

    impl RegisterBus {
        fn new() -> Self {
            let mut regs = [0u8; 0x80];
            regs[REG_VERSION as usize] = EXPECTED_VERSION;
            Self {
                regs,
                fifo_pending: false,
            }
        }
    }

    impl Transfer<u8> for RegisterBus {
        type Error = Infallible;

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
            if self.fifo_pending {
                self.fifo_pending = false;
                words.iter_mut().for_each(|w| *w = 0);
            } else if words.len() == 2 {
                words[1] = self.regs[(words[0] & 0x7F) as usize];
            }
            Ok(words)
        }
    }

    impl Write<u8> for RegisterBus {
        type Error = Infallible;

        fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
            if self.fifo_pending {
                self.fifo_pending = false;
            } else if words.len() == 1 {
                self.fifo_pending = true;
            } else if words.len() == 2 {
                self.regs[(words[0] & 0x7F) as usize] = words[1];
            }
            Ok(())
        }
    }

    struct Pin;

    impl OutputPin for Pin {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl InputPin for Pin {
        type Error = Infallible;

        fn is_high(&self) -> Result<bool, Self::Error> {
            Ok(false)
        }

        fn is_low(&self) -> Result<bool, Self::Error> {
            Ok(true)
        }
    }

    struct NoDelay;

    impl DelayMs<u32> for NoDelay {
        fn delay_ms(&mut self, _ms: u32) {}
    }

    type TestRadio = SX127x<RegisterBus, Pin, Pin, Pin, NoDelay>;

    fn radio() -> TestRadio {
        let mut radio = SX127x::new(RegisterBus::new(), Pin, Pin, Pin, NoDelay);
        radio.init().unwrap();
        radio
    }

    fn reg(radio: &TestRadio, addr: u8) -> u8 {
        radio.spi.regs[addr as usize]
    }

    #[test]
    fn test_init_rejects_unknown_silicon() {
        let mut bus = RegisterBus::new();
        bus.regs[REG_VERSION as usize] = 0x22;
        let mut radio = SX127x::new(bus, Pin, Pin, Pin, NoDelay);
        assert_eq!(radio.init(), Err(RadioError::Hardware));
    }

    #[test]
    fn test_receive_stays_open_until_standby() {
        let mut radio = radio();
        radio.start_receive().unwrap();
        assert_eq!(reg(&radio, REG_OP_MODE), MODE_LONG_RANGE_MODE | MODE_RX_CONTINUOUS);
        assert_eq!(reg(&radio, REG_DIO_MAPPING_1), DIO0_RX_DONE);

        radio.standby().unwrap();
        assert_eq!(reg(&radio, REG_OP_MODE), MODE_LONG_RANGE_MODE | MODE_STDBY);
    }

    #[test]
    fn test_disabling_rx_interrupt_keeps_data_ready_line() {
        let mut radio = radio();
        radio.set_continuous_receive(true).unwrap();
        radio.set_rx_interrupt(true).unwrap();
        radio.set_rx_interrupt(false).unwrap();

        assert_eq!(reg(&radio, REG_OP_MODE), MODE_LONG_RANGE_MODE | MODE_RX_CONTINUOUS);
        assert_eq!(reg(&radio, REG_DIO_MAPPING_1), DIO0_RX_DONE);
    }

    #[test]
    fn test_transmit_maps_tx_done_then_receive_restores_rx_done() {
        let mut radio = radio();
        radio.spi.regs[REG_IRQ_FLAGS as usize] = IRQ_TX_DONE_MASK;
        radio.transmit(&[0x40, 0x01]).unwrap();
        assert_eq!(reg(&radio, REG_DIO_MAPPING_1), DIO0_TX_DONE);
        assert_eq!(reg(&radio, REG_PAYLOAD_LENGTH), 2);

        radio.start_receive().unwrap();
        assert_eq!(reg(&radio, REG_DIO_MAPPING_1), DIO0_RX_DONE);
    }

    #[test]
    fn test_power_register_uses_pa_boost() {
        let mut radio = radio();
        radio.set_tx_power(20).unwrap();
        assert_eq!(reg(&radio, REG_PA_CONFIG), 0xFF);
        radio.set_tx_power(4).unwrap();
        assert_eq!(reg(&radio, REG_PA_CONFIG), 0xF4);
    }
}
