use crate::lorawan::region::Region;

use super::ConfigError;

/// Highest transmit power index accepted by the radio
pub const MAX_TX_POWER_INDEX: u8 = 0x0F;

/// Highest channel index selectable with a fixed policy
pub const MAX_FIXED_CHANNEL: u8 = 7;

/// Default application port for uplinks
pub const DEFAULT_PORT: u8 = 1;

/// LoRaWAN device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceClass {
    /// Class A: Uplink followed by two receive windows
    A,
    /// Class C: Continuously listening except when transmitting
    C,
}

/// How the transmit channel is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelPolicy {
    /// Always use the given channel (0-7)
    Fixed(u8),
    /// Pick a random regional channel for every transmission
    Hopping,
}

/// Radio settings read on every transmission
#[derive(Debug, Clone, PartialEq)]
pub struct RadioSettings {
    /// Transmit channel index
    pub channel_tx: u8,
    /// Receive channel index
    pub channel_rx: u8,
    /// Transmit data rate index
    pub datarate_tx: u8,
    /// Receive data rate index
    pub datarate_rx: u8,
    /// Data rate configured by the user; hopping may override `datarate_tx`
    pub datarate_common: u8,
    /// Transmit power index (0-15)
    pub tx_power: u8,
    /// Request acknowledgement of uplinks
    pub confirm: bool,
    /// Channel selection policy
    pub channel_policy: ChannelPolicy,
    /// Current device class
    pub device_class: DeviceClass,
    /// Application port used for uplinks
    pub port: u8,
}

impl RadioSettings {
    /// Regional defaults: hopping, Class A, unconfirmed, full power
    pub fn new<REG: Region>(region: &REG) -> Self {
        let datarate = region.default_tx_data_rate();
        Self {
            channel_tx: 0,
            channel_rx: region.default_rx_channel(),
            datarate_tx: datarate,
            datarate_rx: region.default_rx_data_rate(),
            datarate_common: datarate,
            tx_power: MAX_TX_POWER_INDEX,
            confirm: false,
            channel_policy: ChannelPolicy::Hopping,
            device_class: DeviceClass::A,
            port: DEFAULT_PORT,
        }
    }

    /// Whether a random channel is picked before every transmission
    pub fn is_hopping(&self) -> bool {
        self.channel_policy == ChannelPolicy::Hopping
    }

    /// Select a fixed channel or enable hopping.
    ///
    /// Fixed channels above 7 are rejected and leave the settings untouched.
    pub fn set_channel<REG: Region>(
        &mut self,
        region: &REG,
        policy: ChannelPolicy,
    ) -> Result<(), ConfigError> {
        match policy {
            ChannelPolicy::Fixed(channel) if channel > MAX_FIXED_CHANNEL => {
                return Err(ConfigError::OutOfRange);
            }
            ChannelPolicy::Fixed(channel) => {
                self.channel_tx = channel;
                if let Some(offset) = region.rx_channel_offset() {
                    self.channel_rx = channel + offset;
                }
                // a wideband hop may have forced the data rate
                self.datarate_tx = self.datarate_common;
            }
            ChannelPolicy::Hopping => {}
        }
        self.channel_policy = policy;
        Ok(())
    }

    /// Set the transmit data rate.
    ///
    /// Indices above the regional maximum are rejected and leave every data
    /// rate untouched.
    pub fn set_data_rate<REG: Region>(
        &mut self,
        region: &REG,
        data_rate: u8,
    ) -> Result<(), ConfigError> {
        if data_rate > region.max_tx_data_rate() {
            return Err(ConfigError::OutOfRange);
        }
        self.datarate_common = data_rate;
        self.datarate_tx = data_rate;
        if let Some(offset) = region.rx_data_rate_offset() {
            self.datarate_rx = data_rate + offset;
        }
        Ok(())
    }

    /// Set the transmit power index, clamped to [`MAX_TX_POWER_INDEX`]
    pub fn set_tx_power(&mut self, index: u8) -> u8 {
        self.tx_power = index.min(MAX_TX_POWER_INDEX);
        self.tx_power
    }

    /// Set the uplink application port (1-223)
    pub fn set_port(&mut self, port: u8) -> Result<(), ConfigError> {
        if !(1..=223).contains(&port) {
            return Err(ConfigError::OutOfRange);
        }
        self.port = port;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lorawan::region::{AS923, EU868, US915};

    #[test]
    fn test_data_rate_out_of_range_retains_previous() {
        let region = EU868::new();
        let mut settings = RadioSettings::new(&region);
        settings.set_data_rate(&region, 5).unwrap();
        assert_eq!(settings.set_data_rate(&region, 8), Err(ConfigError::OutOfRange));
        assert_eq!(settings.set_data_rate(&region, 7), Err(ConfigError::OutOfRange));
        assert_eq!(settings.datarate_tx, 5);
        assert_eq!(settings.datarate_common, 5);
    }

    #[test]
    fn test_us915_receive_offsets() {
        let region = US915::new();
        let mut settings = RadioSettings::new(&region);
        assert_eq!(settings.set_data_rate(&region, 5), Err(ConfigError::OutOfRange));
        settings.set_data_rate(&region, 3).unwrap();
        assert_eq!(settings.datarate_rx, 13);

        settings.set_channel(&region, ChannelPolicy::Fixed(4)).unwrap();
        assert_eq!(settings.channel_tx, 4);
        assert_eq!(settings.channel_rx, 12);
        assert!(!settings.is_hopping());
    }

    #[test]
    fn test_fixed_channel_out_of_range() {
        let region = AS923::new();
        let mut settings = RadioSettings::new(&region);
        settings.set_channel(&region, ChannelPolicy::Fixed(2)).unwrap();
        assert_eq!(
            settings.set_channel(&region, ChannelPolicy::Fixed(8)),
            Err(ConfigError::OutOfRange)
        );
        assert_eq!(settings.channel_policy, ChannelPolicy::Fixed(2));
        assert_eq!(settings.channel_tx, 2);
    }

    #[test]
    fn test_power_clamp() {
        let region = EU868::new();
        let mut settings = RadioSettings::new(&region);
        assert_eq!(settings.set_tx_power(20), 15);
        assert_eq!(settings.set_tx_power(3), 3);
    }
}
