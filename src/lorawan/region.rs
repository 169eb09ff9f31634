//! Regional channel plans
//!
//! Channel and data-rate indices are the ones the device API exposes. Each
//! plan maps them onto frequencies and LoRa modulation parameters.

/// LoRa modulation for one data-rate index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum DataRate {
    SF12BW125,
    SF11BW125,
    SF10BW125,
    SF9BW125,
    SF8BW125,
    SF7BW125,
    SF7BW250,
    SF12BW500,
    SF11BW500,
    SF10BW500,
    SF9BW500,
    SF8BW500,
    SF7BW500,
}

impl DataRate {
    /// Get spreading factor
    pub fn spreading_factor(&self) -> u8 {
        match self {
            DataRate::SF12BW125 | DataRate::SF12BW500 => 12,
            DataRate::SF11BW125 | DataRate::SF11BW500 => 11,
            DataRate::SF10BW125 | DataRate::SF10BW500 => 10,
            DataRate::SF9BW125 | DataRate::SF9BW500 => 9,
            DataRate::SF8BW125 | DataRate::SF8BW500 => 8,
            DataRate::SF7BW125 | DataRate::SF7BW250 | DataRate::SF7BW500 => 7,
        }
    }

    /// Get bandwidth in Hz
    pub fn bandwidth(&self) -> u32 {
        match self {
            DataRate::SF7BW250 => 250_000,
            DataRate::SF12BW500
            | DataRate::SF11BW500
            | DataRate::SF10BW500
            | DataRate::SF9BW500
            | DataRate::SF8BW500
            | DataRate::SF7BW500 => 500_000,
            _ => 125_000,
        }
    }
}

/// Data rates 0-6 shared by EU868 and AS923
const DR_TABLE_125_250: [DataRate; 7] = [
    DataRate::SF12BW125,
    DataRate::SF11BW125,
    DataRate::SF10BW125,
    DataRate::SF9BW125,
    DataRate::SF8BW125,
    DataRate::SF7BW125,
    DataRate::SF7BW250,
];

/// Generic region trait
pub trait Region {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Uplink frequency in Hz for a transmit channel index
    fn tx_frequency(&self, channel: u8) -> Option<u32>;

    /// Downlink frequency in Hz for a receive channel index
    fn rx_frequency(&self, channel: u8) -> Option<u32>;

    /// Modulation for a transmit data-rate index
    fn tx_data_rate(&self, index: u8) -> Option<DataRate>;

    /// Modulation for a receive data-rate index
    fn rx_data_rate(&self, index: u8) -> Option<DataRate>;

    /// Highest transmit data-rate index the user may configure
    fn max_tx_data_rate(&self) -> u8;

    /// Number of channels the hopping policy picks from
    fn hopping_channels(&self) -> u8;

    /// Wideband hopping channel and the data rate it forces
    fn wideband_channel(&self) -> Option<(u8, u8)> {
        None
    }

    /// Receive channel = transmit channel + offset, when the plan pairs them
    fn rx_channel_offset(&self) -> Option<u8> {
        None
    }

    /// Receive data rate = transmit data rate + offset, when the plan pairs them
    fn rx_data_rate_offset(&self) -> Option<u8> {
        None
    }

    /// Transmit data rate after reset
    fn default_tx_data_rate(&self) -> u8;

    /// Receive channel after reset
    fn default_rx_channel(&self) -> u8;

    /// Receive data rate after reset
    fn default_rx_data_rate(&self) -> u8;
}

/// EU863-870 plan
#[derive(Debug, Clone, Default)]
pub struct EU868;

impl EU868 {
    const CHANNELS: [u32; 8] = [
        868_100_000,
        868_300_000,
        868_500_000,
        867_100_000,
        867_300_000,
        867_500_000,
        867_700_000,
        867_900_000,
    ];
    /// RX2 / Class C listening frequency
    const RX2_CHANNEL: u8 = 8;
    const RX2_FREQUENCY: u32 = 869_525_000;

    /// Create a new EU868 region configuration
    pub fn new() -> Self {
        Self
    }
}

impl Region for EU868 {
    fn name(&self) -> &'static str {
        "EU868"
    }

    fn tx_frequency(&self, channel: u8) -> Option<u32> {
        Self::CHANNELS.get(channel as usize).copied()
    }

    fn rx_frequency(&self, channel: u8) -> Option<u32> {
        match channel {
            Self::RX2_CHANNEL => Some(Self::RX2_FREQUENCY),
            _ => self.tx_frequency(channel),
        }
    }

    fn tx_data_rate(&self, index: u8) -> Option<DataRate> {
        DR_TABLE_125_250.get(index as usize).copied()
    }

    fn rx_data_rate(&self, index: u8) -> Option<DataRate> {
        self.tx_data_rate(index)
    }

    fn max_tx_data_rate(&self) -> u8 {
        6
    }

    fn hopping_channels(&self) -> u8 {
        Self::CHANNELS.len() as u8
    }

    fn default_tx_data_rate(&self) -> u8 {
        0
    }

    fn default_rx_channel(&self) -> u8 {
        Self::RX2_CHANNEL
    }

    fn default_rx_data_rate(&self) -> u8 {
        3
    }
}

/// US902-928 plan, restricted to sub-band 2
#[derive(Debug, Clone, Default)]
pub struct US915;

impl US915 {
    const UPLINK_BASE: u32 = 903_900_000;
    const UPLINK_STEP: u32 = 200_000;
    const DOWNLINK_BASE: u32 = 923_300_000;
    const DOWNLINK_STEP: u32 = 600_000;
    const RX_CHANNEL_OFFSET: u8 = 8;
    const RX_DATA_RATE_OFFSET: u8 = 10;

    /// Create a new US915 region configuration
    pub fn new() -> Self {
        Self
    }
}

impl Region for US915 {
    fn name(&self) -> &'static str {
        "US915"
    }

    fn tx_frequency(&self, channel: u8) -> Option<u32> {
        (channel < 8).then(|| Self::UPLINK_BASE + channel as u32 * Self::UPLINK_STEP)
    }

    fn rx_frequency(&self, channel: u8) -> Option<u32> {
        (8..16)
            .contains(&channel)
            .then(|| Self::DOWNLINK_BASE + (channel - 8) as u32 * Self::DOWNLINK_STEP)
    }

    fn tx_data_rate(&self, index: u8) -> Option<DataRate> {
        match index {
            0 => Some(DataRate::SF10BW125),
            1 => Some(DataRate::SF9BW125),
            2 => Some(DataRate::SF8BW125),
            3 => Some(DataRate::SF7BW125),
            4 => Some(DataRate::SF8BW500),
            _ => None,
        }
    }

    fn rx_data_rate(&self, index: u8) -> Option<DataRate> {
        match index {
            8 => Some(DataRate::SF12BW500),
            9 => Some(DataRate::SF11BW500),
            10 => Some(DataRate::SF10BW500),
            11 => Some(DataRate::SF9BW500),
            12 => Some(DataRate::SF8BW500),
            // DR4 uplinks are answered at DR13
            13 | 14 => Some(DataRate::SF7BW500),
            _ => None,
        }
    }

    fn max_tx_data_rate(&self) -> u8 {
        4
    }

    fn hopping_channels(&self) -> u8 {
        8
    }

    fn rx_channel_offset(&self) -> Option<u8> {
        Some(Self::RX_CHANNEL_OFFSET)
    }

    fn rx_data_rate_offset(&self) -> Option<u8> {
        Some(Self::RX_DATA_RATE_OFFSET)
    }

    fn default_tx_data_rate(&self) -> u8 {
        2
    }

    fn default_rx_channel(&self) -> u8 {
        Self::RX_CHANNEL_OFFSET
    }

    fn default_rx_data_rate(&self) -> u8 {
        2 + Self::RX_DATA_RATE_OFFSET
    }
}

/// AS923 plan with a ninth wideband hopping channel
#[derive(Debug, Clone, Default)]
pub struct AS923;

impl AS923 {
    const CHANNELS: [u32; 9] = [
        923_200_000,
        923_400_000,
        922_200_000,
        922_400_000,
        922_600_000,
        922_800_000,
        923_000_000,
        922_000_000,
        922_100_000,
    ];
    const WIDEBAND_CHANNEL: u8 = 8;
    /// SF7 BW250
    const WIDEBAND_DATA_RATE: u8 = 6;
    const RX2_CHANNEL: u8 = 10;
    const RX2_FREQUENCY: u32 = 923_200_000;

    /// Create a new AS923 region configuration
    pub fn new() -> Self {
        Self
    }
}

impl Region for AS923 {
    fn name(&self) -> &'static str {
        "AS923"
    }

    fn tx_frequency(&self, channel: u8) -> Option<u32> {
        Self::CHANNELS.get(channel as usize).copied()
    }

    fn rx_frequency(&self, channel: u8) -> Option<u32> {
        match channel {
            Self::RX2_CHANNEL => Some(Self::RX2_FREQUENCY),
            _ => self.tx_frequency(channel),
        }
    }

    fn tx_data_rate(&self, index: u8) -> Option<DataRate> {
        DR_TABLE_125_250.get(index as usize).copied()
    }

    fn rx_data_rate(&self, index: u8) -> Option<DataRate> {
        self.tx_data_rate(index)
    }

    fn max_tx_data_rate(&self) -> u8 {
        6
    }

    fn hopping_channels(&self) -> u8 {
        Self::CHANNELS.len() as u8
    }

    fn wideband_channel(&self) -> Option<(u8, u8)> {
        Some((Self::WIDEBAND_CHANNEL, Self::WIDEBAND_DATA_RATE))
    }

    fn default_tx_data_rate(&self) -> u8 {
        0
    }

    fn default_rx_channel(&self) -> u8 {
        Self::RX2_CHANNEL
    }

    fn default_rx_data_rate(&self) -> u8 {
        2
    }
}
