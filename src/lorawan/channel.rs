//! Channel selection
//!
//! With a fixed policy the settings already name the channel and selection is
//! a no-op. With hopping a channel is drawn uniformly from the regional set
//! before every transmission.

use rand_core::RngCore;

use super::region::Region;
use crate::config::RadioSettings;

/// Choose the transmit channel for the next transmission.
///
/// The receive channel follows when the plan pairs it with the transmit
/// channel. A regional wideband channel forces its own data rate; every other
/// channel transmits at the configured common data rate.
pub fn select_channel<REG, RNG>(region: &REG, settings: &mut RadioSettings, rng: &mut RNG)
where
    REG: Region,
    RNG: RngCore,
{
    if !settings.is_hopping() {
        return;
    }

    let count = region.hopping_channels().max(1) as u32;
    let channel = (rng.next_u32() % count) as u8;
    settings.channel_tx = channel;

    if let Some(offset) = region.rx_channel_offset() {
        settings.channel_rx = channel + offset;
    }

    settings.datarate_tx = match region.wideband_channel() {
        Some((wideband, data_rate)) if wideband == channel => data_rate,
        _ => settings.datarate_common,
    };

    trace!("hop to channel {} DR{}", channel, settings.datarate_tx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelPolicy;
    use crate::lorawan::region::{AS923, EU868, US915};

    /// Replays a fixed sequence of draws
    struct Sequence<'a>(&'a [u32], usize);

    impl RngCore for Sequence<'_> {
        fn next_u32(&mut self) -> u32 {
            let value = self.0[self.1 % self.0.len()];
            self.1 += 1;
            value
        }

        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for byte in dest {
                *byte = self.next_u32() as u8;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_fixed_policy_is_untouched() {
        let region = EU868::new();
        let mut settings = RadioSettings::new(&region);
        settings.set_channel(&region, ChannelPolicy::Fixed(3)).unwrap();
        let before = settings.clone();
        select_channel(&region, &mut settings, &mut Sequence(&[5], 0));
        assert_eq!(settings, before);
    }

    #[test]
    fn test_hopping_stays_in_plan() {
        let region = EU868::new();
        let mut settings = RadioSettings::new(&region);
        let mut rng = Sequence(&[0, 7, 8, 15, 1_000_003], 0);
        for _ in 0..5 {
            select_channel(&region, &mut settings, &mut rng);
            assert!(settings.channel_tx < 8);
            assert!(region.tx_frequency(settings.channel_tx).is_some());
        }
    }

    #[test]
    fn test_us915_receive_channel_follows() {
        let region = US915::new();
        let mut settings = RadioSettings::new(&region);
        select_channel(&region, &mut settings, &mut Sequence(&[5], 0));
        assert_eq!(settings.channel_tx, 5);
        assert_eq!(settings.channel_rx, 13);
    }

    #[test]
    fn test_as923_wideband_forces_data_rate() {
        let region = AS923::new();
        let mut settings = RadioSettings::new(&region);
        settings.set_data_rate(&region, 2).unwrap();

        select_channel(&region, &mut settings, &mut Sequence(&[8], 0));
        assert_eq!(settings.channel_tx, 8);
        assert_eq!(settings.datarate_tx, 6);

        select_channel(&region, &mut settings, &mut Sequence(&[4], 0));
        assert_eq!(settings.datarate_tx, 2);
        assert_eq!(settings.datarate_common, 2);
    }
}
