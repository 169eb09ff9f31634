use lorawan_node::{
    buffer::ReceiveStatus,
    config::{ActivationMode, ChannelPolicy, ConfigError, DevAddr},
    device::DeviceError,
    lorawan::region::{Region, AS923, US915},
};

use mock::*;

#[test]
fn test_init_programs_full_power() {
    let device = device();
    assert!(device.radio().initialized);
    assert_eq!(device.radio().tx_power, Some(15));
    assert_eq!(device.activation_mode(), ActivationMode::Idle);
    assert!(device.session().is_none());
}

#[test]
fn test_init_reports_unresponsive_radio() {
    let mut radio = MockRadio::new();
    radio.fail_init = true;
    let mut device = lorawan_node::device::LoRaWANDevice::new(
        radio,
        lorawan_node::lorawan::region::EU868::new(),
        SimClock::new(),
        <rand::rngs::SmallRng as rand::SeedableRng>::seed_from_u64(1),
    );
    assert_eq!(
        device.init(),
        Err(DeviceError::Radio(MockError::NoResponse))
    );
}

#[test]
fn test_every_credential_setter_resets_frame_counter() {
    let mut device = abp_device();
    let setters: [(fn(&mut TestDevice, &str) -> Result<(), DeviceError<MockError>>, &str); 6] = [
        (TestDevice::set_dev_eui, DEV_EUI),
        (TestDevice::set_app_eui, APP_EUI),
        (TestDevice::set_app_key, APP_KEY),
        (TestDevice::set_dev_addr, DEV_ADDR),
        (TestDevice::set_nwk_skey, NWK_SKEY),
        (TestDevice::set_app_skey, APP_SKEY),
    ];
    for (setter, value) in setters {
        device.set_frame_counter(0x1234);
        setter(&mut device, value).unwrap();
        assert_eq!(device.frame_counter(), 0);
    }
}

#[test]
fn test_malformed_credential_is_rejected() {
    let mut device = abp_device();
    device.set_frame_counter(9);
    let before = device.session().cloned();

    assert_eq!(
        device.set_dev_addr("26011BD"),
        Err(DeviceError::Config(ConfigError::InvalidHex))
    );
    assert_eq!(
        device.set_nwk_skey("zz0102030405060708090A0B0C0D0E0F"),
        Err(DeviceError::Config(ConfigError::InvalidHex))
    );
    assert_eq!(device.session().cloned(), before);
    assert_eq!(device.frame_counter(), 9);
}

#[test]
fn test_abp_activates_once_complete() {
    let mut device = device();
    device.set_dev_addr(DEV_ADDR).unwrap();
    device.set_nwk_skey(NWK_SKEY).unwrap();
    assert!(device.session().is_none());

    device.set_app_skey(APP_SKEY).unwrap();
    assert_eq!(device.activation_mode(), ActivationMode::ABPActivated);
    let session = device.session().unwrap();
    assert_eq!(session.dev_addr, DevAddr::new([0x26, 0x01, 0x1B, 0xDA]));
    assert_eq!(session.fcnt_up, 0);
}

#[test]
fn test_data_rate_above_limit_is_ignored() {
    let mut device = device();
    device.set_data_rate(5).unwrap();
    assert_eq!(
        device.set_data_rate(8),
        Err(DeviceError::Config(ConfigError::OutOfRange))
    );
    assert_eq!(device.data_rate(), 5);
    assert_eq!(device.settings().datarate_tx, 5);
}

#[test]
fn test_us915_receive_data_rate_offset() {
    let mut device = device_in(US915::new());
    device.set_data_rate(3).unwrap();
    assert_eq!(device.settings().datarate_rx, 13);
    assert!(device.set_data_rate(5).is_err());
    assert_eq!(device.settings().datarate_rx, 13);
}

#[test]
fn test_tx_power_is_clamped() {
    let mut device = device();
    assert_eq!(device.set_tx_power(20), Ok(15));
    assert_eq!(device.tx_power(), 15);
    assert_eq!(device.radio().tx_power, Some(15));

    assert_eq!(device.set_tx_power(4), Ok(4));
    assert_eq!(device.radio().tx_power, Some(4));
}

#[test]
fn test_fixed_channel_bounds() {
    let mut device = device();
    assert_eq!(device.channel(), ChannelPolicy::Hopping);

    device.set_channel(ChannelPolicy::Fixed(7)).unwrap();
    assert_eq!(device.tx_channel(), 7);
    assert!(device.set_channel(ChannelPolicy::Fixed(8)).is_err());
    assert_eq!(device.channel(), ChannelPolicy::Fixed(7));
    assert_eq!(device.tx_channel(), 7);
}

#[test]
fn test_us915_fixed_channel_pairs_receive_channel() {
    let mut device = device_in(US915::new());
    device.set_channel(ChannelPolicy::Fixed(2)).unwrap();
    assert_eq!(device.settings().channel_tx, 2);
    assert_eq!(device.settings().channel_rx, 10);
}

#[test]
fn test_regional_defaults() {
    let as923 = device_in(AS923::new());
    assert_eq!(as923.settings().channel_rx, 10);
    assert_eq!(as923.settings().datarate_rx, 2);
    assert_eq!(AS923::new().rx_frequency(10), Some(923_200_000));

    let us915 = device_in(US915::new());
    assert_eq!(us915.data_rate(), 2);
    assert_eq!(us915.settings().datarate_rx, 12);
}

#[test]
fn test_port_range() {
    let mut device = device();
    assert_eq!(device.settings().port, 1);
    device.set_port(223).unwrap();
    assert!(device.set_port(0).is_err());
    assert!(device.set_port(224).is_err());
    assert_eq!(device.settings().port, 223);
}

#[test]
fn test_nothing_to_read_initially() {
    let mut device = device();
    let mut out = [0u8; 16];
    assert_eq!(device.receive_status(), ReceiveStatus::NoData);
    assert_eq!(device.read_data(&mut out), 0);
}
