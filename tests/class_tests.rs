use lorawan_node::{buffer::ReceiveStatus, class::DeviceClass, lorawan::region::US915};

use mock::*;

#[test]
fn test_class_c_listens_continuously() {
    let mut device = abp_device();
    assert_eq!(device.device_class(), DeviceClass::A);

    device.set_device_class(DeviceClass::C).unwrap();
    assert_eq!(device.device_class(), DeviceClass::C);
    assert!(device.radio().continuous);
    let rx = device.radio().last_rx_config.unwrap();
    assert_eq!(rx.frequency, 869_525_000);

    device.set_device_class(DeviceClass::A).unwrap();
    assert_eq!(device.device_class(), DeviceClass::A);
    assert!(!device.radio().continuous);
    assert!(!device.radio().armed);
}

#[test]
fn test_class_c_resumes_after_uplink() {
    let mut device = abp_device();
    device.set_device_class(DeviceClass::C).unwrap();
    device.send_uplink(b"x", false).unwrap();
    assert!(device.radio().continuous);
}

#[test]
fn test_class_a_idles_after_uplink() {
    let mut device = abp_device();
    device.send_uplink(b"x", false).unwrap();
    assert!(!device.radio().continuous);
    assert!(!device.radio().armed);
    assert!(device.radio().standby_calls > 0);
}

#[test]
fn test_class_c_update_delivers_downlink() {
    let mut device = abp_device();
    device.set_device_class(DeviceClass::C).unwrap();
    let session = device.session().cloned().unwrap();
    device
        .radio_mut()
        .queue_rx(&downlink(&session, 4, 2, b"set=1", false));

    assert_eq!(device.update(), Ok(ReceiveStatus::NewData));
    let mut out = [0u8; 8];
    assert_eq!(device.read_data(&mut out), 5);
    assert_eq!(&out[..5], b"set=1");
    assert_eq!(device.update(), Ok(ReceiveStatus::NoData));
}

#[test]
fn test_class_a_update_does_not_poll_radio() {
    let mut device = abp_device();
    let session = device.session().cloned().unwrap();
    device.radio_mut().continuous = true;
    device
        .radio_mut()
        .queue_rx(&downlink(&session, 1, 2, b"late", false));

    assert_eq!(device.update(), Ok(ReceiveStatus::NoData));
    assert_eq!(device.radio().rx_queue.len(), 1);
}

#[test]
fn test_interrupt_capture_is_decoded_in_update() {
    let mut device = abp_device();
    device.set_device_class(DeviceClass::C).unwrap();
    let session = device.session().cloned().unwrap();
    device
        .radio_mut()
        .queue_rx(&downlink(&session, 1, 2, b"old", false));
    device
        .radio_mut()
        .queue_rx(&downlink(&session, 2, 2, b"new", false));

    assert_eq!(device.on_dio0_rise(), Ok(true));
    assert_eq!(device.on_dio0_rise(), Ok(true));
    assert_eq!(device.on_dio0_rise(), Ok(false));
    assert_eq!(device.receive_status(), ReceiveStatus::NoData);
    assert_eq!(device.diagnostics().mailbox_overruns, 1);

    assert_eq!(device.update(), Ok(ReceiveStatus::NewData));
    let mut out = [0u8; 8];
    let len = device.read_data(&mut out);
    assert_eq!(&out[..len], b"new");
}

#[test]
fn test_foreign_downlink_is_counted() {
    let mut device = abp_device();
    device.set_device_class(DeviceClass::C).unwrap();
    let mut other = device.session().cloned().unwrap();
    other.dev_addr = lorawan_node::config::DevAddr::new([0x01, 0x02, 0x03, 0x04]);
    device
        .radio_mut()
        .queue_rx(&downlink(&other, 1, 2, b"nope", false));

    assert_eq!(device.update(), Ok(ReceiveStatus::NoData));
    assert_eq!(device.diagnostics().malformed_downlinks, 1);
}

#[test]
fn test_us915_class_c_uses_downlink_plan() {
    let mut device = device_in(US915::new());
    device.set_device_class(DeviceClass::C).unwrap();
    let rx = device.radio().last_rx_config.unwrap();
    assert_eq!(rx.frequency, 923_300_000);
    assert_eq!(rx.modulation.bandwidth, 500_000);
}
