//! LoRaWAN device class implementations
//!
//! - Class A: two receive windows after each uplink, radio idle otherwise
//! - Class C: continuous receive except when transmitting
//!
//! The class only changes through [`set_device_class`].

/// Class A uplink cycle
pub mod class_a;

/// Class C continuous reception
pub mod class_c;

pub use class_a::CycleOutcome;
pub use crate::config::DeviceClass;

use crate::lorawan::{
    mac::{MacError, MacLayer},
    region::Region,
};
use crate::radio::Radio;

/// Switch the device class and reprogram the radio to match.
///
/// Leaving Class C turns continuous reception off before returning.
pub fn set_device_class<R: Radio, REG: Region>(
    mac: &mut MacLayer<R, REG>,
    class: DeviceClass,
) -> Result<(), MacError<R::Error>> {
    match class {
        DeviceClass::A => class_c::leave(mac)?,
        DeviceClass::C => class_c::enter(mac)?,
    }
    mac.settings_mut().device_class = class;
    info!("device class {:?}", class);
    Ok(())
}

/// Put the radio back into the state the current class expects after a
/// transmission or join
pub fn resume<R: Radio, REG: Region>(mac: &mut MacLayer<R, REG>) -> Result<(), MacError<R::Error>> {
    match mac.settings().device_class {
        DeviceClass::A => mac.radio_mut().standby().map_err(MacError::Radio),
        DeviceClass::C => class_c::enter(mac),
    }
}
