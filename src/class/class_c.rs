use crate::buffer::RawFrame;
use crate::lorawan::{
    mac::{MacError, MacLayer},
    region::Region,
};
use crate::radio::Radio;

/// Tune to the receive channel and listen continuously
pub fn enter<R: Radio, REG: Region>(mac: &mut MacLayer<R, REG>) -> Result<(), MacError<R::Error>> {
    mac.configure_rx()?;
    mac.radio_mut()
        .set_continuous_receive(true)
        .map_err(MacError::Radio)
}

/// Stop continuous reception and idle the radio
pub fn leave<R: Radio, REG: Region>(mac: &mut MacLayer<R, REG>) -> Result<(), MacError<R::Error>> {
    let radio = mac.radio_mut();
    radio.set_continuous_receive(false).map_err(MacError::Radio)?;
    radio.standby().map_err(MacError::Radio)
}

/// Fetch a frame if the data-ready line is up
pub fn poll<R: Radio, REG: Region>(
    mac: &mut MacLayer<R, REG>,
) -> Result<Option<RawFrame>, MacError<R::Error>> {
    if !mac.is_data_ready()? {
        return Ok(None);
    }
    mac.read_frame()
}
