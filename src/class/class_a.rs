use rand_core::RngCore;

use crate::clock::{wait_until, Clock};
use crate::lorawan::{
    frame::Downlink,
    mac::{MacError, MacLayer},
    region::Region,
};
use crate::radio::Radio;

/// Result of one uplink cycle
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleOutcome {
    /// Latest valid downlink received in either window
    pub downlink: Option<Downlink>,
    /// Frames dropped as malformed or not addressed to this device
    pub discarded: u32,
}

impl CycleOutcome {
    /// Whether the network acknowledged the uplink
    pub fn acknowledged(&self) -> bool {
        self.downlink
            .as_ref()
            .map(|downlink| downlink.f_ctrl.ack)
            .unwrap_or(false)
    }
}

/// Send `payload` and listen in both receive windows.
///
/// The uplink counter advances as soon as the radio accepted the frame.
/// Missing or invalid downlinks are not errors; they only show up in the
/// returned outcome.
pub fn run_cycle<R, REG, C, RNG>(
    mac: &mut MacLayer<R, REG>,
    clock: &C,
    rng: &mut RNG,
    payload: &[u8],
) -> Result<CycleOutcome, MacError<R::Error>>
where
    R: Radio,
    REG: Region,
    C: Clock + ?Sized,
    RNG: RngCore,
{
    mac.hop(rng);
    mac.send_data(payload)?;
    let sent = clock.now();
    let timing = mac.timing();

    let mut outcome = CycleOutcome::default();
    mac.configure_rx()?;

    for (window, deadline) in [(1, timing.rx1_delay), (2, timing.rx2_delay)] {
        mac.start_receive()?;
        let ready = wait_until(clock, sent, deadline, || mac.is_data_ready())?;
        trace!("RX{} {}", window, if ready { "data ready" } else { "closed" });
        receive_into(mac, &mut outcome)?;
    }

    mac.radio_mut().standby().map_err(MacError::Radio)?;
    Ok(outcome)
}

fn receive_into<R, REG>(
    mac: &mut MacLayer<R, REG>,
    outcome: &mut CycleOutcome,
) -> Result<(), MacError<R::Error>>
where
    R: Radio,
    REG: Region,
{
    let Some(raw) = mac.read_frame()? else {
        return Ok(());
    };
    match mac.accept_downlink(&raw) {
        Ok(downlink) => outcome.downlink = Some(downlink),
        Err(MacError::Radio(e)) => return Err(MacError::Radio(e)),
        Err(_) => {
            warn!("dropped {} byte frame in receive window", raw.len());
            outcome.discarded += 1;
        }
    }
    Ok(())
}
