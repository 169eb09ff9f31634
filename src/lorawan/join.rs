//! Over-the-air activation
//!
//! A join attempt hops (when enabled), draws a fresh DevNonce, sends the
//! join request and then listens until a valid join accept arrives or the
//! join-accept timeout runs out. Session keys are derived and the session is
//! committed only after the accept passed its integrity check, so a failed
//! attempt leaves the previous state untouched.

use core::fmt;

use rand_core::RngCore;

use super::frame;
use super::mac::{MacError, MacLayer};
use super::region::Region;
use crate::clock::{wait_until, Clock};
use crate::config::{ActivationState, SessionState};
use crate::crypto;
use crate::radio::Radio;

/// Join failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActivationError<E> {
    /// No valid join accept before the timeout
    Timeout,
    /// Radio error
    Radio(E),
    /// Join request could not be built or sent
    Mac(MacError<E>),
}

impl<E> From<MacError<E>> for ActivationError<E> {
    fn from(error: MacError<E>) -> Self {
        match error {
            MacError::Radio(e) => ActivationError::Radio(e),
            other => ActivationError::Mac(other),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for ActivationError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationError::Timeout => f.write_str("no join accept before timeout"),
            ActivationError::Radio(e) => write!(f, "radio error: {:?}", e),
            ActivationError::Mac(e) => write!(f, "join request failed: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for ActivationError<E> {}

/// Run one join attempt and publish the new session on success
pub fn activate<R, REG, C, RNG>(
    mac: &mut MacLayer<R, REG>,
    clock: &C,
    rng: &mut RNG,
) -> Result<SessionState, ActivationError<R::Error>>
where
    R: Radio,
    REG: Region,
    C: Clock + ?Sized,
    RNG: RngCore,
{
    mac.hop(rng);
    let mut attempt = ActivationState::new(rng.next_u32() as u16);

    mac.send_join_request(attempt.dev_nonce)?;
    let sent = clock.now();
    let timeout = mac.timing().join_accept_timeout;

    mac.configure_rx()?;
    mac.start_receive()?;

    loop {
        if !wait_until(clock, sent, timeout, || mac.is_data_ready())? {
            warn!("no join accept within {} ms", timeout.as_millis() as u32);
            mac.radio_mut().standby().map_err(ActivationError::Radio)?;
            return Err(ActivationError::Timeout);
        }

        if let Some(raw) = mac.read_frame()? {
            let app_key = mac.session().identity().app_key;
            match frame::parse_join_accept::<R::Error>(&app_key, &raw) {
                Ok(accept) => {
                    attempt.app_nonce = accept.app_nonce;
                    attempt.net_id = accept.net_id;
                    let (nwk_skey, app_skey) = crypto::derive_session_keys(
                        &app_key,
                        &attempt.app_nonce,
                        &attempt.net_id,
                        attempt.dev_nonce,
                    );
                    let session = SessionState::new(accept.dev_addr, nwk_skey, app_skey);
                    mac.session_mut().commit_join(session.clone());
                    info!("joined with address {:?}", accept.dev_addr.as_u32());
                    return Ok(session);
                }
                Err(_) => debug!("discarding frame of {} bytes while joining", raw.len()),
            }
        }

        // listen again for the rest of the window
        mac.start_receive()?;
    }
}
