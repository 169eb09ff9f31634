//! LoRaWAN 1.0 frame encoding and decoding
//!
//! Device-side encoders for join requests and data uplinks, decoders for join
//! accepts and data downlinks. The matching network-side encoders are
//! provided for simulators and tests.

use heapless::Vec;

use super::mac::MacError;
use crate::buffer::{RawFrame, MAX_PAYLOAD_SIZE};
use crate::config::device::{AESKey, DevAddr, DeviceIdentity, SessionState};
use crate::crypto::{self, Direction, MIC_SIZE};

/// Join request length: MHDR, AppEUI, DevEUI, DevNonce, MIC
pub const JOIN_REQUEST_SIZE: usize = 23;
/// Join accept length without CFList
pub const JOIN_ACCEPT_SIZE: usize = 17;
/// Join accept length with CFList
pub const JOIN_ACCEPT_CFLIST_SIZE: usize = 33;
/// MHDR + DevAddr + FCtrl + FCnt
const FHDR_END: usize = 8;

/// MAC header types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MType {
    /// Join request
    JoinRequest = 0x00,
    /// Join accept
    JoinAccept = 0x20,
    /// Unconfirmed data up
    UnconfirmedDataUp = 0x40,
    /// Unconfirmed data down
    UnconfirmedDataDown = 0x60,
    /// Confirmed data up
    ConfirmedDataUp = 0x80,
    /// Confirmed data down
    ConfirmedDataDown = 0xA0,
}

impl MType {
    /// Message type of a frame, from its MHDR
    pub fn from_mhdr(mhdr: u8) -> Option<Self> {
        match mhdr & 0xE0 {
            0x00 => Some(MType::JoinRequest),
            0x20 => Some(MType::JoinAccept),
            0x40 => Some(MType::UnconfirmedDataUp),
            0x60 => Some(MType::UnconfirmedDataDown),
            0x80 => Some(MType::ConfirmedDataUp),
            0xA0 => Some(MType::ConfirmedDataDown),
            _ => None,
        }
    }
}

/// Frame header flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FCtrl {
    /// Adaptive data rate enabled
    pub adr: bool,
    /// ADR acknowledgement requested
    pub adr_ack_req: bool,
    /// Acknowledges the last confirmed frame
    pub ack: bool,
    /// Network has more data pending
    pub f_pending: bool,
    /// Length of FOpts
    pub f_opts_len: u8,
}

impl FCtrl {
    /// Encode into the FCtrl byte
    pub fn to_byte(&self) -> u8 {
        let mut byte = self.f_opts_len & 0x0F;
        if self.adr {
            byte |= 0x80;
        }
        if self.adr_ack_req {
            byte |= 0x40;
        }
        if self.ack {
            byte |= 0x20;
        }
        if self.f_pending {
            byte |= 0x10;
        }
        byte
    }

    /// Decode the FCtrl byte
    pub fn from_byte(byte: u8) -> Self {
        Self {
            adr: (byte & 0x80) != 0,
            adr_ack_req: (byte & 0x40) != 0,
            ack: (byte & 0x20) != 0,
            f_pending: (byte & 0x10) != 0,
            f_opts_len: byte & 0x0F,
        }
    }
}

/// Fields of a decrypted, verified join accept
#[derive(Debug, Clone, PartialEq)]
pub struct JoinAccept {
    /// Application nonce
    pub app_nonce: [u8; 3],
    /// Network identifier
    pub net_id: [u8; 3],
    /// Assigned device address
    pub dev_addr: DevAddr,
    /// RX1 data-rate offset and RX2 data rate
    pub dl_settings: u8,
    /// RX1 delay in seconds
    pub rx_delay: u8,
    /// Optional list of extra channels
    pub cf_list: Option<[u8; 16]>,
}

/// A verified, decrypted data downlink
#[derive(Debug, Clone, PartialEq)]
pub struct Downlink {
    /// Confirmed downlink (expects an acknowledgement)
    pub confirmed: bool,
    /// Frame control flags
    pub f_ctrl: FCtrl,
    /// Downlink frame counter
    pub fcnt: u16,
    /// Application port, absent when the frame carries no payload
    pub port: Option<u8>,
    /// Decrypted payload
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Downlink {
    /// Payload meant for the application (port 1-223)
    pub fn application_payload(&self) -> Option<&[u8]> {
        match self.port {
            Some(port) if port > 0 => Some(&self.payload),
            _ => None,
        }
    }
}

fn push_all<E>(frame: &mut RawFrame, bytes: &[u8]) -> Result<(), MacError<E>> {
    frame.extend_from_slice(bytes).map_err(|_| MacError::BufferTooSmall)
}

fn push<E>(frame: &mut RawFrame, byte: u8) -> Result<(), MacError<E>> {
    frame.push(byte).map_err(|_| MacError::BufferTooSmall)
}

/// Build a join request for `identity` with `dev_nonce`
pub fn build_join_request<E>(
    identity: &DeviceIdentity,
    dev_nonce: u16,
) -> Result<RawFrame, MacError<E>> {
    let mut frame = RawFrame::new();
    push(&mut frame, MType::JoinRequest as u8)?;
    push_all(&mut frame, &identity.app_eui.to_le_bytes())?;
    push_all(&mut frame, &identity.dev_eui.to_le_bytes())?;
    push_all(&mut frame, &dev_nonce.to_le_bytes())?;
    let mic = crypto::compute_join_mic(&identity.app_key, &frame);
    push_all(&mut frame, &mic)?;
    Ok(frame)
}

/// Decrypt and verify a join accept
pub fn parse_join_accept<E>(app_key: &AESKey, frame: &[u8]) -> Result<JoinAccept, MacError<E>> {
    if frame.len() != JOIN_ACCEPT_SIZE && frame.len() != JOIN_ACCEPT_CFLIST_SIZE {
        return Err(MacError::InvalidFrame);
    }
    if MType::from_mhdr(frame[0]) != Some(MType::JoinAccept) {
        return Err(MacError::InvalidFrame);
    }

    let mut plain = [0u8; JOIN_ACCEPT_CFLIST_SIZE];
    let len = frame.len();
    plain[..len].copy_from_slice(frame);
    crypto::decrypt_join_accept(app_key, &mut plain[1..len]);

    let mic_at = len - MIC_SIZE;
    if crypto::compute_join_mic(app_key, &plain[..mic_at]) != plain[mic_at..len] {
        return Err(MacError::InvalidMic);
    }

    let mut app_nonce = [0u8; 3];
    let mut net_id = [0u8; 3];
    let mut addr = [0u8; 4];
    app_nonce.copy_from_slice(&plain[1..4]);
    net_id.copy_from_slice(&plain[4..7]);
    addr.copy_from_slice(&plain[7..11]);
    let cf_list = (len == JOIN_ACCEPT_CFLIST_SIZE).then(|| {
        let mut list = [0u8; 16];
        list.copy_from_slice(&plain[13..29]);
        list
    });

    Ok(JoinAccept {
        app_nonce,
        net_id,
        dev_addr: DevAddr::from_le_bytes(addr),
        dl_settings: plain[11],
        rx_delay: plain[12],
        cf_list,
    })
}

/// Encrypt and sign a join accept, as the network server does
pub fn build_join_accept<E>(app_key: &AESKey, accept: &JoinAccept) -> Result<RawFrame, MacError<E>> {
    let mut frame = RawFrame::new();
    push(&mut frame, MType::JoinAccept as u8)?;
    push_all(&mut frame, &accept.app_nonce)?;
    push_all(&mut frame, &accept.net_id)?;
    push_all(&mut frame, &accept.dev_addr.to_le_bytes())?;
    push(&mut frame, accept.dl_settings)?;
    push(&mut frame, accept.rx_delay)?;
    if let Some(cf_list) = &accept.cf_list {
        push_all(&mut frame, cf_list)?;
    }
    let mic = crypto::compute_join_mic(app_key, &frame);
    push_all(&mut frame, &mic)?;
    crypto::encrypt_join_accept(app_key, &mut frame[1..]);
    Ok(frame)
}

/// Encrypt and sign a data frame for `session` at the session's current
/// uplink counter (or any counter, for the network side)
fn build_data_frame<E>(
    session: &SessionState,
    mtype: MType,
    f_ctrl: FCtrl,
    fcnt: u16,
    port: u8,
    payload: &[u8],
    dir: Direction,
) -> Result<RawFrame, MacError<E>> {
    let mut frame = RawFrame::new();
    push(&mut frame, mtype as u8)?;
    push_all(&mut frame, &session.dev_addr.to_le_bytes())?;
    push(&mut frame, f_ctrl.to_byte())?;
    push_all(&mut frame, &fcnt.to_le_bytes())?;

    if !payload.is_empty() {
        push(&mut frame, port)?;
        let start = frame.len();
        push_all(&mut frame, payload)?;
        let key = if port == 0 {
            &session.nwk_skey
        } else {
            &session.app_skey
        };
        crypto::encrypt_payload(key, session.dev_addr, fcnt as u32, dir, &mut frame[start..]);
    }

    let mic = crypto::compute_mic(&session.nwk_skey, &frame, session.dev_addr, fcnt as u32, dir);
    push_all(&mut frame, &mic)?;
    Ok(frame)
}

/// Build a data uplink carrying `payload` on `port`
pub fn build_data_uplink<E>(
    session: &SessionState,
    confirmed: bool,
    port: u8,
    payload: &[u8],
) -> Result<RawFrame, MacError<E>> {
    let mtype = if confirmed {
        MType::ConfirmedDataUp
    } else {
        MType::UnconfirmedDataUp
    };
    build_data_frame(
        session,
        mtype,
        FCtrl::default(),
        session.fcnt_up,
        port,
        payload,
        Direction::Up,
    )
}

/// Build a data downlink, as the network server does
pub fn build_data_downlink<E>(
    session: &SessionState,
    confirmed: bool,
    f_ctrl: FCtrl,
    fcnt: u16,
    port: u8,
    payload: &[u8],
) -> Result<RawFrame, MacError<E>> {
    let mtype = if confirmed {
        MType::ConfirmedDataDown
    } else {
        MType::UnconfirmedDataDown
    };
    let f_ctrl = FCtrl {
        f_opts_len: 0,
        ..f_ctrl
    };
    build_data_frame(session, mtype, f_ctrl, fcnt, port, payload, Direction::Down)
}

/// Verify and decrypt a data downlink addressed to `session`
pub fn parse_data_downlink<E>(
    session: &SessionState,
    frame: &[u8],
) -> Result<Downlink, MacError<E>> {
    if frame.len() < FHDR_END + MIC_SIZE {
        return Err(MacError::InvalidFrame);
    }
    let confirmed = match MType::from_mhdr(frame[0]) {
        Some(MType::UnconfirmedDataDown) => false,
        Some(MType::ConfirmedDataDown) => true,
        _ => return Err(MacError::InvalidFrame),
    };

    let dev_addr = DevAddr::from_le_bytes([frame[1], frame[2], frame[3], frame[4]]);
    if dev_addr != session.dev_addr {
        return Err(MacError::AddressMismatch);
    }

    let f_ctrl = FCtrl::from_byte(frame[5]);
    let fcnt = u16::from_le_bytes([frame[6], frame[7]]);
    let mic_at = frame.len() - MIC_SIZE;
    let header_end = FHDR_END + f_ctrl.f_opts_len as usize;
    if header_end > mic_at {
        return Err(MacError::InvalidFrame);
    }

    let mic = crypto::compute_mic(
        &session.nwk_skey,
        &frame[..mic_at],
        session.dev_addr,
        fcnt as u32,
        Direction::Down,
    );
    if mic != frame[mic_at..] {
        return Err(MacError::InvalidMic);
    }

    let mut payload = Vec::new();
    let port = if header_end < mic_at {
        let port = frame[header_end];
        payload
            .extend_from_slice(&frame[header_end + 1..mic_at])
            .map_err(|_| MacError::InvalidFrame)?;
        let key = if port == 0 {
            &session.nwk_skey
        } else {
            &session.app_skey
        };
        crypto::encrypt_payload(key, session.dev_addr, fcnt as u32, Direction::Down, &mut payload);
        Some(port)
    } else {
        None
    };

    Ok(Downlink {
        confirmed,
        f_ctrl,
        fcnt,
        port,
        payload,
    })
}
