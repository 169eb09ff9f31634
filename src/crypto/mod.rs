//! LoRaWAN cryptographic operations
//!
//! This module provides cryptographic functions for LoRaWAN security:
//! - Message Integrity Code (MIC) computation (AES-CMAC)
//! - Payload encryption/decryption (AES-128 keystream)
//! - Join accept encryption
//! - Session key derivation

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Block};
use cmac::{Cmac, Mac};

use crate::config::device::{AESKey, DevAddr};

/// MIC size in bytes
pub const MIC_SIZE: usize = 4;

/// Block size for AES-128
const BLOCK_SIZE: usize = 16;

/// Direction identifiers for cryptographic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Uplink (device to network)
    Up = 0,
    /// Downlink (network to device)
    Down = 1,
}

fn cipher(key: &AESKey) -> Aes128 {
    Aes128::new(&Block::from(*key.as_bytes()))
}

fn cmac(key: &AESKey) -> Cmac<Aes128> {
    <Cmac<Aes128> as KeyInit>::new(&Block::from(*key.as_bytes()))
}

/// Encrypt a single block with AES-128
pub fn aes128_encrypt(key: &AESKey, input: [u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut block = Block::from(input);
    cipher(key).encrypt_block(&mut block);
    let mut out = [0u8; BLOCK_SIZE];
    out.copy_from_slice(&block);
    out
}

/// Build the B0/Ai block shared by MIC and payload encryption
fn frame_block(tag: u8, dev_addr: DevAddr, fcnt: u32, dir: Direction, last: u8) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block[0] = tag;
    block[5] = dir as u8;
    block[6..10].copy_from_slice(&dev_addr.to_le_bytes());
    block[10..14].copy_from_slice(&fcnt.to_le_bytes());
    block[15] = last;
    block
}

/// Compute Message Integrity Code (MIC) for a data frame
///
/// # Arguments
/// * `key` - Network session key
/// * `data` - MHDR through FRMPayload
/// * `dev_addr` - Device address
/// * `fcnt` - Frame counter
/// * `dir` - Message direction
pub fn compute_mic(
    key: &AESKey,
    data: &[u8],
    dev_addr: DevAddr,
    fcnt: u32,
    dir: Direction,
) -> [u8; MIC_SIZE] {
    let b0 = frame_block(0x49, dev_addr, fcnt, dir, data.len() as u8);
    let mut mac = cmac(key);
    mac.update(&b0);
    mac.update(data);
    truncate_mic(&mac.finalize().into_bytes())
}

/// Compute the MIC of a join request or join accept
///
/// # Arguments
/// * `key` - Application key
/// * `data` - Frame contents without the MIC (plaintext for join accept)
pub fn compute_join_mic(key: &AESKey, data: &[u8]) -> [u8; MIC_SIZE] {
    let mut mac = cmac(key);
    mac.update(data);
    truncate_mic(&mac.finalize().into_bytes())
}

fn truncate_mic(tag: &[u8]) -> [u8; MIC_SIZE] {
    let mut mic = [0u8; MIC_SIZE];
    mic.copy_from_slice(&tag[..MIC_SIZE]);
    mic
}

/// Encrypt or decrypt a FRMPayload in place.
///
/// The keystream is symmetric, so the same call undoes itself.
pub fn encrypt_payload(
    key: &AESKey,
    dev_addr: DevAddr,
    fcnt: u32,
    dir: Direction,
    payload: &mut [u8],
) {
    let cipher = cipher(key);
    for (i, chunk) in payload.chunks_mut(BLOCK_SIZE).enumerate() {
        let a = frame_block(0x01, dev_addr, fcnt, dir, (i + 1) as u8);
        let mut s = Block::from(a);
        cipher.encrypt_block(&mut s);
        for (byte, key_byte) in chunk.iter_mut().zip(s.iter()) {
            *byte ^= key_byte;
        }
    }
}

/// Decrypt a received join accept in place (everything after MHDR).
///
/// The network encrypts with AES decrypt, so the device applies AES encrypt.
/// Trailing bytes that do not fill a block are left untouched.
pub fn decrypt_join_accept(key: &AESKey, data: &mut [u8]) {
    let cipher = cipher(key);
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        let block = Block::from_mut_slice(chunk);
        cipher.encrypt_block(block);
    }
}

/// Encrypt a join accept in place, as the network server does.
///
/// Only needed by network simulators and tests.
pub fn encrypt_join_accept(key: &AESKey, data: &mut [u8]) {
    let cipher = cipher(key);
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        let block = Block::from_mut_slice(chunk);
        cipher.decrypt_block(block);
    }
}

/// Derive network and application session keys from join accept
///
/// # Arguments
/// * `app_key` - Application key
/// * `app_nonce` - Application nonce from join accept
/// * `net_id` - Network ID from join accept
/// * `dev_nonce` - Device nonce from join request
pub fn derive_session_keys(
    app_key: &AESKey,
    app_nonce: &[u8; 3],
    net_id: &[u8; 3],
    dev_nonce: u16,
) -> (AESKey, AESKey) {
    let derive = |tag: u8| {
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = tag;
        block[1..4].copy_from_slice(app_nonce);
        block[4..7].copy_from_slice(net_id);
        block[7..9].copy_from_slice(&dev_nonce.to_le_bytes());
        AESKey::new(aes128_encrypt(app_key, block))
    };
    (derive(0x01), derive(0x02))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> AESKey {
        AESKey::new([byte; 16])
    }

    #[test]
    fn test_payload_cipher_is_symmetric() {
        let addr = DevAddr::new([0x26, 0x01, 0x1B, 0xDA]);
        let plain = *b"a payload longer than one AES block";
        let mut data = plain;
        encrypt_payload(&key(1), addr, 7, Direction::Up, &mut data);
        assert_ne!(data, plain);
        encrypt_payload(&key(1), addr, 7, Direction::Up, &mut data);
        assert_eq!(data, plain);
    }

    #[test]
    fn test_keystream_depends_on_direction_and_counter() {
        let addr = DevAddr::new([1, 2, 3, 4]);
        let mut up = [0u8; 8];
        let mut down = [0u8; 8];
        let mut next = [0u8; 8];
        encrypt_payload(&key(1), addr, 1, Direction::Up, &mut up);
        encrypt_payload(&key(1), addr, 1, Direction::Down, &mut down);
        encrypt_payload(&key(1), addr, 2, Direction::Up, &mut next);
        assert_ne!(up, down);
        assert_ne!(up, next);
    }

    #[test]
    fn test_mic_detects_tampering() {
        let addr = DevAddr::new([1, 2, 3, 4]);
        let mut frame = *b"\x40\x04\x03\x02\x01\x00\x01\x00\x01hello";
        let mic = compute_mic(&key(2), &frame, addr, 1, Direction::Up);
        assert_eq!(mic, compute_mic(&key(2), &frame, addr, 1, Direction::Up));
        frame[10] ^= 0x01;
        assert_ne!(mic, compute_mic(&key(2), &frame, addr, 1, Direction::Up));
        assert_ne!(mic, compute_mic(&key(3), b"hello", addr, 1, Direction::Up));
    }

    #[test]
    fn test_join_accept_cipher_roundtrip() {
        let plain = [0x5Au8; 32];
        let mut data = plain;
        encrypt_join_accept(&key(9), &mut data);
        assert_ne!(data, plain);
        decrypt_join_accept(&key(9), &mut data);
        assert_eq!(data, plain);
    }

    #[test]
    fn test_session_keys_differ() {
        let (nwk, app) = derive_session_keys(&key(1), &[1, 2, 3], &[4, 5, 6], 0x0708);
        assert_ne!(nwk, app);
        let (nwk2, _) = derive_session_keys(&key(1), &[1, 2, 3], &[4, 5, 6], 0x0709);
        assert_ne!(nwk, nwk2);
    }

    // RFC 4493 example 2
    #[test]
    fn test_cmac_reference_vector() {
        let key = AESKey::new([
            0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf,
            0x4f, 0x3c,
        ]);
        let msg = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        assert_eq!(compute_join_mic(&key, &msg), [0x07, 0x0a, 0x16, 0xb4]);
    }
}
