//! LoRaWAN end-device engine in Rust
//!
//! This crate implements the device side of LoRaWAN 1.0: over-the-air and
//! personalized activation, channel selection, the Class A uplink cycle with
//! its two receive windows, and Class C continuous reception.
//!
//! # Features
//! - OTAA and ABP activation with atomic session commit
//! - Fixed-channel and frequency-hopping policies
//! - Class A and Class C operation
//! - EU868, US915 and AS923 channel plans
//! - SX127x / RFM95 driver over `embedded-hal`
//! - `defmt` or `log` logging, `std` error traits
//!
//! # Example
//! ```no_run
//! use lorawan_node::{clock::Clock, device::LoRaWANDevice, lorawan::region::EU868, radio::Radio};
//!
//! # fn run<R: Radio, C: Clock, G: rand_core::RngCore>(radio: R, clock: C, rng: G)
//! # -> Result<(), lorawan_node::device::DeviceError<R::Error>> {
//! let mut device = LoRaWANDevice::new(radio, EU868::new(), clock, rng);
//! device.init()?;
//!
//! device.set_dev_eui("0004A30B001C0530")?;
//! device.set_app_eui("70B3D57ED0000000")?;
//! device.set_app_key("2B7E151628AED2A6ABF7158809CF4F3C")?;
//! device.join()?;
//!
//! device.send_uplink(b"Hello, LoRaWAN!", false)?;
//!
//! let mut buffer = [0u8; 64];
//! let len = device.read_data(&mut buffer);
//! # let _ = len;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

/// Uplink and downlink buffers
pub mod buffer;

/// Device class implementations (A, C)
pub mod class;

/// Monotonic time source
pub mod clock;

/// Device and network configuration
pub mod config;

/// Cryptographic functions
pub mod crypto;

/// High-level device interface
pub mod device;

/// LoRaWAN protocol implementation
pub mod lorawan;

/// Radio hardware abstraction layer
pub mod radio;
