//! # AIS Transmit Core
//!
//! Protocol and DSP building blocks for generating AIS (Automatic
//! Identification System) transmissions on the marine VHF data link.
//!
//! ## Overview
//!
//! - **Codec**: pack vessel state into ITU-R M.1371-5 payloads (types 1-5,
//!   18, 21), armor them into `!AIVDM` sentences and decode them back
//! - **Framing**: training sequence, HDLC flags, CRC-16, bit stuffing, NRZI
//! - **Modulation**: GMSK at 9600 bit/s with BT = 0.4 and ramped bursts
//!
//! ## Signal Flow
//!
//! ```text
//! TX: VesselState → encode → AisMessage → build_frame → TransmissionFrame → GMSK → I/Q
//! RX: I/Q → GMSK demod → decode_line_bits → decode → VesselState
//! ```
//!
//! ## Example
//!
//! ```rust
//! use aistx_core::prelude::*;
//!
//! let vessel = VesselState::new(123456789, "SEA SPRITE", 37.7749, -122.4194)
//!     .with_motion(45.0, 12.5);
//! let message = encode(&vessel, MessageType::PositionScheduled).unwrap();
//! let frame = build_frame(&message);
//! let modulator = GmskModulator::new(GmskConfig::default()).unwrap();
//! let samples = modulator.modulate_frame(&frame);
//! assert_eq!(samples.len(), frame.len() * 8);
//! ```

pub mod ais_decoder;
pub mod ais_encoder;
pub mod ais_message;
mod bits;
pub mod crc;
pub mod frame;
pub mod gmsk_modulator;
pub mod nmea;
pub mod sixbit;
pub mod types;
pub mod vessel;

pub use ais_message::{AisMessage, MessageBody, MessageType};
pub use frame::TransmissionFrame;
pub use types::{AisError, AisResult, Channel, IQSample, IQSample32};
pub use vessel::{NavStatus, VesselClass, VesselState, Waypoint};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ais_decoder::{decode, decode_message, decode_nmea};
    pub use crate::ais_encoder::{encode, encode_with, EncodeOptions};
    pub use crate::ais_message::{AisMessage, CommState, MessageBody, MessageType};
    pub use crate::frame::{build_frame, decode_frame, TransmissionFrame};
    pub use crate::gmsk_modulator::{GmskConfig, GmskDemodulator, GmskModulator};
    pub use crate::nmea::NmeaSentence;
    pub use crate::types::{AisError, AisResult, Channel, IQSample, IQSample32};
    pub use crate::vessel::{NavStatus, StaticData, VesselClass, VesselState, Waypoint};
}
