//! Core types shared across the AIS transmit chain
//!
//! Complex baseband samples are carried as `f64` pairs inside the DSP code
//! and narrowed to `f32` pairs at the sink boundary, which is the format SDR
//! front-ends and SigMF `cf32_le` recordings expect.
//!
//! ```text
//!   VesselState ──► AisMessage ──► TransmissionFrame ──► Vec<IQSample>
//!     (vessel)      (codec)          (frame)              (gmsk_modulator)
//! ```

use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};

/// A single baseband I/Q sample used inside the modulator
pub type IQSample = Complex64;

/// A single I/Q sample as handed to a transmit sink
pub type IQSample32 = Complex32;

/// Result type for codec, framing and modulation operations
pub type AisResult<T> = Result<T, AisError>;

/// Errors raised by the encode → frame → modulate pipeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AisError {
    #[error("field {field} out of range: {value}")]
    FieldOutOfRange { field: &'static str, value: String },

    #[error("message type {message_type} requires {missing}")]
    UnsupportedMessageType { message_type: u8, missing: &'static str },

    #[error("unknown AIS message type: {0}")]
    UnknownMessageType(u8),

    #[error("payload too short: expected {expected} bits, got {actual}")]
    PayloadTooShort { expected: usize, actual: usize },

    #[error("invalid 6-bit armor character: {0:?}")]
    InvalidArmor(char),

    #[error("invalid NMEA sentence: {0}")]
    InvalidSentence(String),

    #[error("frame CRC mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    FrameIntegrityError { expected: u16, computed: u16 },

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AisError {
    pub(crate) fn out_of_range(field: &'static str, value: impl ToString) -> Self {
        AisError::FieldOutOfRange {
            field,
            value: value.to_string(),
        }
    }
}

/// AIS VHF data link channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Channel {
    /// Channel 87B, 161.975 MHz
    #[default]
    A,
    /// Channel 88B, 162.025 MHz
    B,
}

impl Channel {
    /// Carrier frequency in Hz
    pub fn frequency_hz(&self) -> f64 {
        match self {
            Channel::A => 161_975_000.0,
            Channel::B => 162_025_000.0,
        }
    }

    /// The other channel, used to alternate consecutive transmissions
    pub fn other(&self) -> Self {
        match self {
            Channel::A => Channel::B,
            Channel::B => Channel::A,
        }
    }

    /// Channel letter as it appears in an AIVDM sentence
    pub fn letter(&self) -> char {
        match self {
            Channel::A => 'A',
            Channel::B => 'B',
        }
    }

    /// Parse the channel letter of an AIVDM sentence (`1`/`2` are accepted as aliases)
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'A' | '1' => Some(Channel::A),
            'B' | '2' => Some(Channel::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Render a bit slice as a `'0'/'1'` string
pub fn bits_to_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_frequencies() {
        assert_eq!(Channel::A.frequency_hz(), 161_975_000.0);
        assert_eq!(Channel::B.frequency_hz(), 162_025_000.0);
        assert_eq!(Channel::A.other(), Channel::B);
        assert_eq!(Channel::from_letter('2'), Some(Channel::B));
        assert_eq!(Channel::from_letter('C'), None);
    }

    #[test]
    fn test_bits_to_string() {
        assert_eq!(bits_to_string(&[true, false, true, true]), "1011");
        assert_eq!(bits_to_string(&[]), "");
    }

    #[test]
    fn test_error_display() {
        let err = AisError::out_of_range("latitude", 95.0);
        assert_eq!(err.to_string(), "field latitude out of range: 95");
    }
}
