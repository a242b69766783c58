//! AIS physical-layer frame builder
//!
//! ```text
//! ┌──────────┬───────┬──────────────────────────┬───────┬────────┐
//! │ training │ start │ stuffed(payload ‖ CRC16) │  end  │ buffer │
//! │ 24 bits  │ 0x7E  │                          │ 0x7E  │ 8 bits │
//! └──────────┴───────┴──────────────────────────┴───────┴────────┘
//!                    └─────── NRZI over the whole frame ────────┘
//! ```
//!
//! Stuffing runs before the flags are attached, so the flags are the only
//! place six consecutive ones appear. NRZI toggles the line on a `1` and
//! holds it on a `0`, starting from a high line.

use crate::ais_message::{AisMessage, MessageType};
use crate::bits::bits_to_uint;
use crate::crc::{crc16_ccitt, crc_bits};
use crate::types::{bits_to_string, AisError, AisResult};

/// Length of the alternating training sequence
pub const TRAINING_BITS: usize = 24;

/// HDLC flag `01111110`
pub const FLAG: [bool; 8] = [false, true, true, true, true, true, true, false];

/// Trailing zero bits after the end flag
pub const BUFFER_BITS: usize = 8;

/// NRZI line state before the first bit
pub const NRZI_INITIAL: bool = true;

/// One framed, NRZI-encoded transmission burst
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionFrame {
    message_type: MessageType,
    mmsi: u32,
    bits: Vec<bool>,
    payload_bits: usize,
    stuffed_bits: usize,
}

impl TransmissionFrame {
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn mmsi(&self) -> u32 {
        self.mmsi
    }

    /// NRZI line bits, ready for the modulator
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Un-framed payload length
    pub fn payload_bits(&self) -> usize {
        self.payload_bits
    }

    /// Zeros inserted by bit stuffing
    pub fn stuffed_bits(&self) -> usize {
        self.stuffed_bits
    }

    /// Burst duration at the given symbol rate
    pub fn duration_s(&self, symbol_rate: f64) -> f64 {
        self.bits.len() as f64 / symbol_rate
    }

    /// Line bits as a `'0'/'1'` string
    pub fn to_bit_string(&self) -> String {
        bits_to_string(&self.bits)
    }
}

/// Wrap a message in training, flags, CRC and stuffing, then NRZI-encode.
pub fn build_frame(message: &AisMessage) -> TransmissionFrame {
    let payload = message.bits();
    let mut data = Vec::with_capacity(payload.len() + 16);
    data.extend_from_slice(payload);
    data.extend_from_slice(&crc_bits(crc16_ccitt(payload)));

    let stuffed = bit_stuff(&data);
    let stuffed_bits = stuffed.len() - data.len();

    let mut raw = Vec::with_capacity(TRAINING_BITS + stuffed.len() + 16 + BUFFER_BITS);
    raw.extend(training_sequence());
    raw.extend_from_slice(&FLAG);
    raw.extend_from_slice(&stuffed);
    raw.extend_from_slice(&FLAG);
    raw.extend(std::iter::repeat(false).take(BUFFER_BITS));

    TransmissionFrame {
        message_type: message.message_type(),
        mmsi: message.mmsi(),
        bits: nrzi_encode(&raw),
        payload_bits: payload.len(),
        stuffed_bits,
    }
}

/// Recover the message bits from a frame, checking its CRC.
pub fn decode_frame(frame: &TransmissionFrame) -> AisResult<Vec<bool>> {
    decode_line_bits(frame.bits())
}

/// Recover message bits from NRZI line bits (e.g. demodulator output).
pub fn decode_line_bits(line: &[bool]) -> AisResult<Vec<bool>> {
    let raw = nrzi_decode(line);
    let header = TRAINING_BITS + FLAG.len();
    if raw.len() < header + FLAG.len() + 16 {
        return Err(AisError::MalformedFrame(format!(
            "{} bits is shorter than an empty frame",
            raw.len()
        )));
    }
    if raw[..TRAINING_BITS].iter().zip(training_sequence()).any(|(a, b)| *a != b) {
        return Err(AisError::MalformedFrame("bad training sequence".into()));
    }
    if raw[TRAINING_BITS..header] != FLAG {
        return Err(AisError::MalformedFrame("missing start flag".into()));
    }

    let data = destuff_until_flag(&raw[header..])?;
    if data.len() < 16 {
        return Err(AisError::MalformedFrame(format!(
            "{} data bits cannot hold a CRC",
            data.len()
        )));
    }
    let (message, fcs) = data.split_at(data.len() - 16);
    let expected = bits_to_uint(fcs, 0, 16) as u16;
    let computed = crc16_ccitt(message);
    if expected != computed {
        return Err(AisError::FrameIntegrityError { expected, computed });
    }
    Ok(message.to_vec())
}

/// Insert a `0` after every run of five `1`s.
pub fn bit_stuff(input: &[bool]) -> Vec<bool> {
    let mut output = Vec::with_capacity(input.len() + input.len() / 5);
    let mut ones = 0;
    for &bit in input {
        output.push(bit);
        if bit {
            ones += 1;
            if ones == 5 {
                output.push(false);
                ones = 0;
            }
        } else {
            ones = 0;
        }
    }
    output
}

/// Remove stuffed zeros, stopping at the end flag.
fn destuff_until_flag(input: &[bool]) -> AisResult<Vec<bool>> {
    let mut output = Vec::with_capacity(input.len());
    let mut ones = 0;
    let mut i = 0;
    while i < input.len() {
        let bit = input[i];
        i += 1;
        if !bit {
            output.push(false);
            ones = 0;
            continue;
        }
        output.push(true);
        ones += 1;
        if ones == 5 {
            match input.get(i) {
                Some(false) => {
                    i += 1;
                    ones = 0;
                }
                Some(true) => {
                    // Leading 0 plus five 1s of the end flag
                    let keep = output.len().saturating_sub(6);
                    output.truncate(keep);
                    return Ok(output);
                }
                None => break,
            }
        }
    }
    Err(AisError::MalformedFrame("missing end flag".into()))
}

/// Toggle on `1`, hold on `0`.
pub fn nrzi_encode(input: &[bool]) -> Vec<bool> {
    let mut level = NRZI_INITIAL;
    input
        .iter()
        .map(|&bit| {
            if bit {
                level = !level;
            }
            level
        })
        .collect()
}

/// Inverse of [`nrzi_encode`].
pub fn nrzi_decode(input: &[bool]) -> Vec<bool> {
    let mut prev = NRZI_INITIAL;
    input
        .iter()
        .map(|&level| {
            let bit = level != prev;
            prev = level;
            bit
        })
        .collect()
}

fn training_sequence() -> impl Iterator<Item = bool> {
    (0..TRAINING_BITS).map(|i| i % 2 == 1)
}
