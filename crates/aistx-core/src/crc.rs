//! CRC-16/CCITT over bit sequences
//!
//! Non-reflected form: polynomial 0x1021, initial value 0xFFFF, input bits
//! consumed MSB-first, no final XOR.

/// CRC-16/CCITT generator polynomial
pub const CRC16_CCITT_POLY: u16 = 0x1021;

/// CRC-16/CCITT initial register value
pub const CRC16_INIT: u16 = 0xFFFF;

/// Compute the frame check sequence over a slice of bits.
pub fn crc16_ccitt(bits: &[bool]) -> u16 {
    let mut crc = CRC16_INIT;
    for &bit in bits {
        let feedback = ((crc >> 15) & 1 == 1) ^ bit;
        crc <<= 1;
        if feedback {
            crc ^= CRC16_CCITT_POLY;
        }
    }
    crc
}

/// Expand a CRC into 16 bits, MSB first.
pub fn crc_bits(crc: u16) -> [bool; 16] {
    let mut out = [false; 16];
    for (i, bit) in out.iter_mut().enumerate() {
        *bit = (crc >> (15 - i)) & 1 == 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_bits(data: &[u8]) -> Vec<bool> {
        data.iter()
            .flat_map(|&b| (0..8).rev().map(move |i| (b >> i) & 1 == 1))
            .collect()
    }

    #[test]
    fn test_check_value() {
        // CRC-16/CCITT-FALSE check value for "123456789"
        assert_eq!(crc16_ccitt(&byte_bits(b"123456789")), 0x29B1);
    }

    #[test]
    fn test_empty_input_is_init() {
        assert_eq!(crc16_ccitt(&[]), CRC16_INIT);
    }

    #[test]
    fn test_appended_crc_leaves_zero_remainder() {
        let mut bits = byte_bits(b"AIS");
        bits.extend_from_slice(&crc_bits(crc16_ccitt(&bits)));
        assert_eq!(crc16_ccitt(&bits), 0);
    }
}
