//! 6-bit payload armoring and the ITU 6-bit text alphabet
//!
//! Two distinct 6-bit mappings are involved in AIS:
//!
//! - **Armoring** turns the binary payload into printable NMEA characters:
//!   values 0–39 map to `'0'..='W'` (ASCII 48–87) and 40–63 to `'`'..='w'`
//!   (ASCII 96–119).
//! - **Text fields** (names, call signs, destinations) use the ITU table:
//!   values 0–31 are `'@'..='_'` and 32–63 are `' '..='?'`.

use crate::types::{AisError, AisResult};

/// Armor a payload into 6-bit ASCII.
///
/// Returns the armored string and the number of zero fill bits appended to
/// reach a multiple of 6.
pub fn armor_payload(bits: &[bool]) -> (String, u8) {
    let fill = ((6 - bits.len() % 6) % 6) as u8;
    let mut result = String::with_capacity((bits.len() + 5) / 6);
    for chunk in bits.chunks(6) {
        let mut val: u8 = 0;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit {
                val |= 1 << (5 - i);
            }
        }
        result.push(armor_char(val));
    }
    (result, fill)
}

/// Reverse [`armor_payload`], dropping `fill` trailing pad bits.
pub fn dearmor_payload(armored: &str, fill: u8) -> AisResult<Vec<bool>> {
    if fill > 5 {
        return Err(AisError::out_of_range("fill", fill));
    }
    let mut bits = Vec::with_capacity(armored.len() * 6);
    for ch in armored.chars() {
        let val = dearmor_char(ch).ok_or(AisError::InvalidArmor(ch))?;
        for shift in (0..6).rev() {
            bits.push((val >> shift) & 1 == 1);
        }
    }
    let keep = bits.len().saturating_sub(fill as usize);
    bits.truncate(keep);
    Ok(bits)
}

fn armor_char(val: u8) -> char {
    let v = if val > 39 { val + 56 } else { val + 48 };
    v as char
}

fn dearmor_char(ch: char) -> Option<u8> {
    match ch as u32 {
        48..=87 => Some(ch as u8 - 48),
        96..=119 => Some(ch as u8 - 56),
        _ => None,
    }
}

/// Map a character onto the ITU 6-bit text alphabet.
pub fn char_to_sixbit(c: char) -> Option<u8> {
    let c = c.to_ascii_uppercase();
    match c as u32 {
        64..=95 => Some(c as u8 - 64),
        32..=63 => Some(c as u8),
        _ => None,
    }
}

/// Map an ITU 6-bit text value back to its character.
pub fn sixbit_to_char(v: u8) -> char {
    let v = v & 0x3F;
    if v < 32 {
        (v + 64) as char
    } else {
        v as char
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_alphabet_edges() {
        assert_eq!(armor_char(0), '0');
        assert_eq!(armor_char(39), 'W');
        assert_eq!(armor_char(40), '`');
        assert_eq!(armor_char(63), 'w');
        for v in 0..64u8 {
            assert_eq!(dearmor_char(armor_char(v)), Some(v));
        }
        assert_eq!(dearmor_char('X'), None);
        assert_eq!(dearmor_char('x'), None);
    }

    #[test]
    fn test_fill_bits() {
        let (s, fill) = armor_payload(&[true; 8]);
        assert_eq!(s.len(), 2);
        assert_eq!(fill, 4);
        let back = dearmor_payload(&s, fill).unwrap();
        assert_eq!(back, vec![true; 8]);

        let (_, fill) = armor_payload(&[false; 168]);
        assert_eq!(fill, 0);
    }

    #[test]
    fn test_dearmor_rejects_bad_input() {
        assert_eq!(dearmor_payload("1!", 0), Err(AisError::InvalidArmor('!')));
        assert!(dearmor_payload("15", 6).is_err());
    }

    #[test]
    fn test_text_alphabet() {
        assert_eq!(char_to_sixbit('@'), Some(0));
        assert_eq!(char_to_sixbit('A'), Some(1));
        assert_eq!(char_to_sixbit('a'), Some(1));
        assert_eq!(char_to_sixbit(' '), Some(32));
        assert_eq!(char_to_sixbit('?'), Some(63));
        assert_eq!(char_to_sixbit('~'), None);
        for v in 0..64u8 {
            assert_eq!(char_to_sixbit(sixbit_to_char(v)), Some(v));
        }
    }
}
