//! MSB-first bit packing for AIS payload fields

use crate::sixbit::{char_to_sixbit, sixbit_to_char};
use crate::types::{AisError, AisResult};

/// Accumulates fixed-width fields into a payload bit vector.
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    bits: Vec<bool>,
}

impl BitWriter {
    pub(crate) fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits),
        }
    }

    pub(crate) fn push_uint(&mut self, value: u32, width: u8) {
        for i in (0..width).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    /// Two's-complement field
    pub(crate) fn push_int(&mut self, value: i32, width: u8) {
        let mask = if width >= 32 { u32::MAX } else { (1u32 << width) - 1 };
        self.push_uint((value as u32) & mask, width);
    }

    pub(crate) fn push_flag(&mut self, flag: bool) {
        self.bits.push(flag);
    }

    /// 6-bit text padded with `@` to `chars` characters
    pub(crate) fn push_text(&mut self, field: &'static str, text: &str, chars: usize) -> AisResult<()> {
        let upper = text.trim_end().to_ascii_uppercase();
        if upper.chars().count() > chars {
            return Err(AisError::out_of_range(field, text));
        }
        let mut written = 0;
        for c in upper.chars() {
            let v = char_to_sixbit(c).ok_or_else(|| AisError::out_of_range(field, text))?;
            self.push_uint(v as u32, 6);
            written += 1;
        }
        for _ in written..chars {
            self.push_uint(0, 6);
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.bits.len()
    }

    pub(crate) fn finish(self) -> Vec<bool> {
        self.bits
    }
}

/// Sequential field reader over a payload.
#[derive(Debug)]
pub(crate) struct BitReader<'a> {
    bits: &'a [bool],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(bits: &'a [bool]) -> Self {
        Self { bits, pos: 0 }
    }

    pub(crate) fn uint(&mut self, width: usize) -> u32 {
        let v = bits_to_uint(self.bits, self.pos, width);
        self.pos += width;
        v
    }

    pub(crate) fn int(&mut self, width: usize) -> i32 {
        let v = bits_to_int(self.bits, self.pos, width);
        self.pos += width;
        v
    }

    pub(crate) fn flag(&mut self) -> bool {
        self.uint(1) == 1
    }

    pub(crate) fn skip(&mut self, width: usize) {
        self.pos += width;
    }

    /// 6-bit text with trailing `@` padding and spaces removed
    pub(crate) fn text(&mut self, chars: usize) -> String {
        let mut s = String::with_capacity(chars);
        for _ in 0..chars {
            let v = self.uint(6) as u8;
            s.push(sixbit_to_char(v));
        }
        s.trim_end_matches('@').trim_end().to_string()
    }
}

/// Extract an unsigned field; bits past the end read as zero.
pub(crate) fn bits_to_uint(bits: &[bool], start: usize, len: usize) -> u32 {
    let mut val: u32 = 0;
    for i in 0..len {
        if bits.get(start + i).copied().unwrap_or(false) {
            val |= 1 << (len - 1 - i);
        }
    }
    val
}

/// Extract a two's-complement field.
pub(crate) fn bits_to_int(bits: &[bool], start: usize, len: usize) -> i32 {
    let val = bits_to_uint(bits, start, len);
    if len > 0 && len < 32 && (val >> (len - 1)) & 1 == 1 {
        (val | (!0u32 << len)) as i32
    } else {
        val as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_uint_msb_first() {
        let mut w = BitWriter::default();
        w.push_uint(0b101, 3);
        assert_eq!(w.finish(), vec![true, false, true]);
    }

    #[test]
    fn test_signed_fields() {
        let mut w = BitWriter::default();
        w.push_int(-1, 8);
        w.push_int(-73_451_640, 28);
        let bits = w.finish();
        assert_eq!(&bits[..8], &[true; 8]);

        let mut r = BitReader::new(&bits);
        assert_eq!(r.int(8), -1);
        assert_eq!(r.int(28), -73_451_640);
    }

    #[test]
    fn test_text_padding() {
        let mut w = BitWriter::default();
        w.push_text("name", "abc", 5).unwrap();
        assert_eq!(w.len(), 30);
        let bits = w.finish();
        assert_eq!(BitReader::new(&bits).text(5), "ABC");
    }

    #[test]
    fn test_text_rejects_overlong_and_unmapped() {
        let mut w = BitWriter::default();
        assert!(w.push_text("call_sign", "TOOLONGX", 7).is_err());
        assert!(w.push_text("call_sign", "ÅRE", 7).is_err());
    }

    #[test]
    fn test_read_past_end_is_zero() {
        let bits = vec![true, true];
        assert_eq!(bits_to_uint(&bits, 0, 4), 0b1100);
    }
}
