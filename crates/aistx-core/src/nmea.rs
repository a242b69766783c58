//! AIVDM sentence assembly and parsing
//!
//! ```text
//! !AIVDM,1,1,,A,15M67FC000G?ufbE`FepT@3n00Sa,0*5C\r\n
//!  │     │ │ │ │ │                            │  └─ XOR of bytes between '!' and '*'
//!  │     │ │ │ │ │                            └──── fill bits (0-5)
//!  │     │ │ │ │ └───────────────────────────────── 6-bit armored payload
//!  │     │ │ │ └─────────────────────────────────── radio channel (A/B)
//!  │     │ │ └───────────────────────────────────── sequential message id (multi-part only)
//!  │     │ └─────────────────────────────────────── fragment number
//!  │     └───────────────────────────────────────── fragment count
//!  └─────────────────────────────────────────────── talker + sentence type
//! ```

use std::fmt;

use crate::ais_message::ArmoredPayload;
use crate::types::{AisError, AisResult, Channel};

/// Largest payload carried by one fragment, keeping lines under 82 chars
pub const MAX_FRAGMENT_CHARS: usize = 60;

/// XOR checksum of the sentence body (the bytes between `!` and `*`).
pub fn nmea_checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}

/// One `!AIVDM` sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NmeaSentence {
    pub fragment_count: u8,
    pub fragment_number: u8,
    pub sequence_id: Option<u8>,
    pub channel: Channel,
    pub payload: String,
    pub fill: u8,
}

impl NmeaSentence {
    pub fn single(channel: Channel, payload: String, fill: u8) -> Self {
        Self {
            fragment_count: 1,
            fragment_number: 1,
            sequence_id: None,
            channel,
            payload,
            fill,
        }
    }

    /// Split an armored payload into a fragment group.
    ///
    /// Only the last fragment carries the fill count.
    pub fn fragments(channel: Channel, payload: &str, fill: u8, sequence_id: u8) -> Vec<Self> {
        let chunks: Vec<&str> = payload
            .as_bytes()
            .chunks(MAX_FRAGMENT_CHARS)
            .filter_map(|c| std::str::from_utf8(c).ok())
            .collect();
        let count = chunks.len().max(1) as u8;
        if chunks.is_empty() {
            return vec![Self::single(channel, String::new(), fill)];
        }
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let last = i + 1 == count as usize;
                Self {
                    fragment_count: count,
                    fragment_number: i as u8 + 1,
                    sequence_id: if count > 1 { Some(sequence_id % 10) } else { None },
                    channel,
                    payload: chunk.to_string(),
                    fill: if last { fill } else { 0 },
                }
            })
            .collect()
    }

    /// Text between `!` and `*`
    pub fn body(&self) -> String {
        let seq = self.sequence_id.map(|s| s.to_string()).unwrap_or_default();
        format!(
            "AIVDM,{},{},{},{},{},{}",
            self.fragment_count, self.fragment_number, seq, self.channel, self.payload, self.fill
        )
    }

    pub fn checksum(&self) -> u8 {
        nmea_checksum(&self.body())
    }

    /// Sentence with the terminating CR LF
    pub fn to_wire(&self) -> String {
        format!("{self}\r\n")
    }

    /// Parse a `!AIVDM`/`!AIVDO` sentence, verifying its checksum.
    pub fn parse(line: &str) -> AisResult<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let rest = line
            .strip_prefix('!')
            .ok_or_else(|| AisError::InvalidSentence(format!("missing '!': {line}")))?;
        let (body, checksum) = rest
            .split_once('*')
            .ok_or_else(|| AisError::InvalidSentence(format!("missing checksum: {line}")))?;
        let expected = u8::from_str_radix(checksum, 16)
            .map_err(|_| AisError::InvalidSentence(format!("bad checksum field: {checksum}")))?;
        let computed = nmea_checksum(body);
        if expected != computed {
            return Err(AisError::InvalidSentence(format!(
                "checksum mismatch: {expected:02X} != {computed:02X}"
            )));
        }

        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() != 7 {
            return Err(AisError::InvalidSentence(format!(
                "expected 7 fields, got {}",
                fields.len()
            )));
        }
        if fields[0] != "AIVDM" && fields[0] != "AIVDO" {
            return Err(AisError::InvalidSentence(format!("unsupported talker: {}", fields[0])));
        }
        let number = |s: &str, what: &str| {
            s.parse::<u8>()
                .map_err(|_| AisError::InvalidSentence(format!("bad {what}: {s}")))
        };
        let fragment_count = number(fields[1], "fragment count")?;
        let fragment_number = number(fields[2], "fragment number")?;
        let sequence_id = if fields[3].is_empty() {
            None
        } else {
            Some(number(fields[3], "sequence id")?)
        };
        let channel = fields[4]
            .chars()
            .next()
            .and_then(Channel::from_letter)
            .ok_or_else(|| AisError::InvalidSentence(format!("bad channel: {}", fields[4])))?;
        let fill = number(fields[6], "fill")?;
        if fill > 5 {
            return Err(AisError::InvalidSentence(format!("fill out of range: {fill}")));
        }

        Ok(Self {
            fragment_count,
            fragment_number,
            sequence_id,
            channel,
            payload: fields[5].to_string(),
            fill,
        })
    }
}

impl fmt::Display for NmeaSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.body();
        write!(f, "!{}*{:02X}", body, nmea_checksum(&body))
    }
}

/// Join a complete fragment group back into one armored payload.
pub fn reassemble(sentences: &[NmeaSentence]) -> AisResult<ArmoredPayload> {
    let first = sentences
        .first()
        .ok_or_else(|| AisError::InvalidSentence("empty fragment group".to_string()))?;
    let count = first.fragment_count as usize;
    if sentences.len() != count {
        return Err(AisError::InvalidSentence(format!(
            "expected {count} fragments, got {}",
            sentences.len()
        )));
    }
    let mut payload = String::new();
    for (i, s) in sentences.iter().enumerate() {
        if s.fragment_number as usize != i + 1 || s.sequence_id != first.sequence_id {
            return Err(AisError::InvalidSentence(format!(
                "fragment {} out of order",
                s.fragment_number
            )));
        }
        payload.push_str(&s.payload);
    }
    let fill = sentences.last().map_or(0, |s| s.fill);
    Ok(ArmoredPayload { payload, fill })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sentence_checksum() {
        // Widely published sample sentence
        let line = "!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*5C";
        let s = NmeaSentence::parse(line).unwrap();
        assert_eq!(s.channel, Channel::B);
        assert_eq!(s.payload, "177KQJ5000G?tO`K>RA1wUbN0TKH");
        assert_eq!(s.to_string(), line);
    }

    #[test]
    fn test_wire_format() {
        let s = NmeaSentence::single(Channel::A, "15M67FC000G?ufbE`FepT@3n00Sa".into(), 0);
        let wire = s.to_wire();
        assert!(wire.starts_with("!AIVDM,1,1,,A,"));
        assert!(wire.ends_with("\r\n"));
        let star = wire.find('*').unwrap();
        assert_eq!(&wire[star + 3..], "\r\n");
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let line = "!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*00";
        assert!(matches!(
            NmeaSentence::parse(line),
            Err(AisError::InvalidSentence(_))
        ));
    }

    #[test]
    fn test_fragments_reassemble() {
        let payload: String = std::iter::repeat('5').take(71).collect();
        let parts = NmeaSentence::fragments(Channel::A, &payload, 2, 13);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].fill, 0);
        assert_eq!(parts[1].fill, 2);
        assert_eq!(parts[0].sequence_id, Some(3));
        for p in &parts {
            assert!(p.to_wire().len() <= 82);
            assert_eq!(NmeaSentence::parse(&p.to_wire()).unwrap(), *p);
        }
        let joined = reassemble(&parts).unwrap();
        assert_eq!(joined.payload, payload);
        assert_eq!(joined.fill, 2);

        assert!(reassemble(&parts[..1]).is_err());
    }
}
