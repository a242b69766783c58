//! AIS message model (ITU-R M.1371-5)
//!
//! Messages exist in two forms:
//!
//! - [`MessageBody`]: a tagged union with one struct per supported message
//!   type. Values are in engineering units (degrees, knots) and ITU "not
//!   available" codes are `None`.
//! - [`AisMessage`]: the immutable packed payload, produced by
//!   [`crate::ais_encoder::encode`] and consumed by the frame builder.
//!
//! ## Supported Messages
//! - Type 1/2/3: Position Report (Class A)
//! - Type 4: Base Station Report
//! - Type 5: Static and Voyage Related Data
//! - Type 18: Standard Class B Position Report
//! - Type 21: Aid-to-Navigation Report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nmea::{NmeaSentence, MAX_FRAGMENT_CHARS};
use crate::sixbit::armor_payload;
use crate::types::Channel;
use crate::vessel::{Dimensions, EpfdType, Eta, NavStatus, VesselClass};

/// Latitude sentinel for "not available" (91°)
pub const LAT_NOT_AVAILABLE: f64 = 91.0;
/// Longitude sentinel for "not available" (181°)
pub const LON_NOT_AVAILABLE: f64 = 181.0;
/// Speed sentinel for "not available" (102.3 kn)
pub const SOG_NOT_AVAILABLE: f64 = 102.3;
/// Course sentinel for "not available" (360°)
pub const COG_NOT_AVAILABLE: f64 = 360.0;
/// Time stamp value meaning "not available"
pub const TIMESTAMP_NOT_AVAILABLE: u8 = 60;

/// Supported AIS message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Type 1: scheduled position report
    PositionScheduled,
    /// Type 2: assigned scheduled position report
    PositionAssigned,
    /// Type 3: position report in response to interrogation
    PositionInterrogated,
    /// Type 4
    BaseStation,
    /// Type 5
    StaticVoyage,
    /// Type 18
    ClassBPosition,
    /// Type 21
    AidToNavigation,
}

impl MessageType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MessageType::PositionScheduled),
            2 => Some(MessageType::PositionAssigned),
            3 => Some(MessageType::PositionInterrogated),
            4 => Some(MessageType::BaseStation),
            5 => Some(MessageType::StaticVoyage),
            18 => Some(MessageType::ClassBPosition),
            21 => Some(MessageType::AidToNavigation),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            MessageType::PositionScheduled => 1,
            MessageType::PositionAssigned => 2,
            MessageType::PositionInterrogated => 3,
            MessageType::BaseStation => 4,
            MessageType::StaticVoyage => 5,
            MessageType::ClassBPosition => 18,
            MessageType::AidToNavigation => 21,
        }
    }

    /// Payload length in bits
    pub fn payload_bits(&self) -> usize {
        match self {
            MessageType::StaticVoyage => 424,
            MessageType::AidToNavigation => 272,
            _ => 168,
        }
    }

    /// The periodic position message a station of this class sends
    pub fn position_for(class: VesselClass) -> Self {
        match class {
            VesselClass::ClassA => MessageType::PositionScheduled,
            VesselClass::ClassB => MessageType::ClassBPosition,
            VesselClass::BaseStation => MessageType::BaseStation,
            VesselClass::AidToNavigation => MessageType::AidToNavigation,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type {}", self.code())
    }
}

/// SOTDMA communication state (19 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommState {
    /// 0 = UTC direct, 1 = UTC indirect, 2 = base station, 3 = other station
    pub sync_state: u8,
    /// Frames remaining until the slot is reselected (0-7)
    pub slot_timeout: u8,
    /// Meaning depends on `slot_timeout`
    pub sub_message: u16,
}

impl CommState {
    pub fn sotdma(sync_state: u8, slot_timeout: u8, sub_message: u16) -> Self {
        Self {
            sync_state: sync_state & 0x3,
            slot_timeout: slot_timeout & 0x7,
            sub_message: sub_message & 0x3FFF,
        }
    }

    pub fn to_bits(&self) -> u32 {
        ((self.sync_state as u32 & 0x3) << 17)
            | ((self.slot_timeout as u32 & 0x7) << 14)
            | (self.sub_message as u32 & 0x3FFF)
    }

    pub fn from_bits(raw: u32) -> Self {
        Self {
            sync_state: ((raw >> 17) & 0x3) as u8,
            slot_timeout: ((raw >> 14) & 0x7) as u8,
            sub_message: (raw & 0x3FFF) as u16,
        }
    }
}

/// Types 1, 2 and 3
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub message_type: u8,
    pub repeat: u8,
    pub mmsi: u32,
    pub nav_status: NavStatus,
    /// Degrees per minute
    pub rate_of_turn: Option<f64>,
    pub speed_over_ground: Option<f64>,
    pub position_accuracy: bool,
    pub longitude: f64,
    pub latitude: f64,
    pub course_over_ground: Option<f64>,
    pub true_heading: Option<u16>,
    pub timestamp: u8,
    pub raim: bool,
    pub comm_state: CommState,
}

/// Type 4
#[derive(Debug, Clone, PartialEq)]
pub struct BaseStationReport {
    pub repeat: u8,
    pub mmsi: u32,
    pub utc: Option<DateTime<Utc>>,
    pub position_accuracy: bool,
    pub longitude: f64,
    pub latitude: f64,
    pub epfd: EpfdType,
    pub raim: bool,
    pub comm_state: CommState,
}

/// Type 5
#[derive(Debug, Clone, PartialEq)]
pub struct StaticVoyageData {
    pub repeat: u8,
    pub mmsi: u32,
    pub ais_version: u8,
    pub imo: u32,
    pub call_sign: String,
    pub name: String,
    pub ship_type: u8,
    pub dimensions: Dimensions,
    pub epfd: EpfdType,
    pub eta: Eta,
    /// Metres
    pub draught: f64,
    pub destination: String,
    pub dte: bool,
}

/// Type 18
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBPositionReport {
    pub repeat: u8,
    pub mmsi: u32,
    pub speed_over_ground: Option<f64>,
    pub position_accuracy: bool,
    pub longitude: f64,
    pub latitude: f64,
    pub course_over_ground: Option<f64>,
    pub true_heading: Option<u16>,
    pub timestamp: u8,
    pub raim: bool,
}

/// Type 21
#[derive(Debug, Clone, PartialEq)]
pub struct AidToNavigationReport {
    pub repeat: u8,
    pub mmsi: u32,
    pub aid_type: u8,
    pub name: String,
    pub position_accuracy: bool,
    pub longitude: f64,
    pub latitude: f64,
    pub dimensions: Dimensions,
    pub epfd: EpfdType,
    pub timestamp: u8,
    pub off_position: bool,
    pub virtual_aid: bool,
    pub raim: bool,
}

/// One AIS message in typed form
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Position(PositionReport),
    BaseStation(BaseStationReport),
    StaticVoyage(StaticVoyageData),
    ClassBPosition(ClassBPositionReport),
    AidToNavigation(AidToNavigationReport),
}

impl MessageBody {
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageBody::Position(p) => {
                MessageType::from_code(p.message_type).unwrap_or(MessageType::PositionScheduled)
            }
            MessageBody::BaseStation(_) => MessageType::BaseStation,
            MessageBody::StaticVoyage(_) => MessageType::StaticVoyage,
            MessageBody::ClassBPosition(_) => MessageType::ClassBPosition,
            MessageBody::AidToNavigation(_) => MessageType::AidToNavigation,
        }
    }

    pub fn mmsi(&self) -> u32 {
        match self {
            MessageBody::Position(m) => m.mmsi,
            MessageBody::BaseStation(m) => m.mmsi,
            MessageBody::StaticVoyage(m) => m.mmsi,
            MessageBody::ClassBPosition(m) => m.mmsi,
            MessageBody::AidToNavigation(m) => m.mmsi,
        }
    }
}

/// Armored payload ready for an NMEA sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmoredPayload {
    pub payload: String,
    /// Zero bits appended to reach a multiple of 6 (0-5)
    pub fill: u8,
}

/// Immutable bit-level encoding of one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AisMessage {
    message_type: MessageType,
    mmsi: u32,
    bits: Vec<bool>,
}

impl AisMessage {
    pub(crate) fn new(message_type: MessageType, mmsi: u32, bits: Vec<bool>) -> Self {
        Self {
            message_type,
            mmsi,
            bits,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn mmsi(&self) -> u32 {
        self.mmsi
    }

    /// Raw payload bits, MSB-first per field
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn armored(&self) -> ArmoredPayload {
        let (payload, fill) = armor_payload(&self.bits);
        ArmoredPayload { payload, fill }
    }

    /// Single-sentence `!AIVDM,1,1,,<channel>,...` form
    pub fn to_nmea(&self, channel: Channel) -> NmeaSentence {
        let armored = self.armored();
        NmeaSentence::single(channel, armored.payload, armored.fill)
    }

    /// Sentences split at the NMEA line-length limit.
    ///
    /// Payloads that fit in one sentence produce the single-sentence form;
    /// longer ones (type 5) become a fragment group tagged with `sequence_id`.
    pub fn to_sentences(&self, channel: Channel, sequence_id: u8) -> Vec<NmeaSentence> {
        let armored = self.armored();
        if armored.payload.len() <= MAX_FRAGMENT_CHARS {
            return vec![NmeaSentence::single(channel, armored.payload, armored.fill)];
        }
        NmeaSentence::fragments(channel, &armored.payload, armored.fill, sequence_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_codes() {
        for code in [1u8, 2, 3, 4, 5, 18, 21] {
            assert_eq!(MessageType::from_code(code).unwrap().code(), code);
        }
        assert!(MessageType::from_code(24).is_none());
        assert_eq!(MessageType::StaticVoyage.payload_bits(), 424);
        assert_eq!(
            MessageType::position_for(VesselClass::ClassB),
            MessageType::ClassBPosition
        );
    }

    #[test]
    fn test_comm_state_packing() {
        let cs = CommState::sotdma(0, 6, 1234);
        assert_eq!(CommState::from_bits(cs.to_bits()), cs);
        assert!(cs.to_bits() < (1 << 19));

        // Out-of-range inputs are masked to their field widths
        let cs = CommState::sotdma(7, 9, 0xFFFF);
        assert_eq!(cs.sync_state, 3);
        assert_eq!(cs.slot_timeout, 1);
        assert_eq!(cs.sub_message, 0x3FFF);
    }
}
