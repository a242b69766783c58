//! AIS Decoder
//!
//! Reverses [`crate::ais_encoder`]: binary payload → [`MessageBody`] →
//! [`VesselState`]. Used for loopback validation of the transmit chain and
//! for reading back recorded `!AIVDM` sentences.
//!
//! ## Example
//!
//! ```rust
//! use aistx_core::ais_decoder::decode_nmea;
//!
//! let body = decode_nmea(&["!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*5C"]).unwrap();
//! assert_eq!(body.mmsi(), 477553000);
//! ```

use chrono::{TimeZone, Utc};

use crate::ais_encoder::{HEADING_NOT_AVAILABLE, ROT_NOT_AVAILABLE};
use crate::ais_message::{
    AidToNavigationReport, BaseStationReport, ClassBPositionReport, CommState, MessageBody,
    MessageType, PositionReport, StaticVoyageData, COG_NOT_AVAILABLE, LAT_NOT_AVAILABLE,
    LON_NOT_AVAILABLE, SOG_NOT_AVAILABLE,
};
use crate::bits::BitReader;
use crate::nmea::{reassemble, NmeaSentence};
use crate::sixbit::dearmor_payload;
use crate::types::{AisError, AisResult};
use crate::vessel::{
    Dimensions, EpfdType, Eta, NavStatus, StaticData, VesselClass, VesselState,
};

/// Decode a binary payload into its typed form.
pub fn decode_message(bits: &[bool]) -> AisResult<MessageBody> {
    if bits.len() < 6 {
        return Err(AisError::PayloadTooShort {
            expected: 6,
            actual: bits.len(),
        });
    }
    let mut r = BitReader::new(bits);
    let code = r.uint(6) as u8;
    let message_type = MessageType::from_code(code).ok_or(AisError::UnknownMessageType(code))?;
    if bits.len() < message_type.payload_bits() {
        return Err(AisError::PayloadTooShort {
            expected: message_type.payload_bits(),
            actual: bits.len(),
        });
    }
    let repeat = r.uint(2) as u8;
    let mmsi = r.uint(30);

    let body = match message_type {
        MessageType::PositionScheduled
        | MessageType::PositionAssigned
        | MessageType::PositionInterrogated => {
            let nav_status = NavStatus::from_code(r.uint(4) as u8).unwrap_or_default();
            let rate_of_turn = rot_value(r.int(8));
            let speed_over_ground = sog_value(r.uint(10));
            let position_accuracy = r.flag();
            let longitude = r.int(28) as f64 / 600_000.0;
            let latitude = r.int(27) as f64 / 600_000.0;
            let course_over_ground = cog_value(r.uint(12));
            let true_heading = heading_value(r.uint(9));
            let timestamp = r.uint(6) as u8;
            r.skip(5);
            let raim = r.flag();
            let comm_state = CommState::from_bits(r.uint(19));
            MessageBody::Position(PositionReport {
                message_type: code,
                repeat,
                mmsi,
                nav_status,
                rate_of_turn,
                speed_over_ground,
                position_accuracy,
                longitude,
                latitude,
                course_over_ground,
                true_heading,
                timestamp,
                raim,
                comm_state,
            })
        }
        MessageType::BaseStation => {
            let year = r.uint(14) as i32;
            let month = r.uint(4);
            let day = r.uint(5);
            let hour = r.uint(5);
            let minute = r.uint(6);
            let second = r.uint(6);
            let utc = if year == 0 || month == 0 || day == 0 {
                None
            } else {
                Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
                    .single()
            };
            let position_accuracy = r.flag();
            let longitude = r.int(28) as f64 / 600_000.0;
            let latitude = r.int(27) as f64 / 600_000.0;
            let epfd = EpfdType::from_code(r.uint(4) as u8);
            r.skip(10);
            let raim = r.flag();
            let comm_state = CommState::from_bits(r.uint(19));
            MessageBody::BaseStation(BaseStationReport {
                repeat,
                mmsi,
                utc,
                position_accuracy,
                longitude,
                latitude,
                epfd,
                raim,
                comm_state,
            })
        }
        MessageType::StaticVoyage => {
            let ais_version = r.uint(2) as u8;
            let imo = r.uint(30);
            let call_sign = r.text(7);
            let name = r.text(20);
            let ship_type = r.uint(8) as u8;
            let dimensions = read_dimensions(&mut r);
            let epfd = EpfdType::from_code(r.uint(4) as u8);
            let eta = Eta {
                month: r.uint(4) as u8,
                day: r.uint(5) as u8,
                hour: r.uint(5) as u8,
                minute: r.uint(6) as u8,
            };
            let draught = r.uint(8) as f64 / 10.0;
            let destination = r.text(20);
            let dte = r.flag();
            MessageBody::StaticVoyage(StaticVoyageData {
                repeat,
                mmsi,
                ais_version,
                imo,
                call_sign,
                name,
                ship_type,
                dimensions,
                epfd,
                eta,
                draught,
                destination,
                dte,
            })
        }
        MessageType::ClassBPosition => {
            r.skip(8);
            let speed_over_ground = sog_value(r.uint(10));
            let position_accuracy = r.flag();
            let longitude = r.int(28) as f64 / 600_000.0;
            let latitude = r.int(27) as f64 / 600_000.0;
            let course_over_ground = cog_value(r.uint(12));
            let true_heading = heading_value(r.uint(9));
            let timestamp = r.uint(6) as u8;
            r.skip(8);
            let raim = r.flag();
            MessageBody::ClassBPosition(ClassBPositionReport {
                repeat,
                mmsi,
                speed_over_ground,
                position_accuracy,
                longitude,
                latitude,
                course_over_ground,
                true_heading,
                timestamp,
                raim,
            })
        }
        MessageType::AidToNavigation => {
            let aid_type = r.uint(5) as u8;
            let name = r.text(20);
            let position_accuracy = r.flag();
            let longitude = r.int(28) as f64 / 600_000.0;
            let latitude = r.int(27) as f64 / 600_000.0;
            let dimensions = read_dimensions(&mut r);
            let epfd = EpfdType::from_code(r.uint(4) as u8);
            let timestamp = r.uint(6) as u8;
            let off_position = r.flag();
            r.skip(8);
            let raim = r.flag();
            let virtual_aid = r.flag();
            MessageBody::AidToNavigation(AidToNavigationReport {
                repeat,
                mmsi,
                aid_type,
                name,
                position_accuracy,
                longitude,
                latitude,
                dimensions,
                epfd,
                timestamp,
                off_position,
                virtual_aid,
                raim,
            })
        }
    };
    Ok(body)
}

/// Decode a binary payload straight into a vessel snapshot.
///
/// Fields the message does not carry keep their [`VesselState::new`]
/// defaults; "not available" codes become the ITU sentinel values.
pub fn decode(bits: &[bool]) -> AisResult<VesselState> {
    Ok(body_to_vessel(&decode_message(bits)?))
}

/// Decode an armored payload with its fill count.
pub fn decode_armored(payload: &str, fill: u8) -> AisResult<MessageBody> {
    decode_message(&dearmor_payload(payload, fill)?)
}

/// Decode one complete fragment group of `!AIVDM` sentences.
pub fn decode_nmea(lines: &[&str]) -> AisResult<MessageBody> {
    let sentences = lines
        .iter()
        .map(|line| NmeaSentence::parse(line))
        .collect::<AisResult<Vec<_>>>()?;
    let armored = reassemble(&sentences)?;
    decode_armored(&armored.payload, armored.fill)
}

/// Project a typed message onto a vessel snapshot.
pub fn body_to_vessel(body: &MessageBody) -> VesselState {
    match body {
        MessageBody::Position(m) => {
            let mut v = VesselState::new(m.mmsi, "", m.latitude, m.longitude)
                .with_motion(
                    m.course_over_ground.unwrap_or(COG_NOT_AVAILABLE),
                    m.speed_over_ground.unwrap_or(SOG_NOT_AVAILABLE),
                )
                .with_class(VesselClass::ClassA);
            v.nav_status = m.nav_status;
            v.rate_of_turn = m.rate_of_turn;
            v.true_heading = m.true_heading;
            v.position_accuracy = m.position_accuracy;
            v
        }
        MessageBody::BaseStation(m) => {
            let mut v = VesselState::new(m.mmsi, "", m.latitude, m.longitude)
                .with_class(VesselClass::BaseStation)
                .with_static_data(StaticData {
                    epfd: m.epfd,
                    ..Default::default()
                });
            v.position_accuracy = m.position_accuracy;
            v
        }
        MessageBody::StaticVoyage(m) => VesselState::new(
            m.mmsi,
            m.name.clone(),
            LAT_NOT_AVAILABLE,
            LON_NOT_AVAILABLE,
        )
        .with_static_data(StaticData {
            call_sign: Some(m.call_sign.clone()),
            destination: Some(m.destination.clone()),
            imo: (m.imo != 0).then_some(m.imo),
            ship_type: m.ship_type,
            dimensions: m.dimensions,
            draught: m.draught,
            eta: m.eta,
            epfd: m.epfd,
            aid_type: None,
        }),
        MessageBody::ClassBPosition(m) => {
            let mut v = VesselState::new(m.mmsi, "", m.latitude, m.longitude)
                .with_motion(
                    m.course_over_ground.unwrap_or(COG_NOT_AVAILABLE),
                    m.speed_over_ground.unwrap_or(SOG_NOT_AVAILABLE),
                )
                .with_class(VesselClass::ClassB);
            v.true_heading = m.true_heading;
            v.position_accuracy = m.position_accuracy;
            v
        }
        MessageBody::AidToNavigation(m) => {
            let mut v = VesselState::new(m.mmsi, m.name.clone(), m.latitude, m.longitude)
                .with_class(VesselClass::AidToNavigation)
                .with_static_data(StaticData {
                    dimensions: m.dimensions,
                    epfd: m.epfd,
                    aid_type: Some(m.aid_type),
                    ..Default::default()
                });
            v.position_accuracy = m.position_accuracy;
            v
        }
    }
}

fn rot_value(raw: i32) -> Option<f64> {
    if raw == ROT_NOT_AVAILABLE {
        return None;
    }
    let sign = if raw < 0 { -1.0 } else { 1.0 };
    Some(sign * (raw as f64 / 4.733).powi(2))
}

fn sog_value(raw: u32) -> Option<f64> {
    (raw != 1023).then(|| raw as f64 / 10.0)
}

fn cog_value(raw: u32) -> Option<f64> {
    (raw < 3600).then(|| raw as f64 / 10.0)
}

fn heading_value(raw: u32) -> Option<u16> {
    (raw != HEADING_NOT_AVAILABLE && raw < 360).then_some(raw as u16)
}

fn read_dimensions(r: &mut BitReader<'_>) -> Dimensions {
    Dimensions {
        to_bow: r.uint(9) as u16,
        to_stern: r.uint(9) as u16,
        to_port: r.uint(6) as u8,
        to_starboard: r.uint(6) as u8,
    }
}
