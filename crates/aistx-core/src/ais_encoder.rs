//! # AIS Message Encoder
//!
//! Packs a [`VesselState`] snapshot into an ITU-R M.1371-5 binary payload.
//! Encoding happens in two steps so the typed layer can be inspected and
//! tested on its own:
//!
//! 1. [`build_body`] selects and validates the fields a message type needs
//!    and produces a [`MessageBody`].
//! 2. [`pack`] quantizes the body into MSB-first fields.
//!
//! Out-of-range values are rejected, never clamped. The only saturations are
//! speed (1022 = 102.2 kn or more) and rate of turn (±126).
//!
//! ## Example
//!
//! ```rust
//! use aistx_core::ais_encoder::encode;
//! use aistx_core::ais_message::MessageType;
//! use aistx_core::types::Channel;
//! use aistx_core::vessel::VesselState;
//!
//! let vessel = VesselState::new(123456789, "EVER GIVEN", 37.7749, -122.4194)
//!     .with_motion(45.0, 12.5);
//! let msg = encode(&vessel, MessageType::PositionScheduled).unwrap();
//! assert_eq!(msg.len(), 168);
//! let line = msg.to_nmea(Channel::A).to_string();
//! assert!(line.starts_with("!AIVDM,1,1,,A,1"));
//! ```

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::ais_message::{
    AidToNavigationReport, AisMessage, BaseStationReport, ClassBPositionReport, CommState,
    MessageBody, MessageType, PositionReport, StaticVoyageData, COG_NOT_AVAILABLE,
    LAT_NOT_AVAILABLE, LON_NOT_AVAILABLE, SOG_NOT_AVAILABLE, TIMESTAMP_NOT_AVAILABLE,
};
use crate::bits::BitWriter;
use crate::types::{AisError, AisResult};
use crate::vessel::{Dimensions, Eta, StaticData, VesselState, MAX_MMSI, MAX_WAYPOINTS};

/// Rate-of-turn raw value meaning "no turn information"
pub const ROT_NOT_AVAILABLE: i32 = -128;

/// True heading raw value meaning "not available"
pub const HEADING_NOT_AVAILABLE: u32 = 511;

/// Fixed communication state of a Class B "CS" unit
const CLASS_B_CS_RADIO: u32 = 0b110_0000_0000_0000_0110;

/// Per-transmission context that is not part of the vessel state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    /// Repeat indicator (0-3)
    pub repeat: u8,
    /// UTC second of the position fix (0-59, 60 = not available)
    pub utc_second: u8,
    /// Date and time reported by a base station (type 4)
    pub utc: Option<DateTime<Utc>>,
    /// SOTDMA communication state for types 1/2/3 and 4
    pub comm_state: CommState,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            repeat: 0,
            utc_second: TIMESTAMP_NOT_AVAILABLE,
            utc: None,
            comm_state: CommState::default(),
        }
    }
}

/// Encode a vessel snapshot with default options.
pub fn encode(vessel: &VesselState, message_type: MessageType) -> AisResult<AisMessage> {
    encode_with(vessel, message_type, &EncodeOptions::default())
}

/// Encode a vessel snapshot with explicit per-transmission options.
pub fn encode_with(
    vessel: &VesselState,
    message_type: MessageType,
    options: &EncodeOptions,
) -> AisResult<AisMessage> {
    let body = build_body(vessel, message_type, options)?;
    pack(&body)
}

/// Select the fields `message_type` needs from a vessel snapshot.
///
/// Fails with `UnsupportedMessageType` when a required field is absent and
/// with `FieldOutOfRange` when a value cannot be represented.
pub fn build_body(
    vessel: &VesselState,
    message_type: MessageType,
    options: &EncodeOptions,
) -> AisResult<MessageBody> {
    check_vessel(vessel)?;
    let code = message_type.code();
    let body = match message_type {
        MessageType::PositionScheduled
        | MessageType::PositionAssigned
        | MessageType::PositionInterrogated => MessageBody::Position(PositionReport {
            message_type: code,
            repeat: options.repeat,
            mmsi: vessel.mmsi,
            nav_status: vessel.nav_status,
            rate_of_turn: vessel.rate_of_turn,
            speed_over_ground: speed_field(vessel.speed_over_ground)?,
            position_accuracy: vessel.position_accuracy,
            longitude: vessel.longitude,
            latitude: vessel.latitude,
            course_over_ground: course_field(vessel.course_over_ground)?,
            true_heading: vessel.true_heading,
            timestamp: options.utc_second,
            raim: false,
            comm_state: options.comm_state,
        }),
        MessageType::BaseStation => MessageBody::BaseStation(BaseStationReport {
            repeat: options.repeat,
            mmsi: vessel.mmsi,
            utc: options.utc,
            position_accuracy: vessel.position_accuracy,
            longitude: vessel.longitude,
            latitude: vessel.latitude,
            epfd: vessel.static_data.as_ref().map(|s| s.epfd).unwrap_or_default(),
            raim: false,
            comm_state: options.comm_state,
        }),
        MessageType::StaticVoyage => {
            let name = required_text(Some(vessel.name.as_str()), code, "name")?;
            let call_sign = required_text(vessel.call_sign(), code, "call_sign")?;
            let destination = required_text(vessel.destination(), code, "destination")?;
            let data = vessel.static_data.clone().unwrap_or_default();
            MessageBody::StaticVoyage(StaticVoyageData {
                repeat: options.repeat,
                mmsi: vessel.mmsi,
                ais_version: 0,
                imo: data.imo.unwrap_or(0),
                call_sign,
                name,
                ship_type: data.ship_type,
                dimensions: data.dimensions,
                epfd: data.epfd,
                eta: data.eta,
                draught: data.draught,
                destination,
                dte: false,
            })
        }
        MessageType::ClassBPosition => MessageBody::ClassBPosition(ClassBPositionReport {
            repeat: options.repeat,
            mmsi: vessel.mmsi,
            speed_over_ground: speed_field(vessel.speed_over_ground)?,
            position_accuracy: vessel.position_accuracy,
            longitude: vessel.longitude,
            latitude: vessel.latitude,
            course_over_ground: course_field(vessel.course_over_ground)?,
            true_heading: vessel.true_heading,
            timestamp: options.utc_second,
            raim: false,
        }),
        MessageType::AidToNavigation => {
            let name = required_text(Some(vessel.name.as_str()), code, "name")?;
            let data: Option<&StaticData> = vessel.static_data.as_ref();
            let aid_type = data
                .and_then(|s| s.aid_type)
                .ok_or(AisError::UnsupportedMessageType {
                    message_type: code,
                    missing: "aid_type",
                })?;
            MessageBody::AidToNavigation(AidToNavigationReport {
                repeat: options.repeat,
                mmsi: vessel.mmsi,
                aid_type,
                name,
                position_accuracy: vessel.position_accuracy,
                longitude: vessel.longitude,
                latitude: vessel.latitude,
                dimensions: data.map(|s| s.dimensions).unwrap_or_default(),
                epfd: data.map(|s| s.epfd).unwrap_or_default(),
                timestamp: options.utc_second,
                off_position: false,
                virtual_aid: false,
                raim: false,
            })
        }
    };
    Ok(body)
}

/// Pack a typed message into its payload bits.
pub fn pack(body: &MessageBody) -> AisResult<AisMessage> {
    let message_type = body.message_type();
    let mut w = BitWriter::with_capacity(message_type.payload_bits());
    w.push_uint(message_type.code() as u32, 6);

    match body {
        MessageBody::Position(m) => {
            w.push_uint(repeat_field(m.repeat)?, 2);
            w.push_uint(mmsi_field(m.mmsi)?, 30);
            w.push_uint(m.nav_status.code() as u32, 4);
            w.push_int(quantize_rot(m.rate_of_turn)?, 8);
            w.push_uint(quantize_sog(m.speed_over_ground)?, 10);
            w.push_flag(m.position_accuracy);
            w.push_int(quantize_longitude(m.longitude)?, 28);
            w.push_int(quantize_latitude(m.latitude)?, 27);
            w.push_uint(quantize_cog(m.course_over_ground)?, 12);
            w.push_uint(heading_field(m.true_heading)?, 9);
            w.push_uint(timestamp_field(m.timestamp)?, 6);
            w.push_uint(0, 2); // manoeuvre indicator
            w.push_uint(0, 3); // spare
            w.push_flag(m.raim);
            w.push_uint(m.comm_state.to_bits(), 19);
        }
        MessageBody::BaseStation(m) => {
            w.push_uint(repeat_field(m.repeat)?, 2);
            w.push_uint(mmsi_field(m.mmsi)?, 30);
            match m.utc {
                Some(t) => {
                    if t.year() > 9999 || t.year() < 1 {
                        return Err(AisError::out_of_range("utc", t));
                    }
                    w.push_uint(t.year() as u32, 14);
                    w.push_uint(t.month(), 4);
                    w.push_uint(t.day(), 5);
                    w.push_uint(t.hour(), 5);
                    w.push_uint(t.minute(), 6);
                    w.push_uint(t.second().min(59), 6);
                }
                None => {
                    w.push_uint(0, 14);
                    w.push_uint(0, 4);
                    w.push_uint(0, 5);
                    w.push_uint(24, 5);
                    w.push_uint(60, 6);
                    w.push_uint(60, 6);
                }
            }
            w.push_flag(m.position_accuracy);
            w.push_int(quantize_longitude(m.longitude)?, 28);
            w.push_int(quantize_latitude(m.latitude)?, 27);
            w.push_uint(m.epfd.code() as u32, 4);
            w.push_uint(0, 10);
            w.push_flag(m.raim);
            w.push_uint(m.comm_state.to_bits(), 19);
        }
        MessageBody::StaticVoyage(m) => {
            w.push_uint(repeat_field(m.repeat)?, 2);
            w.push_uint(mmsi_field(m.mmsi)?, 30);
            if m.ais_version > 3 {
                return Err(AisError::out_of_range("ais_version", m.ais_version));
            }
            w.push_uint(m.ais_version as u32, 2);
            if m.imo > (1 << 30) - 1 {
                return Err(AisError::out_of_range("imo", m.imo));
            }
            w.push_uint(m.imo, 30);
            w.push_text("call_sign", &m.call_sign, 7)?;
            w.push_text("name", &m.name, 20)?;
            w.push_uint(m.ship_type as u32, 8);
            push_dimensions(&mut w, &m.dimensions)?;
            w.push_uint(m.epfd.code() as u32, 4);
            push_eta(&mut w, &m.eta)?;
            w.push_uint(quantize_draught(m.draught)?, 8);
            w.push_text("destination", &m.destination, 20)?;
            w.push_flag(m.dte);
            w.push_uint(0, 1);
        }
        MessageBody::ClassBPosition(m) => {
            w.push_uint(repeat_field(m.repeat)?, 2);
            w.push_uint(mmsi_field(m.mmsi)?, 30);
            w.push_uint(0, 8); // regional reserved
            w.push_uint(quantize_sog(m.speed_over_ground)?, 10);
            w.push_flag(m.position_accuracy);
            w.push_int(quantize_longitude(m.longitude)?, 28);
            w.push_int(quantize_latitude(m.latitude)?, 27);
            w.push_uint(quantize_cog(m.course_over_ground)?, 12);
            w.push_uint(heading_field(m.true_heading)?, 9);
            w.push_uint(timestamp_field(m.timestamp)?, 6);
            w.push_uint(0, 2); // regional reserved
            w.push_flag(true); // CS unit
            w.push_flag(false); // no display
            w.push_flag(false); // no DSC
            w.push_flag(true); // whole marine band
            w.push_flag(false); // no message 22
            w.push_flag(false); // autonomous mode
            w.push_flag(m.raim);
            w.push_flag(true); // ITDMA selector
            w.push_uint(CLASS_B_CS_RADIO, 19);
        }
        MessageBody::AidToNavigation(m) => {
            w.push_uint(repeat_field(m.repeat)?, 2);
            w.push_uint(mmsi_field(m.mmsi)?, 30);
            if m.aid_type > 31 {
                return Err(AisError::out_of_range("aid_type", m.aid_type));
            }
            w.push_uint(m.aid_type as u32, 5);
            w.push_text("name", &m.name, 20)?;
            w.push_flag(m.position_accuracy);
            w.push_int(quantize_longitude(m.longitude)?, 28);
            w.push_int(quantize_latitude(m.latitude)?, 27);
            push_dimensions(&mut w, &m.dimensions)?;
            w.push_uint(m.epfd.code() as u32, 4);
            w.push_uint(timestamp_field(m.timestamp)?, 6);
            w.push_flag(m.off_position);
            w.push_uint(0, 8); // regional reserved
            w.push_flag(m.raim);
            w.push_flag(m.virtual_aid);
            w.push_flag(false); // autonomous mode
            w.push_uint(0, 1);
        }
    }

    debug_assert_eq!(w.len(), message_type.payload_bits());
    Ok(AisMessage::new(message_type, body.mmsi(), w.finish()))
}

fn check_vessel(vessel: &VesselState) -> AisResult<()> {
    mmsi_field(vessel.mmsi)?;
    if vessel.waypoints().len() > MAX_WAYPOINTS {
        return Err(AisError::out_of_range("waypoints", vessel.waypoints().len()));
    }
    if let Some(rot) = vessel.rate_of_turn {
        if !rot.is_finite() {
            return Err(AisError::out_of_range("rate_of_turn", rot));
        }
    }
    Ok(())
}

fn required_text(value: Option<&str>, message_type: u8, field: &'static str) -> AisResult<String> {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(AisError::UnsupportedMessageType {
            message_type,
            missing: field,
        }),
    }
}

/// 102.3 is the vessel-side "not available" value
fn speed_field(speed: f64) -> AisResult<Option<f64>> {
    if !speed.is_finite() || speed < 0.0 {
        return Err(AisError::out_of_range("speed_over_ground", speed));
    }
    if speed == SOG_NOT_AVAILABLE {
        Ok(None)
    } else {
        Ok(Some(speed))
    }
}

/// 360.0 is the vessel-side "not available" value; anything else wraps
fn course_field(course: f64) -> AisResult<Option<f64>> {
    if !course.is_finite() {
        return Err(AisError::out_of_range("course_over_ground", course));
    }
    if course == COG_NOT_AVAILABLE {
        Ok(None)
    } else {
        Ok(Some(course.rem_euclid(360.0)))
    }
}

fn repeat_field(repeat: u8) -> AisResult<u32> {
    if repeat > 3 {
        return Err(AisError::out_of_range("repeat", repeat));
    }
    Ok(repeat as u32)
}

fn mmsi_field(mmsi: u32) -> AisResult<u32> {
    if mmsi > MAX_MMSI {
        return Err(AisError::out_of_range("mmsi", mmsi));
    }
    Ok(mmsi)
}

fn heading_field(heading: Option<u16>) -> AisResult<u32> {
    match heading {
        None => Ok(HEADING_NOT_AVAILABLE),
        Some(h) if h <= 359 => Ok(h as u32),
        Some(h) => Err(AisError::out_of_range("true_heading", h)),
    }
}

fn timestamp_field(ts: u8) -> AisResult<u32> {
    if ts > 63 {
        return Err(AisError::out_of_range("timestamp", ts));
    }
    Ok(ts as u32)
}

/// Latitude in 1/10000 minute; 91° is the "not available" sentinel.
pub fn quantize_latitude(lat: f64) -> AisResult<i32> {
    if !lat.is_finite() || (!(-90.0..=90.0).contains(&lat) && lat != LAT_NOT_AVAILABLE) {
        return Err(AisError::out_of_range("latitude", lat));
    }
    Ok((lat * 600_000.0).round() as i32)
}

/// Longitude in 1/10000 minute; 181° is the "not available" sentinel.
pub fn quantize_longitude(lon: f64) -> AisResult<i32> {
    if !lon.is_finite() || (!(-180.0..=180.0).contains(&lon) && lon != LON_NOT_AVAILABLE) {
        return Err(AisError::out_of_range("longitude", lon));
    }
    Ok((lon * 600_000.0).round() as i32)
}

/// Speed in 0.1 kn, saturating at 1022
pub fn quantize_sog(sog: Option<f64>) -> AisResult<u32> {
    match sog {
        None => Ok(1023),
        Some(v) if !v.is_finite() || v < 0.0 => Err(AisError::out_of_range("speed_over_ground", v)),
        Some(v) => Ok(((v * 10.0).round() as u32).min(1022)),
    }
}

/// Course in 0.1°, 3600 = not available
pub fn quantize_cog(cog: Option<f64>) -> AisResult<u32> {
    match cog {
        None => Ok(3600),
        Some(v) if !v.is_finite() => Err(AisError::out_of_range("course_over_ground", v)),
        Some(v) => Ok(((v.rem_euclid(360.0) * 10.0).round() as u32) % 3600),
    }
}

/// ROT_AIS = 4.733·√|rot|, signed, saturating at ±126
pub fn quantize_rot(rot: Option<f64>) -> AisResult<i32> {
    match rot {
        None => Ok(ROT_NOT_AVAILABLE),
        Some(r) if !r.is_finite() => Err(AisError::out_of_range("rate_of_turn", r)),
        Some(r) => {
            let raw = (4.733 * r.abs().sqrt()).round().min(126.0) as i32;
            Ok(if r < 0.0 { -raw } else { raw })
        }
    }
}

fn quantize_draught(draught: f64) -> AisResult<u32> {
    if !draught.is_finite() || !(0.0..=25.5).contains(&draught) {
        return Err(AisError::out_of_range("draught", draught));
    }
    Ok((draught * 10.0).round() as u32)
}

fn push_dimensions(w: &mut BitWriter, d: &Dimensions) -> AisResult<()> {
    if d.to_bow > 511 || d.to_stern > 511 || d.to_port > 63 || d.to_starboard > 63 {
        return Err(AisError::out_of_range("dimensions", format!("{d:?}")));
    }
    w.push_uint(d.to_bow as u32, 9);
    w.push_uint(d.to_stern as u32, 9);
    w.push_uint(d.to_port as u32, 6);
    w.push_uint(d.to_starboard as u32, 6);
    Ok(())
}

fn push_eta(w: &mut BitWriter, eta: &Eta) -> AisResult<()> {
    if eta.month > 12 || eta.day > 31 || eta.hour > 24 || eta.minute > 60 {
        return Err(AisError::out_of_range("eta", format!("{eta:?}")));
    }
    w.push_uint(eta.month as u32, 4);
    w.push_uint(eta.day as u32, 5);
    w.push_uint(eta.hour as u32, 5);
    w.push_uint(eta.minute as u32, 6);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::bits_to_uint;
    use crate::types::Channel;
    use crate::vessel::{VesselClass, Waypoint};
    use chrono::TimeZone;

    fn vessel() -> VesselState {
        VesselState::new(123456789, "PACIFIC TRADER", 37.7749, -122.4194).with_motion(45.0, 12.5)
    }

    fn voyage() -> StaticData {
        StaticData {
            call_sign: Some("WDC1234".into()),
            destination: Some("OAKLAND".into()),
            imo: Some(9_123_456),
            ship_type: 70,
            dimensions: Dimensions {
                to_bow: 150,
                to_stern: 40,
                to_port: 12,
                to_starboard: 14,
            },
            draught: 9.8,
            ..Default::default()
        }
    }

    #[test]
    fn test_type1_field_offsets() {
        let msg = encode(&vessel(), MessageType::PositionScheduled).unwrap();
        let bits = msg.bits();
        assert_eq!(bits.len(), 168);
        assert_eq!(bits_to_uint(bits, 0, 6), 1);
        assert_eq!(bits_to_uint(bits, 8, 30), 123456789);
        assert_eq!(bits_to_uint(bits, 42, 8), 0x80, "ROT not available");
        assert_eq!(bits_to_uint(bits, 50, 10), 125);
        assert_eq!(bits_to_uint(bits, 116, 12), 450);
        assert_eq!(bits_to_uint(bits, 128, 9), 511);
        assert_eq!(bits_to_uint(bits, 137, 6), 60);
    }

    #[test]
    fn test_unavailable_position_sentinels() {
        assert_eq!(quantize_longitude(LON_NOT_AVAILABLE).unwrap(), 0x6791AC0);
        assert_eq!(quantize_latitude(LAT_NOT_AVAILABLE).unwrap(), 0x3412140);
        assert!(quantize_latitude(90.5).is_err());
        assert!(quantize_longitude(-180.5).is_err());
        assert!(quantize_latitude(f64::NAN).is_err());
    }

    #[test]
    fn test_speed_and_course_saturation() {
        assert_eq!(quantize_sog(Some(150.0)).unwrap(), 1022);
        assert_eq!(quantize_sog(None).unwrap(), 1023);
        assert!(quantize_sog(Some(-1.0)).is_err());
        assert_eq!(quantize_cog(Some(360.0)).unwrap(), 0);
        assert_eq!(quantize_cog(Some(359.96)).unwrap(), 0);
        assert_eq!(quantize_cog(Some(-90.0)).unwrap(), 2700);
        assert_eq!(quantize_cog(None).unwrap(), 3600);

        let mut v = vessel();
        v.speed_over_ground = SOG_NOT_AVAILABLE;
        let msg = encode(&v, MessageType::PositionScheduled).unwrap();
        assert_eq!(bits_to_uint(msg.bits(), 50, 10), 1023);
    }

    #[test]
    fn test_course_sentinel_survives_decode() {
        let mut v = vessel();
        v.course_over_ground = COG_NOT_AVAILABLE;
        let msg = encode(&v, MessageType::PositionScheduled).unwrap();
        assert_eq!(bits_to_uint(msg.bits(), 116, 12), 3600);

        let back = crate::ais_decoder::decode(msg.bits()).unwrap();
        assert_eq!(back.course_over_ground, COG_NOT_AVAILABLE);
        let again = encode(&back, MessageType::PositionScheduled).unwrap();
        assert_eq!(bits_to_uint(again.bits(), 116, 12), 3600);

        v.course_over_ground = 720.0;
        let msg = encode(&v, MessageType::PositionScheduled).unwrap();
        assert_eq!(bits_to_uint(msg.bits(), 116, 12), 0, "whole turns wrap to north");
    }

    #[test]
    fn test_rate_of_turn_quantization() {
        assert_eq!(quantize_rot(Some(0.0)).unwrap(), 0);
        assert_eq!(quantize_rot(Some(10.0)).unwrap(), 15);
        assert_eq!(quantize_rot(Some(-10.0)).unwrap(), -15);
        assert_eq!(quantize_rot(Some(10_000.0)).unwrap(), 126);
        assert_eq!(quantize_rot(None).unwrap(), -128);
    }

    #[test]
    fn test_out_of_range_rejected_not_clamped() {
        let mut v = vessel();
        v.latitude = 95.0;
        assert!(matches!(
            encode(&v, MessageType::PositionScheduled),
            Err(AisError::FieldOutOfRange { field: "latitude", .. })
        ));

        let mut v = vessel();
        v.mmsi = 1_000_000_000;
        assert!(encode(&v, MessageType::PositionScheduled).is_err());

        let mut v = vessel();
        v.true_heading = Some(360);
        assert!(encode(&v, MessageType::PositionScheduled).is_err());

        let mut v = vessel();
        v.speed_over_ground = -0.5;
        assert!(encode(&v, MessageType::PositionScheduled).is_err());
    }

    #[test]
    fn test_type5_requires_voyage_text() {
        let err = encode(&vessel(), MessageType::StaticVoyage).unwrap_err();
        assert_eq!(
            err,
            AisError::UnsupportedMessageType {
                message_type: 5,
                missing: "call_sign"
            }
        );

        let mut unnamed = vessel().with_static_data(voyage());
        unnamed.name = String::new();
        assert!(matches!(
            encode(&unnamed, MessageType::StaticVoyage),
            Err(AisError::UnsupportedMessageType { missing: "name", .. })
        ));

        let msg = encode(&vessel().with_static_data(voyage()), MessageType::StaticVoyage).unwrap();
        assert_eq!(msg.len(), 424);
        let sentences = msg.to_sentences(Channel::A, 1);
        assert_eq!(sentences.len(), 2);
        assert_eq!(msg.armored().fill, 2);
    }

    #[test]
    fn test_overlong_name_rejected() {
        let mut v = vessel().with_static_data(voyage());
        v.name = "A NAME THAT IS WAY TOO LONG".into();
        assert!(matches!(
            encode(&v, MessageType::StaticVoyage),
            Err(AisError::FieldOutOfRange { field: "name", .. })
        ));
    }

    #[test]
    fn test_base_station_utc() {
        let v = vessel().with_class(VesselClass::BaseStation);
        let opts = EncodeOptions {
            utc: Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 15).unwrap()),
            ..Default::default()
        };
        let msg = encode_with(&v, MessageType::BaseStation, &opts).unwrap();
        let bits = msg.bits();
        assert_eq!(bits_to_uint(bits, 38, 14), 2024);
        assert_eq!(bits_to_uint(bits, 52, 4), 6);
        assert_eq!(bits_to_uint(bits, 66, 6), 30);

        let msg = encode(&v, MessageType::BaseStation).unwrap();
        assert_eq!(bits_to_uint(msg.bits(), 61, 5), 24);
    }

    #[test]
    fn test_class_b_and_aton_lengths() {
        let msg = encode(&vessel(), MessageType::ClassBPosition).unwrap();
        assert_eq!(msg.len(), 168);
        assert_eq!(bits_to_uint(msg.bits(), 0, 6), 18);
        assert_eq!(bits_to_uint(msg.bits(), 141, 1), 1, "CS flag");

        assert!(encode(&vessel(), MessageType::AidToNavigation).is_err());
        let aton = vessel().with_static_data(StaticData {
            aid_type: Some(13),
            ..Default::default()
        });
        let msg = encode(&aton, MessageType::AidToNavigation).unwrap();
        assert_eq!(msg.len(), 272);
        assert_eq!(bits_to_uint(msg.bits(), 38, 5), 13);
    }

    #[test]
    fn test_comm_state_written() {
        let opts = EncodeOptions {
            comm_state: CommState::sotdma(0, 3, 17),
            ..Default::default()
        };
        let msg = encode_with(&vessel(), MessageType::PositionScheduled, &opts).unwrap();
        assert_eq!(bits_to_uint(msg.bits(), 149, 19), opts.comm_state.to_bits());
    }

    #[test]
    fn test_route_does_not_affect_encoding() {
        let mut v = vessel();
        let plain = encode(&v, MessageType::PositionScheduled).unwrap();
        v.set_route(vec![Waypoint::new(38.0, -122.0)]).unwrap();
        let routed = encode(&v, MessageType::PositionScheduled).unwrap();
        assert_eq!(plain, routed);
    }
}
