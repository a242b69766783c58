//! Fleet state and vessel configuration records
//!
//! Vessel configuration arrives as a JSON array of [`VesselRecord`]s:
//!
//! ```json
//! [
//!   {
//!     "name": "TAGUS PILOT", "mmsi": 263000001,
//!     "lat": 39.52, "lon": -9.18, "course": 45.0, "speed": 12.0, "status": 0,
//!     "waypoints": [[39.55, -9.15], [39.58, -9.12]]
//!   }
//! ]
//! ```
//!
//! Records are checked here, at the boundary, so the rest of the simulator
//! only ever sees in-range [`VesselState`]s.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use aistx_core::sixbit::char_to_sixbit;
use aistx_core::vessel::{
    Dimensions, EpfdType, Eta, NavStatus, StaticData, VesselClass, VesselState, Waypoint,
    DEFAULT_ARRIVAL_RADIUS_DEG, MAX_MMSI, MAX_WAYPOINTS,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ConfigError;
use crate::error::{SimError, SimResult};

/// Text field widths in ITU 6-bit characters
const NAME_CHARS: usize = 20;
const CALL_SIGN_CHARS: usize = 7;
const DESTINATION_CHARS: usize = 20;

/// Text must fit its field and use only the 6-bit alphabet
fn check_text(field: &str, text: &str, max_chars: usize) -> Result<(), String> {
    let text = text.trim_end();
    let len = text.chars().count();
    if len > max_chars {
        return Err(format!("{field} {text:?} is {len} characters, at most {max_chars} fit"));
    }
    match text.chars().find(|&c| char_to_sixbit(c).is_none()) {
        Some(c) => Err(format!("{field} {text:?} contains {c:?}, not in the AIS character set")),
        None => Ok(()),
    }
}

/// One vessel as it appears in the fleet file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselRecord {
    pub name: String,
    pub mmsi: u32,
    pub lat: f64,
    pub lon: f64,
    pub course: f64,
    pub speed: f64,
    pub status: u8,
    /// `[lat, lon]` pairs in visiting order
    #[serde(default)]
    pub waypoints: Vec<[f64; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<u16>,
    /// Degrees per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rot: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_radius: Option<f64>,
    #[serde(default)]
    pub class: VesselClass,
    #[serde(default)]
    pub accuracy: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_sign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imo: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    /// Metres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draught: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<Eta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epfd: Option<EpfdType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid_type: Option<u8>,
}

impl VesselRecord {
    fn has_static_data(&self) -> bool {
        self.call_sign.is_some()
            || self.destination.is_some()
            || self.imo.is_some()
            || self.ship_type.is_some()
            || self.dimensions.is_some()
            || self.draught.is_some()
            || self.eta.is_some()
            || self.epfd.is_some()
            || self.aid_type.is_some()
    }

    /// Validate and convert; `index` is the record's position in the file.
    pub fn into_vessel(self, index: usize) -> Result<VesselState, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidVessel { index, reason };

        if self.mmsi == 0 || self.mmsi > MAX_MMSI {
            return Err(invalid(format!("mmsi {} is not a 9-digit identifier", self.mmsi)));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(invalid(format!("lat {} outside [-90, 90]", self.lat)));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(invalid(format!("lon {} outside [-180, 180]", self.lon)));
        }
        if !(0.0..=360.0).contains(&self.course) {
            return Err(invalid(format!("course {} outside [0, 360]", self.course)));
        }
        if !(0.0..=102.3).contains(&self.speed) {
            return Err(invalid(format!("speed {} outside [0, 102.3]", self.speed)));
        }
        let nav_status = NavStatus::from_code(self.status)
            .ok_or_else(|| invalid(format!("status {} is not 0-15", self.status)))?;
        check_text("name", &self.name, NAME_CHARS).map_err(invalid)?;
        if let Some(call_sign) = &self.call_sign {
            check_text("call_sign", call_sign, CALL_SIGN_CHARS).map_err(invalid)?;
        }
        if let Some(destination) = &self.destination {
            check_text("destination", destination, DESTINATION_CHARS).map_err(invalid)?;
        }
        if let Some(h) = self.heading {
            if h > 359 {
                return Err(invalid(format!("heading {h} outside 0-359")));
            }
        }
        if let Some(rot) = self.rot {
            if !rot.is_finite() {
                return Err(invalid("rot must be finite".into()));
            }
        }
        let arrival_radius = self.arrival_radius.unwrap_or(DEFAULT_ARRIVAL_RADIUS_DEG);
        if !(arrival_radius.is_finite() && arrival_radius > 0.0) {
            return Err(invalid(format!("arrival_radius {arrival_radius} must be positive")));
        }
        if self.waypoints.len() > MAX_WAYPOINTS {
            return Err(invalid(format!(
                "{} waypoints, at most {} allowed",
                self.waypoints.len(),
                MAX_WAYPOINTS
            )));
        }
        if let Some(d) = self.draught {
            if !(0.0..=25.5).contains(&d) {
                return Err(invalid(format!("draught {d} outside [0, 25.5]")));
            }
        }
        if let Some(a) = self.aid_type {
            if a > 31 {
                return Err(invalid(format!("aid_type {a} outside 0-31")));
            }
        }

        let static_data = self.has_static_data().then(|| StaticData {
            call_sign: self.call_sign.clone(),
            destination: self.destination.clone(),
            imo: self.imo,
            ship_type: self.ship_type.unwrap_or(0),
            dimensions: self.dimensions.unwrap_or_default(),
            draught: self.draught.unwrap_or(0.0),
            eta: self.eta.unwrap_or_default(),
            epfd: self.epfd.unwrap_or_default(),
            aid_type: self.aid_type,
        });

        let mut vessel = VesselState::new(self.mmsi, self.name, self.lat, self.lon)
            .with_motion(self.course, self.speed)
            .with_class(self.class);
        vessel.nav_status = nav_status;
        vessel.true_heading = self.heading;
        vessel.rate_of_turn = self.rot;
        vessel.position_accuracy = self.accuracy;
        vessel.waypoint_arrival_radius = arrival_radius;
        vessel.static_data = static_data;
        vessel
            .set_route(
                self.waypoints
                    .iter()
                    .map(|[lat, lon]| Waypoint::new(*lat, *lon))
                    .collect(),
            )
            .map_err(|e| invalid(e.to_string()))?;
        Ok(vessel)
    }

    /// Snapshot of a vessel's current state in file form
    pub fn from_vessel(vessel: &VesselState) -> Self {
        let sd = vessel.static_data.as_ref();
        Self {
            name: vessel.name.clone(),
            mmsi: vessel.mmsi,
            lat: vessel.latitude,
            lon: vessel.longitude,
            course: vessel.course_over_ground,
            speed: vessel.speed_over_ground,
            status: vessel.nav_status.code(),
            waypoints: vessel.waypoints().iter().map(|w| [w.lat, w.lon]).collect(),
            heading: vessel.true_heading,
            rot: vessel.rate_of_turn,
            arrival_radius: Some(vessel.waypoint_arrival_radius),
            class: vessel.class,
            accuracy: vessel.position_accuracy,
            call_sign: sd.and_then(|s| s.call_sign.clone()),
            destination: sd.and_then(|s| s.destination.clone()),
            imo: sd.and_then(|s| s.imo),
            ship_type: sd.map(|s| s.ship_type),
            dimensions: sd.map(|s| s.dimensions),
            draught: sd.map(|s| s.draught),
            eta: sd.map(|s| s.eta),
            epfd: sd.map(|s| s.epfd),
            aid_type: sd.and_then(|s| s.aid_type),
        }
    }
}

/// Parse a JSON fleet description.
pub fn parse_fleet(json: &str) -> Result<Vec<VesselState>, ConfigError> {
    let records: Vec<VesselRecord> =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut vessels = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if !seen.insert(record.mmsi) {
            return Err(ConfigError::InvalidVessel {
                index,
                reason: format!("duplicate mmsi {}", record.mmsi),
            });
        }
        vessels.push(record.into_vessel(index)?);
    }
    Ok(vessels)
}

/// Load a JSON fleet file.
pub fn load_fleet(path: &Path) -> Result<Vec<VesselState>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
    let vessels = parse_fleet(&content)?;
    info!(path = %path.display(), vessels = vessels.len(), "fleet loaded");
    Ok(vessels)
}

/// Render vessels back into fleet-file JSON
pub fn fleet_to_json(vessels: &[VesselState]) -> Result<String, ConfigError> {
    let records: Vec<VesselRecord> = vessels.iter().map(VesselRecord::from_vessel).collect();
    serde_json::to_string_pretty(&records).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Everything the orchestrator mutates between ticks
#[derive(Debug, Clone, Default)]
pub struct FleetState {
    vessels: Vec<VesselState>,
    clock_s: f64,
    frame_start_s: f64,
    transmissions: HashMap<u32, u64>,
    /// Bumped on every membership change
    revision: u64,
}

impl FleetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from vessels in insertion order; MMSIs must be unique.
    pub fn from_vessels(vessels: Vec<VesselState>) -> SimResult<Self> {
        let mut fleet = Self::new();
        for v in vessels {
            fleet.add_vessel(v)?;
        }
        Ok(fleet)
    }

    pub fn add_vessel(&mut self, vessel: VesselState) -> SimResult<()> {
        if self.get(vessel.mmsi).is_some() {
            return Err(SimError::DuplicateMmsi(vessel.mmsi));
        }
        self.vessels.push(vessel);
        self.revision += 1;
        Ok(())
    }

    pub fn remove_vessel(&mut self, mmsi: u32) -> SimResult<VesselState> {
        let pos = self
            .vessels
            .iter()
            .position(|v| v.mmsi == mmsi)
            .ok_or(SimError::UnknownVessel(mmsi))?;
        self.transmissions.remove(&mmsi);
        self.revision += 1;
        Ok(self.vessels.remove(pos))
    }

    pub fn get(&self, mmsi: u32) -> Option<&VesselState> {
        self.vessels.iter().find(|v| v.mmsi == mmsi)
    }

    pub fn get_mut(&mut self, mmsi: u32) -> Option<&mut VesselState> {
        self.vessels.iter_mut().find(|v| v.mmsi == mmsi)
    }

    pub fn vessels(&self) -> &[VesselState] {
        &self.vessels
    }

    pub fn vessels_mut(&mut self) -> &mut [VesselState] {
        &mut self.vessels
    }

    /// MMSIs in insertion order
    pub fn mmsis(&self) -> Vec<u32> {
        self.vessels.iter().map(|v| v.mmsi).collect()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Simulation clock, seconds
    pub fn clock_s(&self) -> f64 {
        self.clock_s
    }

    pub fn advance_clock(&mut self, dt: f64) -> f64 {
        self.clock_s += dt;
        self.clock_s
    }

    /// Start of SOTDMA frame 0 on the simulation clock
    pub fn frame_start_s(&self) -> f64 {
        self.frame_start_s
    }

    pub fn set_frame_start(&mut self, t: f64) {
        self.frame_start_s = t;
    }

    pub fn transmission_count(&self, mmsi: u32) -> u64 {
        self.transmissions.get(&mmsi).copied().unwrap_or(0)
    }

    /// Count one transmission; returns the count before it, starting at 0.
    pub fn record_transmission(&mut self, mmsi: u32) -> u64 {
        let count = self.transmissions.entry(mmsi).or_insert(0);
        let before = *count;
        *count += 1;
        before
    }

    pub fn total_transmissions(&self) -> u64 {
        self.transmissions.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FLEET: &str = r#"[
        {
            "name": "TAGUS PILOT", "mmsi": 263000001,
            "lat": 39.52, "lon": -9.18, "course": 45.0, "speed": 12.0, "status": 0,
            "waypoints": [[39.55, -9.15], [39.58, -9.12]]
        },
        {
            "name": "BELEM", "mmsi": 263000002,
            "lat": 38.69, "lon": -9.21, "course": 270.0, "speed": 8.5, "status": 8,
            "waypoints": [], "heading": 268, "class": "class_a",
            "call_sign": "CSBL", "destination": "FUNCHAL", "imo": 9074729,
            "ship_type": 36, "draught": 4.2,
            "dimensions": {"to_bow": 40, "to_stern": 18, "to_port": 5, "to_starboard": 5}
        },
        {
            "name": "BUOY 7", "mmsi": 992636007,
            "lat": 38.65, "lon": -9.30, "course": 0.0, "speed": 0.0, "status": 15,
            "waypoints": [], "class": "aid_to_navigation", "aid_type": 25
        }
    ]"#;

    #[test]
    fn test_parse_fleet() {
        let fleet = parse_fleet(FLEET).unwrap();
        assert_eq!(fleet.len(), 3);

        let pilot = &fleet[0];
        assert_eq!(pilot.waypoint_index(), 0);
        assert_eq!(pilot.waypoints().len(), 2);
        assert_eq!(pilot.waypoint_arrival_radius, DEFAULT_ARRIVAL_RADIUS_DEG);
        assert!(pilot.static_data.is_none());

        let belem = &fleet[1];
        assert_eq!(belem.nav_status, NavStatus::UnderWaySailing);
        assert_eq!(belem.true_heading, Some(268));
        assert_eq!(belem.call_sign(), Some("CSBL"));
        let sd = belem.static_data.as_ref().unwrap();
        assert_eq!(sd.dimensions.to_bow, 40);
        assert_eq!(sd.draught, 4.2);

        assert_eq!(fleet[2].class, VesselClass::AidToNavigation);
        assert_eq!(fleet[2].static_data.as_ref().unwrap().aid_type, Some(25));
    }

    #[test]
    fn test_invalid_records_name_their_index() {
        let bad_status = r#"[{"name":"A","mmsi":1,"lat":0,"lon":0,"course":0,"speed":0,"status":0},
                             {"name":"B","mmsi":2,"lat":0,"lon":0,"course":0,"speed":0,"status":16}]"#;
        assert!(matches!(
            parse_fleet(bad_status),
            Err(ConfigError::InvalidVessel { index: 1, .. })
        ));

        let bad_lat = r#"[{"name":"A","mmsi":1,"lat":91,"lon":0,"course":0,"speed":0,"status":0}]"#;
        assert!(matches!(parse_fleet(bad_lat), Err(ConfigError::InvalidVessel { index: 0, .. })));

        let dup = r#"[{"name":"A","mmsi":7,"lat":0,"lon":0,"course":0,"speed":0,"status":0},
                      {"name":"B","mmsi":7,"lat":0,"lon":0,"course":0,"speed":0,"status":0}]"#;
        assert!(matches!(parse_fleet(dup), Err(ConfigError::InvalidVessel { index: 1, .. })));

        let missing = r#"[{"name":"A","mmsi":1,"lat":0,"lon":0}]"#;
        assert!(matches!(parse_fleet(missing), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_text_fields_must_fit() {
        let record = |name: &str, call_sign: &str, destination: &str| {
            format!(
                r#"[{{"name":"{name}","mmsi":248000001,"lat":35.9,"lon":14.5,"course":90,
                     "speed":14,"status":0,"call_sign":"{call_sign}","destination":"{destination}"}}]"#
            )
        };
        assert!(parse_fleet(&record("MSC ANNA", "9HA1234", "VALENCIA")).is_ok());
        // Trailing spaces are padding, not content
        assert!(parse_fleet(&record("TWENTY CHARS EXACTLY  ", "9HA1234", "VALENCIA")).is_ok());

        for json in [
            record("MEDITERRANEAN SHIPPING CO", "9HA1234", "VALENCIA"),
            record("MSC ANNA", "9HA12345", "VALENCIA"),
            record("MSC ANNA", "9HA1234", "VALENCIA VIA GIBRALTAR"),
            record("MSC ÅNNA", "9HA1234", "VALENCIA"),
        ] {
            assert!(
                matches!(parse_fleet(&json), Err(ConfigError::InvalidVessel { index: 0, .. })),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn test_bad_waypoint_rejected() {
        let json = r#"[{"name":"A","mmsi":1,"lat":0,"lon":0,"course":0,"speed":5,"status":0,
                        "waypoints":[[0.0, 200.0]]}]"#;
        assert!(matches!(parse_fleet(json), Err(ConfigError::InvalidVessel { index: 0, .. })));
    }

    #[test]
    fn test_snapshot_reloads() {
        let fleet = parse_fleet(FLEET).unwrap();
        let json = fleet_to_json(&fleet).unwrap();
        let again = parse_fleet(&json).unwrap();
        assert_eq!(again, fleet);
    }

    #[test]
    fn test_load_fleet_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fleet.json");
        std::fs::write(&path, FLEET).unwrap();
        assert_eq!(load_fleet(&path).unwrap().len(), 3);
        assert!(matches!(
            load_fleet(&dir.path().join("none.json")),
            Err(ConfigError::ReadError(_))
        ));
    }

    #[test]
    fn test_fleet_membership() {
        let mut fleet = FleetState::from_vessels(parse_fleet(FLEET).unwrap()).unwrap();
        let rev = fleet.revision();
        assert_eq!(fleet.mmsis(), vec![263000001, 263000002, 992636007]);

        let dup = fleet.get(263000001).unwrap().clone();
        assert!(matches!(fleet.add_vessel(dup), Err(SimError::DuplicateMmsi(263000001))));
        assert_eq!(fleet.revision(), rev);

        assert_eq!(fleet.record_transmission(263000002), 0);
        assert_eq!(fleet.record_transmission(263000002), 1);
        assert_eq!(fleet.total_transmissions(), 2);

        let removed = fleet.remove_vessel(263000002).unwrap();
        assert_eq!(removed.name, "BELEM");
        assert_eq!(fleet.transmission_count(263000002), 0);
        assert!(fleet.revision() > rev);
        assert!(matches!(fleet.remove_vessel(1), Err(SimError::UnknownVessel(1))));
    }
}
