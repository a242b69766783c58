//! Vessel navigation state
//!
//! [`VesselState`] is the snapshot the codec reads. The route (waypoints and
//! the active index) is kept private so the "index is either unset or points
//! at a real waypoint" invariant cannot be broken from outside; the
//! kinematics code moves along it through [`VesselState::advance_waypoint`].

use serde::{Deserialize, Serialize};

use crate::types::{AisError, AisResult};

/// Maximum number of waypoints in a route
pub const MAX_WAYPOINTS: usize = 20;

/// Default arrival radius in degrees
pub const DEFAULT_ARRIVAL_RADIUS_DEG: f64 = 0.01;

/// Largest MMSI representable as a 9-digit identifier
pub const MAX_MMSI: u32 = 999_999_999;

/// AIS navigational status (ITU-R M.1371-5, table 50)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum NavStatus {
    #[default]
    UnderWayUsingEngine = 0,
    AtAnchor = 1,
    NotUnderCommand = 2,
    RestrictedManoeuvrability = 3,
    ConstrainedByDraught = 4,
    Moored = 5,
    Aground = 6,
    EngagedInFishing = 7,
    UnderWaySailing = 8,
    ReservedHsc = 9,
    ReservedWig = 10,
    PowerDrivenTowingAstern = 11,
    PowerDrivenPushingAhead = 12,
    Reserved13 = 13,
    AisSartActive = 14,
    NotDefined = 15,
}

impl NavStatus {
    /// Map a 4-bit code to a status
    pub fn from_code(code: u8) -> Option<Self> {
        use NavStatus::*;
        let status = match code {
            0 => UnderWayUsingEngine,
            1 => AtAnchor,
            2 => NotUnderCommand,
            3 => RestrictedManoeuvrability,
            4 => ConstrainedByDraught,
            5 => Moored,
            6 => Aground,
            7 => EngagedInFishing,
            8 => UnderWaySailing,
            9 => ReservedHsc,
            10 => ReservedWig,
            11 => PowerDrivenTowingAstern,
            12 => PowerDrivenPushingAhead,
            13 => Reserved13,
            14 => AisSartActive,
            15 => NotDefined,
            _ => return None,
        };
        Some(status)
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Which kind of station a simulated vessel represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VesselClass {
    /// Class A mobile station (position reports 1/2/3, static data 5)
    #[default]
    ClassA,
    /// Class B "CS" mobile station (position report 18)
    ClassB,
    /// Fixed base station (report 4)
    BaseStation,
    /// Aid to navigation (report 21)
    AidToNavigation,
}

/// Electronic position fixing device type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpfdType {
    #[default]
    Undefined = 0,
    Gps = 1,
    Glonass = 2,
    CombinedGpsGlonass = 3,
    LoranC = 4,
    Chayka = 5,
    IntegratedNavigation = 6,
    Surveyed = 7,
    Galileo = 8,
}

impl EpfdType {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => EpfdType::Gps,
            2 => EpfdType::Glonass,
            3 => EpfdType::CombinedGpsGlonass,
            4 => EpfdType::LoranC,
            5 => EpfdType::Chayka,
            6 => EpfdType::IntegratedNavigation,
            7 => EpfdType::Surveyed,
            8 => EpfdType::Galileo,
            _ => EpfdType::Undefined,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// A route point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Ship dimensions relative to the position reference point, in metres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub to_bow: u16,
    pub to_stern: u16,
    pub to_port: u8,
    pub to_starboard: u8,
}

/// Estimated time of arrival (UTC, no year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eta {
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl Default for Eta {
    /// ITU "not available" ETA
    fn default() -> Self {
        Self {
            month: 0,
            day: 0,
            hour: 24,
            minute: 60,
        }
    }
}

/// Static and voyage data carried by message 5 (and partly by 21)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticData {
    pub call_sign: Option<String>,
    pub destination: Option<String>,
    pub imo: Option<u32>,
    pub ship_type: u8,
    pub dimensions: Dimensions,
    /// Draught in metres
    pub draught: f64,
    pub eta: Eta,
    pub epfd: EpfdType,
    /// Aid-to-navigation type (message 21, 0-31)
    pub aid_type: Option<u8>,
}

/// One simulated ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VesselStateFields")]
pub struct VesselState {
    pub mmsi: u32,
    pub name: String,
    pub class: VesselClass,
    /// Decimal degrees, 91.0 = not available
    pub latitude: f64,
    /// Decimal degrees, 181.0 = not available
    pub longitude: f64,
    /// Degrees true, 0-359.9
    pub course_over_ground: f64,
    /// Knots
    pub speed_over_ground: f64,
    pub true_heading: Option<u16>,
    pub nav_status: NavStatus,
    /// Degrees per minute, positive to starboard
    pub rate_of_turn: Option<f64>,
    pub position_accuracy: bool,
    pub waypoint_arrival_radius: f64,
    pub static_data: Option<StaticData>,
    waypoints: Vec<Waypoint>,
    current_waypoint_index: Option<usize>,
}

/// Wire form of [`VesselState`]; the route is checked on the way in
#[derive(Deserialize)]
struct VesselStateFields {
    mmsi: u32,
    name: String,
    class: VesselClass,
    latitude: f64,
    longitude: f64,
    course_over_ground: f64,
    speed_over_ground: f64,
    true_heading: Option<u16>,
    nav_status: NavStatus,
    rate_of_turn: Option<f64>,
    position_accuracy: bool,
    waypoint_arrival_radius: f64,
    static_data: Option<StaticData>,
    #[serde(default)]
    waypoints: Vec<Waypoint>,
    #[serde(default)]
    current_waypoint_index: Option<usize>,
}

impl TryFrom<VesselStateFields> for VesselState {
    type Error = AisError;

    fn try_from(f: VesselStateFields) -> AisResult<Self> {
        let mut vessel = VesselState {
            mmsi: f.mmsi,
            name: f.name,
            class: f.class,
            latitude: f.latitude,
            longitude: f.longitude,
            course_over_ground: f.course_over_ground,
            speed_over_ground: f.speed_over_ground,
            true_heading: f.true_heading,
            nav_status: f.nav_status,
            rate_of_turn: f.rate_of_turn,
            position_accuracy: f.position_accuracy,
            waypoint_arrival_radius: f.waypoint_arrival_radius,
            static_data: f.static_data,
            waypoints: Vec::new(),
            current_waypoint_index: None,
        };
        vessel.set_route(f.waypoints)?;
        match f.current_waypoint_index {
            Some(i) if i >= vessel.waypoints.len() => {
                return Err(AisError::out_of_range("current_waypoint_index", i));
            }
            index => vessel.current_waypoint_index = index,
        }
        Ok(vessel)
    }
}

impl VesselState {
    pub fn new(mmsi: u32, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            mmsi,
            name: name.into(),
            class: VesselClass::ClassA,
            latitude,
            longitude,
            course_over_ground: 0.0,
            speed_over_ground: 0.0,
            true_heading: None,
            nav_status: NavStatus::UnderWayUsingEngine,
            rate_of_turn: None,
            position_accuracy: false,
            waypoint_arrival_radius: DEFAULT_ARRIVAL_RADIUS_DEG,
            static_data: None,
            waypoints: Vec::new(),
            current_waypoint_index: None,
        }
    }

    /// Set course and speed
    pub fn with_motion(mut self, course_deg: f64, speed_knots: f64) -> Self {
        self.course_over_ground = course_deg;
        self.speed_over_ground = speed_knots;
        self
    }

    pub fn with_class(mut self, class: VesselClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_static_data(mut self, data: StaticData) -> Self {
        self.static_data = Some(data);
        self
    }

    /// Replace the route and start navigating toward its first point.
    ///
    /// An empty route stops navigation.
    pub fn set_route(&mut self, waypoints: Vec<Waypoint>) -> AisResult<()> {
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(AisError::out_of_range("waypoints", waypoints.len()));
        }
        for wp in &waypoints {
            if !(-90.0..=90.0).contains(&wp.lat) || !(-180.0..=180.0).contains(&wp.lon) {
                return Err(AisError::out_of_range(
                    "waypoint",
                    format!("({}, {})", wp.lat, wp.lon),
                ));
            }
        }
        self.current_waypoint_index = if waypoints.is_empty() { None } else { Some(0) };
        self.waypoints = waypoints;
        Ok(())
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn current_waypoint_index(&self) -> Option<usize> {
        self.current_waypoint_index
    }

    /// Active waypoint index with −1 meaning "not navigating"
    pub fn waypoint_index(&self) -> i64 {
        self.current_waypoint_index.map_or(-1, |i| i as i64)
    }

    pub fn current_waypoint(&self) -> Option<Waypoint> {
        self.current_waypoint_index
            .and_then(|i| self.waypoints.get(i).copied())
    }

    pub fn is_navigating(&self) -> bool {
        self.current_waypoint_index.is_some()
    }

    /// Move to the next waypoint; navigation ends after the last one.
    pub fn advance_waypoint(&mut self) -> Option<Waypoint> {
        self.current_waypoint_index = match self.current_waypoint_index {
            Some(i) if i + 1 < self.waypoints.len() => Some(i + 1),
            _ => None,
        };
        self.current_waypoint()
    }

    /// Re-arm navigation at the first waypoint
    pub fn restart_route(&mut self) {
        self.current_waypoint_index = if self.waypoints.is_empty() { None } else { Some(0) };
    }

    /// Call sign from static data, if present and non-empty
    pub fn call_sign(&self) -> Option<&str> {
        self.static_data
            .as_ref()
            .and_then(|s| s.call_sign.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Destination from static data, if present and non-empty
    pub fn destination(&self) -> Option<&str> {
        self.static_data
            .as_ref()
            .and_then(|s| s.destination.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Vec<Waypoint> {
        vec![Waypoint::new(39.55, -9.15), Waypoint::new(39.58, -9.12)]
    }

    #[test]
    fn test_route_lifecycle() {
        let mut v = VesselState::new(123456789, "TEST", 39.52, -9.18);
        assert_eq!(v.waypoint_index(), -1);

        v.set_route(route()).unwrap();
        assert_eq!(v.waypoint_index(), 0);
        assert_eq!(v.current_waypoint(), Some(Waypoint::new(39.55, -9.15)));

        assert_eq!(v.advance_waypoint(), Some(Waypoint::new(39.58, -9.12)));
        assert_eq!(v.waypoint_index(), 1);

        // The last waypoint halts navigation instead of wrapping
        assert_eq!(v.advance_waypoint(), None);
        assert_eq!(v.waypoint_index(), -1);
        assert!(!v.is_navigating());

        v.restart_route();
        assert_eq!(v.waypoint_index(), 0);
    }

    #[test]
    fn test_route_limits() {
        let mut v = VesselState::new(1, "X", 0.0, 0.0);
        let too_many = vec![Waypoint::new(0.0, 0.0); MAX_WAYPOINTS + 1];
        assert!(v.set_route(too_many).is_err());
        assert!(v.set_route(vec![Waypoint::new(95.0, 0.0)]).is_err());
        assert!(v.set_route(Vec::new()).is_ok());
        assert_eq!(v.waypoint_index(), -1);
    }

    #[test]
    fn test_nav_status_codes() {
        for code in 0..16u8 {
            assert_eq!(NavStatus::from_code(code).unwrap().code(), code);
        }
        assert!(NavStatus::from_code(16).is_none());
    }

    #[test]
    fn test_static_accessors_ignore_blank() {
        let v = VesselState::new(1, "X", 0.0, 0.0).with_static_data(StaticData {
            call_sign: Some("  ".into()),
            destination: Some("LISBON".into()),
            ..Default::default()
        });
        assert_eq!(v.call_sign(), None);
        assert_eq!(v.destination(), Some("LISBON"));
    }

    #[test]
    fn test_deserialize_checks_route_index() {
        let mut v = VesselState::new(123456789, "TEST", 39.52, -9.18);
        v.set_route(route()).unwrap();
        v.advance_waypoint();
        let json = serde_json::to_string(&v).unwrap();
        let back: VesselState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert_eq!(back.waypoint_index(), 1);

        let past_end = json.replace("\"current_waypoint_index\":1", "\"current_waypoint_index\":5");
        assert_ne!(past_end, json);
        assert!(serde_json::from_str::<VesselState>(&past_end).is_err());

        let finished = json.replace("\"current_waypoint_index\":1", "\"current_waypoint_index\":null");
        let back: VesselState = serde_json::from_str(&finished).unwrap();
        assert_eq!(back.waypoint_index(), -1);
    }
}
