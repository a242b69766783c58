//! Ship kinematics
//!
//! Dead-reckoning along the course with a flat-earth step, steering toward
//! the active waypoint by its initial great-circle bearing. Distances in
//! nautical miles map to degrees of latitude at 60 nm per degree.

use aistx_core::ais_message::{
    COG_NOT_AVAILABLE, LAT_NOT_AVAILABLE, LON_NOT_AVAILABLE, SOG_NOT_AVAILABLE,
};
use aistx_core::vessel::{VesselState, Waypoint};
use tracing::{debug, info};

use crate::fleet::FleetState;

/// Nautical miles per degree of latitude
pub const NM_PER_DEGREE: f64 = 60.0;

/// Initial great-circle bearing from one point to another, degrees in `[0, 360)`.
pub fn bearing_deg(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
    let (phi1, phi2) = (from_lat.to_radians(), to_lat.to_radians());
    let dlambda = (to_lon - from_lon).to_radians();
    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    normalize_course(y.atan2(x).to_degrees())
}

/// Haversine central angle between two points, in degrees.
pub fn haversine_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = phi2 - phi1;
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    (2.0 * a.sqrt().min(1.0).asin()).to_degrees()
}

/// Fold a course into `[0, 360)`
pub fn normalize_course(deg: f64) -> f64 {
    let c = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if c >= 360.0 {
        0.0
    } else {
        c
    }
}

/// Wrap a longitude into `[-180, 180)`
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

fn point_at(vessel: &mut VesselState, target: Waypoint) {
    let course = bearing_deg(vessel.latitude, vessel.longitude, target.lat, target.lon);
    vessel.course_over_ground = course;
    vessel.true_heading = Some((course.round() as u16) % 360);
}

/// A vessel reporting "not available" for speed or position stays put, as
/// does one drifting without a route on an unavailable course.
fn has_motion_fix(vessel: &VesselState) -> bool {
    vessel.speed_over_ground != SOG_NOT_AVAILABLE
        && vessel.latitude != LAT_NOT_AVAILABLE
        && vessel.longitude != LON_NOT_AVAILABLE
        && (vessel.is_navigating() || vessel.course_over_ground != COG_NOT_AVAILABLE)
}

/// Advance one vessel by `elapsed_s` seconds.
pub fn advance(vessel: &VesselState, elapsed_s: f64) -> VesselState {
    let mut next = vessel.clone();
    advance_in_place(&mut next, elapsed_s);
    next
}

/// In-place form of [`advance`]. Returns true when a waypoint was reached.
pub fn advance_in_place(vessel: &mut VesselState, elapsed_s: f64) -> bool {
    if !(vessel.speed_over_ground > 0.0) || !(elapsed_s > 0.0) || !has_motion_fix(vessel) {
        return false;
    }

    let mut distance_nm = vessel.speed_over_ground * elapsed_s / 3600.0;
    if let Some(target) = vessel.current_waypoint() {
        point_at(vessel, target);
        // Stop on the waypoint rather than sail past it
        let remaining_nm =
            haversine_deg(vessel.latitude, vessel.longitude, target.lat, target.lon) * NM_PER_DEGREE;
        distance_nm = distance_nm.min(remaining_nm);
    }

    let course = vessel.course_over_ground.to_radians();
    let dlat = distance_nm * course.cos() / NM_PER_DEGREE;
    // Guard the pole, where a degree of longitude has no length
    let cos_lat = vessel.latitude.to_radians().cos().max(1e-9);
    let dlon = distance_nm * course.sin() / (NM_PER_DEGREE * cos_lat);

    vessel.latitude = (vessel.latitude + dlat).clamp(-90.0, 90.0);
    vessel.longitude = wrap_longitude(vessel.longitude + dlon);

    let Some(target) = vessel.current_waypoint() else {
        return false;
    };
    let remaining = haversine_deg(vessel.latitude, vessel.longitude, target.lat, target.lon);
    if remaining > vessel.waypoint_arrival_radius {
        return false;
    }

    match vessel.advance_waypoint() {
        Some(next) => {
            debug!(
                mmsi = vessel.mmsi,
                index = vessel.waypoint_index(),
                "waypoint reached, steering to next"
            );
            point_at(vessel, next);
        }
        None => info!(mmsi = vessel.mmsi, "route complete"),
    }
    true
}

/// Steps every vessel of a fleet.
///
/// Long ticks are split into sub-steps of at most `max_step_s` so a vessel
/// cannot sail through a waypoint's arrival circle between two checks.
#[derive(Debug, Clone, Copy)]
pub struct Kinematics {
    pub max_step_s: f64,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self { max_step_s: 10.0 }
    }
}

impl Kinematics {
    pub fn new(max_step_s: f64) -> Self {
        Self { max_step_s }
    }

    /// Advance one vessel, sub-stepping long intervals.
    pub fn step(&self, vessel: &mut VesselState, elapsed_s: f64) -> usize {
        if !(elapsed_s > 0.0) {
            return 0;
        }
        let max = if self.max_step_s > 0.0 { self.max_step_s } else { elapsed_s };
        let steps = (elapsed_s / max).ceil().max(1.0) as usize;
        let dt = elapsed_s / steps as f64;
        let mut arrivals = 0;
        for _ in 0..steps {
            if advance_in_place(vessel, dt) {
                arrivals += 1;
            }
        }
        arrivals
    }

    /// Advance every vessel in the fleet; returns the number of waypoint arrivals.
    pub fn advance_fleet(&self, fleet: &mut FleetState, elapsed_s: f64) -> usize {
        fleet
            .vessels_mut()
            .iter_mut()
            .map(|v| self.step(v, elapsed_s))
            .sum()
    }
}
