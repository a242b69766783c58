//! End-to-end runs: fleet → scheduler → codec → frame → GMSK → sink

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use aistx_core::ais_decoder::{body_to_vessel, decode, decode_nmea};
use aistx_core::frame::decode_line_bits;
use aistx_sim::config::SinkConfig;
use aistx_sim::kinematics::Kinematics;
use aistx_sim::prelude::*;
use aistx_sim::sink::BitStreamSink;
use num_complex::Complex64;
use tempfile::TempDir;

fn config() -> AistxConfig {
    let mut cfg = AistxConfig::default();
    cfg.simulation.seed = Some(7);
    cfg
}

fn start(vessels: Vec<VesselState>, sink: Box<dyn Sink>) -> Orchestrator {
    let cfg = config();
    let emitter = Emitter::spawn(sink, &cfg.emission).unwrap();
    let fleet = FleetState::from_vessels(vessels).unwrap();
    Orchestrator::new(fleet, emitter, &cfg).unwrap()
}

fn run_ticks(sim: &mut Orchestrator, n: usize, dt: f64) {
    for _ in 0..n {
        sim.tick(dt).unwrap();
    }
}

fn sea_sprite() -> VesselState {
    VesselState::new(123456789, "SEA SPRITE", 37.7749, -122.4194).with_motion(45.0, 12.5)
}

/// Writer whose buffer outlives the sink that owns it
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_position_report_survives_nmea() {
    let v = sea_sprite();
    let msg = encode(&v, MessageType::PositionScheduled).unwrap();
    let wire = msg.to_nmea(Channel::A).to_wire();

    let decoded = body_to_vessel(&decode_nmea(&[wire.as_str()]).unwrap());
    assert_eq!(decoded.mmsi, 123456789);
    assert!((decoded.course_over_ground - 45.0).abs() <= 0.1);
    assert!((decoded.speed_over_ground - 12.5).abs() <= 0.1);
    assert!((decoded.latitude - 37.7749).abs() < 1e-5);
    assert!((decoded.longitude + 122.4194).abs() < 1e-5);
}

#[test]
fn test_scheduled_report_through_simulator() {
    let sink = VectorSink::new(SinkInput::Iq);
    let mut sim = start(vec![sea_sprite()], Box::new(sink.clone()));
    run_ticks(&mut sim, 60, 1.0);
    let (fleet, _, stats) = sim.shutdown(ShutdownMode::Drain).unwrap();

    assert_eq!(stats.sent, 1);
    assert_eq!(fleet.transmission_count(123456789), 1);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let tx = &records[0];
    assert_eq!(tx.mmsi, 123456789);
    assert_eq!(tx.message_type, MessageType::PositionScheduled);
    assert_eq!(tx.channel, Channel::A);

    let lines: Vec<&str> = tx.nmea.iter().map(String::as_str).collect();
    let decoded = body_to_vessel(&decode_nmea(&lines).unwrap());
    assert!((decoded.course_over_ground - 45.0).abs() <= 0.1);
    assert!((decoded.speed_over_ground - 12.5).abs() <= 0.1);
    // Under a minute at 12.5 kn is well inside 0.01°
    assert!((decoded.latitude - 37.7749).abs() < 0.01);
    assert!((decoded.longitude + 122.4194).abs() < 0.01);
}

#[test]
fn test_iq_burst_demodulates_to_frame() {
    let sink = VectorSink::new(SinkInput::Iq);
    let mut sim = start(vec![sea_sprite()], Box::new(sink.clone()));
    run_ticks(&mut sim, 60, 1.0);
    sim.shutdown(ShutdownMode::Drain).unwrap();

    let tx = &sink.records()[0];
    let burst = tx.iq.as_ref().expect("iq sink gets samples");
    assert_eq!(burst.samples.len(), tx.frame.len() * 8);
    assert_eq!(burst.center_frequency, Channel::A.frequency_hz());

    let samples: Vec<Complex64> = burst
        .samples
        .iter()
        .map(|s| Complex64::new(s.re as f64, s.im as f64))
        .collect();
    let line = GmskDemodulator::new(8).unwrap().demodulate(&samples);
    assert_eq!(line, tx.frame.bits());

    let decoded = decode(&decode_line_bits(&line).unwrap()).unwrap();
    assert_eq!(decoded.mmsi, 123456789);
}

#[test]
fn test_two_vessels_never_share_a_slot() {
    let both = assign_slots(&[111111111, 222222222]).unwrap();
    let a = both.slot_of(111111111).unwrap();
    let b = both.slot_of(222222222).unwrap();
    assert_ne!(a, b);

    // Neither home slot was contested, so removing one leaves the other put
    let alone = assign_slots(&[222222222]).unwrap();
    assert_eq!(alone.slot_of(222222222), Some(b));

    let sink = VectorSink::new(SinkInput::Bits);
    let vessels = vec![
        VesselState::new(111111111, "ALPHA", 51.0, 1.0).with_motion(90.0, 8.0),
        VesselState::new(222222222, "BRAVO", 51.1, 1.1).with_motion(270.0, 8.0),
    ];
    let mut sim = start(vessels, Box::new(sink.clone()));
    run_ticks(&mut sim, 120, 1.0);
    sim.shutdown(ShutdownMode::Drain).unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 4);
    for tx in &records {
        let expected = if tx.mmsi == 111111111 { a } else { b };
        assert_eq!(tx.slot, expected);
    }
    assert!(records.iter().all(|tx| tx.iq.is_none()));
}

#[test]
fn test_route_visits_waypoints_in_order() {
    let fleet_json = r#"[
        {
            "name": "TAGUS PILOT", "mmsi": 263000001,
            "lat": 39.52, "lon": -9.18, "course": 0.0, "speed": 12.0, "status": 0,
            "arrival_radius": 0.01,
            "waypoints": [[39.55, -9.15], [39.58, -9.12]]
        }
    ]"#;
    let mut fleet = FleetState::from_vessels(parse_fleet(fleet_json).unwrap()).unwrap();
    assert_eq!(fleet.get(263000001).unwrap().waypoint_index(), 0);

    let kinematics = Kinematics::default();
    let mut seen = vec![0];
    let mut finished_at = None;
    for _ in 0..400 {
        kinematics.advance_fleet(&mut fleet, 10.0);
        let v = fleet.get(263000001).unwrap();
        let index = v.waypoint_index();
        if *seen.last().unwrap() != index {
            seen.push(index);
            if index == -1 {
                finished_at = Some((v.latitude, v.longitude));
            }
        }
    }
    assert_eq!(seen, vec![0, 1, -1]);

    let (lat, lon) = finished_at.unwrap();
    assert!((lat - 39.58).abs() < 0.02);
    assert!((lon + 9.12).abs() < 0.02);
}

#[test]
fn test_sigmf_recording() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("capture");
    let sink_cfg = SinkConfig {
        kind: SinkKind::Sigmf,
        path: base.to_string_lossy().into_owned(),
        ..SinkConfig::default()
    };
    let sink = build_sink(&sink_cfg, 9600.0 * 8.0).unwrap();
    assert_eq!(sink.input(), SinkInput::Iq);

    let mut sim = start(vec![sea_sprite()], sink);
    run_ticks(&mut sim, 60, 1.0);
    let (_, _, stats) = sim.shutdown(ShutdownMode::Drain).unwrap();
    assert_eq!(stats.sent, 1);

    let data = std::fs::read(base.with_extension("sigmf-data")).unwrap();
    assert!(!data.is_empty());
    assert_eq!(data.len() % 8, 0);

    let meta: serde_json::Value =
        serde_json::from_slice(&std::fs::read(base.with_extension("sigmf-meta")).unwrap())
            .unwrap();
    assert_eq!(meta["global"]["core:datatype"], "cf32_le");
    let annotations = meta["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0]["aistx:mmsi"], 123456789);
    assert_eq!(
        annotations[0]["core:sample_count"].as_u64().unwrap(),
        (data.len() / 8) as u64
    );
}

#[test]
fn test_bit_lines_decode() {
    let buffer = SharedBuffer::default();
    let sink = BitStreamSink::new("buffer", buffer.clone());
    let vessels = vec![
        sea_sprite(),
        VesselState::new(338000001, "HARBOR TUG", 37.80, -122.40).with_motion(180.0, 4.0),
    ];
    let mut sim = start(vessels, Box::new(sink));
    run_ticks(&mut sim, 60, 1.0);
    let (_, _, stats) = sim.shutdown(ShutdownMode::Drain).unwrap();
    assert_eq!(stats.sent, 2);

    let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let mut mmsis: Vec<u32> = text
        .lines()
        .map(|line| {
            let bits: Vec<bool> = line.chars().map(|c| c == '1').collect();
            decode(&decode_line_bits(&bits).unwrap()).unwrap().mmsi
        })
        .collect();
    mmsis.sort_unstable();
    assert_eq!(mmsis, vec![123456789, 338000001]);
}
