//! Transmission orchestrator
//!
//! Owns the fleet, the slot scheduler, the modulator and the emitter. One
//! tick:
//!
//! ```text
//! advance vessels → reassign slots if the fleet changed → slots_due
//!   → per due vessel: encode → frame → (modulate) → queue
//! ```
//!
//! A vessel whose pipeline fails is skipped for the tick with a warning
//! naming it and the failing stage; the other due vessels still go out.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use aistx_core::ais_encoder::{encode_with, EncodeOptions};
use aistx_core::ais_message::{AisMessage, CommState, MessageType};
use aistx_core::frame::build_frame;
use aistx_core::gmsk_modulator::GmskModulator;
use aistx_core::types::{Channel, IQSample32};
use aistx_core::vessel::{VesselClass, VesselState};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Timelike, Utc};
use tracing::{debug, error, info, warn};

use crate::config::{AistxConfig, ConfigError};
use crate::emitter::{Emitter, EmitterStats, ShutdownMode};
use crate::error::{SimError, SimResult};
use crate::fleet::FleetState;
use crate::kinematics::Kinematics;
use crate::scheduler::{SlotScheduler, SLOTS_PER_FRAME};
use crate::sink::{IqBurst, Sink, SinkError, SinkInput, Transmission};

/// Simulated UTC for seeded runs starts from 2024-01-01T00:00:00Z
const SEEDED_EPOCH_S: i64 = 1_704_067_200;

/// Pipeline stage that can fail, for log records.
///
/// Framing and modulation cannot fail once a message has encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Encode,
    /// The emitter's worker is no longer running
    Emit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Encode => "encode",
            Stage::Emit => "emit",
        };
        f.write_str(s)
    }
}

/// A message skipped during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub mmsi: u32,
    /// `None` when the whole vessel was skipped
    pub message_type: Option<MessageType>,
    pub stage: Stage,
    pub reason: String,
}

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub time_s: f64,
    /// Vessels whose slot came up, in slot order
    pub due: Vec<u32>,
    /// Transmissions handed to the emitter
    pub queued: usize,
    pub skipped: Vec<Skipped>,
}

/// Totals over a run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub due: u64,
    pub queued: u64,
    pub skipped: u64,
    pub end_time_s: f64,
}

/// SOTDMA communication state for a vessel's slot in a given frame.
///
/// The slot timeout counts 7 → 0 over consecutive frames; the sub-message
/// depends on it.
pub fn comm_state_for(frame: u64, slot: u16, utc: DateTime<Utc>, stations_heard: u16) -> CommState {
    let timeout = 7 - (frame % 8) as u8;
    let sub_message = match timeout {
        0 => SLOTS_PER_FRAME as u16,
        1 => ((utc.hour() as u16) << 9) | ((utc.minute() as u16) << 2),
        2 | 4 | 6 => slot,
        _ => stations_heard,
    };
    CommState::sotdma(0, timeout, sub_message)
}

fn skip(
    report: &mut TickReport,
    mmsi: u32,
    message_type: Option<MessageType>,
    stage: Stage,
    err: SimError,
) {
    match message_type {
        Some(t) => warn!(
            mmsi,
            stage = %stage,
            message_type = t.code(),
            error = %err,
            "message skipped this tick"
        ),
        None => warn!(mmsi, stage = %stage, error = %err, "vessel skipped this tick"),
    }
    report.skipped.push(Skipped {
        mmsi,
        message_type,
        stage,
        reason: err.to_string(),
    });
}

/// Whether a Class A vessel carries enough to send a type 5
fn has_voyage_data(vessel: &VesselState) -> bool {
    vessel.class == VesselClass::ClassA
        && !vessel.name.trim().is_empty()
        && vessel.call_sign().is_some()
        && vessel.destination().is_some()
}

/// Composition root of the simulator
pub struct Orchestrator {
    fleet: FleetState,
    scheduler: SlotScheduler,
    kinematics: Kinematics,
    modulator: GmskModulator,
    emitter: Emitter,
    static_every: u32,
    gain_db: f64,
    utc_start: DateTime<Utc>,
    assigned_revision: Option<u64>,
    sequence_id: u8,
}

impl Orchestrator {
    pub fn new(fleet: FleetState, emitter: Emitter, config: &AistxConfig) -> SimResult<Self> {
        let modulator = GmskModulator::new(config.radio.gmsk)?;
        let utc_start = match config.simulation.seed {
            Some(seed) => Utc
                .timestamp_opt(SEEDED_EPOCH_S + (seed % 31_536_000) as i64, 0)
                .single()
                .unwrap_or_else(Utc::now),
            None => Utc::now(),
        };

        let mut scheduler = SlotScheduler::new();
        scheduler.prime(fleet.clock_s(), fleet.frame_start_s());

        info!(
            vessels = fleet.len(),
            sink = emitter.sink_name(),
            sample_rate = modulator.sample_rate(),
            "orchestrator ready"
        );
        Ok(Self {
            fleet,
            scheduler,
            kinematics: Kinematics::default(),
            modulator,
            emitter,
            static_every: config.simulation.static_every.max(1),
            gain_db: config.radio.gain_db,
            utc_start,
            assigned_revision: None,
            sequence_id: 0,
        })
    }

    /// Fix the simulated UTC at clock zero
    pub fn with_utc_start(mut self, utc: DateTime<Utc>) -> Self {
        self.utc_start = utc;
        self
    }

    pub fn with_kinematics(mut self, kinematics: Kinematics) -> Self {
        self.kinematics = kinematics;
        self
    }

    pub fn fleet(&self) -> &FleetState {
        &self.fleet
    }

    pub fn scheduler(&self) -> &SlotScheduler {
        &self.scheduler
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn clock_s(&self) -> f64 {
        self.fleet.clock_s()
    }

    /// Simulated wall-clock time at simulation time `t`
    pub fn utc_at(&self, t: f64) -> DateTime<Utc> {
        self.utc_start + ChronoDuration::milliseconds((t * 1000.0).round() as i64)
    }

    pub fn add_vessel(&mut self, vessel: VesselState) -> SimResult<()> {
        let mmsi = vessel.mmsi;
        self.fleet.add_vessel(vessel)?;
        info!(mmsi, vessels = self.fleet.len(), "vessel added");
        Ok(())
    }

    pub fn remove_vessel(&mut self, mmsi: u32) -> SimResult<VesselState> {
        let vessel = self.fleet.remove_vessel(mmsi)?;
        info!(mmsi, vessels = self.fleet.len(), "vessel removed");
        Ok(vessel)
    }

    fn ensure_assignment(&mut self) -> SimResult<()> {
        if self.assigned_revision == Some(self.fleet.revision()) {
            return Ok(());
        }
        match self.scheduler.assign(&self.fleet.mmsis()) {
            Ok(_) => {
                self.assigned_revision = Some(self.fleet.revision());
                Ok(())
            }
            Err(e) => {
                error!(vessels = self.fleet.len(), error = %e, "slot assignment failed");
                Err(e)
            }
        }
    }

    /// Advance the simulation by `dt` seconds and transmit for every slot
    /// that came up.
    ///
    /// Only scheduling failures are returned; per-vessel failures are
    /// reported in [`TickReport::skipped`].
    pub fn tick(&mut self, dt: f64) -> SimResult<TickReport> {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.kinematics.advance_fleet(&mut self.fleet, dt);
        let now = self.fleet.advance_clock(dt);
        self.ensure_assignment()?;

        let due = self.scheduler.slots_due(now, self.fleet.frame_start_s());
        let mut report = TickReport {
            time_s: now,
            due: due.clone(),
            ..Default::default()
        };

        for mmsi in due {
            self.transmit(mmsi, now, &mut report);
        }
        Ok(report)
    }

    fn transmit(&mut self, mmsi: u32, now: f64, report: &mut TickReport) {
        // Work on a snapshot so the fleet may move on while this one is in flight
        let (Some(snapshot), Some(slot)) =
            (self.fleet.get(mmsi).cloned(), self.scheduler.slot_of(mmsi))
        else {
            skip(report, mmsi, None, Stage::Encode, SimError::UnknownVessel(mmsi));
            return;
        };
        if !self.emitter.is_running() {
            skip(report, mmsi, None, Stage::Emit, SinkError::Closed.into());
            return;
        }

        let count = self.fleet.transmission_count(mmsi);
        let channel = if count % 2 == 0 { Channel::A } else { Channel::B };
        let utc = self.utc_at(now);
        let frame = self.scheduler.frame_index(now, self.fleet.frame_start_s());
        let heard = (self.fleet.len().saturating_sub(1)).min(0x3FFF) as u16;
        let options = EncodeOptions {
            utc_second: utc.second() as u8,
            utc: Some(utc),
            comm_state: comm_state_for(frame, slot, utc, heard),
            ..Default::default()
        };

        let position_type = MessageType::position_for(snapshot.class);
        match encode_with(&snapshot, position_type, &options) {
            Ok(message) => {
                self.queue(&message, channel, now, slot);
                report.queued += 1;
                self.fleet.record_transmission(mmsi);
            }
            Err(e) => {
                skip(report, mmsi, Some(position_type), Stage::Encode, e.into());
                return;
            }
        }

        if has_voyage_data(&snapshot) && count % self.static_every as u64 == 0 {
            // Static data goes out on the other channel in the same slot
            match encode_with(&snapshot, MessageType::StaticVoyage, &options) {
                Ok(message) => {
                    self.queue(&message, channel.other(), now, slot);
                    report.queued += 1;
                }
                Err(e) => skip(
                    report,
                    mmsi,
                    Some(MessageType::StaticVoyage),
                    Stage::Encode,
                    e.into(),
                ),
            }
        }
    }

    fn queue(&mut self, message: &AisMessage, channel: Channel, now: f64, slot: u16) {
        let tx = self.build_transmission(message, channel, now, slot);
        debug!(
            mmsi = tx.mmsi,
            message_type = message.message_type().code(),
            channel = %channel,
            slot,
            bits = tx.frame.len(),
            "transmission queued"
        );
        self.emitter.push(tx);
    }

    fn build_transmission(
        &mut self,
        message: &AisMessage,
        channel: Channel,
        now: f64,
        slot: u16,
    ) -> Transmission {
        let frame = build_frame(message);
        let sentences = message.to_sentences(channel, self.sequence_id);
        if sentences.len() > 1 {
            self.sequence_id = (self.sequence_id + 1) % 10;
        }

        let iq = (self.emitter.input() == SinkInput::Iq).then(|| IqBurst {
            samples: self
                .modulator
                .modulate_frame(&frame)
                .iter()
                .map(|s| IQSample32::new(s.re as f32, s.im as f32))
                .collect(),
            sample_rate: self.modulator.sample_rate(),
            center_frequency: channel.frequency_hz(),
            gain_db: self.gain_db,
        });

        Transmission {
            mmsi: message.mmsi(),
            message_type: message.message_type(),
            channel,
            time_s: now,
            slot,
            nmea: sentences.iter().map(|s| s.to_wire()).collect(),
            frame,
            iq,
        }
    }

    /// Run ticks of `tick_s` until `duration_s` of simulated time has passed.
    ///
    /// With `time_scale > 0` each tick is paced to `tick_s / time_scale`
    /// of wall-clock time; `keep_running` is polled between ticks.
    pub fn run_for(
        &mut self,
        duration_s: f64,
        tick_s: f64,
        time_scale: f64,
        keep_running: &dyn Fn() -> bool,
    ) -> SimResult<RunSummary> {
        if !(tick_s.is_finite() && tick_s > 0.0) {
            return Err(ConfigError::ValidationError(format!("tick of {tick_s} s")).into());
        }
        let mut summary = RunSummary::default();
        let end = self.clock_s() + duration_s;
        let started = Instant::now();
        let start_clock = self.clock_s();

        while self.clock_s() + tick_s / 2.0 < end && keep_running() {
            let report = self.tick(tick_s)?;
            summary.ticks += 1;
            summary.due += report.due.len() as u64;
            summary.queued += report.queued as u64;
            summary.skipped += report.skipped.len() as u64;

            if time_scale > 0.0 {
                let target = Duration::from_secs_f64((self.clock_s() - start_clock) / time_scale);
                if let Some(wait) = target.checked_sub(started.elapsed()) {
                    thread::sleep(wait);
                }
            }
        }
        summary.end_time_s = self.clock_s();
        info!(
            ticks = summary.ticks,
            queued = summary.queued,
            skipped = summary.skipped,
            end_time_s = summary.end_time_s,
            "run finished"
        );
        Ok(summary)
    }

    /// Stop emission and return the fleet, the sink and the delivery counters.
    pub fn shutdown(self, mode: ShutdownMode) -> SimResult<(FleetState, Box<dyn Sink>, EmitterStats)> {
        let (sink, stats) = self.emitter.shutdown(mode)?;
        Ok((self.fleet, sink, stats))
    }
}
