//! # AIS Fleet Simulator
//!
//! Moves simulated vessels along their routes, schedules them onto SOTDMA
//! slots and hands each finished transmission to a sink.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────── Orchestrator ─────────────────────────┐
//! │ FleetState ──kinematics──▶ snapshot ──▶ encode ─▶ frame ─▶ GMSK │
//! │      │                         ▲                          │    │
//! │      └──▶ SlotScheduler ───due─┘                          ▼    │
//! └──────────────────────────────────────────────── Emitter queue ─┘
//!                                                        │ worker thread
//!                                                        ▼
//!                              SigMF file │ bit lines │ TCP │ SDR │ memory
//! ```
//!
//! ## Example
//!
//! ```rust
//! use aistx_sim::prelude::*;
//!
//! let config = AistxConfig::default();
//! let sink = VectorSink::new(SinkInput::Bits);
//! let emitter = Emitter::spawn(Box::new(sink.clone()), &config.emission).unwrap();
//! let vessel = VesselState::new(123456789, "SEA SPRITE", 37.7749, -122.4194)
//!     .with_motion(45.0, 12.5);
//! let fleet = FleetState::from_vessels(vec![vessel]).unwrap();
//!
//! let mut sim = Orchestrator::new(fleet, emitter, &config).unwrap();
//! for _ in 0..60 {
//!     sim.tick(1.0).unwrap();
//! }
//! let (_, _, stats) = sim.shutdown(ShutdownMode::Drain).unwrap();
//! assert_eq!(stats.sent, 1);
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod fleet;
pub mod kinematics;
pub mod logging;
pub mod orchestrator;
pub mod scheduler;
pub mod sink;

pub use config::{AistxConfig, ConfigError};
pub use emitter::{Emitter, EmitterStats, ShutdownMode};
pub use error::{SimError, SimResult};
pub use fleet::FleetState;
pub use orchestrator::{Orchestrator, TickReport};
pub use scheduler::{SlotAssignment, SlotScheduler};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{AistxConfig, ConfigError, SinkKind};
    pub use crate::emitter::{Emitter, EmitterStats, ShutdownMode};
    pub use crate::error::{SimError, SimResult};
    pub use crate::fleet::{load_fleet, parse_fleet, FleetState, VesselRecord};
    pub use crate::kinematics::{advance, Kinematics};
    pub use crate::orchestrator::{Orchestrator, RunSummary, TickReport};
    pub use crate::scheduler::{assign_slots, SlotAssignment, SlotScheduler};
    pub use crate::sink::{build_sink, Sink, SinkError, SinkInput, Transmission, VectorSink};
    pub use aistx_core::prelude::*;
}
