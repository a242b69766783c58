//! Simulation error types

use aistx_core::AisError;

use crate::config::ConfigError;
use crate::sink::SinkError;

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors surfaced by the scheduler, fleet and orchestrator
#[derive(Debug, Clone, thiserror::Error)]
pub enum SimError {
    /// More active vessels than slots in a SOTDMA frame
    #[error("{vessels} vessels exceed the {slots} slots of a frame")]
    SlotExhaustion { vessels: usize, slots: usize },

    #[error("vessel {0} is already in the fleet")]
    DuplicateMmsi(u32),

    #[error("no vessel with MMSI {0}")]
    UnknownVessel(u32),

    #[error("codec error: {0}")]
    Codec(#[from] AisError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
