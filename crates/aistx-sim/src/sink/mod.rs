//! Transmit sinks
//!
//! A [`Sink`] is the only blocking boundary of the simulator: it consumes
//! finished [`Transmission`]s on the emitter's worker thread. Each sink
//! declares whether it wants modulated I/Q or the raw frame bit string so
//! the orchestrator can skip modulation for bit-level consumers.
//!
//! | Sink | Input | Destination |
//! |------|-------|-------------|
//! | [`SigMfSink`] | I/Q | `.sigmf-data` + `.sigmf-meta` recording |
//! | [`SdrSink`] | I/Q | any [`TxDevice`] |
//! | [`BitStreamSink`] | bits | any `Write`, one line per frame |
//! | [`TcpBitSink`] | bits | TCP endpoint, reconnecting lazily |
//! | [`VectorSink`] | either | in-memory record |

mod bitstream;
mod sdr;
mod sigmf;
mod vector;

pub use bitstream::{BitStreamSink, TcpBitSink};
pub use sdr::{MemoryTxDevice, SdrSink, TxDevice};
pub use sigmf::{SigMfAnnotation, SigMfCapture, SigMfGlobal, SigMfMeta, SigMfSink};
pub use vector::VectorSink;

use aistx_core::ais_message::MessageType;
use aistx_core::frame::TransmissionFrame;
use aistx_core::types::{Channel, IQSample32};

use crate::config::{SinkConfig, SinkKind};

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors reported by a sink
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SinkError {
    /// Temporarily unable to accept data; the emitter retries
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("sink closed")]
    Closed,
}

impl SinkError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SinkError::SinkUnavailable(_))
    }
}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError::Io(e.to_string())
    }
}

/// What a sink consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkInput {
    /// Modulated complex baseband
    Iq,
    /// Pre-modulation frame bit string
    Bits,
}

/// Modulated burst plus the RF parameters it should be sent with
#[derive(Debug, Clone, PartialEq)]
pub struct IqBurst {
    pub samples: Vec<IQSample32>,
    pub sample_rate: f64,
    /// Carrier frequency in Hz
    pub center_frequency: f64,
    pub gain_db: f64,
}

/// One vessel's output for one slot
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    pub mmsi: u32,
    pub message_type: MessageType,
    pub channel: Channel,
    /// Simulation time of the slot, seconds
    pub time_s: f64,
    pub slot: u16,
    /// `!AIVDM` sentences including `\r\n`
    pub nmea: Vec<String>,
    pub frame: TransmissionFrame,
    /// Present only when the sink consumes I/Q
    pub iq: Option<IqBurst>,
}

impl Transmission {
    /// Label used in recordings and logs
    pub fn label(&self) -> String {
        format!("{} {} ch{}", self.mmsi, self.message_type, self.channel)
    }
}

/// Destination for finished transmissions
pub trait Sink: Send {
    fn name(&self) -> &str;

    fn input(&self) -> SinkInput;

    /// Deliver one transmission; never blocks indefinitely on backpressure
    fn emit(&mut self, tx: &Transmission) -> SinkResult<()>;

    /// Flush and release resources
    fn close(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn input(&self) -> SinkInput {
        (**self).input()
    }

    fn emit(&mut self, tx: &Transmission) -> SinkResult<()> {
        (**self).emit(tx)
    }

    fn close(&mut self) -> SinkResult<()> {
        (**self).close()
    }
}

/// Build the sink selected in configuration.
pub fn build_sink(config: &SinkConfig, sample_rate: f64) -> SinkResult<Box<dyn Sink>> {
    let sink: Box<dyn Sink> = match config.kind {
        SinkKind::Sigmf => Box::new(SigMfSink::create(&config.path, sample_rate)?),
        SinkKind::Bits => {
            if config.path.is_empty() || config.path == "-" {
                Box::new(BitStreamSink::new("stdout", std::io::stdout()))
            } else {
                let file = std::fs::File::create(&config.path)?;
                Box::new(BitStreamSink::new(
                    config.path.clone(),
                    std::io::BufWriter::new(file),
                ))
            }
        }
        SinkKind::Tcp => Box::new(TcpBitSink::new(
            config.address.clone(),
            std::time::Duration::from_millis(config.connect_timeout_ms),
        )),
        SinkKind::Memory => Box::new(VectorSink::new(SinkInput::Bits)),
    };
    Ok(sink)
}
