//! In-memory recorder

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Sink, SinkError, SinkInput, SinkResult, Transmission};

/// Records every transmission it receives.
///
/// Clones share the same record, so a test can keep one handle while the
/// emitter's worker owns another.
#[derive(Debug, Clone)]
pub struct VectorSink {
    input: SinkInput,
    records: Arc<Mutex<Vec<Transmission>>>,
    unavailable: Arc<AtomicUsize>,
}

impl VectorSink {
    pub fn new(input: SinkInput) -> Self {
        Self {
            input,
            records: Arc::new(Mutex::new(Vec::new())),
            unavailable: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Transmission>> {
        // A panicking test thread must not hide what was recorded
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of everything recorded so far
    pub fn records(&self) -> Vec<Transmission> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject the next `n` emits with `SinkUnavailable`
    pub fn unavailable_for(&self, n: usize) {
        self.unavailable.store(n, Ordering::SeqCst);
    }
}

impl Sink for VectorSink {
    fn name(&self) -> &str {
        "vector"
    }

    fn input(&self) -> SinkInput {
        self.input
    }

    fn emit(&mut self, tx: &Transmission) -> SinkResult<()> {
        let pending = self
            .unavailable
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Err(SinkError::SinkUnavailable("vector sink busy".into()));
        }
        self.lock().push(tx.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aistx_core::ais_encoder::encode;
    use aistx_core::ais_message::MessageType;
    use aistx_core::frame::build_frame;
    use aistx_core::types::Channel;
    use aistx_core::vessel::VesselState;

    fn transmission(mmsi: u32) -> Transmission {
        let v = VesselState::new(mmsi, "", 10.0, 10.0);
        let msg = encode(&v, MessageType::PositionScheduled).unwrap();
        Transmission {
            mmsi,
            message_type: MessageType::PositionScheduled,
            channel: Channel::B,
            time_s: 0.0,
            slot: 0,
            nmea: Vec::new(),
            frame: build_frame(&msg),
            iq: None,
        }
    }

    #[test]
    fn test_clones_share_records() {
        let handle = VectorSink::new(SinkInput::Bits);
        let mut sink = handle.clone();
        sink.emit(&transmission(1)).unwrap();
        sink.emit(&transmission(2)).unwrap();
        assert_eq!(handle.len(), 2);
        assert_eq!(handle.records()[1].mmsi, 2);
    }

    #[test]
    fn test_simulated_unavailability() {
        let mut sink = VectorSink::new(SinkInput::Iq);
        sink.unavailable_for(2);
        assert!(sink.emit(&transmission(1)).unwrap_err().is_retryable());
        assert!(sink.emit(&transmission(1)).is_err());
        sink.emit(&transmission(1)).unwrap();
        assert_eq!(sink.len(), 1);
    }
}
