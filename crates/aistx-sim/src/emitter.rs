//! Emission queue and sink worker
//!
//! The tick loop never blocks on a sink. Finished transmissions go into a
//! bounded lock-free queue; a named worker thread owns the [`Sink`] and
//! drains it. When the queue is full the oldest unsent transmission is
//! evicted. A `SinkUnavailable` answer keeps the transmission in hand and
//! retries it a bounded number of times.
//!
//! ```text
//! tick loop ──push──▶ ArrayQueue (drop oldest) ──pop──▶ worker ──emit──▶ Sink
//!                  └──unpark────────────────────────────────▲
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_queue::ArrayQueue;
use tracing::{debug, info, warn};

use crate::config::EmissionConfig;
use crate::error::{SimError, SimResult};
use crate::sink::{Sink, SinkError, SinkInput, Transmission};

/// Worker wake-up period when idle
const IDLE_PARK: Duration = Duration::from_millis(50);

/// How to stop the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Deliver everything still queued, then stop
    Drain,
    /// Finish the emit in progress, discard the rest
    Abort,
}

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterStats {
    pub sent: u64,
    /// Evicted from a full queue
    pub dropped_full: u64,
    /// Given up after `max_retries` unavailable answers
    pub dropped_retries: u64,
    /// Rejected by the sink with a non-retryable error
    pub failed: u64,
    /// Left in the queue by an aborting shutdown
    pub discarded: u64,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    dropped_full: AtomicU64,
    dropped_retries: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> EmitterStats {
        EmitterStats {
            sent: self.sent.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            dropped_retries: self.dropped_retries.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

struct Shared {
    queue: ArrayQueue<Transmission>,
    counters: Counters,
    stop: AtomicBool,
    abort: AtomicBool,
    busy: AtomicBool,
}

/// Handle to the emission queue and its worker thread
pub struct Emitter {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<Box<dyn Sink>>>,
    input: SinkInput,
    sink_name: String,
}

impl Emitter {
    /// Start a worker that owns `sink`.
    pub fn spawn(sink: Box<dyn Sink>, config: &EmissionConfig) -> SimResult<Self> {
        let shared = Arc::new(Shared {
            queue: ArrayQueue::new(config.queue_capacity.max(1)),
            counters: Counters::default(),
            stop: AtomicBool::new(false),
            abort: AtomicBool::new(false),
            busy: AtomicBool::new(false),
        });
        let input = sink.input();
        let sink_name = sink.name().to_string();
        let worker = Worker {
            shared: Arc::clone(&shared),
            sink,
            max_retries: config.max_retries,
            retry_interval: Duration::from_millis(config.retry_interval_ms),
        };

        let handle = thread::Builder::new()
            .name("aistx-emitter".to_string())
            .spawn(move || worker.run())
            .map_err(|e| SimError::Sink(SinkError::Io(format!("emitter thread: {e}"))))?;

        info!(sink = %sink_name, capacity = config.queue_capacity, "emitter started");
        Ok(Self {
            shared,
            worker: Some(handle),
            input,
            sink_name,
        })
    }

    /// What the sink behind this emitter consumes
    pub fn input(&self) -> SinkInput {
        self.input
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    /// Queue a transmission, evicting the oldest one if the queue is full.
    ///
    /// Returns false when something was evicted.
    pub fn push(&self, tx: Transmission) -> bool {
        let evicted = self.shared.queue.force_push(tx);
        if let Some(worker) = &self.worker {
            worker.thread().unpark();
        }
        match evicted {
            Some(old) => {
                self.shared.counters.dropped_full.fetch_add(1, Ordering::Relaxed);
                warn!(
                    mmsi = old.mmsi,
                    stage = "queue",
                    message_type = old.message_type.code(),
                    "emission queue full, dropped oldest"
                );
                false
            }
            None => true,
        }
    }

    /// False once the worker has exited, e.g. after a sink panicked
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Transmissions waiting in the queue
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn stats(&self) -> EmitterStats {
        self.shared.counters.snapshot()
    }

    /// Wait until the queue is empty and no emit is in progress.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.shared.queue.is_empty() && !self.shared.busy.load(Ordering::SeqCst) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stop the worker and hand back the sink with the final counters.
    pub fn shutdown(mut self, mode: ShutdownMode) -> SimResult<(Box<dyn Sink>, EmitterStats)> {
        let handle = self
            .worker
            .take()
            .ok_or_else(|| SimError::Sink(SinkError::Closed))?;
        self.signal(mode);
        handle.thread().unpark();
        let sink = handle
            .join()
            .map_err(|_| SimError::Sink(SinkError::Io("emitter worker panicked".into())))?;

        let stats = self.stats();
        info!(
            sink = %self.sink_name,
            sent = stats.sent,
            dropped_full = stats.dropped_full,
            dropped_retries = stats.dropped_retries,
            failed = stats.failed,
            discarded = stats.discarded,
            "emitter stopped"
        );
        Ok((sink, stats))
    }

    fn signal(&self, mode: ShutdownMode) {
        if mode == ShutdownMode::Abort {
            self.shared.abort.store(true, Ordering::SeqCst);
        }
        self.shared.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.signal(ShutdownMode::Abort);
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

struct Worker {
    shared: Arc<Shared>,
    sink: Box<dyn Sink>,
    max_retries: u32,
    retry_interval: Duration,
}

impl Worker {
    fn aborted(&self) -> bool {
        self.shared.abort.load(Ordering::SeqCst)
    }

    fn run(mut self) -> Box<dyn Sink> {
        loop {
            if self.aborted() {
                break;
            }
            self.shared.busy.store(true, Ordering::SeqCst);
            match self.shared.queue.pop() {
                Some(tx) => {
                    self.deliver(&tx);
                    self.shared.busy.store(false, Ordering::SeqCst);
                }
                None => {
                    self.shared.busy.store(false, Ordering::SeqCst);
                    if self.shared.stop.load(Ordering::SeqCst) {
                        break;
                    }
                    thread::park_timeout(IDLE_PARK);
                }
            }
        }

        let mut discarded = 0u64;
        while self.shared.queue.pop().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            self.shared
                .counters
                .discarded
                .fetch_add(discarded, Ordering::Relaxed);
            warn!(discarded, "emitter aborted with transmissions queued");
        }

        if let Err(e) = self.sink.close() {
            warn!(sink = self.sink.name(), error = %e, "sink close failed");
        }
        self.sink
    }

    fn deliver(&mut self, tx: &Transmission) {
        let counters = &self.shared.counters;
        let mut attempt = 0u32;
        loop {
            match self.sink.emit(tx) {
                Ok(()) => {
                    counters.sent.fetch_add(1, Ordering::Relaxed);
                    debug!(mmsi = tx.mmsi, slot = tx.slot, channel = %tx.channel, "emitted");
                    return;
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!(mmsi = tx.mmsi, attempt, error = %e, "sink unavailable, retrying");
                    if !self.wait_retry() {
                        counters.discarded.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                }
                Err(e) if e.is_retryable() => {
                    counters.dropped_retries.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        mmsi = tx.mmsi,
                        stage = "emit",
                        attempts = attempt + 1,
                        error = %e,
                        "sink unavailable, transmission dropped"
                    );
                    return;
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(mmsi = tx.mmsi, stage = "emit", error = %e, "sink rejected transmission");
                    return;
                }
            }
        }
    }

    /// Sleep one retry interval; false if an abort arrived meanwhile.
    fn wait_retry(&self) -> bool {
        let deadline = Instant::now() + self.retry_interval;
        loop {
            if self.aborted() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::VectorSink;
    use aistx_core::ais_encoder::encode;
    use aistx_core::ais_message::MessageType;
    use aistx_core::frame::build_frame;
    use aistx_core::types::Channel;
    use aistx_core::vessel::VesselState;

    fn transmission(mmsi: u32) -> Transmission {
        let v = VesselState::new(mmsi, "", 1.0, 1.0);
        let msg = encode(&v, MessageType::PositionScheduled).unwrap();
        Transmission {
            mmsi,
            message_type: MessageType::PositionScheduled,
            channel: Channel::A,
            time_s: 0.0,
            slot: 0,
            nmea: Vec::new(),
            frame: build_frame(&msg),
            iq: None,
        }
    }

    fn config(capacity: usize, retries: u32) -> EmissionConfig {
        EmissionConfig {
            queue_capacity: capacity,
            max_retries: retries,
            retry_interval_ms: 5,
        }
    }

    /// Holds every emit until opened, to pin the worker in place
    #[derive(Clone)]
    struct GatedSink {
        open: Arc<AtomicBool>,
        inner: VectorSink,
    }

    impl GatedSink {
        fn new() -> Self {
            Self {
                open: Arc::new(AtomicBool::new(false)),
                inner: VectorSink::new(SinkInput::Bits),
            }
        }
    }

    impl Sink for GatedSink {
        fn name(&self) -> &str {
            "gated"
        }
        fn input(&self) -> SinkInput {
            SinkInput::Bits
        }
        fn emit(&mut self, tx: &Transmission) -> Result<(), SinkError> {
            while !self.open.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            self.inner.emit(tx)
        }
    }

    fn wait_until_taken(emitter: &Emitter) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while emitter.pending() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(emitter.pending(), 0);
    }

    struct RejectingSink;

    impl Sink for RejectingSink {
        fn name(&self) -> &str {
            "rejecting"
        }
        fn input(&self) -> SinkInput {
            SinkInput::Bits
        }
        fn emit(&mut self, _tx: &Transmission) -> Result<(), SinkError> {
            Err(SinkError::Unsupported("nope".into()))
        }
    }

    #[test]
    fn test_delivers_in_order() {
        let sink = VectorSink::new(SinkInput::Bits);
        let emitter = Emitter::spawn(Box::new(sink.clone()), &config(16, 0)).unwrap();
        for mmsi in 1..=5 {
            assert!(emitter.push(transmission(mmsi)));
        }
        let (_, stats) = emitter.shutdown(ShutdownMode::Drain).unwrap();
        assert_eq!(stats.sent, 5);
        let order: Vec<u32> = sink.records().iter().map(|t| t.mmsi).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let sink = GatedSink::new();
        let (open, inner) = (Arc::clone(&sink.open), sink.inner.clone());
        let emitter = Emitter::spawn(Box::new(sink), &config(2, 0)).unwrap();

        // The worker takes #1 and waits inside emit
        emitter.push(transmission(1));
        wait_until_taken(&emitter);

        emitter.push(transmission(2));
        emitter.push(transmission(3));
        assert!(!emitter.push(transmission(4)), "#2 evicted");
        open.store(true, Ordering::SeqCst);

        let (_, stats) = emitter.shutdown(ShutdownMode::Drain).unwrap();
        assert_eq!(stats.dropped_full, 1);
        let order: Vec<u32> = inner.records().iter().map(|t| t.mmsi).collect();
        assert_eq!(order, vec![1, 3, 4]);
    }

    #[test]
    fn test_retries_then_succeeds() {
        let sink = VectorSink::new(SinkInput::Bits);
        sink.unavailable_for(2);
        let emitter = Emitter::spawn(Box::new(sink.clone()), &config(4, 3)).unwrap();
        emitter.push(transmission(9));
        let (_, stats) = emitter.shutdown(ShutdownMode::Drain).unwrap();
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.dropped_retries, 0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let sink = VectorSink::new(SinkInput::Bits);
        sink.unavailable_for(10);
        let emitter = Emitter::spawn(Box::new(sink.clone()), &config(4, 2)).unwrap();
        emitter.push(transmission(9));
        let (_, stats) = emitter.shutdown(ShutdownMode::Drain).unwrap();
        assert_eq!(stats.sent, 0);
        assert_eq!(stats.dropped_retries, 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_non_retryable_counts_failed() {
        let emitter = Emitter::spawn(Box::new(RejectingSink), &config(4, 5)).unwrap();
        emitter.push(transmission(1));
        let (_, stats) = emitter.shutdown(ShutdownMode::Drain).unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.sent, 0);
    }

    #[test]
    fn test_abort_discards_queue() {
        let sink = GatedSink::new();
        let (open, inner) = (Arc::clone(&sink.open), sink.inner.clone());
        let emitter = Emitter::spawn(Box::new(sink), &config(8, 0)).unwrap();
        emitter.push(transmission(1));
        wait_until_taken(&emitter);
        emitter.push(transmission(2));
        emitter.push(transmission(3));

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            open.store(true, Ordering::SeqCst);
        });
        let (_, stats) = emitter.shutdown(ShutdownMode::Abort).unwrap();
        releaser.join().unwrap();

        // The in-flight emit completes whole; the rest never reach the sink
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.discarded, 2);
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_wait_idle() {
        let sink = VectorSink::new(SinkInput::Bits);
        let emitter = Emitter::spawn(Box::new(sink.clone()), &config(8, 0)).unwrap();
        emitter.push(transmission(1));
        emitter.push(transmission(2));
        assert!(emitter.wait_idle(Duration::from_secs(5)));
        assert_eq!(sink.len(), 2);
        assert_eq!(emitter.stats().sent, 2);
    }
}
