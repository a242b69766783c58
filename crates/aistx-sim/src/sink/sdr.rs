//! SDR transmit adapter
//!
//! The radio itself is opaque: anything that can be tuned and accept a
//! buffer of `cf32` samples implements [`TxDevice`]. [`SdrSink`] retunes per
//! burst (AIS alternates channels) and never splits a burst across writes.

use aistx_core::types::IQSample32;
use tracing::{debug, trace};

use super::{Sink, SinkError, SinkInput, SinkResult, Transmission};

/// Minimal transmit-side device control.
pub trait TxDevice: Send {
    fn name(&self) -> &str;

    /// Set center frequency, returning the frequency actually set.
    fn set_frequency(&mut self, freq_hz: u64) -> SinkResult<u64>;

    fn set_sample_rate(&mut self, rate: f64) -> SinkResult<f64>;

    fn set_tx_gain(&mut self, gain_db: f64) -> SinkResult<f64>;

    /// Samples the device can take right now without blocking
    fn tx_available(&self) -> usize;

    /// Queue samples for transmission, returning how many were accepted.
    fn write(&mut self, samples: &[IQSample32]) -> SinkResult<usize>;
}

/// [`Sink`] over any [`TxDevice`]
pub struct SdrSink<D: TxDevice> {
    name: String,
    device: D,
    frequency: Option<u64>,
    sample_rate: Option<f64>,
    gain_db: Option<f64>,
    bursts: u64,
}

impl<D: TxDevice> SdrSink<D> {
    pub fn new(device: D) -> Self {
        Self {
            name: format!("sdr:{}", device.name()),
            device,
            frequency: None,
            sample_rate: None,
            gain_db: None,
            bursts: 0,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    pub fn into_device(self) -> D {
        self.device
    }
}

impl<D: TxDevice> Sink for SdrSink<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn input(&self) -> SinkInput {
        SinkInput::Iq
    }

    fn emit(&mut self, tx: &Transmission) -> SinkResult<()> {
        let burst = tx
            .iq
            .as_ref()
            .ok_or_else(|| SinkError::Unsupported("SDR sink needs I/Q samples".into()))?;

        let available = self.device.tx_available();
        if available < burst.samples.len() {
            return Err(SinkError::SinkUnavailable(format!(
                "{} has room for {} of {} samples",
                self.device.name(),
                available,
                burst.samples.len()
            )));
        }

        let freq = burst.center_frequency.round() as u64;
        if self.frequency != Some(freq) {
            let actual = self.device.set_frequency(freq)?;
            trace!(requested = freq, actual, "retuned");
            self.frequency = Some(freq);
        }
        if self.sample_rate != Some(burst.sample_rate) {
            self.device.set_sample_rate(burst.sample_rate)?;
            self.sample_rate = Some(burst.sample_rate);
        }
        if self.gain_db != Some(burst.gain_db) {
            self.device.set_tx_gain(burst.gain_db)?;
            self.gain_db = Some(burst.gain_db);
        }

        let written = self.device.write(&burst.samples)?;
        if written != burst.samples.len() {
            return Err(SinkError::Io(format!(
                "short write: {} of {} samples",
                written,
                burst.samples.len()
            )));
        }
        self.bursts += 1;
        debug!(mmsi = tx.mmsi, channel = %tx.channel, samples = written, "burst transmitted");
        Ok(())
    }
}

/// In-memory [`TxDevice`] with a bounded transmit buffer.
#[derive(Debug, Clone)]
pub struct MemoryTxDevice {
    capacity: usize,
    buffer: Vec<IQSample32>,
    frequency: u64,
    sample_rate: f64,
    gain_db: f64,
    retunes: usize,
}

impl MemoryTxDevice {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: Vec::new(),
            frequency: 0,
            sample_rate: 0.0,
            gain_db: 0.0,
            retunes: 0,
        }
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    /// Number of frequency changes so far
    pub fn retunes(&self) -> usize {
        self.retunes
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Take everything "transmitted" so far, freeing the buffer
    pub fn drain(&mut self) -> Vec<IQSample32> {
        std::mem::take(&mut self.buffer)
    }
}

impl TxDevice for MemoryTxDevice {
    fn name(&self) -> &str {
        "memory"
    }

    fn set_frequency(&mut self, freq_hz: u64) -> SinkResult<u64> {
        if freq_hz != self.frequency {
            self.retunes += 1;
        }
        self.frequency = freq_hz;
        Ok(freq_hz)
    }

    fn set_sample_rate(&mut self, rate: f64) -> SinkResult<f64> {
        if rate <= 0.0 {
            return Err(SinkError::Unsupported(format!("sample rate {rate}")));
        }
        self.sample_rate = rate;
        Ok(rate)
    }

    fn set_tx_gain(&mut self, gain_db: f64) -> SinkResult<f64> {
        self.gain_db = gain_db;
        Ok(gain_db)
    }

    fn tx_available(&self) -> usize {
        self.capacity.saturating_sub(self.buffer.len())
    }

    fn write(&mut self, samples: &[IQSample32]) -> SinkResult<usize> {
        let n = samples.len().min(self.tx_available());
        self.buffer.extend_from_slice(&samples[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::IqBurst;
    use aistx_core::ais_encoder::encode;
    use aistx_core::ais_message::MessageType;
    use aistx_core::frame::build_frame;
    use aistx_core::types::Channel;
    use aistx_core::vessel::VesselState;

    fn transmission(channel: Channel, samples: usize) -> Transmission {
        let v = VesselState::new(244000001, "", 52.0, 4.0);
        let msg = encode(&v, MessageType::PositionScheduled).unwrap();
        Transmission {
            mmsi: v.mmsi,
            message_type: MessageType::PositionScheduled,
            channel,
            time_s: 0.0,
            slot: 0,
            nmea: Vec::new(),
            frame: build_frame(&msg),
            iq: Some(IqBurst {
                samples: vec![IQSample32::new(0.5, 0.5); samples],
                sample_rate: 76_800.0,
                center_frequency: channel.frequency_hz(),
                gain_db: 20.0,
            }),
        }
    }

    #[test]
    fn test_retunes_per_channel() {
        let mut sink = SdrSink::new(MemoryTxDevice::new(10_000));
        sink.emit(&transmission(Channel::A, 100)).unwrap();
        assert_eq!(sink.device().frequency(), 161_975_000);
        sink.emit(&transmission(Channel::A, 100)).unwrap();
        sink.emit(&transmission(Channel::B, 100)).unwrap();
        assert_eq!(sink.device().frequency(), 162_025_000);
        assert_eq!(sink.device().retunes(), 2);
        assert_eq!(sink.device().gain_db(), 20.0);
        assert_eq!(sink.device().buffered(), 300);
        assert_eq!(sink.bursts(), 3);
    }

    #[test]
    fn test_full_device_is_unavailable_not_partial() {
        let mut sink = SdrSink::new(MemoryTxDevice::new(150));
        sink.emit(&transmission(Channel::A, 100)).unwrap();

        let err = sink.emit(&transmission(Channel::B, 100)).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(sink.device().buffered(), 100, "no partial burst");

        sink.device_mut().drain();
        sink.emit(&transmission(Channel::B, 100)).unwrap();
        assert_eq!(sink.device().buffered(), 100);
    }

    #[test]
    fn test_requires_iq() {
        let mut sink = SdrSink::new(MemoryTxDevice::new(10));
        let mut tx = transmission(Channel::A, 1);
        tx.iq = None;
        assert!(matches!(sink.emit(&tx), Err(SinkError::Unsupported(_))));
        assert_eq!(sink.input(), SinkInput::Iq);
    }
}
