//! GMSK Modulator: Gaussian Minimum Shift Keying for the AIS burst
//!
//! AIS transmits at 9600 bit/s with BT = 0.4. The NRZI line bits of a
//! [`TransmissionFrame`] are mapped to ±1, shaped by a Gaussian frequency
//! pulse and integrated into phase with modulation index h = 0.5.
//!
//! ## Mathematical Background
//!
//! The Gaussian frequency pulse is:
//!
//! ```text
//! g(t) = Q(2*pi*B*(t - T/2)/sqrt(ln2)) - Q(2*pi*B*(t + T/2)/sqrt(ln2))
//! ```
//!
//! where Q(x) = 0.5 * erfc(x / sqrt(2)) is the complementary Gaussian CDF.
//!
//! Phase accumulation:
//!
//! ```text
//! phi(t) = (pi/2) * sum_k { a_k * integral_0^t g(tau - k*T) dtau }
//! ```
//!
//! The burst envelope rises and falls linearly over `ramp_symbols` at each
//! end so the transmitter does not key on at full power.
//!
//! ## Example
//!
//! ```rust
//! use aistx_core::gmsk_modulator::{GmskConfig, GmskDemodulator, GmskModulator};
//!
//! let modulator = GmskModulator::new(GmskConfig::default()).unwrap();
//! let bits = vec![true, false, true, true, false, false, true, false];
//! let iq = modulator.modulate(&bits);
//! assert_eq!(iq.len(), bits.len() * 8);
//! assert_eq!(modulator.sample_rate(), 76_800.0);
//!
//! let recovered = GmskDemodulator::new(8).unwrap().demodulate(&iq);
//! assert_eq!(recovered.len(), bits.len());
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::frame::TransmissionFrame;
use crate::types::{AisError, AisResult, IQSample};

/// AIS symbol rate in bit/s
pub const AIS_SYMBOL_RATE: f64 = 9600.0;

/// AIS Gaussian filter bandwidth-time product
pub const AIS_BT: f64 = 0.4;

/// Modulator parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmskConfig {
    /// Symbols per second
    pub symbol_rate: f64,
    /// Oversampling factor
    pub samples_per_symbol: usize,
    /// Bandwidth-time product
    pub bt: f64,
    /// Peak amplitude relative to full scale
    pub amplitude: f64,
    /// Length of each linear power ramp in symbols
    pub ramp_symbols: usize,
    /// Gaussian pulse duration in symbols
    pub span: usize,
}

impl Default for GmskConfig {
    fn default() -> Self {
        Self {
            symbol_rate: AIS_SYMBOL_RATE,
            samples_per_symbol: 8,
            bt: AIS_BT,
            amplitude: 0.9,
            ramp_symbols: 4,
            span: 4,
        }
    }
}

impl GmskConfig {
    pub fn validate(&self) -> AisResult<()> {
        if self.samples_per_symbol < 1 {
            return Err(AisError::InvalidParameter(
                "samples_per_symbol must be at least 1".into(),
            ));
        }
        if self.bt <= 0.0 || !self.bt.is_finite() {
            return Err(AisError::InvalidParameter(format!(
                "bt must be positive, got {}",
                self.bt
            )));
        }
        if self.symbol_rate <= 0.0 || !self.symbol_rate.is_finite() {
            return Err(AisError::InvalidParameter(format!(
                "symbol_rate must be positive, got {}",
                self.symbol_rate
            )));
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return Err(AisError::InvalidParameter(format!(
                "amplitude must be in (0, 1], got {}",
                self.amplitude
            )));
        }
        if self.span < 1 {
            return Err(AisError::InvalidParameter("span must be at least 1 symbol".into()));
        }
        Ok(())
    }
}

/// Gaussian Q-function: Q(x) = 0.5 * erfc(x / sqrt(2)).
pub fn q_function(x: f64) -> f64 {
    0.5 * erfc_approx(x / core::f64::consts::SQRT_2)
}

/// Complementary error function approximation (Abramowitz and Stegun 7.1.26).
///
/// Maximum error < 1.5e-7 for all x >= 0. For x < 0, uses erfc(-x) = 2 - erfc(x).
fn erfc_approx(x: f64) -> f64 {
    if x < 0.0 {
        return 2.0 - erfc_approx(-x);
    }
    let p = 0.3275911;
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;

    let t = 1.0 / (1.0 + p * x);
    let poly = t * (a1 + t * (a2 + t * (a3 + t * (a4 + t * a5))));
    poly * (-x * x).exp()
}

/// Gaussian frequency pulse, `span * samples_per_symbol + 1` taps
/// normalized to unit sum so each symbol contributes exactly ±π/2.
pub fn gaussian_pulse(bt: f64, span: usize, samples_per_symbol: usize) -> Vec<f64> {
    let len = span * samples_per_symbol + 1;
    let half = (len - 1) as f64 / 2.0;
    let sps = samples_per_symbol as f64;
    let scale = 2.0 * PI * bt / 2.0_f64.ln().sqrt();

    let mut pulse: Vec<f64> = (0..len)
        .map(|i| {
            let t = (i as f64 - half) / sps;
            q_function(scale * (t - 0.5)) - q_function(scale * (t + 0.5))
        })
        .collect();

    let sum: f64 = pulse.iter().sum();
    if sum.abs() > 1e-15 {
        for tap in &mut pulse {
            *tap /= sum;
        }
    }
    pulse
}

/// Continuous-phase GMSK burst generator.
///
/// Holds only the precomputed pulse, so one instance can be shared across
/// threads and every call is a pure function of its input bits.
#[derive(Debug, Clone)]
pub struct GmskModulator {
    config: GmskConfig,
    pulse: Vec<f64>,
}

impl GmskModulator {
    pub fn new(config: GmskConfig) -> AisResult<Self> {
        config.validate()?;
        let pulse = gaussian_pulse(config.bt, config.span, config.samples_per_symbol);
        Ok(Self { config, pulse })
    }

    pub fn config(&self) -> &GmskConfig {
        &self.config
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.config.samples_per_symbol
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> f64 {
        self.config.symbol_rate * self.config.samples_per_symbol as f64
    }

    /// Modulate line bits into a ramped baseband burst.
    ///
    /// Output length = `bits.len() * samples_per_symbol`.
    pub fn modulate(&self, bits: &[bool]) -> Vec<IQSample> {
        if bits.is_empty() {
            return Vec::new();
        }

        let sps = self.config.samples_per_symbol;
        let total_samples = bits.len() * sps;

        // Impulse train of NRZ values at the start of each symbol
        let upsampled_len = total_samples + self.pulse.len() - 1;
        let mut upsampled = vec![0.0; upsampled_len];
        for (k, &bit) in bits.iter().enumerate() {
            upsampled[k * sps] = if bit { 1.0 } else { -1.0 };
        }

        let freq_signal: Vec<f64> = (0..upsampled_len)
            .map(|i| {
                self.pulse
                    .iter()
                    .enumerate()
                    .take(i + 1)
                    .map(|(j, &tap)| upsampled[i - j] * tap)
                    .sum()
            })
            .collect();

        // h = 0.5; the centered pulse delays by half its length
        let phase_scale = PI / 2.0;
        let delay = (self.pulse.len() - 1) / 2;
        let ramp = self.ramp_samples(total_samples);

        let mut phase = 0.0_f64;
        let mut output = Vec::with_capacity(total_samples);
        for i in 0..total_samples {
            phase += phase_scale * freq_signal.get(i + delay).copied().unwrap_or(0.0);
            let gain = self.config.amplitude * envelope(i, total_samples, ramp);
            output.push(IQSample::from_polar(gain, phase));
        }
        output
    }

    /// Modulate a frame's NRZI line bits.
    pub fn modulate_frame(&self, frame: &TransmissionFrame) -> Vec<IQSample> {
        self.modulate(frame.bits())
    }

    /// Ramps shrink to half the burst when the burst is too short for two
    fn ramp_samples(&self, total_samples: usize) -> usize {
        let ramp = self.config.ramp_symbols * self.config.samples_per_symbol;
        if 2 * ramp > total_samples {
            total_samples / 2
        } else {
            ramp
        }
    }
}

fn envelope(i: usize, total: usize, ramp: usize) -> f64 {
    if ramp == 0 {
        1.0
    } else if i < ramp {
        i as f64 / ramp as f64
    } else if i >= total - ramp {
        (total - 1 - i) as f64 / ramp as f64
    } else {
        1.0
    }
}

/// GMSK demodulator using differential phase detection.
///
/// Recovers line bits by measuring the phase change across one symbol
/// period at symbol centers; used for loopback checks of the modulator.
#[derive(Debug, Clone)]
pub struct GmskDemodulator {
    samples_per_symbol: usize,
}

impl GmskDemodulator {
    pub fn new(samples_per_symbol: usize) -> AisResult<Self> {
        if samples_per_symbol < 1 {
            return Err(AisError::InvalidParameter(
                "samples_per_symbol must be at least 1".into(),
            ));
        }
        Ok(Self { samples_per_symbol })
    }

    pub fn demodulate(&self, samples: &[IQSample]) -> Vec<bool> {
        let sps = self.samples_per_symbol;
        let num_symbols = samples.len() / sps;

        (0..num_symbols)
            .map(|k| {
                let center = k * sps + sps / 2;
                if center >= sps {
                    let diff = samples[center] * samples[center - sps].conj();
                    diff.arg() > 0.0
                } else {
                    // First symbol: absolute phase from the zero start
                    samples[center].arg() > 0.0
                }
            })
            .collect()
    }
}
