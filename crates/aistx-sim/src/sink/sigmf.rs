//! # SigMF recording sink
//!
//! Appends every burst to one recording:
//!
//! - **Data file** (`<base>.sigmf-data`): `cf32_le` samples, bursts back to back
//! - **Metadata file** (`<base>.sigmf-meta`): JSON with one capture segment
//!   per burst (carrying its channel frequency) and one annotation per burst
//!   labelled with MMSI, message type and channel
//!
//! Metadata is written when the sink is closed.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Sink, SinkError, SinkInput, SinkResult, Transmission};

/// SigMF global metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigMfGlobal {
    #[serde(rename = "core:datatype")]
    pub datatype: String,

    #[serde(rename = "core:sample_rate")]
    pub sample_rate: f64,

    #[serde(rename = "core:version")]
    pub version: String,

    #[serde(rename = "core:num_channels", skip_serializing_if = "Option::is_none")]
    pub num_channels: Option<u32>,

    #[serde(rename = "core:description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "core:author", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(rename = "core:datetime", skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(rename = "core:hw", skip_serializing_if = "Option::is_none")]
    pub hw: Option<String>,

    #[serde(flatten)]
    pub extensions: HashMap<String, serde_json::Value>,
}

/// SigMF capture segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigMfCapture {
    #[serde(rename = "core:sample_start")]
    pub sample_start: u64,

    /// Center frequency in Hz
    #[serde(rename = "core:frequency", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,

    #[serde(rename = "core:datetime", skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
}

/// SigMF annotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigMfAnnotation {
    #[serde(rename = "core:sample_start")]
    pub sample_start: u64,

    #[serde(rename = "core:sample_count")]
    pub sample_count: u64,

    #[serde(rename = "core:label", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(rename = "core:comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(flatten)]
    pub extensions: HashMap<String, serde_json::Value>,
}

/// Complete SigMF metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigMfMeta {
    pub global: SigMfGlobal,
    pub captures: Vec<SigMfCapture>,
    pub annotations: Vec<SigMfAnnotation>,
}

impl SigMfMeta {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            global: SigMfGlobal {
                datatype: "cf32_le".to_string(),
                sample_rate,
                version: "1.0.0".to_string(),
                num_channels: Some(1),
                description: Some("AIS fleet transmissions".to_string()),
                author: Some("aistx".to_string()),
                datetime: Some(chrono::Utc::now().to_rfc3339()),
                hw: None,
                extensions: HashMap::new(),
            },
            captures: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

/// File-backed I/Q sink
pub struct SigMfSink {
    name: String,
    meta: SigMfMeta,
    data_file: Option<BufWriter<File>>,
    base_path: PathBuf,
    samples_written: u64,
}

impl SigMfSink {
    /// Create a recording. Pass the base name without extension.
    pub fn create<P: AsRef<Path>>(path: P, sample_rate: f64) -> SinkResult<Self> {
        let base_path = path.as_ref().to_path_buf();
        let data_path = base_path.with_extension("sigmf-data");
        let data_file = File::create(&data_path).map_err(|e| {
            SinkError::Io(format!("failed to create {}: {}", data_path.display(), e))
        })?;

        Ok(Self {
            name: format!("sigmf:{}", base_path.display()),
            meta: SigMfMeta::new(sample_rate),
            data_file: Some(BufWriter::new(data_file)),
            base_path,
            samples_written: 0,
        })
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn meta(&self) -> &SigMfMeta {
        &self.meta
    }

    pub fn meta_path(&self) -> PathBuf {
        self.base_path.with_extension("sigmf-meta")
    }

    pub fn data_path(&self) -> PathBuf {
        self.base_path.with_extension("sigmf-data")
    }
}

impl Sink for SigMfSink {
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
            .ok_or_else(|| SinkError::Unsupported("SigMF sink needs I/Q samples".into()))?;
        let file = self.data_file.as_mut().ok_or(SinkError::Closed)?;

        let mut bytes = Vec::with_capacity(burst.samples.len() * 8);
        for s in &burst.samples {
            bytes.extend_from_slice(&s.re.to_le_bytes());
            bytes.extend_from_slice(&s.im.to_le_bytes());
        }
        file.write_all(&bytes)?;

        let start = self.samples_written;
        let count = burst.samples.len() as u64;
        self.meta.captures.push(SigMfCapture {
            sample_start: start,
            frequency: Some(burst.center_frequency),
            datetime: None,
        });
        let mut extensions = HashMap::new();
        extensions.insert("aistx:mmsi".to_string(), serde_json::Value::from(tx.mmsi));
        extensions.insert("aistx:slot".to_string(), serde_json::Value::from(tx.slot));
        self.meta.annotations.push(SigMfAnnotation {
            sample_start: start,
            sample_count: count,
            label: Some(tx.label()),
            comment: tx.nmea.first().map(|s| s.trim_end().to_string()),
            extensions,
        });
        self.samples_written += count;
        debug!(mmsi = tx.mmsi, samples = count, "burst recorded");
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        let Some(mut file) = self.data_file.take() else {
            return Ok(());
        };
        file.flush()?;

        let meta_path = self.meta_path();
        let meta_file = File::create(&meta_path).map_err(|e| {
            SinkError::Io(format!("failed to create {}: {}", meta_path.display(), e))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(meta_file), &self.meta)
            .map_err(|e| SinkError::Io(format!("failed to write metadata: {}", e)))?;
        Ok(())
    }
}

impl Drop for SigMfSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
