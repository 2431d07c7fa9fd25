//! cu-logging: NDJSON decision/leg events and JSON snapshot persistence.
//!
//! Events carry plain strings and numbers only, so log readers need nothing from the engine
//! crates to consume them.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event schema version written into every event.
pub const LOG_SCHEMA_VERSION: u32 = 1;

pub fn now_ms() -> u64 {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    d.as_millis() as u64
}

pub fn hash_config_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Read a JSON document written by [`write_json_atomic`].
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, NdjsonError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice::<T>(&bytes)?)
}

/// Write pretty JSON through a sibling `.tmp` file and a rename, so readers never see a
/// half-written document.
pub fn write_json_atomic<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), NdjsonError> {
    let path = path.as_ref();
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfoV1 {
    pub log_schema_version: u32,
    pub engine_version: String,
    /// blake3 of the YAML config the session was started from, if any.
    pub config_hash: Option<String>,
}

impl VersionInfoV1 {
    pub fn new(engine_version: &str, config_hash: Option<String>) -> Self {
        Self {
            log_schema_version: LOG_SCHEMA_VERSION,
            engine_version: engine_version.to_string(),
            config_hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedOptionV1 {
    pub action: String,
    pub ev: f64,
    pub variance: f64,
}

/// One optimizer consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEventV1 {
    pub event: String,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub session_id: String,
    pub leg: u32,
    pub player: u8,
    /// Racing colors front to back.
    pub ranking: Vec<String>,
    pub dice_left: u8,

    /// `exact` or `sampled`.
    pub precision: String,
    pub samples: Option<u32>,
    pub branches: u64,

    /// Best first.
    pub options: Vec<RankedOptionV1>,
    /// What the player went on to do, if known.
    pub chosen: Option<String>,
}

/// A leg settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegEventV1 {
    pub event: String,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub session_id: String,
    pub leg: u32,
    pub ranking: Vec<String>,
    /// Coins per player after settlement.
    pub coins: Vec<i32>,
    pub race_finished: bool,
}

#[derive(Debug, Error)]
pub enum NdjsonError {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append. Creates it if it doesn't exist.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, NdjsonError> {
        Self::open_append_with_flush(path, 0)
    }

    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(
        path: impl AsRef<Path>,
        flush_every_lines: u64,
    ) -> Result<Self, NdjsonError> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), NdjsonError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NdjsonError> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}

impl Drop for NdjsonWriter {
    fn drop(&mut self) {
        let _ = self.w.flush();
    }
}
