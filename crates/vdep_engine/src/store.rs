//! Persisted combined reports.
//!
//! The combined report of the latest pass is written next to the artifacts
//! so a consumer process can answer alias and closure queries without
//! regenerating. The file carries a header with magic bytes, a format
//! version, and a checksum; any mismatch reads as a miss.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use vdep_common::ContentHash;

use crate::combine::CombinedReport;
use crate::error::EngineError;

/// File name of the persisted report inside the destination.
pub const REPORT_FILE: &str = "report.bin";

/// Magic bytes identifying a vdep report snapshot.
const REPORT_MAGIC: [u8; 4] = *b"VDEP";

/// Current snapshot format version. Increment on breaking changes to the
/// header or payload format.
const REPORT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every snapshot for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReportHeader {
    magic: [u8; 4],
    format_version: u32,
    vdep_version: String,
    checksum: ContentHash,
}

/// Reads and writes the combined report snapshot of one destination.
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    /// Creates a store for `<destination>/report.bin`.
    pub fn new(destination: &Path) -> Self {
        Self {
            path: destination.join(REPORT_FILE),
        }
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `combined`, replacing any previous snapshot.
    pub fn save(&self, combined: &CombinedReport) -> Result<(), EngineError> {
        let payload = bincode::serde::encode_to_vec(combined, bincode::config::standard())
            .map_err(|e| EngineError::Serialization {
                reason: e.to_string(),
            })?;

        let header = ReportHeader {
            magic: REPORT_MAGIC,
            format_version: REPORT_FORMAT_VERSION,
            vdep_version: env!("CARGO_PKG_VERSION").to_string(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| EngineError::Serialization {
                reason: e.to_string(),
            })?;

        // 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
        }
        std::fs::write(&self.path, &output).map_err(|e| EngineError::io(&self.path, e))?;
        debug!(path = %self.path.display(), version = %combined.version, "saved report snapshot");
        Ok(())
    }

    /// Reads the snapshot.
    ///
    /// Returns `None` if the file is missing, truncated, from another format
    /// version, or fails its checksum.
    pub fn load(&self) -> Option<CombinedReport> {
        let raw = std::fs::read(&self.path).ok()?;
        if raw.len() < 4 {
            return None;
        }

        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let (header, _): (ReportHeader, usize) =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?;
        if header.magic != REPORT_MAGIC || header.format_version != REPORT_FORMAT_VERSION {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }

        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .ok()
            .map(|(combined, _)| combined)
    }
}
