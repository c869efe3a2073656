//! Binary artifact for a `TrainedPipeline`.
//!
//! Layout (bincode):
//!
//! ```text
//! Envelope { magic: "SALP", format_version, metadata, checksum: sha256(payload) as hex, payload }
//! payload = bincode(TrainedPipeline)
//! ```
//!
//! Loading rejects wrong magic, unknown format versions, checksum mismatches,
//! undecodable payloads, metadata that disagrees with the payload, and
//! pipelines whose transformer and forest disagree on feature width.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::forest::ForestParams;
use crate::pipeline::TrainedPipeline;

pub const ARTIFACT_MAGIC: [u8; 4] = *b"SALP";
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Upper bound on decoded sizes, so a corrupt length prefix cannot trigger a
/// huge allocation.
const MAX_ARTIFACT_BYTES: u64 = 512 * 1024 * 1024;

/// Human-facing description of an artifact, stored beside the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub crate_version: String,
    pub trained_at: DateTime<Utc>,
    pub n_rows: usize,
    pub feature_names: Vec<String>,
    pub forest: ForestParams,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 4],
    format_version: u32,
    metadata: ArtifactMetadata,
    checksum: String,
    payload: Vec<u8>,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_ARTIFACT_BYTES)
}

fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn persistence(context: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Persistence(format!("{context}: {err}"))
}

impl TrainedPipeline {
    pub fn metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            crate_version: self.info().crate_version.clone(),
            trained_at: self.info().trained_at,
            n_rows: self.info().n_rows,
            feature_names: self.transformer().feature_names(),
            forest: self.forest().params().clone(),
        }
    }

    /// Encode the pipeline as a self-checking binary blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = codec()
            .serialize(self)
            .map_err(|e| persistence("failed to encode pipeline", e))?;
        let envelope = Envelope {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            metadata: self.metadata(),
            checksum: checksum(&payload),
            payload,
        };
        codec()
            .serialize(&envelope)
            .map_err(|e| persistence("failed to encode artifact", e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: Envelope = codec()
            .deserialize(bytes)
            .map_err(|e| persistence("unreadable artifact", e))?;

        if envelope.magic != ARTIFACT_MAGIC {
            return Err(PipelineError::Persistence(
                "not a salary pipeline artifact (bad magic)".into(),
            ));
        }
        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PipelineError::Persistence(format!(
                "unsupported artifact format version {} (expected {ARTIFACT_FORMAT_VERSION})",
                envelope.format_version
            )));
        }
        if checksum(&envelope.payload) != envelope.checksum {
            return Err(PipelineError::Persistence(
                "checksum mismatch, artifact is corrupted".into(),
            ));
        }

        let pipeline: TrainedPipeline = codec()
            .deserialize(&envelope.payload)
            .map_err(|e| persistence("incompatible pipeline payload", e))?;
        pipeline
            .check_consistency()
            .map_err(|e| persistence("inconsistent pipeline", e))?;
        if pipeline.metadata() != envelope.metadata {
            return Err(PipelineError::Persistence(
                "artifact metadata does not match its payload".into(),
            ));
        }
        Ok(pipeline)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let file = File::create(path)
            .map_err(|e| persistence(&format!("failed to create '{}'", path.display()), e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| persistence(&format!("failed to write '{}'", path.display()), e))?;

        info!(path = %path.display(), bytes = bytes.len(), "pipeline saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| persistence(&format!("failed to read '{}'", path.display()), e))?;
        let pipeline = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            trees = pipeline.forest().n_trees(),
            width = pipeline.transformer().width(),
            "pipeline loaded"
        );
        Ok(pipeline)
    }
}
