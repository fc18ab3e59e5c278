// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the qrmagic barcode recovery engine.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Decoded payloads: de-duplicated and lexicographically sorted.
pub type PayloadSet = BTreeSet<String>;

/// Unique identifier for a scan job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an input image (file path or content hash).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where the bytes of an image come from. Loading happens inside the worker.
#[derive(Clone)]
pub enum ImageSource {
    /// An image file on disk.
    Path(PathBuf),
    /// An already-read, still-encoded image buffer (JPEG, PNG, ...).
    Memory { id: SourceId, bytes: Arc<[u8]> },
}

impl ImageSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Wrap an encoded buffer, identified by the SHA-256 of its contents.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let digest = Sha256::digest(&bytes);
        let id = format!("sha256:{}", &hex::encode(digest)[..16]);
        Self::Memory {
            id: SourceId(id),
            bytes,
        }
    }

    /// Wrap an encoded buffer under a caller-supplied name (e.g. an upload filename).
    pub fn named_bytes(id: impl Into<SourceId>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Memory {
            id: id.into(),
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> SourceId {
        match self {
            Self::Path(path) => SourceId(path.display().to_string()),
            Self::Memory { id, .. } => id.clone(),
        }
    }
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Memory { id, bytes } => f
                .debug_struct("Memory")
                .field("id", id)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

/// One image transform. Pure data; applied by the engine's transform library.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformStep {
    /// Proportional resize by `factor`.
    Scale { factor: f32 },
    /// Stretch the luminance histogram to the full 0..=255 range.
    Contrast,
    /// Unsharp blend: 1.0 is identity, >1 sharpens, <1 blurs.
    Sharpen { amount: f32 },
    /// Rotate about the centre, expanding the canvas.
    Rotate { degrees: f32 },
    /// Crop an overlapping window `2/divisions` wide at grid cell (`col`, `row`).
    Tile { col: u32, row: u32, divisions: u32 },
}

impl TransformStep {
    /// Relative computational cost; cheaper steps are tried first.
    pub fn cost_rank(&self) -> u8 {
        match self {
            Self::Scale { .. } => 0,
            Self::Contrast => 1,
            Self::Sharpen { .. } => 2,
            Self::Tile { .. } => 3,
            Self::Rotate { .. } => 4,
        }
    }

    /// Stable human-readable label, e.g. `scale=0.5` or `rotate=30`.
    pub fn label(&self) -> String {
        match self {
            Self::Scale { factor } => format!("scale={factor}"),
            Self::Contrast => "contrast".to_owned(),
            Self::Sharpen { amount } => format!("sharpen={amount}"),
            Self::Rotate { degrees } => format!("rotate={degrees}"),
            Self::Tile {
                col,
                row,
                divisions,
            } => format!("tile={col}x{row}/{divisions}"),
        }
    }
}

/// An ordered combination of transforms followed by one decode attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strategy {
    pub steps: Vec<TransformStep>,
}

impl Strategy {
    pub fn new(steps: Vec<TransformStep>) -> Self {
        Self { steps }
    }

    /// Step labels joined with `+`; the empty strategy is `original`.
    pub fn label(&self) -> String {
        if self.steps.is_empty() {
            return "original".to_owned();
        }
        self.steps
            .iter()
            .map(TransformStep::label)
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Highest cost rank among the steps (0 for the empty strategy).
    pub fn cost_rank(&self) -> u8 {
        self.steps
            .iter()
            .map(TransformStep::cost_rank)
            .max()
            .unwrap_or(0)
    }

    /// The factor of a leading `Scale` step, if any.
    pub fn leading_scale(&self) -> Option<f32> {
        match self.steps.first() {
            Some(TransformStep::Scale { factor }) => Some(*factor),
            _ => None,
        }
    }
}

/// Outcome of one strategy against one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Position of the strategy in the search plan.
    pub strategy_index: usize,
    pub strategy: String,
    pub payloads: PayloadSet,
    /// Transform + decode wall time for this attempt.
    pub elapsed: Duration,
    /// Sum of `elapsed` over this and every earlier attempt of the job.
    pub cumulative: Duration,
}

/// Terminal status of a scan job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// At least one payload was decoded.
    Success,
    /// Every strategy ran (or fast mode had nothing to stop on) without a decode.
    NoBarcodeFound,
    /// The image bytes could not be decoded into pixels.
    LoadError,
    /// The batch was cancelled before this job started.
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoBarcodeFound => "no_barcode_found",
            Self::LoadError => "load_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything learned about one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    pub source: SourceId,
    /// Union of payloads over all attempts.
    pub payloads: PayloadSet,
    pub attempts: Vec<AttemptRecord>,
    /// Time spent decoding the file into pixels (not part of `total_elapsed`).
    pub load_elapsed: Duration,
    pub status: JobStatus,
    pub error: Option<String>,
}

impl JobResult {
    /// Build a searched result; the status follows from the payload set.
    pub fn searched(
        source: SourceId,
        payloads: PayloadSet,
        attempts: Vec<AttemptRecord>,
        load_elapsed: Duration,
    ) -> Self {
        let status = if payloads.is_empty() {
            JobStatus::NoBarcodeFound
        } else {
            JobStatus::Success
        };
        Self {
            job_id: JobId::new(),
            source,
            payloads,
            attempts,
            load_elapsed,
            status,
            error: None,
        }
    }

    pub fn load_error(
        source: SourceId,
        error: impl std::fmt::Display,
        load_elapsed: Duration,
    ) -> Self {
        Self {
            job_id: JobId::new(),
            source,
            payloads: PayloadSet::new(),
            attempts: Vec::new(),
            load_elapsed,
            status: JobStatus::LoadError,
            error: Some(error.to_string()),
        }
    }

    pub fn cancelled(source: SourceId) -> Self {
        Self {
            job_id: JobId::new(),
            source,
            payloads: PayloadSet::new(),
            attempts: Vec::new(),
            load_elapsed: Duration::ZERO,
            status: JobStatus::Cancelled,
            error: None,
        }
    }

    /// Sum of attempt times.
    pub fn total_elapsed(&self) -> Duration {
        self.attempts.iter().map(|a| a.elapsed).sum()
    }

    /// The first attempt that produced a payload.
    pub fn winning_attempt(&self) -> Option<&AttemptRecord> {
        self.attempts.iter().find(|a| !a.payloads.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(
        index: usize,
        elapsed_ms: u64,
        cumulative_ms: u64,
        payloads: &[&str],
    ) -> AttemptRecord {
        AttemptRecord {
            strategy_index: index,
            strategy: format!("s{index}"),
            payloads: payloads.iter().map(|p| p.to_string()).collect(),
            elapsed: Duration::from_millis(elapsed_ms),
            cumulative: Duration::from_millis(cumulative_ms),
        }
    }

    #[test]
    fn strategy_labels() {
        assert_eq!(Strategy::new(vec![]).label(), "original");
        let s = Strategy::new(vec![
            TransformStep::Scale { factor: 0.5 },
            TransformStep::Sharpen { amount: 1.5 },
        ]);
        assert_eq!(s.label(), "scale=0.5+sharpen=1.5");
        assert_eq!(s.leading_scale(), Some(0.5));
        assert_eq!(s.cost_rank(), 2);
        let tile = TransformStep::Tile {
            col: 2,
            row: 3,
            divisions: 6,
        };
        assert_eq!(tile.label(), "tile=2x3/6");
    }

    #[test]
    fn cost_rank_orders_cheapest_first() {
        let mut steps = vec![
            TransformStep::Rotate { degrees: 10.0 },
            TransformStep::Sharpen { amount: 0.5 },
            TransformStep::Contrast,
            TransformStep::Scale { factor: 0.2 },
        ];
        steps.sort_by_key(TransformStep::cost_rank);
        assert_eq!(steps[0], TransformStep::Scale { factor: 0.2 });
        assert_eq!(steps[3], TransformStep::Rotate { degrees: 10.0 });
    }

    #[test]
    fn step_serializes_as_tagged_variant() {
        let json = serde_json::to_string(&TransformStep::Scale { factor: 0.5 }).unwrap();
        assert_eq!(json, r#"{"op":"scale","factor":0.5}"#);
        let back: TransformStep = serde_json::from_str(r#"{"op":"contrast"}"#).unwrap();
        assert_eq!(back, TransformStep::Contrast);
    }

    #[test]
    fn searched_status_follows_payloads() {
        let empty = JobResult::searched("a.jpg".into(), PayloadSet::new(), vec![], Duration::ZERO);
        assert_eq!(empty.status, JobStatus::NoBarcodeFound);

        let payloads: PayloadSet = ["KM-0001".to_string()].into_iter().collect();
        let found = JobResult::searched(
            "a.jpg".into(),
            payloads,
            vec![attempt(0, 3, 3, &[]), attempt(1, 4, 7, &["KM-0001"])],
            Duration::from_millis(10),
        );
        assert_eq!(found.status, JobStatus::Success);
        assert_eq!(found.total_elapsed(), Duration::from_millis(7));
        assert_eq!(found.winning_attempt().map(|a| a.strategy_index), Some(1));
    }

    #[test]
    fn byte_sources_are_content_addressed() {
        let a = ImageSource::from_bytes(b"hello".to_vec());
        let b = ImageSource::from_bytes(b"hello".to_vec());
        let c = ImageSource::from_bytes(b"world".to_vec());
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert!(a.id().as_str().starts_with("sha256:"));
        assert_eq!(a.id().as_str().len(), "sha256:".len() + 16);

        let named = ImageSource::named_bytes("upload.jpg", b"x".to_vec());
        assert_eq!(named.id().as_str(), "upload.jpg");
        assert!(format!("{named:?}").contains("len: 1"));
    }

    #[test]
    fn cancelled_result_is_empty() {
        let r = JobResult::cancelled("late.jpg".into());
        assert_eq!(r.status, JobStatus::Cancelled);
        assert!(r.payloads.is_empty());
        assert_eq!(r.total_elapsed(), Duration::ZERO);
    }
}
