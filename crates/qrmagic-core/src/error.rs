// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for qrmagic.

use thiserror::Error;

/// Top-level error type for all qrmagic operations.
///
/// Finding no barcode is not an error: it is the `NoBarcodeFound` job status.
#[derive(Debug, Error)]
pub enum QrmagicError {
    // -- Per-job errors --
    #[error("failed to load image {source_id}: {reason}")]
    Load { source_id: String, reason: String },

    // -- Startup errors --
    #[error("invalid configuration: {0}")]
    Configuration(String),

    // -- Orchestration --
    #[error("worker pool error: {0}")]
    Worker(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QrmagicError {
    /// Build a `Load` error for the given source.
    pub fn load(source_id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Load {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error aborts before any job runs.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Serialization(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QrmagicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_message_names_source() {
        let err = QrmagicError::load("IMG_0042.jpg", "unsupported format");
        assert_eq!(
            err.to_string(),
            "failed to load image IMG_0042.jpg: unsupported format"
        );
        assert!(!err.is_fatal_at_startup());
    }

    #[test]
    fn configuration_error_is_fatal() {
        let err = QrmagicError::Configuration("scale_plan is empty".into());
        assert!(err.is_fatal_at_startup());
    }
}
