// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch progress counters, emitted after every completed job.

use qrmagic_core::{JobResult, JobStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub no_barcode: usize,
    /// Load errors, including panicked workers.
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Count one finished job.
    pub fn record(&mut self, result: &JobResult) {
        self.completed += 1;
        match result.status {
            JobStatus::Success => self.succeeded += 1,
            JobStatus::NoBarcodeFound => self.no_barcode += 1,
            JobStatus::LoadError => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }

    /// Completion percentage, 0 to 100. An empty batch is complete.
    pub fn percentage(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            (self.completed * 100) / self.total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn counts_by_status() {
        let mut progress = BatchProgress::new(4);
        progress.record(&JobResult::load_error("a.jpg".into(), "bad", Duration::ZERO));
        progress.record(&JobResult::cancelled("b.jpg".into()));
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.cancelled, 1);
        assert_eq!(progress.percentage(), 50);
        assert!(!progress.is_finished());
    }

    #[test]
    fn empty_batch_is_finished() {
        let progress = BatchProgress::new(0);
        assert!(progress.is_finished());
        assert_eq!(progress.percentage(), 100);
    }
}
