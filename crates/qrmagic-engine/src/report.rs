// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result reporting — one ND-JSON record per image plus a batch summary.

use std::fmt;
use std::time::Duration;

use qrmagic_core::error::Result;
use qrmagic_core::{JobResult, JobStatus};
use serde::{Deserialize, Serialize};

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// One attempt as it appears in a report line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptEntry {
    pub strategy: String,
    pub payloads: Vec<String>,
    pub elapsed_ms: f64,
}

/// Serializable record of one job, written as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub source: String,
    pub job_id: String,
    /// Sorted, de-duplicated.
    pub payloads: Vec<String>,
    pub status: JobStatus,
    /// Label of the first strategy that decoded anything.
    pub winning_strategy: Option<String>,
    pub attempts: Vec<AttemptEntry>,
    pub load_elapsed_ms: f64,
    /// Sum of the attempts' `elapsed_ms`.
    pub total_elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// Compact JSON without a trailing newline.
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<&JobResult> for JobRecord {
    fn from(result: &JobResult) -> Self {
        let attempts: Vec<AttemptEntry> = result
            .attempts
            .iter()
            .map(|a| AttemptEntry {
                strategy: a.strategy.clone(),
                payloads: a.payloads.iter().cloned().collect(),
                elapsed_ms: millis(a.elapsed),
            })
            .collect();
        let total_elapsed_ms = attempts.iter().map(|a| a.elapsed_ms).sum();
        Self {
            source: result.source.to_string(),
            job_id: result.job_id.to_string(),
            payloads: result.payloads.iter().cloned().collect(),
            status: result.status,
            winning_strategy: result.winning_attempt().map(|a| a.strategy.clone()),
            attempts,
            load_elapsed_ms: millis(result.load_elapsed),
            total_elapsed_ms,
            error: result.error.clone(),
        }
    }
}

/// Per-status counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub no_barcode_found: usize,
    pub load_error: usize,
    pub cancelled: usize,
    /// Distinct payloads summed per image.
    pub payloads: usize,
}

impl BatchSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a JobResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            summary.payloads += result.payloads.len();
            match result.status {
                JobStatus::Success => summary.success += 1,
                JobStatus::NoBarcodeFound => summary.no_barcode_found += 1,
                JobStatus::LoadError => summary.load_error += 1,
                JobStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images: {} decoded ({} payloads), {} without barcode, {} failed to load",
            self.total, self.success, self.payloads, self.no_barcode_found, self.load_error
        )?;
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrmagic_core::{AttemptRecord, PayloadSet};

    fn attempt(index: usize, micros: u64, payloads: &[&str]) -> AttemptRecord {
        AttemptRecord {
            strategy_index: index,
            strategy: format!("scale=0.{}", index + 1),
            payloads: payloads.iter().map(|p| p.to_string()).collect(),
            elapsed: Duration::from_micros(micros),
            cumulative: Duration::ZERO,
        }
    }

    fn found() -> JobResult {
        let payloads: PayloadSet = ["KM-9".to_string(), "KM-10".to_string()].into_iter().collect();
        JobResult::searched(
            "tray/IMG_0101.jpg".into(),
            payloads,
            vec![
                attempt(0, 1_500, &[]),
                attempt(1, 2_250, &["KM-9", "KM-10"]),
            ],
            Duration::from_millis(12),
        )
    }

    #[test]
    fn record_carries_sorted_payloads_and_winner() {
        let record = JobRecord::from(&found());
        assert_eq!(record.payloads, vec!["KM-10", "KM-9"]);
        assert_eq!(record.status, JobStatus::Success);
        assert_eq!(record.winning_strategy.as_deref(), Some("scale=0.2"));
        assert_eq!(record.attempts.len(), 2);
        assert!((record.total_elapsed_ms - 3.75).abs() < 1e-9);
        assert!((record.load_elapsed_ms - 12.0).abs() < 1e-9);
    }

    #[test]
    fn total_equals_sum_of_attempts() {
        let record = JobRecord::from(&found());
        let sum: f64 = record.attempts.iter().map(|a| a.elapsed_ms).sum();
        assert_eq!(record.total_elapsed_ms, sum);
    }

    #[test]
    fn json_line_is_single_line_and_parses_back() {
        let record = JobRecord::from(&found());
        let line = record.to_json_line().unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains(r#""status":"success""#));
        assert!(!line.contains(r#""error""#));
        let back: JobRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn load_error_record_keeps_message() {
        let failed = JobResult::load_error("bad.jpg".into(), "truncated", Duration::ZERO);
        let record = JobRecord::from(&failed);
        assert_eq!(record.status, JobStatus::LoadError);
        assert_eq!(record.error.as_deref(), Some("truncated"));
        assert!(record.winning_strategy.is_none());
        assert_eq!(record.total_elapsed_ms, 0.0);
    }

    #[test]
    fn summary_counts_each_status() {
        let results = vec![
            found(),
            JobResult::searched("blank.jpg".into(), PayloadSet::new(), vec![], Duration::ZERO),
            JobResult::load_error("bad.jpg".into(), "truncated", Duration::ZERO),
            JobResult::cancelled("late.jpg".into()),
        ];
        let summary = BatchSummary::from_results(&results);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.no_barcode_found, 1);
        assert_eq!(summary.load_error, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.payloads, 2);
        assert_eq!(
            summary.to_string(),
            "4 images: 1 decoded (2 payloads), 1 without barcode, 1 failed to load, 1 cancelled"
        );
    }
}
