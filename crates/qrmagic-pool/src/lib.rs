// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// qrmagic-pool — Parallel batch scanning.
//
// Runs one search per image on tokio's blocking threads behind a fixed-size
// semaphore, with a shared cancel flag, per-job progress events, and a batch
// outcome that keeps results in completion order.

pub mod orchestrator;
pub mod pool;
pub mod progress;

#[cfg(test)]
pub(crate) mod testutil;

pub use orchestrator::{BatchOutcome, Orchestrator};
pub use pool::{CancelHandle, WorkerPool};
pub use progress::BatchProgress;
