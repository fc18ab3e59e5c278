// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Worker pool — runs one search per image on tokio's blocking threads.
//
// A semaphore sized by the configured concurrency gates how many jobs run at
// once. Jobs are dispatched in submission order and their results are drained
// from a `JoinSet` in completion order. Cancellation is a single shared flag
// checked before each dispatch; jobs already running are left to finish.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use qrmagic_core::error::QrmagicError;
use qrmagic_core::{ImageSource, JobResult, JobStatus, SourceId};
use qrmagic_engine::SearchEngine;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, instrument, warn};

use crate::orchestrator::BatchOutcome;
use crate::progress::BatchProgress;

/// Shared cancellation flag for a batch.
///
/// Cloning yields another handle to the same flag. Once set it stays set.
/// A [`child`](Self::child) handle also reports cancellation when its parent
/// is cancelled, but cancelling the child leaves the parent untouched.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    parent: Option<Box<CancelHandle>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh flag scoped below this one.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Jobs that have not started yet will complete as `Cancelled`.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}

/// Fixed-size pool of search workers.
pub struct WorkerPool {
    engine: Arc<SearchEngine>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    cancel: CancelHandle,
    fail_fast: bool,
    queue: VecDeque<ImageSource>,
}

impl WorkerPool {
    // -- Construction ---------------------------------------------------------

    /// A pool running at most `concurrency` jobs at once (at least one).
    pub fn new(engine: Arc<SearchEngine>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            engine,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            cancel: CancelHandle::new(),
            fail_fast: false,
            queue: VecDeque::new(),
        }
    }

    /// Trigger the cancel handle on the first `LoadError`.
    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Use `cancel` instead of the pool's own handle. Fail-fast trips this
    /// handle, so pass a [`CancelHandle::child`] to keep it from reaching
    /// other batches.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    // -- Accessors ------------------------------------------------------------

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Jobs submitted but not yet collected.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    // -- Jobs -----------------------------------------------------------------

    /// Queue one image. Jobs start when `collect` is awaited.
    pub fn submit(&mut self, source: ImageSource) {
        debug!(source = %source.id(), "Job submitted");
        self.queue.push_back(source);
    }

    /// Run every queued job and gather the results.
    ///
    /// `on_progress` is called once per finished job, in completion order.
    /// Every submitted image yields exactly one result.
    #[instrument(skip_all, fields(jobs = self.queue.len(), concurrency = self.concurrency))]
    pub async fn collect<F>(&mut self, mut on_progress: F) -> BatchOutcome
    where
        F: FnMut(&BatchProgress),
    {
        let started_at = Utc::now();
        let mut progress = BatchProgress::new(self.queue.len());
        let mut results: Vec<JobResult> = Vec::with_capacity(progress.total);
        let mut running: JoinSet<JobResult> = JoinSet::new();
        let mut in_flight: HashMap<Id, SourceId> = HashMap::new();

        info!("Batch started");

        let mut finish = |result: JobResult| {
            progress.record(&result);
            on_progress(&progress);
            results.push(result);
        };

        loop {
            while let Some(source) = self.queue.pop_front() {
                if self.cancel.is_cancelled() {
                    debug!(source = %source.id(), "Job cancelled before start");
                    finish(JobResult::cancelled(source.id()));
                    continue;
                }
                let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
                    self.queue.push_front(source);
                    break;
                };
                let engine = Arc::clone(&self.engine);
                let source_id = source.id();
                let handle = running.spawn_blocking(move || {
                    let _permit = permit;
                    engine.process(&source)
                });
                in_flight.insert(handle.id(), source_id);
            }

            let Some(joined) = running.join_next_with_id().await else {
                break;
            };
            let result = match joined {
                Ok((id, result)) => {
                    in_flight.remove(&id);
                    result
                }
                Err(err) => {
                    let source = in_flight
                        .remove(&err.id())
                        .unwrap_or_else(|| SourceId::from("<unknown>"));
                    warn!(source = %source, error = %err, "Worker failed");
                    JobResult::load_error(
                        source,
                        QrmagicError::Worker(err.to_string()),
                        Duration::ZERO,
                    )
                }
            };

            if self.fail_fast
                && result.status == JobStatus::LoadError
                && !self.cancel.is_cancelled()
            {
                warn!(source = %result.source, "Fail-fast: cancelling remaining jobs");
                self.cancel.cancel();
            }
            finish(result);
        }

        let outcome = BatchOutcome::new(results, started_at, Utc::now());
        info!(summary = %outcome.summary(), "Batch finished");
        outcome
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("engine", &self.engine)
            .field("concurrency", &self.concurrency)
            .field("fail_fast", &self.fail_fast)
            .field("pending", &self.queue.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
