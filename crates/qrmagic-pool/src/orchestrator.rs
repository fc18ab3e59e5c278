// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestration: validate the configuration, build the search plan once,
// fan the images out over the worker pool, and aggregate the outcome.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use qrmagic_core::error::{QrmagicError, Result};
use qrmagic_core::{EngineConfig, ImageSource, JobResult, SourceId};
use qrmagic_engine::{BatchSummary, Decoder, JobRecord, SearchEngine};
use serde::Serialize;
use tracing::{info, instrument};

use crate::pool::{CancelHandle, WorkerPool};
use crate::progress::BatchProgress;

/// Every result of one batch, in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    results: Vec<JobResult>,
}

impl BatchOutcome {
    pub(crate) fn new(
        results: Vec<JobResult>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            started_at,
            finished_at,
            results,
        }
    }

    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<JobResult> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The result for `source`; the first one if the image was submitted twice.
    pub fn get(&self, source: &str) -> Option<&JobResult> {
        self.results.iter().find(|r| r.source.as_str() == source)
    }

    /// Results keyed by source. Duplicate sources keep their first result.
    pub fn by_source(&self) -> HashMap<&SourceId, &JobResult> {
        let mut map = HashMap::with_capacity(self.results.len());
        for result in &self.results {
            map.entry(&result.source).or_insert(result);
        }
        map
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_results(&self.results)
    }

    pub fn elapsed(&self) -> chrono::TimeDelta {
        self.finished_at - self.started_at
    }

    pub fn records(&self) -> Vec<JobRecord> {
        self.results.iter().map(JobRecord::from).collect()
    }

    /// One JSON record per line, in completion order.
    pub fn write_ndjson<W: Write>(&self, mut out: W) -> Result<()> {
        for record in self.records() {
            writeln!(out, "{}", record.to_json_line()?)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Top-level entry point for scanning a batch of images.
///
/// Construction validates the configuration and builds the search plan, so
/// a bad configuration is reported before any image is touched.
#[derive(Debug)]
pub struct Orchestrator {
    config: EngineConfig,
    engine: Arc<SearchEngine>,
    cancel: CancelHandle,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, decoder: Arc<dyn Decoder>) -> Result<Self> {
        let engine = SearchEngine::from_config(&config, decoder)?;
        info!(
            mode = ?config.mode,
            strategies = engine.plan().len(),
            concurrency = config.effective_concurrency(),
            decoder = engine.decoder_name(),
            "Orchestrator ready"
        );
        Ok(Self {
            config,
            engine: Arc::new(engine),
            cancel: CancelHandle::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Cancelling this handle cancels the running batch and every later one.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// A fresh pool wired to this orchestrator's engine.
    ///
    /// The pool gets its own batch handle below the orchestrator's, so a
    /// fail-fast stop ends only that batch.
    pub fn pool(&self) -> WorkerPool {
        WorkerPool::new(Arc::clone(&self.engine), self.config.effective_concurrency())
            .with_fail_fast(self.config.fail_fast)
            .with_cancel_handle(self.cancel.child())
    }

    pub async fn run(&self, sources: impl IntoIterator<Item = ImageSource>) -> BatchOutcome {
        self.run_with_progress(sources, |_| {}).await
    }

    #[instrument(skip_all)]
    pub async fn run_with_progress<F>(
        &self,
        sources: impl IntoIterator<Item = ImageSource>,
        on_progress: F,
    ) -> BatchOutcome
    where
        F: FnMut(&BatchProgress),
    {
        let mut pool = self.pool();
        for source in sources {
            pool.submit(source);
        }
        pool.collect(on_progress).await
    }

    /// Run a batch from synchronous code on a dedicated tokio runtime.
    ///
    /// Returns `QrmagicError::Worker` when called from inside a tokio
    /// runtime; async callers use [`run`](Self::run) instead.
    pub fn run_blocking(
        &self,
        sources: impl IntoIterator<Item = ImageSource>,
    ) -> Result<BatchOutcome> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(QrmagicError::Worker(
                "run_blocking called from inside a tokio runtime; await run() instead".into(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .max_blocking_threads(self.config.effective_concurrency())
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.run(sources)))
    }
}
