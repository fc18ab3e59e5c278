// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Strategy search engine — walks the search plan against one image, feeding
// each candidate view to the decoder and accumulating payloads.
//
// The engine is sequential and pure with respect to its inputs; parallelism
// lives in the worker pool, which runs one engine call per job.

use std::sync::Arc;
use std::time::{Duration, Instant};

use qrmagic_core::error::Result;
use qrmagic_core::{
    AttemptRecord, EngineConfig, ImageSource, JobResult, PayloadSet, SearchMode, Strategy,
};
use tracing::{debug, info, instrument, warn};

use crate::decode::Decoder;
use crate::image::transform;
use crate::image::view::ImageView;
use crate::search::plan::SearchPlan;

/// Payloads and per-attempt diagnostics from one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Union over all attempts.
    pub payloads: PayloadSet,
    /// In plan order. Strategies skipped by the size floor are absent.
    pub attempts: Vec<AttemptRecord>,
}

/// Runs the search plan for one image at a time.
///
/// Cheap to share: the plan and decoder sit behind `Arc`s and nothing is
/// mutated during a search.
#[derive(Clone)]
pub struct SearchEngine {
    plan: Arc<SearchPlan>,
    decoder: Arc<dyn Decoder>,
    mode: SearchMode,
    min_side_px: u32,
}

impl SearchEngine {
    // -- Construction ---------------------------------------------------------

    pub fn new(plan: Arc<SearchPlan>, decoder: Arc<dyn Decoder>, mode: SearchMode) -> Self {
        Self {
            plan,
            decoder,
            mode,
            min_side_px: 0,
        }
    }

    /// Build the plan from `config` and carry over its mode and size floor.
    pub fn from_config(config: &EngineConfig, decoder: Arc<dyn Decoder>) -> Result<Self> {
        let plan = Arc::new(SearchPlan::from_config(config)?);
        Ok(Self::new(plan, decoder, config.mode).with_min_side(config.min_side_px))
    }

    /// Skip down-scaling strategies that would leave the shorter side below
    /// `px` pixels. Zero disables the floor.
    pub fn with_min_side(mut self, px: u32) -> Self {
        self.min_side_px = px;
        self
    }

    // -- Accessors ------------------------------------------------------------

    pub fn plan(&self) -> &SearchPlan {
        &self.plan
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn decoder_name(&self) -> &str {
        self.decoder.name()
    }

    // -- Search ---------------------------------------------------------------

    /// Try every strategy against `original` (stopping early in fast mode).
    ///
    /// Each candidate is built from `original`, never from the previous
    /// candidate. Attempt timing covers transform plus decode.
    #[instrument(
        skip_all,
        fields(
            source = %original.source(),
            width = original.width(),
            height = original.height()
        )
    )]
    pub fn search(&self, original: &ImageView) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        let mut cumulative = Duration::ZERO;

        for (index, strategy) in self.plan.iter().enumerate() {
            if self.below_size_floor(strategy, original) {
                debug!(strategy = %strategy.label(), "Skipping strategy below size floor");
                continue;
            }

            let started = Instant::now();
            let candidate = transform::apply_all(original, &strategy.steps);
            let payloads = self.decoder.decode(&candidate);
            drop(candidate);
            let elapsed = started.elapsed();
            cumulative += elapsed;

            debug!(
                index,
                strategy = %strategy.label(),
                found = payloads.len(),
                elapsed_us = elapsed.as_micros() as u64,
                "Attempt finished"
            );

            outcome.payloads.extend(payloads.iter().cloned());
            outcome.attempts.push(AttemptRecord {
                strategy_index: index,
                strategy: strategy.label(),
                payloads,
                elapsed,
                cumulative,
            });

            if self.mode == SearchMode::Fast && !outcome.payloads.is_empty() {
                break;
            }
        }

        outcome
    }

    /// Load `source`, search it, and package the result.
    ///
    /// Load failures become a `LoadError` result rather than an `Err`, so a
    /// bad file never takes the batch down with it.
    #[instrument(skip_all, fields(source = %source.id()))]
    pub fn process(&self, source: &ImageSource) -> JobResult {
        let source_id = source.id();
        let started = Instant::now();
        let original = match ImageView::load(source) {
            Ok(view) => view,
            Err(err) => {
                warn!(error = %err, "Could not load image");
                return JobResult::load_error(source_id, err, started.elapsed());
            }
        };
        let load_elapsed = started.elapsed();

        let outcome = self.search(&original);
        drop(original);

        let result =
            JobResult::searched(source_id, outcome.payloads, outcome.attempts, load_elapsed);
        info!(
            status = %result.status,
            payloads = result.payloads.len(),
            attempts = result.attempts.len(),
            elapsed_ms = result.total_elapsed().as_millis() as u64,
            "Image scanned"
        );
        result
    }

    fn below_size_floor(&self, strategy: &Strategy, original: &ImageView) -> bool {
        if self.min_side_px == 0 {
            return false;
        }
        match strategy.leading_scale() {
            Some(factor) if factor < 1.0 => {
                let shorter = original.width().min(original.height()) as f32;
                shorter * factor < self.min_side_px as f32
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("strategies", &self.plan.len())
            .field("decoder", &self.decoder.name())
            .field("mode", &self.mode)
            .field("min_side_px", &self.min_side_px)
            .finish()
    }
}
