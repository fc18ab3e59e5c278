// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Search plan — the ordered catalogue of strategies tried against every image.
// Built once per configuration and shared read-only between workers.

use qrmagic_core::error::{QrmagicError, Result};
use qrmagic_core::{EngineConfig, Strategy, TransformStep};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A non-empty, ordered list of strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Strategy>", into = "Vec<Strategy>")]
pub struct SearchPlan {
    strategies: Vec<Strategy>,
}

impl SearchPlan {
    /// Wrap an explicit strategy list. An empty list is a configuration error.
    pub fn new(strategies: Vec<Strategy>) -> Result<Self> {
        if strategies.is_empty() {
            return Err(QrmagicError::Configuration(
                "search plan has no strategies".into(),
            ));
        }
        Ok(Self { strategies })
    }

    /// Build the plan described by `config`.
    ///
    /// Per scale factor (in configured order) the variants are: plain scale,
    /// contrast-normalised, then each non-identity sharpen amount. Rotations
    /// of every scale follow, then tiles of the full-resolution image.
    #[instrument(skip_all, fields(mode = ?config.mode))]
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut strategies = Vec::new();
        for &factor in &config.scale_plan {
            let scale = TransformStep::Scale { factor };
            let mut variants: Vec<Strategy> = config
                .sharpen_amounts
                .iter()
                .map(|&amount| {
                    if amount == 1.0 {
                        Strategy::new(vec![scale])
                    } else {
                        Strategy::new(vec![scale, TransformStep::Sharpen { amount }])
                    }
                })
                .collect();
            if config.include_contrast {
                variants.push(Strategy::new(vec![scale, TransformStep::Contrast]));
            }
            // Stable: sharpen amounts keep their configured order.
            variants.sort_by_key(Strategy::cost_rank);
            for variant in variants {
                push_unique(&mut strategies, variant);
            }
        }

        if config.include_rotation {
            for &degrees in &config.rotation_degrees {
                for &factor in &config.scale_plan {
                    push_unique(
                        &mut strategies,
                        Strategy::new(vec![
                            TransformStep::Scale { factor },
                            TransformStep::Rotate { degrees },
                        ]),
                    );
                }
            }
        }

        if config.include_tiles {
            let divisions = config.tile_divisions;
            for row in 0..divisions - 1 {
                for col in 0..divisions - 1 {
                    push_unique(
                        &mut strategies,
                        Strategy::new(vec![TransformStep::Tile {
                            col,
                            row,
                            divisions,
                        }]),
                    );
                }
            }
        }

        debug!(strategies = strategies.len(), "Search plan built");
        Self::new(strategies)
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Never true for a constructed plan.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Strategy> {
        self.strategies.iter()
    }

    pub fn labels(&self) -> Vec<String> {
        self.strategies.iter().map(Strategy::label).collect()
    }
}

fn push_unique(strategies: &mut Vec<Strategy>, strategy: Strategy) {
    if !strategies.contains(&strategy) {
        strategies.push(strategy);
    }
}

impl TryFrom<Vec<Strategy>> for SearchPlan {
    type Error = QrmagicError;

    fn try_from(strategies: Vec<Strategy>) -> Result<Self> {
        Self::new(strategies)
    }
}

impl From<SearchPlan> for Vec<Strategy> {
    fn from(plan: SearchPlan) -> Self {
        plan.strategies
    }
}

impl<'a> IntoIterator for &'a SearchPlan {
    type Item = &'a Strategy;
    type IntoIter = std::slice::Iter<'a, Strategy>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
