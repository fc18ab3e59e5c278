// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// qrmagic-engine — Barcode recovery for a single image.
//
// Provides grayscale image views and the transform library (scale, contrast,
// sharpen, rotate, tile), the decode adapter around `rqrr`, the search plan,
// the strategy search engine, and the per-image result reporter.

pub mod decode;
pub mod image;
pub mod report;
pub mod search;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the primary structs so callers can use `qrmagic_engine::SearchEngine` etc.
pub use decode::{Decoder, RqrrDecoder};
pub use crate::image::view::ImageView;
pub use report::{BatchSummary, JobRecord};
pub use search::engine::{SearchEngine, SearchOutcome};
pub use search::plan::SearchPlan;
