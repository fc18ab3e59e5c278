// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Strategy search — the fixed search plan and the engine that walks it for
// one image.

pub mod engine;
pub mod plan;

pub use engine::{SearchEngine, SearchOutcome};
pub use plan::SearchPlan;
