// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decode adapter — the seam where a barcode-decoding library is plugged in.

pub mod qr;

pub use qr::RqrrDecoder;

use qrmagic_core::PayloadSet;

use crate::image::view::ImageView;

/// Extracts payloads from a single view.
///
/// Implementations hold no mutable state so one instance can be shared by
/// every worker. Finding nothing is an empty set, never an error.
pub trait Decoder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn decode(&self, view: &ImageView) -> PayloadSet;
}

/// Normalise raw decoder output: trim whitespace, drop empties, sort, dedupe.
pub fn collect_payloads<I, S>(raw: I) -> PayloadSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| s.as_ref().trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}
