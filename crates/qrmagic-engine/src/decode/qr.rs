// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR decoding via `rqrr`. This is the only module that speaks rqrr's
// vocabulary.

use qrmagic_core::PayloadSet;
use rqrr::PreparedImage;
use tracing::{debug, trace};

use super::{Decoder, collect_payloads};
use crate::image::view::ImageView;

/// Stateless QR decoder backed by `rqrr`.
///
/// Every grid found in the view is decoded, so a photograph holding several
/// labels yields several payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for RqrrDecoder {
    fn name(&self) -> &str {
        "rqrr"
    }

    fn decode(&self, view: &ImageView) -> PayloadSet {
        if view.is_empty() {
            return PayloadSet::new();
        }

        let gray = view.pixels();
        let width = gray.width() as usize;
        let height = gray.height() as usize;
        let raw = gray.as_raw();
        let mut prepared =
            PreparedImage::prepare_from_greyscale(width, height, |x, y| raw[y * width + x]);
        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), width, height, "rqrr grid detection");

        let decoded = grids.iter().filter_map(|grid| match grid.decode() {
            Ok((_meta, content)) => Some(content),
            Err(err) => {
                debug!(error = ?err, "rqrr found a grid but could not decode it");
                None
            }
        });
        collect_payloads(decoded)
    }
}
