// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image views — decoded grayscale rasters plus the provenance of how they were
// produced. Loading from disk or memory happens here so that corrupt input is
// rejected before the decode adapter is ever reached.

use image::{DynamicImage, GrayImage};
use qrmagic_core::error::{QrmagicError, Result};
use qrmagic_core::{ImageSource, SourceId, TransformStep};
use tracing::{debug, info, instrument};

/// An immutable grayscale raster and the transforms that produced it.
///
/// Views are never mutated: every transform builds a new view whose
/// provenance is the parent's steps plus one.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageView {
    pixels: GrayImage,
    source: SourceId,
    steps: Vec<TransformStep>,
}

impl ImageView {
    // -- Construction ---------------------------------------------------------

    /// Wrap already-decoded grayscale pixels as an original (untransformed) view.
    pub fn new(source: impl Into<SourceId>, pixels: GrayImage) -> Self {
        Self {
            pixels,
            source: source.into(),
            steps: Vec::new(),
        }
    }

    /// Convert any decoded image to a grayscale original view.
    pub fn from_dynamic(source: impl Into<SourceId>, image: &DynamicImage) -> Self {
        Self::new(source, image.to_luma8())
    }

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let source = SourceId(path.as_ref().display().to_string());
        let img = image::open(path.as_ref())
            .map_err(|err| QrmagicError::load(source.as_str(), err))?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self::from_dynamic(source, &img))
    }

    /// Decode raw encoded bytes (JPEG, PNG, TIFF, ...).
    #[instrument(skip_all, fields(source = %source, data_len = data.len()))]
    pub fn from_bytes(source: SourceId, data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| QrmagicError::load(source.as_str(), err))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self::from_dynamic(source, &img))
    }

    /// Load whichever kind of source this is.
    pub fn load(source: &ImageSource) -> Result<Self> {
        match source {
            ImageSource::Path(path) => Self::open(path),
            ImageSource::Memory { id, bytes } => Self::from_bytes(id.clone(), bytes),
        }
    }

    /// A child view carrying `pixels`, with `step` appended to the provenance.
    pub(crate) fn derive(&self, pixels: GrayImage, step: TransformStep) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self {
            pixels,
            source: self.source.clone(),
            steps,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// True for a zero-area raster.
    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Transforms applied to the original, in order.
    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn is_original(&self) -> bool {
        self.steps.is_empty()
    }
}
