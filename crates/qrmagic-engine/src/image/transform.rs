// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transform library — pure functions from one `ImageView` to a new one.
// Operates on grayscale rasters using the `image` and `imageproc` crates.
//
// None of these fail: degenerate input (zero-area images, non-finite
// parameters) yields a copy of the input with the step still recorded in its
// provenance.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use qrmagic_core::TransformStep;
use tracing::{debug, trace};

use crate::image::view::ImageView;

/// Fill for canvas area uncovered by rotation.
pub const NEUTRAL_GRAY: Luma<u8> = Luma([128u8]);

/// Gaussian sigma of the unsharp blend.
const SHARPEN_SIGMA: f32 = 1.0;

/// Apply one step. The single dispatch point for `TransformStep`.
pub fn apply(view: &ImageView, step: &TransformStep) -> ImageView {
    trace!(step = %step.label(), "Applying transform");
    match *step {
        TransformStep::Scale { factor } => scale(view, factor),
        TransformStep::Contrast => normalize_contrast(view),
        TransformStep::Sharpen { amount } => sharpen(view, amount),
        TransformStep::Rotate { degrees } => rotate(view, degrees),
        TransformStep::Tile {
            col,
            row,
            divisions,
        } => tile(view, col, row, divisions),
    }
}

/// Apply `steps` left to right, starting from `view`.
pub fn apply_all(view: &ImageView, steps: &[TransformStep]) -> ImageView {
    let mut current = view.clone();
    for step in steps {
        current = apply(&current, step);
    }
    current
}

/// Resize proportionally by `factor` using Lanczos3 resampling.
///
/// A factor of exactly 1.0 copies the pixels untouched. Target dimensions are
/// rounded and never drop below 1px.
pub fn scale(view: &ImageView, factor: f32) -> ImageView {
    let step = TransformStep::Scale { factor };
    if view.is_empty() || !factor.is_finite() || factor <= 0.0 || factor == 1.0 {
        return view.derive(view.pixels().clone(), step);
    }

    let (w, h) = view.dimensions();
    let new_w = ((w as f32 * factor).round() as u32).max(1);
    let new_h = ((h as f32 * factor).round() as u32).max(1);
    if (new_w, new_h) == (w, h) {
        return view.derive(view.pixels().clone(), step);
    }

    let resized = imageops::resize(view.pixels(), new_w, new_h, FilterType::Lanczos3);
    debug!(from_w = w, from_h = h, new_w, new_h, "Scaled view");
    view.derive(resized, step)
}

/// Stretch the luminance histogram so the darkest pixel maps to 0 and the
/// brightest to 255. A flat image is left as is.
pub fn normalize_contrast(view: &ImageView) -> ImageView {
    let step = TransformStep::Contrast;
    let gray = view.pixels();
    let (lo, hi) = gray.pixels().fold((u8::MAX, u8::MIN), |(lo, hi), p| {
        (lo.min(p.0[0]), hi.max(p.0[0]))
    });
    if view.is_empty() || hi <= lo || (lo == 0 && hi == 255) {
        return view.derive(gray.clone(), step);
    }

    let range = (hi - lo) as f32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let clamped = (value as u8).clamp(lo, hi);
        *slot = (((clamped - lo) as f32) * 255.0 / range).round() as u8;
    }

    let mut stretched = gray.clone();
    for pixel in stretched.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    debug!(lo, hi, "Contrast normalized");
    view.derive(stretched, step)
}

/// Unsharp blend against a Gaussian-blurred copy:
/// `out = blur + amount * (orig - blur)`.
///
/// 1.0 is identity, values above 1 boost edges, values below 1 blur
/// (0 is the fully blurred copy).
pub fn sharpen(view: &ImageView, amount: f32) -> ImageView {
    let step = TransformStep::Sharpen { amount };
    if view.is_empty() || !amount.is_finite() || amount == 1.0 {
        return view.derive(view.pixels().clone(), step);
    }

    let original = view.pixels();
    let blurred = gaussian_blur_f32(original, SHARPEN_SIGMA);
    let blended = GrayImage::from_fn(original.width(), original.height(), |x, y| {
        let o = original.get_pixel(x, y).0[0] as f32;
        let b = blurred.get_pixel(x, y).0[0] as f32;
        Luma([(b + amount * (o - b)).round().clamp(0.0, 255.0) as u8])
    });
    view.derive(blended, step)
}

/// Rotate clockwise about the centre by `degrees`.
///
/// The canvas grows to hold the rotated bounding box and the uncovered area
/// is filled with [`NEUTRAL_GRAY`]. Quarter turns are lossless.
pub fn rotate(view: &ImageView, degrees: f32) -> ImageView {
    let step = TransformStep::Rotate { degrees };
    if view.is_empty() || !degrees.is_finite() {
        return view.derive(view.pixels().clone(), step);
    }

    let normalised = degrees.rem_euclid(360.0);
    let gray = view.pixels();
    if normalised < 0.01 || (normalised - 360.0).abs() < 0.01 {
        return view.derive(gray.clone(), step);
    }
    if (normalised - 90.0).abs() < 0.01 {
        return view.derive(imageops::rotate90(gray), step);
    }
    if (normalised - 180.0).abs() < 0.01 {
        return view.derive(imageops::rotate180(gray), step);
    }
    if (normalised - 270.0).abs() < 0.01 {
        return view.derive(imageops::rotate270(gray), step);
    }

    let (w, h) = view.dimensions();
    let (canvas_w, canvas_h) = rotated_canvas(w, h, normalised);
    let mut canvas = GrayImage::from_pixel(canvas_w, canvas_h, NEUTRAL_GRAY);
    let x_off = i64::from((canvas_w - w) / 2);
    let y_off = i64::from((canvas_h - h) / 2);
    imageops::replace(&mut canvas, gray, x_off, y_off);

    let rotated = rotate_about_center(
        &canvas,
        normalised.to_radians(),
        Interpolation::Bilinear,
        NEUTRAL_GRAY,
    );
    debug!(degrees, canvas_w, canvas_h, "Rotated view");
    view.derive(rotated, step)
}

/// Canvas large enough for both the upright image and its rotated bounding box.
fn rotated_canvas(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (w, h) = (width as f32, height as f32);
    let bound_w = (w * cos + h * sin).ceil() as u32;
    let bound_h = (w * sin + h * cos).ceil() as u32;
    (bound_w.max(width), bound_h.max(height))
}

/// Crop the overlapping window at grid cell (`col`, `row`) of a
/// `divisions` x `divisions` grid. Each window spans two cells per axis.
pub fn tile(view: &ImageView, col: u32, row: u32, divisions: u32) -> ImageView {
    let step = TransformStep::Tile {
        col,
        row,
        divisions,
    };
    if view.is_empty() || divisions == 0 {
        return view.derive(view.pixels().clone(), step);
    }

    let (w, h) = view.dimensions();
    let (x, tile_w) = window(w, col, divisions);
    let (y, tile_h) = window(h, row, divisions);
    let cropped = imageops::crop_imm(view.pixels(), x, y, tile_w, tile_h).to_image();
    view.derive(cropped, step)
}

/// Offset and extent of window `index` along an axis of `len` pixels.
fn window(len: u32, index: u32, divisions: u32) -> (u32, u32) {
    let len64 = u64::from(len);
    let start = (len64 * u64::from(index) / u64::from(divisions)).min(len64 - 1) as u32;
    let extent = ((len64 * 2 / u64::from(divisions)).max(1) as u32).min(len - start);
    (start, extent)
}
