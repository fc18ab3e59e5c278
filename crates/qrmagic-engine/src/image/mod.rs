// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — immutable grayscale views and the pure transform library
// (scale, contrast, sharpen, rotate, tile).

pub mod transform;
pub mod view;

pub use view::ImageView;
