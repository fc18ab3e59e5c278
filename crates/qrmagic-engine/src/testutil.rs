// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for unit tests: rendered QR symbols and scripted decoders.

use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};
use qrmagic_core::PayloadSet;

use crate::decode::Decoder;
use crate::image::view::ImageView;

/// Quiet zone around each rendered symbol, in modules.
const QUIET_MODULES: u32 = 4;

/// Render `text` as a black-on-white QR symbol with `module_px` pixels per module.
pub fn qr_image(text: &str, module_px: u32) -> GrayImage {
    let code = QrCode::new(text.as_bytes()).expect("payload fits in a QR symbol");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_MODULES) * module_px;
    GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / module_px) as i64 - QUIET_MODULES as i64;
        let my = (y / module_px) as i64 - QUIET_MODULES as i64;
        let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
        if inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Two symbols side by side on one white canvas.
pub fn two_symbol_image(left: &str, right: &str, module_px: u32) -> GrayImage {
    let a = qr_image(left, module_px);
    let b = qr_image(right, module_px);
    let mut canvas = GrayImage::from_pixel(
        a.width() + b.width(),
        a.height().max(b.height()),
        Luma([255u8]),
    );
    image::imageops::replace(&mut canvas, &a, 0, 0);
    image::imageops::replace(&mut canvas, &b, i64::from(a.width()), 0);
    canvas
}

/// Decoder driven by a closure over the candidate view.
pub struct ScriptedDecoder<F> {
    script: F,
}

impl<F> ScriptedDecoder<F>
where
    F: Fn(&ImageView) -> Vec<&'static str> + Send + Sync,
{
    pub fn new(script: F) -> Self {
        Self { script }
    }
}

impl<F> Decoder for ScriptedDecoder<F>
where
    F: Fn(&ImageView) -> Vec<&'static str> + Send + Sync,
{
    fn name(&self) -> &str {
        "scripted"
    }

    fn decode(&self, view: &ImageView) -> PayloadSet {
        (self.script)(view).into_iter().map(str::to_owned).collect()
    }
}
