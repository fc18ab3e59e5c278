// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test fixtures: encoded in-memory images and a decoder keyed on provenance.

use std::sync::Arc;

use image::{GrayImage, ImageFormat, Luma};
use qrmagic_core::{EngineConfig, ImageSource, PayloadSet, TransformStep};
use qrmagic_engine::{Decoder, ImageView, SearchEngine};

/// Reports `<source>#small` for views at most 16px wide and
/// `<source>#sharp` for sharpened views. Sources named `blank*` never
/// decode; `boom.png` panics.
pub struct LabelDecoder;

impl Decoder for LabelDecoder {
    fn name(&self) -> &str {
        "label"
    }

    fn decode(&self, view: &ImageView) -> PayloadSet {
        let name = view.source().as_str();
        if name == "boom.png" {
            panic!("decoder exploded");
        }
        let mut found = PayloadSet::new();
        if name.starts_with("blank") {
            return found;
        }
        if view.width() <= 16 {
            found.insert(format!("{name}#small"));
        }
        let sharpened = view
            .steps()
            .iter()
            .any(|s| matches!(s, TransformStep::Sharpen { amount } if *amount > 1.0));
        if sharpened {
            found.insert(format!("{name}#sharp"));
        }
        found
    }
}

pub fn engine(config: &EngineConfig) -> Arc<SearchEngine> {
    Arc::new(SearchEngine::from_config(config, Arc::new(LabelDecoder)).unwrap())
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_pixel(width, height, Luma([200u8]));
    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn png_source(name: &str, width: u32, height: u32) -> ImageSource {
    ImageSource::named_bytes(name, png_bytes(width, height))
}

pub fn corrupt_source(name: &str) -> ImageSource {
    ImageSource::named_bytes(name, b"\x89PNG\r\n\x1a\n truncated".to_vec())
}
