// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Rasterizes the SVG serialization of a scene with resvg.
//!
//! Text uses whatever fonts the system provides; the stylesheet's font
//! stack falls back to a generic sans-serif.

use resvg::tiny_skia;
use resvg::usvg;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::diagram::layout::Layout;
use crate::diagram::scene::Scene;

#[derive(Clone, Copy, Debug, Default)]
pub struct PngRenderOpts {
    /// Output width in pixels; height follows the aspect ratio. Unset means
    /// the SVG's intrinsic size.
    pub width: Option<u32>,
}

fn render_error(details: String) -> Error {
    Error::new(ErrorKind::Render, ErrorCode::RenderFailed, Some(details))
}

pub fn render_png(scene: &Scene, layout: &Layout, opts: &PngRenderOpts) -> Result<Vec<u8>> {
    svg_to_png(&super::render_svg(scene, layout), opts)
}

pub fn svg_to_png(svg: &str, opts: &PngRenderOpts) -> Result<Vec<u8>> {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();

    let usvg_opts = usvg::Options {
        fontdb: std::sync::Arc::new(fontdb),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &usvg_opts)
        .map_err(|e| render_error(format!("failed to parse SVG: {e}")))?;

    let size = tree.size();
    let (px_w, scale) = match opts.width {
        Some(w) => (w, w as f32 / size.width()),
        None => (size.width().ceil() as u32, 1.0),
    };
    let px_h = (size.height() * scale).ceil() as u32;
    if px_w == 0 || px_h == 0 {
        return Err(render_error("computed image dimensions are zero".to_owned()));
    }

    let mut pixmap = tiny_skia::Pixmap::new(px_w, px_h)
        .ok_or_else(|| render_error("failed to allocate pixmap".to_owned()))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| render_error(format!("failed to encode PNG: {e}")))
}
