// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

pub mod common;
pub mod constants;
pub mod elements;
pub mod interpolate;
pub mod layout;
pub mod locator;
mod render;
#[cfg(feature = "png_render")]
pub mod render_png;
pub mod scene;

pub use render::render_svg;
#[cfg(feature = "png_render")]
pub use render_png::{PngRenderOpts, render_png};
