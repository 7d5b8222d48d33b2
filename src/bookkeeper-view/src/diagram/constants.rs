// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

pub const LABEL_PADDING: f64 = 10.0;
pub const MESSAGE_LABEL_PADDING: f64 = 5.0;
/// Ensemble codes use one letter per bookie ordinal, so ordinals stop at Z.
pub const MAX_ENSEMBLE_ORDINAL: u32 = 26;
pub const COORDINATOR_TITLE: &str = "ZooKeeper";
pub const VIEW_BOX_MARGIN: f64 = 50.0;
