// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Recorded model traces and their replay through a single view.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use bookkeeper_view::{ChangeSet, FixedClock, MemoryEnv, View, ViewConfig, ViewHandle};

/// One recorded model update.
#[derive(Clone, Debug, Deserialize)]
pub struct Frame {
    pub clock: f64,
    #[serde(default)]
    pub changes: ChangeSet,
    pub vars: BTreeMap<String, Value>,
}

pub fn load_trace(path: &Path) -> Result<Vec<Frame>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let frames: Vec<Frame> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing trace {}", path.display()))?;
    if frames.is_empty() {
        bail!("trace {} has no frames", path.display());
    }
    Ok(frames)
}

/// Feeds `frames[..=last]` (every frame when `last` is `None`) through one
/// view, calling `on_frame` after each update.
pub fn replay<F>(
    frames: &[Frame],
    config: &ViewConfig,
    last: Option<usize>,
    mut on_frame: F,
) -> Result<()>
where
    F: FnMut(usize, &View) -> Result<()>,
{
    let end = match last {
        Some(n) if n >= frames.len() => {
            bail!("frame {} out of range (trace has {} frames)", n, frames.len())
        }
        Some(n) => n + 1,
        None => frames.len(),
    };

    let mut env = MemoryEnv::with_builtins();
    let mut view: Option<View> = None;
    for (index, frame) in frames[..end].iter().enumerate() {
        env.replace_vars(frame.vars.clone());
        let clock = FixedClock(frame.clock);
        let current = match view.take() {
            None => View::new(&clock, &env, config.clone())
                .with_context(|| format!("frame {}: building view", index))?,
            Some(mut current) => {
                current
                    .update(&clock, &env, &frame.changes)
                    .with_context(|| format!("frame {} (clock {})", index, frame.clock))?;
                current
            }
        };
        debug!(frame = index, clock = frame.clock, "replayed");
        on_frame(index, &current)?;
        view = Some(current);
    }

    Ok(())
}
