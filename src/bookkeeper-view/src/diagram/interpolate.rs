// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Where an in-flight message is drawn at a given logical time.
//!
//! Nothing is cached between frames: messages are bound by position, so the
//! message at index 3 this frame may be a different message next frame.

use float_cmp::approx_eq;

use crate::common::Result;
use crate::datamodel::MessageSnapshot;
use crate::diagram::common::Point;
use crate::diagram::locator::Locator;

/// Fraction of the path travelled at `clock`.
pub fn progress(message: &MessageSnapshot, clock: f64, unresolved_fraction: f64) -> f64 {
    let deliver_at = match message.deliver_at {
        Some(deliver_at) => deliver_at,
        None => return unresolved_fraction,
    };

    let duration = deliver_at - message.sent_at;
    // instantaneous (or inverted) delivery: already there
    let degenerate = approx_eq!(f64, deliver_at, message.sent_at);
    if degenerate || duration < 0.0 || !duration.is_finite() {
        return 1.0;
    }

    let frac = (clock - message.sent_at) / duration;
    if frac.is_nan() {
        return 1.0;
    }
    frac.clamp(0.0, 1.0)
}

pub fn message_position(
    locator: &Locator,
    message: &MessageSnapshot,
    clock: f64,
) -> Result<Point> {
    let config = locator.layout().config();
    let from = locator.locate(&message.from)?.center();
    let to = locator.locate(&message.to)?.center();

    let frac = progress(message, clock, config.unresolved_delivery_fraction);
    // endpoints exactly; only points strictly between them are rounded
    Ok(match frac {
        f if f <= 0.0 => from,
        f if f >= 1.0 => to,
        f => from.lerp(to, f).round_to(config.message_precision),
    })
}
