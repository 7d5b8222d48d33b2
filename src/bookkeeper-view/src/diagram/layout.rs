// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Geometry for the fixed BookKeeper topology: the coordinator box above the
//! midline, a row of clients on it, and a row of bookies below.
//!
//! Every box is a pure function of (role, ordinal, row size); two frames with
//! the same collection sizes always get identical geometry.

use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::datamodel::ModelSnapshot;
use crate::diagram::common::BBox;
use crate::layout_err;

/// Layout constants. All values are in diagram units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    // Canvas positioning
    pub mid_x: f64,
    pub mid_y: f64,

    // Coordinator box, centered on mid_x, top edge `coordinator_offset` above mid_y.
    pub coordinator_width: f64,
    pub coordinator_height: f64,
    pub coordinator_offset: f64,

    // Client row, top edge `client_offset` below mid_y.
    pub client_width: f64,
    pub client_height: f64,
    pub client_spacing: f64,
    pub client_offset: f64,

    // Bookie row. Wider than clients with tighter spacing to fit ledger labels.
    pub peer_width: f64,
    pub peer_height: f64,
    pub peer_spacing: f64,
    pub peer_offset: f64,

    // Text
    pub font_size: f64,
    pub line_spacing: f64,
    pub stroke_width: f64,

    // Messages
    pub message_radius: f64,
    /// Decimal places kept on interpolated message coordinates.
    pub message_precision: u32,
    /// Where along its path a message whose delivery time the model has not
    /// resolved yet is drawn. A visual placeholder only.
    pub unresolved_delivery_fraction: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mid_x: 500.0,
            mid_y: 500.0,
            coordinator_width: 400.0,
            coordinator_height: 200.0,
            coordinator_offset: 350.0,
            client_width: 100.0,
            client_height: 100.0,
            client_spacing: 100.0,
            client_offset: 0.0,
            peer_width: 220.0,
            peer_height: 250.0,
            peer_spacing: 50.0,
            peer_offset: 300.0,
            font_size: 36.0,
            line_spacing: 42.0,
            stroke_width: 5.0,
            message_radius: 15.0,
            message_precision: 2,
            unresolved_delivery_fraction: 0.7,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("mid_x", self.mid_x),
            ("mid_y", self.mid_y),
            ("coordinator_offset", self.coordinator_offset),
            ("client_offset", self.client_offset),
            ("peer_offset", self.peer_offset),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return layout_err!(BadConfig, format!("{} must be finite, got {}", name, value));
            }
        }

        let positive = [
            ("coordinator_width", self.coordinator_width),
            ("coordinator_height", self.coordinator_height),
            ("client_width", self.client_width),
            ("client_height", self.client_height),
            ("peer_width", self.peer_width),
            ("peer_height", self.peer_height),
            ("font_size", self.font_size),
            ("line_spacing", self.line_spacing),
            ("message_radius", self.message_radius),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return layout_err!(BadConfig, format!("{} must be positive, got {}", name, value));
            }
        }

        let non_negative = [
            ("client_spacing", self.client_spacing),
            ("peer_spacing", self.peer_spacing),
            ("stroke_width", self.stroke_width),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return layout_err!(
                    BadConfig,
                    format!("{} must not be negative, got {}", name, value)
                );
            }
        }

        if !(0.0..=1.0).contains(&self.unresolved_delivery_fraction) {
            return layout_err!(
                BadConfig,
                format!(
                    "unresolved_delivery_fraction must be within [0, 1], got {}",
                    self.unresolved_delivery_fraction
                )
            );
        }
        if self.message_precision > 10 {
            return layout_err!(
                BadConfig,
                format!("message_precision {} is too large", self.message_precision)
            );
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Coordinator,
    Client,
    Peer,
}

fn row_x(mid_x: f64, width: f64, spacing: f64, index: u32, total: usize) -> f64 {
    // an empty row has no boxes to place; keep the formula away from N - 1 < 0
    let n = total.max(1) as f64;
    let i = index as f64;
    mid_x - n / 2.0 * width - (n - 1.0) / 2.0 * spacing + (i - 1.0) * (width + spacing)
}

/// Box for the `index`th (1-based) member of a row of `total`. The
/// coordinator ignores both.
pub fn bounding_box(config: &LayoutConfig, role: Role, index: u32, total: usize) -> BBox {
    match role {
        Role::Coordinator => BBox {
            x: config.mid_x - config.coordinator_width / 2.0,
            y: config.mid_y - config.coordinator_offset,
            width: config.coordinator_width,
            height: config.coordinator_height,
        },
        Role::Client => BBox {
            x: row_x(
                config.mid_x,
                config.client_width,
                config.client_spacing,
                index,
                total,
            ),
            y: config.mid_y + config.client_offset,
            width: config.client_width,
            height: config.client_height,
        },
        Role::Peer => BBox {
            x: row_x(
                config.mid_x,
                config.peer_width,
                config.peer_spacing,
                index,
                total,
            ),
            y: config.mid_y + config.peer_offset,
            width: config.peer_width,
            height: config.peer_height,
        },
    }
}

/// A config bound to one frame's collection sizes.
#[derive(Clone, Copy, Debug)]
pub struct Layout<'a> {
    config: &'a LayoutConfig,
    num_clients: usize,
    num_peers: usize,
}

impl<'a> Layout<'a> {
    pub fn new(config: &'a LayoutConfig, num_clients: usize, num_peers: usize) -> Self {
        Layout {
            config,
            num_clients,
            num_peers,
        }
    }

    pub fn for_snapshot(config: &'a LayoutConfig, snapshot: &ModelSnapshot) -> Self {
        Self::new(config, snapshot.clients.len(), snapshot.bookies.len())
    }

    pub fn config(&self) -> &'a LayoutConfig {
        self.config
    }

    pub fn total(&self, role: Role) -> usize {
        match role {
            Role::Coordinator => 1,
            Role::Client => self.num_clients,
            Role::Peer => self.num_peers,
        }
    }

    pub fn bbox(&self, role: Role, index: u32) -> BBox {
        bounding_box(self.config, role, index, self.total(role))
    }

    /// Every box of a role, left to right. Empty for an empty row.
    pub fn row(&self, role: Role) -> Vec<BBox> {
        let total = self.total(role);
        (1..=total as u32).map(|i| self.bbox(role, i)).collect()
    }

    /// Union of every box in the diagram.
    pub fn extent(&self) -> BBox {
        let coordinator = self.bbox(Role::Coordinator, 1);
        self.row(Role::Client)
            .iter()
            .chain(self.row(Role::Peer).iter())
            .fold(coordinator, |acc, b| acc.union(b))
    }
}
