// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The view controller: owns the retained scene and drives one
//! reconciliation pass per model update.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::datamodel::{
    BOOKIES_VAR, CLIENTS_VAR, ClientId, ModelSnapshot, NETWORK_VAR, ZOOKEEPER_VAR,
};
use crate::diagram::common::Point;
use crate::diagram::elements::{client_spec, coordinator_spec, message_spec, peer_spec};
use crate::diagram::layout::{Layout, LayoutConfig, Role};
use crate::diagram::locator::Locator;
use crate::diagram::render_svg;
use crate::diagram::scene::{ElementSpec, ReconcileStats, Scene};
use crate::env::{ACK_FUNCTION, AckPosition, Controller, EvaluatedAck, ModelEnv};
use crate::menu::{CommandDispatch, MenuEntry, client_menu};

pub const VIEW_NAME: &str = "BookKeeperView";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub layout: LayoutConfig,
    /// Model function evaluated to find a writer's last-add-confirmed.
    pub ack_function: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            layout: LayoutConfig::default(),
            ack_function: ACK_FUNCTION.to_owned(),
        }
    }
}

/// Names of the model variables that changed since the last update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(Vec<String>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ChangeSet(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// What a host sees of a view.
pub trait ViewHandle {
    fn name(&self) -> &'static str;
    fn big_view(&self) -> bool;
    fn wide_view(&self) -> bool;
    fn update(
        &mut self,
        controller: &dyn Controller,
        env: &dyn ModelEnv,
        changes: &ChangeSet,
    ) -> Result<()>;
}

/// Every collection's specs for one frame, in paint order.
struct FrameSpecs {
    collections: [(&'static str, Vec<ElementSpec>); 4],
}

fn derive_frame(
    config: &LayoutConfig,
    snapshot: &ModelSnapshot,
    clock: f64,
    ack: &dyn AckPosition,
) -> Result<FrameSpecs> {
    let layout = Layout::for_snapshot(config, snapshot);
    let locator = Locator::new(layout);

    let zoo_keeper = vec![coordinator_spec(&layout, &snapshot.zoo_keeper)?];

    let clients = snapshot
        .clients
        .iter()
        .zip(1..)
        .map(|(state, id)| client_spec(&layout, id, state, ack))
        .collect::<Result<Vec<_>>>()?;

    let bookies = snapshot
        .bookies
        .iter()
        .zip(1..)
        .map(|(peer, id)| peer_spec(&layout, id, peer))
        .collect();

    let network = snapshot
        .network
        .iter()
        .map(|message| message_spec(&locator, message, clock))
        .collect::<Result<Vec<_>>>()?;

    Ok(FrameSpecs {
        collections: [
            (ZOOKEEPER_VAR, zoo_keeper),
            (CLIENTS_VAR, clients),
            (BOOKIES_VAR, bookies),
            (NETWORK_VAR, network),
        ],
    })
}

pub struct View {
    config: ViewConfig,
    scene: Scene,
    snapshot: ModelSnapshot,
    clock: f64,
}

impl View {
    /// Reads the current model state and seeds the scene from it.
    pub fn new(
        controller: &dyn Controller,
        env: &dyn ModelEnv,
        config: ViewConfig,
    ) -> Result<View> {
        config.layout.validate()?;
        let mut view = View {
            config,
            scene: Scene::new(),
            snapshot: ModelSnapshot::default(),
            clock: 0.0,
        };
        view.update(controller, env, &ChangeSet::new())?;
        Ok(view)
    }

    /// A view over an already-decoded snapshot, with the ack position
    /// supplied directly rather than evaluated by the model.
    pub fn from_snapshot(
        config: ViewConfig,
        snapshot: ModelSnapshot,
        clock: f64,
        ack: &dyn AckPosition,
    ) -> Result<View> {
        config.layout.validate()?;
        let mut view = View {
            config,
            scene: Scene::new(),
            snapshot: ModelSnapshot::default(),
            clock: 0.0,
        };
        view.update_snapshot(snapshot, clock, ack)?;
        Ok(view)
    }

    /// Reconciles every collection against `snapshot`. On error the scene
    /// and the stored snapshot are left as they were.
    pub fn update_snapshot(
        &mut self,
        snapshot: ModelSnapshot,
        clock: f64,
        ack: &dyn AckPosition,
    ) -> Result<ReconcileStats> {
        let frame = match derive_frame(&self.config.layout, &snapshot, clock, ack) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, clock, "frame rejected");
                return Err(err);
            }
        };

        let mut stats = ReconcileStats::default();
        for (name, specs) in frame.collections {
            stats.merge(self.scene.apply(name, specs));
        }

        self.snapshot = snapshot;
        self.clock = clock;
        Ok(stats)
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The snapshot the scene currently reflects.
    pub fn snapshot(&self) -> &ModelSnapshot {
        &self.snapshot
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn layout(&self) -> Layout<'_> {
        Layout::for_snapshot(&self.config.layout, &self.snapshot)
    }

    /// The client whose box contains `point`, if any.
    pub fn client_at(&self, point: Point) -> Option<ClientId> {
        self.layout()
            .row(Role::Client)
            .iter()
            .zip(1..)
            .find(|(bbox, _)| bbox.contains(point))
            .map(|(_, id)| id)
    }

    pub fn context_menu(&self, client: ClientId) -> Result<Vec<MenuEntry>> {
        client_menu(&self.snapshot, client)
    }

    /// Forwards a menu entry's command. Entries that are no longer valid for
    /// the client's current state are refused.
    pub fn select(&self, entry: &MenuEntry, dispatcher: &mut dyn CommandDispatch) -> Result<()> {
        let client = entry.command.client();
        if !self.context_menu(client)?.contains(entry) {
            return Err(Error::new(
                ErrorKind::Command,
                ErrorCode::DoesNotExist,
                Some(format!(
                    "{} is not available for client {}",
                    entry.command.identifier(),
                    client
                )),
            ));
        }
        debug!(command = entry.command.identifier(), client, "dispatching");
        dispatcher.dispatch(&entry.command)
    }

    pub fn render_svg(&self) -> String {
        render_svg(&self.scene, &self.layout())
    }
}

impl ViewHandle for View {
    fn name(&self) -> &'static str {
        VIEW_NAME
    }

    fn big_view(&self) -> bool {
        true
    }

    fn wide_view(&self) -> bool {
        true
    }

    fn update(
        &mut self,
        controller: &dyn Controller,
        env: &dyn ModelEnv,
        changes: &ChangeSet,
    ) -> Result<()> {
        let clock = controller.clock();
        let snapshot = ModelSnapshot::read(env).inspect_err(|err| {
            warn!(error = %err, clock, "could not read model snapshot");
        })?;
        let function = self.config.ack_function.clone();
        let ack = EvaluatedAck::new(env, &function);
        let stats = self.update_snapshot(snapshot, clock, &ack)?;
        debug!(
            %changes,
            clock,
            entered = stats.entered,
            updated = stats.updated,
            exited = stats.exited,
            "update"
        );
        Ok(())
    }
}
