// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Typed snapshots of the BookKeeper model state.
//!
//! The model hands us tagged-union values (`{"tag": "Writer", ...}`); these
//! types are the closed variants we decode them into. Decoding is strict: an
//! unknown tag or a missing field is an integration error, never a default.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub type ClientId = u32;
pub type PeerId = u32;
pub type LedgerId = u32;

/// Ordered peer ordinals storing a ledger's entries.
pub type Ensemble = SmallVec<[PeerId; 5]>;

pub const CLIENTS_VAR: &str = "clients";
pub const BOOKIES_VAR: &str = "bookies";
pub const NETWORK_VAR: &str = "network";
pub const ZOOKEEPER_VAR: &str = "zooKeeper";

/// Identifies a node in the diagram. Ids are 1-based ordinals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(tag = "tag", content = "id")]
pub enum EntityRef {
    Client(ClientId),
    #[serde(alias = "Bookie")]
    Peer(PeerId),
    #[serde(alias = "ZooKeeper")]
    Coordinator,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(tag = "tag")]
pub enum ClientState {
    Inactive,
    CreatingLedger,
    Writer {
        ledger: LedgerId,
        entries: u64,
        ensemble: Ensemble,
    },
    Recovering {
        ledger: LedgerId,
    },
}

impl ClientState {
    pub fn ledger(&self) -> Option<LedgerId> {
        match self {
            ClientState::Writer { ledger, .. } | ClientState::Recovering { ledger } => {
                Some(*ledger)
            }
            ClientState::Inactive | ClientState::CreatingLedger => None,
        }
    }
}

/// A ledger as stored on one bookie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct HostedLedger {
    pub id: LedgerId,
    pub entries: u64,
    pub lac: u64,
    #[serde(default)]
    pub fenced: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct PeerSnapshot {
    pub ledgers: Vec<HostedLedger>,
}

impl PeerSnapshot {
    pub fn ledger(&self, id: LedgerId) -> Option<&HostedLedger> {
        self.ledgers.iter().find(|l| l.id == id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(tag = "tag")]
pub enum LedgerState {
    Open,
    Closed { lac: u64 },
}

/// A ledger as registered with the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct LedgerRecord {
    pub id: LedgerId,
    pub ensemble: Ensemble,
    pub state: LedgerState,
}

impl LedgerRecord {
    pub fn is_open(&self) -> bool {
        matches!(self.state, LedgerState::Open)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CoordinatorSnapshot {
    pub ledgers: Vec<LedgerRecord>,
}

impl CoordinatorSnapshot {
    pub fn open_ledgers(&self) -> impl Iterator<Item = &LedgerRecord> {
        self.ledgers.iter().filter(|l| l.is_open())
    }
}

/// One message in flight on the network.
///
/// `deliver_at` is `None` while the model has not yet resolved the
/// (nondeterministic) delivery delay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct MessageSnapshot {
    pub from: EntityRef,
    pub to: EntityRef,
    pub sent_at: f64,
    #[serde(default)]
    pub deliver_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Read-only view of the model at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelSnapshot {
    pub clients: Vec<ClientState>,
    pub bookies: Vec<PeerSnapshot>,
    pub network: Vec<MessageSnapshot>,
    pub zoo_keeper: CoordinatorSnapshot,
}

impl ModelSnapshot {
    pub fn client(&self, id: ClientId) -> Option<&ClientState> {
        let index = (id as usize).checked_sub(1)?;
        self.clients.get(index)
    }

    pub fn peer(&self, id: PeerId) -> Option<&PeerSnapshot> {
        let index = (id as usize).checked_sub(1)?;
        self.bookies.get(index)
    }
}

/// JSON schemas for each model variable the view reads, keyed by name.
#[cfg(feature = "schema")]
pub fn variable_schemas() -> serde_json::Map<String, serde_json::Value> {
    use schemars::schema_for;

    let schemas = [
        (CLIENTS_VAR, schema_for!(Vec<ClientState>)),
        (BOOKIES_VAR, schema_for!(Vec<PeerSnapshot>)),
        (NETWORK_VAR, schema_for!(Vec<MessageSnapshot>)),
        (ZOOKEEPER_VAR, schema_for!(CoordinatorSnapshot)),
    ];
    schemas
        .into_iter()
        .map(|(name, schema)| (name.to_owned(), schema.to_value()))
        .collect()
}
