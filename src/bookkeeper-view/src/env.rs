// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Bindings to the external model: variable lookup, function evaluation,
//! the logical clock, and the ack-position strategy the view depends on.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::datamodel::{
    BOOKIES_VAR, CLIENTS_VAR, ClientState, CoordinatorSnapshot, Ensemble, LedgerId,
    MessageSnapshot, ModelSnapshot, NETWORK_VAR, PeerSnapshot, ZOOKEEPER_VAR,
};
use crate::model_err;

/// Name of the model function computing a ledger's last-add-confirmed.
pub const ACK_FUNCTION: &str = "lastAddConfirmed";

/// The external state model, as the view sees it.
pub trait ModelEnv {
    fn var(&self, name: &str) -> Option<&Value>;
    fn evaluate(&self, function: &str, args: &[Value]) -> Result<Value>;
}

/// Owner of the logical clock.
pub trait Controller {
    fn clock(&self) -> f64;
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedClock(pub f64);

impl Controller for FixedClock {
    fn clock(&self) -> f64 {
        self.0
    }
}

/// Computes the highest entry position a writer can treat as durably
/// replicated across `ensemble`.
pub trait AckPosition {
    fn compute_ack_position(&self, ledger: LedgerId, ensemble: &Ensemble) -> Result<u64>;
}

impl<F> AckPosition for F
where
    F: Fn(LedgerId, &Ensemble) -> Result<u64>,
{
    fn compute_ack_position(&self, ledger: LedgerId, ensemble: &Ensemble) -> Result<u64> {
        self(ledger, ensemble)
    }
}

/// Delegates the computation to a function defined by the model.
pub struct EvaluatedAck<'a> {
    env: &'a dyn ModelEnv,
    function: &'a str,
}

impl<'a> EvaluatedAck<'a> {
    pub fn new(env: &'a dyn ModelEnv, function: &'a str) -> Self {
        EvaluatedAck { env, function }
    }
}

impl AckPosition for EvaluatedAck<'_> {
    fn compute_ack_position(&self, ledger: LedgerId, ensemble: &Ensemble) -> Result<u64> {
        let args = [json!(ledger), json!(ensemble.as_slice())];
        let value = self.env.evaluate(self.function, &args)?;
        value.as_u64().ok_or_else(|| {
            Error::new(
                ErrorKind::Model,
                ErrorCode::BadFunctionResult,
                Some(format!(
                    "{}(L{}) returned {}, expected a position",
                    self.function, ledger, value
                )),
            )
        })
    }
}

/// Quorum check over the entry counts the ensemble's bookies report.
///
/// The result is the largest position stored by at least `ack_quorum`
/// members; a member that does not host the ledger counts as 0.
pub struct QuorumAck<'a> {
    peers: &'a [PeerSnapshot],
    ack_quorum: Option<usize>,
}

impl<'a> QuorumAck<'a> {
    /// Majority quorum.
    pub fn new(peers: &'a [PeerSnapshot]) -> Self {
        QuorumAck {
            peers,
            ack_quorum: None,
        }
    }

    pub fn with_ack_quorum(mut self, ack_quorum: usize) -> Self {
        self.ack_quorum = Some(ack_quorum);
        self
    }
}

impl AckPosition for QuorumAck<'_> {
    fn compute_ack_position(&self, ledger: LedgerId, ensemble: &Ensemble) -> Result<u64> {
        if ensemble.is_empty() {
            return model_err!(BadEnsemble, format!("ledger L{} has an empty ensemble", ledger));
        }
        let quorum = self.ack_quorum.unwrap_or(ensemble.len() / 2 + 1);
        if quorum == 0 || quorum > ensemble.len() {
            return model_err!(
                BadEnsemble,
                format!(
                    "ack quorum {} invalid for ensemble of {} (ledger L{})",
                    quorum,
                    ensemble.len(),
                    ledger
                )
            );
        }

        let mut stored = Vec::with_capacity(ensemble.len());
        for &peer in ensemble.iter() {
            let index = (peer as usize).checked_sub(1);
            let snapshot = index.and_then(|i| self.peers.get(i)).ok_or_else(|| {
                Error::new(
                    ErrorKind::Model,
                    ErrorCode::DoesNotExist,
                    Some(format!("ledger L{} ensemble names unknown bookie {}", ledger, peer)),
                )
            })?;
            stored.push(snapshot.ledger(ledger).map(|l| l.entries).unwrap_or(0));
        }

        stored.sort_unstable_by(|a, b| b.cmp(a));
        Ok(stored[quorum - 1])
    }
}

type EnvFunction = Box<dyn Fn(&MemoryEnv, &[Value]) -> Result<Value>>;

/// In-memory model environment: a variable map plus registered functions.
#[derive(Default)]
pub struct MemoryEnv {
    vars: BTreeMap<String, Value>,
    functions: BTreeMap<String, EnvFunction>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment with `lastAddConfirmed` backed by [`QuorumAck`].
    pub fn with_builtins() -> Self {
        let mut env = Self::new();
        env.register(ACK_FUNCTION, |env, args| {
            let (ledger, ensemble) = match args {
                [ledger, ensemble] => (
                    LedgerId::deserialize(ledger)?,
                    Ensemble::deserialize(ensemble)?,
                ),
                _ => {
                    return model_err!(
                        BadSnapshot,
                        format!("{} expects 2 arguments, got {}", ACK_FUNCTION, args.len())
                    );
                }
            };
            let peers: Vec<PeerSnapshot> = decode_var(env, BOOKIES_VAR)?;
            let lac = QuorumAck::new(&peers).compute_ack_position(ledger, &ensemble)?;
            Ok(json!(lac))
        });
        env
    }

    pub fn set_var(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_owned(), value);
    }

    /// Replaces every variable with the entries of `vars`.
    pub fn replace_vars(&mut self, vars: BTreeMap<String, Value>) {
        self.vars = vars;
    }

    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&MemoryEnv, &[Value]) -> Result<Value> + 'static,
    {
        self.functions.insert(name.to_owned(), Box::new(f));
    }
}

impl ModelEnv for MemoryEnv {
    fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    fn evaluate(&self, function: &str, args: &[Value]) -> Result<Value> {
        match self.functions.get(function) {
            Some(f) => f(self, args),
            None => model_err!(UnknownFunction, function.to_owned()),
        }
    }
}

fn decode_var<T>(env: &dyn ModelEnv, name: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let value = match env.var(name) {
        Some(value) => value,
        None => return model_err!(MissingVariable, name.to_owned()),
    };
    T::deserialize(value).map_err(|err| {
        Error::new(
            ErrorKind::Model,
            ErrorCode::BadSnapshot,
            Some(format!("{}: {}", name, err)),
        )
    })
}

impl ModelSnapshot {
    /// Decodes the four variables the view renders.
    pub fn read(env: &dyn ModelEnv) -> Result<ModelSnapshot> {
        let clients: Vec<ClientState> = decode_var(env, CLIENTS_VAR)?;
        let bookies: Vec<PeerSnapshot> = decode_var(env, BOOKIES_VAR)?;
        let network: Vec<MessageSnapshot> = decode_var(env, NETWORK_VAR)?;
        let zoo_keeper: CoordinatorSnapshot = decode_var(env, ZOOKEEPER_VAR)?;
        Ok(ModelSnapshot {
            clients,
            bookies,
            network,
            zoo_keeper,
        })
    }
}
