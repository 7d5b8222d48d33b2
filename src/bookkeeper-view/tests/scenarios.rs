// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::cell::Cell;

use float_cmp::approx_eq;
use serde_json::json;
use smallvec::smallvec;

use bookkeeper_view::datamodel::{
    CLIENTS_VAR, ClientState, CoordinatorSnapshot, EntityRef, Ensemble, LedgerId,
    MessageSnapshot, ModelSnapshot, NETWORK_VAR, PeerSnapshot,
};
use bookkeeper_view::diagram::layout::{Layout, Role};
use bookkeeper_view::diagram::locator::Locator;
use bookkeeper_view::diagram::scene::{ElementKind, Shape, StrokeStyle};
use bookkeeper_view::{ChangeSet, FixedClock, MemoryEnv, Result, View, ViewConfig, ViewHandle};

fn fixed_lac(lac: u64) -> impl Fn(LedgerId, &Ensemble) -> Result<u64> {
    move |_ledger: LedgerId, _ensemble: &Ensemble| Ok(lac)
}

fn one_of_each() -> ModelSnapshot {
    ModelSnapshot {
        clients: vec![ClientState::Inactive],
        bookies: vec![PeerSnapshot::default()],
        network: vec![],
        zoo_keeper: CoordinatorSnapshot::default(),
    }
}

fn writer(entries: u64) -> ClientState {
    ClientState::Writer {
        ledger: 1,
        entries,
        ensemble: smallvec![1],
    }
}

#[test]
fn test_single_client_single_peer_no_messages() {
    let view = View::from_snapshot(ViewConfig::default(), one_of_each(), 0.0, &fixed_lac(0))
        .unwrap();

    assert_eq!(view.scene().element_count(), 3);

    let client = view.scene().collection(CLIENTS_VAR).unwrap().get(0).unwrap();
    match client.attrs().shape {
        Shape::Rect(bbox) => {
            // N = 1 collapses the centering offset
            assert_eq!(bbox.center().x, view.config().layout.mid_x);
        }
        ref other => panic!("client drawn as {:?}", other),
    }
}

#[test]
fn test_writer_falls_behind_its_ack_position() {
    let mut snapshot = one_of_each();
    snapshot.clients[0] = writer(5);
    let lac = fixed_lac(5);

    let mut view = View::from_snapshot(ViewConfig::default(), snapshot.clone(), 0.0, &lac).unwrap();
    let client = view.scene().collection(CLIENTS_VAR).unwrap().get(0).unwrap();
    let id = client.id();
    assert_eq!(client.attrs().stroke, StrokeStyle::Solid);

    snapshot.clients[0] = writer(6);
    let stats = view.update_snapshot(snapshot, 1.0, &lac).unwrap();
    assert_eq!(stats.entered, 0);
    assert_eq!(stats.exited, 0);

    let client = view.scene().collection(CLIENTS_VAR).unwrap().get(0).unwrap();
    assert_eq!(client.id(), id);
    assert_eq!(client.attrs().stroke, StrokeStyle::CatchingUp);
    assert_eq!(client.attrs().text.as_ref().unwrap().content, "L1: 6");
}

#[test]
fn test_message_halfway_through_its_interval() {
    let mut snapshot = one_of_each();
    snapshot.network.push(MessageSnapshot {
        from: EntityRef::Client(1),
        to: EntityRef::Peer(1),
        sent_at: 10.0,
        deliver_at: Some(20.0),
        kind: Some("AddEntry".to_owned()),
    });

    let view = View::from_snapshot(ViewConfig::default(), snapshot, 15.0, &fixed_lac(0)).unwrap();

    let config = &view.config().layout;
    let locator = Locator::new(Layout::new(config, 1, 1));
    let from = locator.locate(&EntityRef::Client(1)).unwrap().center();
    let to = locator.locate(&EntityRef::Peer(1)).unwrap().center();

    let dot = view.scene().collection(NETWORK_VAR).unwrap().get(0).unwrap();
    assert_eq!(dot.attrs().kind, ElementKind::Message);
    match dot.attrs().shape {
        Shape::Dot { center, .. } => {
            assert!(approx_eq!(f64, center.x, (from.x + to.x) / 2.0));
            assert!(approx_eq!(f64, center.y, (from.y + to.y) / 2.0));
        }
        ref other => panic!("message drawn as {:?}", other),
    }
}

#[test]
fn test_membership_changes_keep_surviving_ids() {
    let lac = fixed_lac(0);
    let mut snapshot = one_of_each();
    snapshot.clients = vec![ClientState::Inactive; 2];
    let mut view = View::from_snapshot(ViewConfig::default(), snapshot.clone(), 0.0, &lac).unwrap();
    let ids = |view: &View| -> Vec<u64> {
        view.scene()
            .collection(CLIENTS_VAR)
            .unwrap()
            .iter()
            .map(|e| e.id())
            .collect()
    };
    let first = ids(&view);

    snapshot.clients = vec![ClientState::Inactive; 5];
    let stats = view.update_snapshot(snapshot.clone(), 1.0, &lac).unwrap();
    assert_eq!(stats.entered, 3);
    let grown = ids(&view);
    assert_eq!(&grown[..2], &first[..]);

    // the surviving boxes moved to the new row geometry
    let layout = Layout::new(&view.config().layout, 5, 1);
    let client = view.scene().collection(CLIENTS_VAR).unwrap().get(0).unwrap();
    assert_eq!(client.attrs().shape, Shape::Rect(layout.bbox(Role::Client, 1)));

    snapshot.clients = vec![ClientState::Inactive; 1];
    let stats = view.update_snapshot(snapshot, 2.0, &lac).unwrap();
    assert_eq!(stats.exited, 4);
    assert_eq!(ids(&view), vec![first[0]]);
}

#[test]
fn test_unchanged_snapshot_is_idempotent() {
    let mut snapshot = one_of_each();
    snapshot.clients[0] = writer(3);
    let lac = fixed_lac(1);
    let mut view = View::from_snapshot(ViewConfig::default(), snapshot.clone(), 0.0, &lac).unwrap();
    let before = view.render_svg();

    let stats = view.update_snapshot(snapshot, 0.0, &lac).unwrap();
    assert_eq!(stats.entered + stats.exited, 0);
    assert_eq!(view.render_svg(), before);
}

#[test]
fn test_ack_strategy_is_only_consulted_for_writers() {
    let calls = Cell::new(0);
    let counting = |_ledger: LedgerId, _ensemble: &Ensemble| -> Result<u64> {
        calls.set(calls.get() + 1);
        Ok(0)
    };
    let mut snapshot = one_of_each();
    snapshot.clients = vec![
        ClientState::Inactive,
        writer(1),
        ClientState::Recovering { ledger: 1 },
        writer(2),
    ];
    View::from_snapshot(ViewConfig::default(), snapshot, 0.0, &counting).unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_replaying_a_model_environment() {
    let mut env = MemoryEnv::with_builtins();
    env.set_var(CLIENTS_VAR, json!([{"tag": "Inactive"}, {"tag": "CreatingLedger"}]));
    env.set_var("bookies", json!([{"ledgers": []}, {"ledgers": []}, {"ledgers": []}]));
    env.set_var(NETWORK_VAR, json!([]));
    env.set_var("zooKeeper", json!({"ledgers": []}));

    let mut view = View::new(&FixedClock(0.0), &env, ViewConfig::default()).unwrap();
    assert_eq!(view.scene().element_count(), 1 + 2 + 3);

    env.set_var(
        NETWORK_VAR,
        json!([{"from": {"tag": "Client", "id": 2}, "to": {"tag": "ZooKeeper"}, "sentAt": 1}]),
    );
    let changes: ChangeSet = [NETWORK_VAR].into_iter().collect();
    view.update(&FixedClock(5.0), &env, &changes).unwrap();
    assert_eq!(view.scene().collection(NETWORK_VAR).unwrap().len(), 1);

    // a malformed variable rejects the frame and keeps the scene
    env.set_var(CLIENTS_VAR, json!([{"tag": "Sleeping"}]));
    assert!(view.update(&FixedClock(6.0), &env, &changes).is_err());
    assert_eq!(view.scene().collection(CLIENTS_VAR).unwrap().len(), 2);
    assert_eq!(view.clock(), 5.0);
}
