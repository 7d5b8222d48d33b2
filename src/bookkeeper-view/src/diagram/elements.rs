// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::common::Result;
use crate::datamodel::{
    ClientId, ClientState, CoordinatorSnapshot, Ensemble, HostedLedger, LedgerRecord, LedgerState,
    MessageSnapshot, PeerId, PeerSnapshot,
};
use crate::diagram::common::{BBox, Point};
use crate::diagram::constants::*;
use crate::diagram::interpolate::message_position;
use crate::diagram::layout::{Layout, LayoutConfig, Role};
use crate::diagram::locator::Locator;
use crate::diagram::scene::{Attrs, Color, ElementKind, ElementSpec, Shape, StrokeStyle, Text};
use crate::env::AckPosition;
use crate::model_err;

/// Compact ensemble rendering: bookie 1 is `A`, bookie 2 is `B`, and so on.
pub fn ensemble_code(ensemble: &Ensemble) -> Result<String> {
    let mut code = String::with_capacity(ensemble.len());
    for &peer in ensemble.iter() {
        if peer == 0 || peer > MAX_ENSEMBLE_ORDINAL {
            return model_err!(
                BadEnsemble,
                format!("bookie ordinal {} has no ensemble letter", peer)
            );
        }
        code.push((b'A' + (peer - 1) as u8) as char);
    }
    Ok(code)
}

// --- text placement ---

fn title_inside(bbox: &BBox, config: &LayoutConfig) -> Point {
    Point::new(bbox.center().x, bbox.y + config.line_spacing)
}

/// Line `k` (0-based) of `count` below the title. Lines keep the configured
/// spacing while they fit; past that the spacing shrinks so the last
/// baseline stays `LABEL_PADDING` above the bottom edge. The font size is
/// not reduced, so very long lists overlap rather than overflow.
fn line_inside(bbox: &BBox, config: &LayoutConfig, k: usize, count: usize) -> Point {
    let room = bbox.height - config.line_spacing - LABEL_PADDING;
    let step = config.line_spacing.min(room / count.max(1) as f64).max(0.0);
    Point::new(bbox.center().x, bbox.y + config.line_spacing + step * (k as f64 + 1.0))
}

fn centered(bbox: &BBox, config: &LayoutConfig) -> Point {
    let c = bbox.center();
    Point::new(c.x, c.y + config.font_size / 3.0)
}

fn above(bbox: &BBox) -> Point {
    Point::new(bbox.center().x, bbox.y - LABEL_PADDING)
}

// --- Coordinator ---

fn coordinator_ledger_text(record: &LedgerRecord) -> Result<String> {
    let code = ensemble_code(&record.ensemble)?;
    Ok(match record.state {
        LedgerState::Open => format!("L{} {}", record.id, code),
        LedgerState::Closed { lac } => format!("L{} {} closed @{}", record.id, code, lac),
    })
}

pub fn coordinator_spec(layout: &Layout, zk: &CoordinatorSnapshot) -> Result<ElementSpec> {
    let config = layout.config();
    let bbox = layout.bbox(Role::Coordinator, 1);

    let mut attrs = Attrs::new(
        ElementKind::Coordinator,
        Shape::Rect(bbox),
        Color::Coordination,
    );
    attrs.label = Some(Text::new(
        title_inside(&bbox, config),
        COORDINATOR_TITLE.to_owned(),
    ));

    let mut children = Vec::with_capacity(zk.ledgers.len());
    for (k, record) in zk.ledgers.iter().enumerate() {
        let mut label = Attrs::new(ElementKind::LedgerLabel, Shape::None, Color::Text);
        label.text = Some(Text::new(
            line_inside(&bbox, config, k, zk.ledgers.len()),
            coordinator_ledger_text(record)?,
        ));
        children.push(ElementSpec::new(label));
    }

    Ok(ElementSpec { attrs, children })
}

// --- Client ---

fn client_fill(state: &ClientState) -> Color {
    match state {
        ClientState::Inactive => Color::Neutral,
        ClientState::CreatingLedger | ClientState::Writer { .. } => Color::Active,
        ClientState::Recovering { .. } => Color::Pending,
    }
}

/// Whether a writer holds entries its ensemble has not acknowledged yet.
pub fn is_catching_up(state: &ClientState, ack: &dyn AckPosition) -> Result<bool> {
    match state {
        ClientState::Writer {
            ledger,
            entries,
            ensemble,
        } => {
            let lac = ack.compute_ack_position(*ledger, ensemble)?;
            Ok(*entries > lac)
        }
        ClientState::Inactive | ClientState::CreatingLedger | ClientState::Recovering { .. } => {
            Ok(false)
        }
    }
}

fn client_text(state: &ClientState) -> Option<String> {
    match state {
        ClientState::Writer {
            ledger, entries, ..
        } => Some(format!("L{}: {}", ledger, entries)),
        ClientState::Recovering { ledger } => Some(format!("L{}", ledger)),
        ClientState::Inactive | ClientState::CreatingLedger => None,
    }
}

pub fn client_spec(
    layout: &Layout,
    id: ClientId,
    state: &ClientState,
    ack: &dyn AckPosition,
) -> Result<ElementSpec> {
    let config = layout.config();
    let bbox = layout.bbox(Role::Client, id);

    let mut attrs = Attrs::new(ElementKind::Client, Shape::Rect(bbox), client_fill(state));
    if is_catching_up(state, ack)? {
        attrs.stroke = StrokeStyle::CatchingUp;
    }
    attrs.label = Some(Text::new(above(&bbox), format!("C{}", id)));
    attrs.text = client_text(state).map(|content| Text::new(centered(&bbox, config), content));

    Ok(ElementSpec::new(attrs))
}

// --- Peer ---

fn hosted_ledger_text(ledger: &HostedLedger) -> String {
    format!("L{}: {} lac {}", ledger.id, ledger.entries, ledger.lac)
}

pub fn peer_spec(layout: &Layout, id: PeerId, peer: &PeerSnapshot) -> ElementSpec {
    let config = layout.config();
    let bbox = layout.bbox(Role::Peer, id);

    let mut attrs = Attrs::new(ElementKind::Peer, Shape::Rect(bbox), Color::Storage);
    attrs.label = Some(Text::new(title_inside(&bbox, config), format!("B{}", id)));

    let count = peer.ledgers.len();
    let children = peer
        .ledgers
        .iter()
        .enumerate()
        .map(|(k, ledger)| {
            let color = if ledger.fenced {
                Color::Fenced
            } else {
                Color::Text
            };
            let mut label = Attrs::new(ElementKind::LedgerLabel, Shape::None, Color::Text);
            label.text = Some(
                Text::new(line_inside(&bbox, config, k, count), hosted_ledger_text(ledger))
                    .with_color(color),
            );
            ElementSpec::new(label)
        })
        .collect();

    ElementSpec { attrs, children }
}

// --- Message ---

pub fn message_spec(
    locator: &Locator,
    message: &MessageSnapshot,
    clock: f64,
) -> Result<ElementSpec> {
    let r = locator.layout().config().message_radius;
    let center = message_position(locator, message, clock)?;

    let mut attrs = Attrs::new(ElementKind::Message, Shape::Dot { center, r }, Color::Message);
    attrs.label = message.kind.as_ref().map(|kind| {
        Text::new(
            Point::new(center.x, center.y - r - MESSAGE_LABEL_PADDING),
            kind.clone(),
        )
    });

    Ok(ElementSpec::new(attrs))
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::common::ErrorCode;
    use crate::datamodel::{EntityRef, LedgerId};

    fn no_lag(_ledger: LedgerId, _ensemble: &Ensemble) -> Result<u64> {
        Ok(u64::MAX)
    }

    fn writer(entries: u64) -> ClientState {
        ClientState::Writer {
            ledger: 1,
            entries,
            ensemble: smallvec![1, 2, 3],
        }
    }

    #[test]
    fn test_ensemble_code() {
        assert_eq!(ensemble_code(&smallvec![1, 2, 3]).unwrap(), "ABC");
        assert_eq!(ensemble_code(&smallvec![3, 1]).unwrap(), "CA");
        assert_eq!(ensemble_code(&smallvec![26]).unwrap(), "Z");
        assert_eq!(ensemble_code(&smallvec![]).unwrap(), "");
        let err = ensemble_code(&smallvec![0]).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadEnsemble);
        assert!(ensemble_code(&smallvec![27]).is_err());
    }

    #[test]
    fn test_client_fill_by_state() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 4, 3);
        let states = [
            (ClientState::Inactive, Color::Neutral),
            (ClientState::CreatingLedger, Color::Active),
            (writer(1), Color::Active),
            (ClientState::Recovering { ledger: 2 }, Color::Pending),
        ];
        for (i, (state, fill)) in states.iter().enumerate() {
            let spec = client_spec(&layout, i as u32 + 1, state, &no_lag).unwrap();
            assert_eq!(spec.attrs.fill, *fill, "{:?}", state);
            assert_eq!(spec.attrs.kind, ElementKind::Client);
            assert!(spec.children.is_empty());
        }
    }

    #[test]
    fn test_client_text() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 1, 3);

        let spec = client_spec(&layout, 1, &writer(5), &no_lag).unwrap();
        assert_eq!(spec.attrs.text.unwrap().content, "L1: 5");
        assert_eq!(spec.attrs.label.unwrap().content, "C1");

        let recovering = ClientState::Recovering { ledger: 4 };
        let spec = client_spec(&layout, 1, &recovering, &no_lag).unwrap();
        assert_eq!(spec.attrs.text.unwrap().content, "L4");

        let spec = client_spec(&layout, 1, &ClientState::Inactive, &no_lag).unwrap();
        assert!(spec.attrs.text.is_none());
    }

    #[test]
    fn test_catching_up_marker() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 1, 3);
        let lac_five = |_ledger: LedgerId, _ensemble: &Ensemble| -> Result<u64> { Ok(5) };

        let spec = client_spec(&layout, 1, &writer(5), &lac_five).unwrap();
        assert_eq!(spec.attrs.stroke, StrokeStyle::Solid);

        let spec = client_spec(&layout, 1, &writer(6), &lac_five).unwrap();
        assert_eq!(spec.attrs.stroke, StrokeStyle::CatchingUp);

        // only writers consult the ack position
        let failing = |_ledger: LedgerId, _ensemble: &Ensemble| -> Result<u64> {
            model_err!(UnknownFunction, "no lac".to_owned())
        };
        assert!(!is_catching_up(&ClientState::Inactive, &failing).unwrap());
        assert!(client_spec(&layout, 1, &writer(1), &failing).is_err());
    }

    #[test]
    fn test_ack_sees_writer_ensemble() {
        let seen = std::cell::RefCell::new(Vec::new());
        let recording = |ledger: LedgerId, ensemble: &Ensemble| -> Result<u64> {
            seen.borrow_mut().push((ledger, ensemble.to_vec()));
            Ok(0)
        };
        assert!(is_catching_up(&writer(1), &recording).unwrap());
        assert_eq!(*seen.borrow(), vec![(1, vec![1, 2, 3])]);
    }

    #[test]
    fn test_peer_labels() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 1, 2);
        let peer = PeerSnapshot {
            ledgers: vec![
                HostedLedger {
                    id: 1,
                    entries: 5,
                    lac: 4,
                    fenced: false,
                },
                HostedLedger {
                    id: 2,
                    entries: 3,
                    lac: 3,
                    fenced: true,
                },
            ],
        };
        let spec = peer_spec(&layout, 2, &peer);
        assert_eq!(spec.attrs.fill, Color::Storage);
        assert_eq!(spec.attrs.shape, Shape::Rect(layout.bbox(Role::Peer, 2)));
        assert_eq!(spec.attrs.label.as_ref().unwrap().content, "B2");
        assert_eq!(spec.children.len(), 2);

        let first = spec.children[0].attrs.text.as_ref().unwrap();
        let second = spec.children[1].attrs.text.as_ref().unwrap();
        assert_eq!(first.content, "L1: 5 lac 4");
        assert_eq!(first.color, Color::Text);
        assert_eq!(second.content, "L2: 3 lac 3");
        assert_eq!(second.color, Color::Fenced);
        assert!(second.at.y > first.at.y);
    }

    #[test]
    fn test_coordinator_labels() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 1, 3);
        let zk = CoordinatorSnapshot {
            ledgers: vec![
                LedgerRecord {
                    id: 1,
                    ensemble: smallvec![1, 2, 3],
                    state: LedgerState::Closed { lac: 7 },
                },
                LedgerRecord {
                    id: 2,
                    ensemble: smallvec![2, 3],
                    state: LedgerState::Open,
                },
            ],
        };
        let spec = coordinator_spec(&layout, &zk).unwrap();
        assert_eq!(spec.attrs.fill, Color::Coordination);
        assert_eq!(spec.attrs.label.as_ref().unwrap().content, COORDINATOR_TITLE);
        let texts: Vec<&str> = spec
            .children
            .iter()
            .map(|c| c.attrs.text.as_ref().unwrap().content.as_str())
            .collect();
        assert_eq!(texts, vec!["L1 ABC closed @7", "L2 BC"]);
    }

    fn label_ys(spec: &ElementSpec) -> Vec<f64> {
        spec.children
            .iter()
            .map(|c| c.attrs.text.as_ref().unwrap().at.y)
            .collect()
    }

    #[test]
    fn test_ledger_labels_stay_inside_box() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 1, 1);

        let hosted = |id| HostedLedger {
            id,
            entries: 1,
            lac: 0,
            fenced: false,
        };
        for count in 1..=8 {
            let peer = PeerSnapshot {
                ledgers: (1..=count).map(hosted).collect(),
            };
            let bbox = layout.bbox(Role::Peer, 1);
            let ys = label_ys(&peer_spec(&layout, 1, &peer));
            assert_eq!(ys.len(), count as usize);
            assert!(ys.windows(2).all(|w| w[1] > w[0]), "{:?}", ys);
            assert!(ys[0] > bbox.y + config.line_spacing);
            assert!(*ys.last().unwrap() <= bbox.bottom() - LABEL_PADDING, "{:?}", ys);
        }

        let record = |id| LedgerRecord {
            id,
            ensemble: smallvec![1],
            state: LedgerState::Open,
        };
        for count in 1..=6 {
            let zk = CoordinatorSnapshot {
                ledgers: (1..=count).map(record).collect(),
            };
            let bbox = layout.bbox(Role::Coordinator, 1);
            let ys = label_ys(&coordinator_spec(&layout, &zk).unwrap());
            assert!(ys.windows(2).all(|w| w[1] > w[0]), "{:?}", ys);
            assert!(*ys.last().unwrap() <= bbox.bottom() - LABEL_PADDING, "{:?}", ys);
        }
    }

    #[test]
    fn test_ledger_labels_keep_spacing_when_they_fit() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 1, 1);
        let zk = CoordinatorSnapshot {
            ledgers: (1..=3)
                .map(|id| LedgerRecord {
                    id,
                    ensemble: smallvec![1],
                    state: LedgerState::Open,
                })
                .collect(),
        };
        let bbox = layout.bbox(Role::Coordinator, 1);
        let expected: Vec<f64> = (0..3)
            .map(|k| bbox.y + config.line_spacing * (k as f64 + 2.0))
            .collect();
        assert_eq!(label_ys(&coordinator_spec(&layout, &zk).unwrap()), expected);
    }

    #[test]
    fn test_coordinator_bad_ensemble() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 0, 0);
        let zk = CoordinatorSnapshot {
            ledgers: vec![LedgerRecord {
                id: 1,
                ensemble: smallvec![30],
                state: LedgerState::Open,
            }],
        };
        assert!(coordinator_spec(&layout, &zk).is_err());
    }

    #[test]
    fn test_message_dot() {
        let config = LayoutConfig::default();
        let layout = Layout::new(&config, 1, 1);
        let locator = Locator::new(layout);
        let message = MessageSnapshot {
            from: EntityRef::Client(1),
            to: EntityRef::Peer(1),
            sent_at: 0.0,
            deliver_at: Some(10.0),
            kind: Some("AddEntry".to_owned()),
        };
        let spec = message_spec(&locator, &message, 0.0).unwrap();
        let from = layout.bbox(Role::Client, 1).center();
        assert_eq!(
            spec.attrs.shape,
            Shape::Dot {
                center: from,
                r: config.message_radius
            }
        );
        let label = spec.attrs.label.unwrap();
        assert_eq!(label.content, "AddEntry");
        assert!(label.at.y < from.y);
    }
}
