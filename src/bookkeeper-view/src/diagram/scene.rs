// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The retained scene and the positional reconciliation that keeps it in
//! sync with the model.
//!
//! Identity of a rendered element is positional for this model, since the
//! external model never reorders these collections in practice: the element
//! at index `i` of a collection is bound to whatever entity sits at index `i`
//! of the snapshot. A reorder in the model therefore looks like in-place
//! mutation here.

use tracing::trace;

use crate::common::Result;
use crate::diagram::common::{BBox, Point};

pub type ElementId = u64;

/// Name of the nested collection holding ledger labels.
pub const LEDGERS_COLLECTION: &str = "ledgers";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Coordinator,
    Client,
    Peer,
    Message,
    LedgerLabel,
}

/// Semantic colors; the renderer decides what they look like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Neutral,
    Active,
    Pending,
    Storage,
    Coordination,
    Message,
    Text,
    Fenced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrokeStyle {
    Solid,
    /// The writer has entries its ensemble has not yet acknowledged.
    CatchingUp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(BBox),
    Dot { center: Point, r: f64 },
    None,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Text {
    pub at: Point,
    pub content: String,
    pub color: Color,
}

impl Text {
    pub fn new(at: Point, content: String) -> Self {
        Text {
            at,
            content,
            color: Color::Text,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Everything visible about one element, derived fresh every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Attrs {
    pub kind: ElementKind,
    pub shape: Shape,
    pub fill: Color,
    pub stroke: StrokeStyle,
    /// Caption outside (or atop) the shape.
    pub label: Option<Text>,
    /// Text inside the shape.
    pub text: Option<Text>,
}

impl Attrs {
    pub fn new(kind: ElementKind, shape: Shape, fill: Color) -> Self {
        Attrs {
            kind,
            shape,
            fill,
            stroke: StrokeStyle::Solid,
            label: None,
            text: None,
        }
    }
}

/// Desired state of an element and its nested children.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSpec {
    pub attrs: Attrs,
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(attrs: Attrs) -> Self {
        ElementSpec {
            attrs,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct VisualElement {
    id: ElementId,
    attrs: Attrs,
    children: Collection,
}

impl VisualElement {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn children(&self) -> &Collection {
        &self.children
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

impl ReconcileStats {
    pub fn merge(&mut self, other: ReconcileStats) {
        self.entered += other.entered;
        self.updated += other.updated;
        self.exited += other.exited;
    }
}

#[derive(Clone, Debug)]
pub struct Collection {
    name: String,
    elements: Vec<VisualElement>,
}

impl Collection {
    pub fn new(name: &str) -> Self {
        Collection {
            name: name.to_owned(),
            elements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VisualElement> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisualElement> {
        self.elements.iter()
    }

    /// Positional enter/update/exit against `specs`. Nested children are
    /// reconciled with the same rule. Infallible: specs are already derived.
    fn apply(&mut self, specs: Vec<ElementSpec>, next_id: &mut ElementId) -> ReconcileStats {
        let mut stats = ReconcileStats::default();

        let kept = self.elements.len().min(specs.len());
        if self.elements.len() > specs.len() {
            stats.exited = self.elements.len() - specs.len();
            for (index, removed) in self.elements.drain(specs.len()..).enumerate() {
                trace!(
                    collection = %self.name,
                    index = kept + index,
                    id = removed.id,
                    "exit"
                );
            }
        }

        for (index, spec) in specs.into_iter().enumerate() {
            let ElementSpec { attrs, children } = spec;
            if index < kept {
                let element = &mut self.elements[index];
                element.attrs = attrs;
                element.children.apply(children, next_id);
                stats.updated += 1;
            } else {
                let id = *next_id;
                *next_id += 1;
                trace!(collection = %self.name, index, id, "enter");
                let mut nested = Collection::new(LEDGERS_COLLECTION);
                nested.apply(children, next_id);
                self.elements.push(VisualElement {
                    id,
                    attrs,
                    children: nested,
                });
                stats.entered += 1;
            }
        }

        stats
    }
}

/// The retained set of visual elements, partitioned into named collections
/// painted in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    collections: Vec<Collection>,
    next_id: ElementId,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Top-level elements across every collection; nested labels excluded.
    pub fn element_count(&self) -> usize {
        self.collections.iter().map(|c| c.len()).sum()
    }

    /// Synchronizes collection `name` against `items` by position.
    ///
    /// `attr_fn` runs for every item before anything is mutated, so a failing
    /// item leaves the collection exactly as it was.
    pub fn reconcile<T, F>(
        &mut self,
        name: &str,
        items: &[T],
        mut attr_fn: F,
    ) -> Result<ReconcileStats>
    where
        F: FnMut(&T, usize) -> Result<ElementSpec>,
    {
        let specs = items
            .iter()
            .enumerate()
            .map(|(index, item)| attr_fn(item, index))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.apply(name, specs))
    }

    /// Reconciles `name` against already-derived specs, creating the
    /// collection on first use.
    pub fn apply(&mut self, name: &str, specs: Vec<ElementSpec>) -> ReconcileStats {
        let index = match self.collections.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.collections.push(Collection::new(name));
                self.collections.len() - 1
            }
        };
        let Scene {
            collections,
            next_id,
        } = self;
        collections[index].apply(specs, next_id)
    }
}
