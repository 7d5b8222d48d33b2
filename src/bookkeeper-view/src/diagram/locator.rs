// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::common::Result;
use crate::datamodel::EntityRef;
use crate::diagram::common::BBox;
use crate::diagram::layout::{Layout, Role};
use crate::model_err;

/// Resolves entity references to the same boxes the frame's nodes are drawn
/// in. Built from the frame's [`Layout`], so it can never disagree with it.
#[derive(Clone, Copy, Debug)]
pub struct Locator<'a> {
    layout: Layout<'a>,
}

impl<'a> Locator<'a> {
    pub fn new(layout: Layout<'a>) -> Self {
        Locator { layout }
    }

    pub fn layout(&self) -> &Layout<'a> {
        &self.layout
    }

    pub fn locate(&self, entity: &EntityRef) -> Result<BBox> {
        let (role, id) = match *entity {
            EntityRef::Coordinator => return Ok(self.layout.bbox(Role::Coordinator, 1)),
            EntityRef::Client(id) => (Role::Client, id),
            EntityRef::Peer(id) => (Role::Peer, id),
        };

        let total = self.layout.total(role);
        if id == 0 || id as usize > total {
            return model_err!(
                DoesNotExist,
                format!("{:?} is outside the {} rendered {:?} nodes", entity, total, role)
            );
        }

        Ok(self.layout.bbox(role, id))
    }
}
