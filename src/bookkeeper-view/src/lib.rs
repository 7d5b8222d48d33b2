// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
pub mod datamodel;
pub mod diagram;
pub mod env;
pub mod menu;
mod view;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::datamodel::{ClientState, EntityRef, ModelSnapshot};
pub use self::diagram::layout::LayoutConfig;
pub use self::diagram::render_svg;
pub use self::env::{
    AckPosition, Controller, EvaluatedAck, FixedClock, MemoryEnv, ModelEnv, QuorumAck,
};
pub use self::menu::{Command, CommandDispatch, MenuEntry};
pub use self::view::{ChangeSet, VIEW_NAME, View, ViewConfig, ViewHandle};
