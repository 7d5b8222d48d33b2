// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Context menu commands for clients. The view only enumerates what is valid
//! for a client's current state; executing a command belongs to whoever
//! implements [`CommandDispatch`].

use serde_json::{Value, json};

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::datamodel::{ClientId, ClientState, LedgerId, ModelSnapshot};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    CreateLedger { client: ClientId },
    RecoverLedger { client: ClientId, ledger: LedgerId },
    AppendEntry { client: ClientId },
    CloseLedger { client: ClientId },
    Reboot { client: ClientId },
}

impl Command {
    /// Stable name the dispatcher keys on.
    pub fn identifier(&self) -> &'static str {
        match self {
            Command::CreateLedger { .. } => "createLedger",
            Command::RecoverLedger { .. } => "recoverLedger",
            Command::AppendEntry { .. } => "appendEntry",
            Command::CloseLedger { .. } => "closeLedger",
            Command::Reboot { .. } => "reboot",
        }
    }

    pub fn client(&self) -> ClientId {
        match *self {
            Command::CreateLedger { client }
            | Command::RecoverLedger { client, .. }
            | Command::AppendEntry { client }
            | Command::CloseLedger { client }
            | Command::Reboot { client } => client,
        }
    }

    pub fn args(&self) -> Vec<Value> {
        match *self {
            Command::RecoverLedger { client, ledger } => vec![json!(client), json!(ledger)],
            Command::CreateLedger { client }
            | Command::AppendEntry { client }
            | Command::CloseLedger { client }
            | Command::Reboot { client } => vec![json!(client)],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub command: Command,
}

impl MenuEntry {
    fn new(label: String, command: Command) -> Self {
        MenuEntry { label, command }
    }
}

/// Receives the command behind a selected menu entry.
pub trait CommandDispatch {
    fn dispatch(&mut self, command: &Command) -> Result<()>;
}

/// Commands valid for `client` in `snapshot`, in display order.
pub fn client_menu(snapshot: &ModelSnapshot, client: ClientId) -> Result<Vec<MenuEntry>> {
    let state = snapshot.client(client).ok_or_else(|| {
        Error::new(
            ErrorKind::Command,
            ErrorCode::NotAClient,
            Some(format!(
                "client {} does not exist ({} clients)",
                client,
                snapshot.clients.len()
            )),
        )
    })?;

    let mut entries = Vec::new();
    match state {
        ClientState::Inactive => {
            entries.push(MenuEntry::new(
                "Create ledger".to_owned(),
                Command::CreateLedger { client },
            ));
            for record in snapshot.zoo_keeper.open_ledgers() {
                entries.push(MenuEntry::new(
                    format!("Recover L{}", record.id),
                    Command::RecoverLedger {
                        client,
                        ledger: record.id,
                    },
                ));
            }
        }
        ClientState::Writer { ledger, .. } => {
            entries.push(MenuEntry::new(
                format!("Append entry to L{}", ledger),
                Command::AppendEntry { client },
            ));
            entries.push(MenuEntry::new(
                format!("Close L{}", ledger),
                Command::CloseLedger { client },
            ));
        }
        ClientState::CreatingLedger | ClientState::Recovering { .. } => {}
    }

    if *state != ClientState::Inactive {
        entries.push(MenuEntry::new("Reboot".to_owned(), Command::Reboot { client }));
    }

    Ok(entries)
}
