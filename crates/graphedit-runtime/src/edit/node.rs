#![forbid(unsafe_code)]

//! Node lifecycle commands: create, erase, rename, unfeed-and-erase.

use graphedit_core::{ExportFormat, Feed, NodeName, PlugPath};

use super::err_str;
use super::feed::{ConnectFeedCmd, issue_connect};
use crate::event::{Change, Origin, Severity};
use crate::session::Session;
use crate::undo::{Command, CommandMetadata, CompoundCmd, Mode, Rejection, UndoStack};

fn issue_create(
    session: &mut Session,
    node_type: &str,
    suggested: &NodeName,
    origin: Origin,
) -> Result<NodeName, String> {
    let result = session
        .call("create_node", |e, cb| e.create_node(node_type, suggested, cb))
        .and_then(|reply| {
            reply
                .into_name()
                .ok_or_else(|| "create_node replied without a name".to_string())
        });
    let name = result.as_ref().map_or_else(|_| suggested.clone(), Clone::clone);
    session.announce(
        Change::NodeCreated {
            name,
            node_type: node_type.to_string(),
        },
        origin,
        err_str(&result),
    );
    result
}

fn issue_erase(session: &mut Session, name: &NodeName, origin: Origin) -> Result<(), String> {
    let result = session
        .call("erase_node", |e, cb| e.erase_node(name, cb))
        .map(drop);
    session.announce(Change::NodeErased { name: name.clone() }, origin, err_str(&result));
    result
}

fn issue_rename(
    session: &mut Session,
    from: &NodeName,
    to: &NodeName,
    origin: Origin,
) -> Result<NodeName, String> {
    let result = session
        .call("rename_node", |e, cb| e.rename_node(from, to, cb))
        .map(|reply| reply.into_name().unwrap_or_else(|| to.clone()));
    let new = result.as_ref().map_or_else(|_| to.clone(), Clone::clone);
    session.announce(
        Change::NodeRenamed {
            old: from.clone(),
            new,
        },
        origin,
        err_str(&result),
    );
    result
}

/// Snapshot used to undo an erase. Not announced: it changes nothing.
fn export(
    session: &mut Session,
    name: &NodeName,
    format: ExportFormat,
) -> Result<Vec<u8>, String> {
    session
        .call("export_entity", |e, cb| e.export_entity(name, format, cb))
        .and_then(|reply| {
            reply
                .into_blob()
                .ok_or_else(|| "export_entity replied without a snapshot".to_string())
        })
}

fn import(
    session: &mut Session,
    expected: &NodeName,
    snapshot: &[u8],
    format: ExportFormat,
    origin: Origin,
) -> Result<NodeName, String> {
    let result = session
        .call("import_entity", |e, cb| e.import_entity(snapshot, format, cb))
        .map(|reply| reply.into_name().unwrap_or_else(|| expected.clone()));
    let name = result.as_ref().map_or_else(|_| expected.clone(), Clone::clone);
    let node_type = session.engine().node_type(&name).unwrap_or_default();
    session.announce(Change::NodeCreated { name, node_type }, origin, err_str(&result));
    result
}

/// Cuts each feed through the session so observers hear about it. On a
/// refusal the feeds already cut are reconnected and `false` is returned.
fn detach(
    session: &mut Session,
    feeds: &[Feed],
    origin: Origin,
    failures: &mut Vec<String>,
) -> bool {
    for (cut, feed) in feeds.iter().enumerate() {
        if let Err(message) = issue_connect(session, &feed.input, &PlugPath::none(), origin) {
            failures.push(format!("cannot unfeed '{}': {message}", feed.input));
            reattach(session, &feeds[..cut], origin, failures);
            return false;
        }
    }
    true
}

fn reattach(session: &mut Session, feeds: &[Feed], origin: Origin, failures: &mut Vec<String>) {
    for feed in feeds {
        if let Err(message) = issue_connect(session, &feed.input, &feed.output, origin) {
            failures.push(message);
        }
    }
}

// ============================================================================
// Create
// ============================================================================

/// Undo erases the node; redo creates it again under the same name.
///
/// Later entries address the node by that name, so a redo that comes back
/// with any other name is a replay failure and the stray node is erased.
#[derive(Debug, Clone)]
pub struct CreateNodeCmd {
    pub(crate) meta: CommandMetadata,
    pub(crate) node_type: String,
    pub(crate) name: NodeName,
}

impl CreateNodeCmd {
    pub fn once(
        session: &mut Session,
        node_type: &str,
        suggested: &NodeName,
    ) -> Result<NodeName, Rejection> {
        Self::apply(session, Mode::Once, node_type, suggested)
    }

    pub fn as_child(
        session: &mut Session,
        parent: &mut CompoundCmd,
        node_type: &str,
        suggested: &NodeName,
    ) -> Result<NodeName, Rejection> {
        Self::apply(session, Mode::Child(parent), node_type, suggested)
    }

    pub fn on_stack(
        session: &mut Session,
        stack: &mut UndoStack,
        node_type: &str,
        suggested: &NodeName,
    ) -> Result<NodeName, Rejection> {
        Self::apply(session, Mode::Stack(stack), node_type, suggested)
    }

    /// Returns the name the engine actually assigned.
    pub fn apply(
        session: &mut Session,
        mode: Mode<'_>,
        node_type: &str,
        suggested: &NodeName,
    ) -> Result<NodeName, Rejection> {
        let name = issue_create(session, node_type, suggested, Origin::Edit)
            .map_err(|message| Rejection::new("create_node", message))?;
        mode.materialize(Command::CreateNode(Self {
            meta: CommandMetadata::new(format!("Create {name}")),
            node_type: node_type.to_string(),
            name: name.clone(),
        }));
        Ok(name)
    }

    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    #[must_use]
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        if origin.is_undo() {
            if let Err(message) = issue_erase(session, &self.name, origin) {
                failures.push(message);
            }
            return;
        }
        match issue_create(session, &self.node_type, &self.name, origin) {
            Ok(stray) if stray != self.name => {
                failures.push(format!("'{}' came back as '{stray}'", self.name));
                if let Err(message) = issue_erase(session, &stray, origin) {
                    failures.push(message);
                }
            }
            Ok(_) => {}
            Err(message) => failures.push(message),
        }
    }
}

// ============================================================================
// Erase
// ============================================================================

/// Holds an exported snapshot and the feeds attached at erase time.
///
/// The feeds are cut through the session before the erase, so each one is
/// announced. Undo re-imports the snapshot and then reconnects them.
#[derive(Debug, Clone)]
pub struct EraseNodeCmd {
    pub(crate) meta: CommandMetadata,
    pub(crate) name: NodeName,
    pub(crate) snapshot: Vec<u8>,
    pub(crate) format: ExportFormat,
    pub(crate) feeds: Vec<Feed>,
}

impl EraseNodeCmd {
    pub fn once(session: &mut Session, name: &NodeName) -> Result<(), Rejection> {
        Self::apply(session, Mode::Once, name)
    }

    pub fn as_child(
        session: &mut Session,
        parent: &mut CompoundCmd,
        name: &NodeName,
    ) -> Result<(), Rejection> {
        Self::apply(session, Mode::Child(parent), name)
    }

    pub fn on_stack(
        session: &mut Session,
        stack: &mut UndoStack,
        name: &NodeName,
    ) -> Result<(), Rejection> {
        Self::apply(session, Mode::Stack(stack), name)
    }

    pub fn apply(session: &mut Session, mode: Mode<'_>, name: &NodeName) -> Result<(), Rejection> {
        let format = ExportFormat::Native;
        let snapshot = match export(session, name, format) {
            Ok(snapshot) => snapshot,
            Err(message) => {
                let reason = format!("cannot snapshot '{name}': {message}");
                return Err(session.reject("erase_node", reason));
            }
        };
        let feeds = session.engine().feeds_of(name);
        let mut failures = Vec::new();
        if !detach(session, &feeds, Origin::Edit, &mut failures) {
            return Err(Rejection::new("erase_node", failures.join("; ")));
        }
        if let Err(message) = issue_erase(session, name, Origin::Edit) {
            failures.push(message);
            reattach(session, &feeds, Origin::Edit, &mut failures);
            return Err(Rejection::new("erase_node", failures.join("; ")));
        }
        mode.materialize(Command::EraseNode(Self {
            meta: CommandMetadata::new(format!("Erase {name}")),
            name: name.clone(),
            snapshot,
            format,
            feeds,
        }));
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    #[must_use]
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }

    #[must_use]
    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        if origin.is_undo() {
            match import(session, &self.name, &self.snapshot, self.format, origin) {
                Ok(name) => {
                    self.name = name;
                    reattach(session, &self.feeds, origin, failures);
                }
                Err(message) => failures.push(message),
            }
            return;
        }
        // Refresh both: later edits may have changed the node or its feeds.
        match export(session, &self.name, self.format) {
            Ok(snapshot) => self.snapshot = snapshot,
            Err(message) => {
                failures.push(format!("cannot snapshot '{}': {message}", self.name));
                return;
            }
        }
        self.feeds = session.engine().feeds_of(&self.name);
        if !detach(session, &self.feeds, origin, failures) {
            return;
        }
        if let Err(message) = issue_erase(session, &self.name, origin) {
            failures.push(message);
        }
    }
}

/// Erase `name` after disconnecting every feed attached to it, as one
/// compound entry.
///
/// Undo re-imports the node and then reconnects each feed. If any step is
/// refused, the steps already applied are rolled back and nothing is
/// materialized.
pub fn unfeed_and_erase(
    session: &mut Session,
    mode: Mode<'_>,
    name: &NodeName,
) -> Result<(), Rejection> {
    session.nested("unfeed_and_erase", |session| {
        let mut compound = CompoundCmd::new(format!("Erase {name}"));
        let feeds = session.engine().feeds_of(name);

        let mut step = Ok(());
        for feed in &feeds {
            step = ConnectFeedCmd::apply(
                session,
                Mode::Child(&mut compound),
                &feed.input,
                &PlugPath::none(),
            );
            if step.is_err() {
                break;
            }
        }
        if step.is_ok() {
            step = EraseNodeCmd::apply(session, Mode::Child(&mut compound), name);
        }

        if let Err(rejection) = step {
            if let Err(replay) = compound.rollback(session) {
                session.report(Severity::Error, replay.to_string());
            }
            return Err(rejection);
        }
        compound.commit(mode);
        Ok(())
    })
}

// ============================================================================
// Rename
// ============================================================================

/// Never mergeable. Both names are the engine-normalized ones.
#[derive(Debug, Clone)]
pub struct RenameNodeCmd {
    pub(crate) meta: CommandMetadata,
    pub(crate) old: NodeName,
    pub(crate) new: NodeName,
}

impl RenameNodeCmd {
    pub fn once(
        session: &mut Session,
        old: &NodeName,
        new: &NodeName,
    ) -> Result<NodeName, Rejection> {
        Self::apply(session, Mode::Once, old, new)
    }

    pub fn as_child(
        session: &mut Session,
        parent: &mut CompoundCmd,
        old: &NodeName,
        new: &NodeName,
    ) -> Result<NodeName, Rejection> {
        Self::apply(session, Mode::Child(parent), old, new)
    }

    pub fn on_stack(
        session: &mut Session,
        stack: &mut UndoStack,
        old: &NodeName,
        new: &NodeName,
    ) -> Result<NodeName, Rejection> {
        Self::apply(session, Mode::Stack(stack), old, new)
    }

    /// Returns the name the engine actually assigned.
    pub fn apply(
        session: &mut Session,
        mode: Mode<'_>,
        old: &NodeName,
        new: &NodeName,
    ) -> Result<NodeName, Rejection> {
        let confirmed = issue_rename(session, old, new, Origin::Edit)
            .map_err(|message| Rejection::new("rename_node", message))?;
        mode.materialize(Command::RenameNode(Self {
            meta: CommandMetadata::new(format!("Rename {old} to {confirmed}")),
            old: old.clone(),
            new: confirmed.clone(),
        }));
        Ok(confirmed)
    }

    #[must_use]
    pub fn old(&self) -> &NodeName {
        &self.old
    }

    #[must_use]
    pub fn new_name(&self) -> &NodeName {
        &self.new
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        let result = if origin.is_undo() {
            issue_rename(session, &self.new, &self.old, origin).map(|name| self.old = name)
        } else {
            issue_rename(session, &self.old, &self.new, origin).map(|name| self.new = name)
        };
        if let Err(message) = result {
            failures.push(message);
        }
    }
}
