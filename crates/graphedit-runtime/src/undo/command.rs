#![forbid(unsafe_code)]

//! The closed set of undoable commands and how they are invoked.
//!
//! A [`Command`] exists only after the engine confirmed the edit it
//! describes. Undo and redo never restore cached state locally: they
//! re-issue the inverse or original engine call through the session, so
//! the engine validates and normalizes again.
//!
//! # Invocation modes
//!
//! Every concrete command exposes the same three entry points, all
//! delegating to one `apply(session, mode, ..)`:
//!
//! | Entry point | [`Mode`] | On confirmation |
//! |-------------|----------|-----------------|
//! | `once`      | `Once`   | nothing is materialized |
//! | `as_child`  | `Child`  | adopted by the parent [`CompoundCmd`] |
//! | `on_stack`  | `Stack`  | pushed onto the [`UndoStack`], may merge |
//!
//! # Ownership
//!
//! A command has exactly one owner: the undo stack or its parent compound.
//! Dropping the owner drops every command it holds.

use std::fmt;

use tracing::info_span;
use web_time::Instant;

use super::batch::BatchCmd;
use super::compound::CompoundCmd;
use super::history::UndoStack;
use crate::edit::{
    ConnectFeedCmd, CreateNodeCmd, EraseNodeCmd, MetaEdit, RenameNodeCmd, SetParameterCmd,
    SetPlugFlagCmd, SetVector3Cmd, StateEdit,
};
use crate::event::Origin;
use crate::session::Session;

/// Metadata shared by every command.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Human-readable label shown in undo menus.
    pub label: String,
    /// Creation time, refreshed whenever another edit merges in.
    pub timestamp: Instant,
    /// Whether this edit may coalesce into the previous one.
    pub mergeable: bool,
}

impl CommandMetadata {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            timestamp: Instant::now(),
            mergeable: false,
        }
    }

    #[must_use]
    pub fn with_mergeable(mut self, mergeable: bool) -> Self {
        self.mergeable = mergeable;
        self
    }
}

/// A materialized, undoable edit.
#[derive(Debug)]
pub enum Command {
    CreateNode(CreateNodeCmd),
    EraseNode(EraseNodeCmd),
    RenameNode(RenameNodeCmd),
    ConnectFeed(ConnectFeedCmd),
    SetParameter(SetParameterCmd),
    SetVector3(SetVector3Cmd),
    SetMeta(BatchCmd<MetaEdit>),
    SetOperatorState(BatchCmd<StateEdit>),
    SetPlugFlag(SetPlugFlagCmd),
    Compound(CompoundCmd),
}

impl Command {
    #[must_use]
    pub fn meta(&self) -> &CommandMetadata {
        match self {
            Self::CreateNode(c) => &c.meta,
            Self::EraseNode(c) => &c.meta,
            Self::RenameNode(c) => &c.meta,
            Self::ConnectFeed(c) => &c.meta,
            Self::SetParameter(c) => &c.meta,
            Self::SetVector3(c) => &c.meta,
            Self::SetMeta(c) => &c.meta,
            Self::SetOperatorState(c) => &c.meta,
            Self::SetPlugFlag(c) => &c.meta,
            Self::Compound(c) => &c.meta,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.meta().label
    }

    /// Short machine name of the variant, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateNode(_) => "create_node",
            Self::EraseNode(_) => "erase_node",
            Self::RenameNode(_) => "rename_node",
            Self::ConnectFeed(_) => "connect_feed",
            Self::SetParameter(_) => "set_parameter",
            Self::SetVector3(_) => "set_vector3",
            Self::SetMeta(_) => "set_meta",
            Self::SetOperatorState(_) => "set_operator_state",
            Self::SetPlugFlag(_) => "set_plug_flag",
            Self::Compound(_) => "compound",
        }
    }

    /// The children of a compound, or an empty slice.
    #[must_use]
    pub fn children(&self) -> &[Command] {
        match self {
            Self::Compound(c) => c.children(),
            _ => &[],
        }
    }

    /// Re-issue the inverse engine call(s).
    pub fn undo(&mut self, session: &mut Session) -> Result<(), ReplayError> {
        self.replay(session, Origin::Undo)
    }

    /// Re-issue the original engine call(s).
    pub fn redo(&mut self, session: &mut Session) -> Result<(), ReplayError> {
        self.replay(session, Origin::Redo)
    }

    fn replay(&mut self, session: &mut Session, origin: Origin) -> Result<(), ReplayError> {
        let span = info_span!(
            "command.replay",
            command = self.kind(),
            label = %self.label(),
            %origin
        );
        let _guard = span.enter();

        let mut failures = Vec::new();
        self.replay_into(session, origin, &mut failures);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReplayError {
                label: self.label().to_string(),
                origin,
                failures,
            })
        }
    }

    /// Replay without opening a span, appending every engine refusal.
    pub(crate) fn replay_into(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        match self {
            Self::CreateNode(c) => c.replay(session, origin, failures),
            Self::EraseNode(c) => c.replay(session, origin, failures),
            Self::RenameNode(c) => c.replay(session, origin, failures),
            Self::ConnectFeed(c) => c.replay(session, origin, failures),
            Self::SetParameter(c) => c.replay(session, origin, failures),
            Self::SetVector3(c) => c.replay(session, origin, failures),
            Self::SetMeta(c) => c.replay(session, origin, failures),
            Self::SetOperatorState(c) => c.replay(session, origin, failures),
            Self::SetPlugFlag(c) => c.replay(session, origin, failures),
            Self::Compound(c) => c.replay(session, origin, failures),
        }
    }
}

/// Where a confirmed edit goes.
#[derive(Debug)]
pub enum Mode<'a> {
    /// Apply and forget.
    Once,
    /// Attach to a compound that is pushed or discarded later as a unit.
    Child(&'a mut CompoundCmd),
    /// Push onto the undo stack, merging into the top when allowed.
    Stack(&'a mut UndoStack),
}

impl Mode<'_> {
    /// Hand a freshly confirmed command to its owner.
    pub(crate) fn materialize(self, command: Command) {
        match self {
            Self::Once => {}
            Self::Child(parent) => parent.adopt(command),
            Self::Stack(stack) => {
                stack.push(command);
            }
        }
    }
}

/// An edit the engine (or the pre-call snapshot) refused.
///
/// Nothing changed and nothing was materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub operation: &'static str,
    pub message: String,
}

impl Rejection {
    #[must_use]
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rejected: {}", self.operation, self.message)
    }
}

impl std::error::Error for Rejection {}

/// The engine refused at least one call while replaying a command.
///
/// The history cursor has moved regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayError {
    pub label: String,
    pub origin: Origin,
    /// One message per refused engine call, in call order.
    pub failures: Vec<String>,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of '{}' failed: {}",
            self.origin,
            self.label,
            self.failures.join("; ")
        )
    }
}

impl std::error::Error for ReplayError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults_not_mergeable() {
        let meta = CommandMetadata::new("Set Foo.mass");
        assert!(!meta.mergeable);
        assert!(meta.with_mergeable(true).mergeable);
    }

    #[test]
    fn test_rejection_display() {
        let r = Rejection::new("rename_node", "name 'B' is already in use");
        assert_eq!(r.to_string(), "rename_node rejected: name 'B' is already in use");
    }

    #[test]
    fn test_replay_error_display() {
        let e = ReplayError {
            label: "Move 2 nodes".into(),
            origin: Origin::Undo,
            failures: vec!["A:position: gone".into(), "B:position: gone".into()],
        };
        assert_eq!(
            e.to_string(),
            "undo of 'Move 2 nodes' failed: A:position: gone; B:position: gone"
        );
    }
}
