#![forbid(unsafe_code)]

//! Compound commands: several child commands undone and redone as one.

use super::command::{Command, CommandMetadata, Mode, ReplayError};
use crate::event::Origin;
use crate::session::Session;

/// Owns its children by value.
///
/// Children are undone newest first and redone oldest first. A compound
/// never merges, and an empty compound is discarded on commit.
#[derive(Debug)]
pub struct CompoundCmd {
    pub(crate) meta: CommandMetadata,
    children: Vec<Command>,
}

impl CompoundCmd {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: CommandMetadata::new(label),
            children: Vec::new(),
        }
    }

    /// Take ownership of a confirmed child.
    pub fn adopt(&mut self, child: Command) {
        self.children.push(child);
    }

    #[must_use]
    pub fn children(&self) -> &[Command] {
        &self.children
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.meta.label
    }

    /// Hand the finished compound to `mode`. Returns `false` (and drops the
    /// compound) when it has no children.
    pub fn commit(self, mode: Mode<'_>) -> bool {
        if self.children.is_empty() {
            tracing::debug!(
                target: "graphedit.edit",
                label = %self.meta.label,
                "empty compound discarded"
            );
            return false;
        }
        mode.materialize(Command::Compound(self));
        true
    }

    /// Undo every child already applied and drop the compound.
    pub fn rollback(self, session: &mut Session) -> Result<(), ReplayError> {
        tracing::debug!(
            target: "graphedit.edit",
            label = %self.meta.label,
            children = self.children.len(),
            "rolling back compound"
        );
        Command::Compound(self).undo(session)
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        if origin.is_undo() {
            for child in self.children.iter_mut().rev() {
                child.replay_into(session, origin, failures);
            }
        } else {
            for child in &mut self.children {
                child.replay_into(session, origin, failures);
            }
        }
    }
}
