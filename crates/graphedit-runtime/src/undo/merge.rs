#![forbid(unsafe_code)]

//! Coalescing of consecutive edits into one history entry.
//!
//! A push may merge only into the current top of the stack. The incoming
//! command is absorbed when all of these hold:
//!
//! 1. merging is enabled and the incoming command is flagged mergeable;
//! 2. both are the same variant, matched structurally below;
//! 3. they address the same target (batches: same targets, same order);
//! 4. the gap since the top last changed is within `max_gap_ms`.
//!
//! On merge the top keeps its old value and label and takes the incoming
//! new value. Creates, erases, renames, feeds, plug flags and compounds
//! never merge.

use super::command::{Command, CommandMetadata};

/// When consecutive edits may coalesce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct MergePolicy {
    pub enabled: bool,
    /// Largest gap between merged edits in milliseconds (0 = unbounded).
    pub max_gap_ms: u64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_gap_ms: 0,
        }
    }
}

impl MergePolicy {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_gap_ms: 0,
        }
    }

    #[must_use]
    pub fn within(max_gap_ms: u64) -> Self {
        Self {
            enabled: true,
            max_gap_ms,
        }
    }

    /// Metadata-level checks, before variants are compared.
    #[must_use]
    pub fn admits(&self, top: &CommandMetadata, incoming: &CommandMetadata) -> bool {
        if !self.enabled || !incoming.mergeable {
            return false;
        }
        if self.max_gap_ms == 0 {
            return true;
        }
        let gap = incoming.timestamp.saturating_duration_since(top.timestamp);
        gap.as_millis() <= u128::from(self.max_gap_ms)
    }
}

impl Command {
    /// Absorb `incoming` into `self`, or hand it back untouched.
    pub fn merge(&mut self, incoming: Command, policy: &MergePolicy) -> Result<(), Command> {
        if !policy.admits(self.meta(), incoming.meta()) {
            return Err(incoming);
        }
        match (self, incoming) {
            (Command::SetParameter(top), Command::SetParameter(next))
                if top.path == next.path && top.component == next.component =>
            {
                top.new = next.new;
                top.meta.timestamp = next.meta.timestamp;
                Ok(())
            }
            (Command::SetVector3(top), Command::SetVector3(next)) if top.path == next.path => {
                top.new = next.new;
                top.meta.timestamp = next.meta.timestamp;
                Ok(())
            }
            (Command::SetMeta(top), Command::SetMeta(next)) if top.same_targets(&next) => {
                top.absorb(next);
                Ok(())
            }
            (Command::SetOperatorState(top), Command::SetOperatorState(next))
                if top.same_targets(&next) =>
            {
                top.absorb(next);
                Ok(())
            }
            (_, incoming) => Err(incoming),
        }
    }
}
