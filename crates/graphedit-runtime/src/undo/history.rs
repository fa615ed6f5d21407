#![forbid(unsafe_code)]

//! Bounded undo history with a clean marker.
//!
//! # Invariants
//!
//! 1. `index <= commands.len()`; entries `[0, index)` are done, the rest undone.
//! 2. `commands.len() <= config.max_depth` after every push (0 = unlimited).
//! 3. A push discards every undone entry first.
//! 4. `clean`, when set, is the `index` at which the document was saved.
//!
//! # Memory Model
//!
//! ```text
//! push(c4) with index == 3
//! ┌──────────────────────────────┐
//! │ [c1, c2, c3, c4]    index 4  │
//! └──────────────────────────────┘
//! undo() x2
//! ┌──────────────────────────────┐
//! │ [c1, c2 | c3, c4]   index 2  │
//! └──────────────────────────────┘
//! push(c5)  <-- drops c3, c4
//! ┌──────────────────────────────┐
//! │ [c1, c2, c5]        index 3  │
//! └──────────────────────────────┘
//! ```
//!
//! # Failure Modes
//!
//! - **Replay refused**: when the engine refuses an undo or redo, the cursor
//!   has already moved and stays moved. Document state can then disagree
//!   with the history position; the refusal is reported, never repaired.

use std::collections::VecDeque;

use tracing::{info, warn};

use super::command::{Command, ReplayError};
use crate::config::HistoryConfig;
use crate::event::Event;
use crate::hub::NotificationHub;
use crate::session::Session;

/// What [`UndoStack::push`] did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushed {
    Appended,
    /// Absorbed into the previous top.
    Merged,
}

pub struct UndoStack {
    commands: VecDeque<Command>,
    index: usize,
    clean: Option<usize>,
    config: HistoryConfig,
    hub: NotificationHub,
}

impl std::fmt::Debug for UndoStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoStack")
            .field("len", &self.commands.len())
            .field("index", &self.index)
            .field("clean", &self.clean)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UndoStack {
    /// Empty, clean stack publishing its signals on `hub`.
    #[must_use]
    pub fn new(config: HistoryConfig, hub: NotificationHub) -> Self {
        Self {
            commands: VecDeque::new(),
            index: 0,
            clean: Some(0),
            config,
            hub,
        }
    }

    /// Stack sharing `session`'s hub.
    #[must_use]
    pub fn for_session(session: &Session, config: HistoryConfig) -> Self {
        Self::new(config, session.hub().clone())
    }

    /// Record an already applied command. It is not replayed.
    pub fn push(&mut self, command: Command) -> Pushed {
        let was_clean = self.is_clean();

        if self.index < self.commands.len() {
            self.commands.truncate(self.index);
            if self.clean.is_some_and(|c| c > self.index) {
                self.clean = None;
            }
        }

        let kind = command.kind();
        let pushed = match self.try_merge(command) {
            Ok(()) => Pushed::Merged,
            Err(command) => {
                self.commands.push_back(command);
                self.index += 1;
                Pushed::Appended
            }
        };
        self.enforce_limits();

        info!(
            target: "graphedit.undo",
            command = kind,
            label = self.undo_label().unwrap_or_default(),
            depth = self.commands.len(),
            merged = pushed == Pushed::Merged,
            "history push"
        );
        self.emit_clean(was_clean);
        pushed
    }

    fn try_merge(&mut self, incoming: Command) -> Result<(), Command> {
        let Some(top) = self.commands.back_mut() else {
            return Err(incoming);
        };
        top.merge(incoming, &self.config.merge)?;
        if self.clean == Some(self.index) {
            self.clean = None;
        }
        Ok(())
    }

    fn enforce_limits(&mut self) {
        if self.config.max_depth == 0 {
            return;
        }
        while self.commands.len() > self.config.max_depth {
            if self.commands.pop_front().is_none() {
                break;
            }
            self.index = self.index.saturating_sub(1);
            self.clean = match self.clean {
                Some(0) | None => None,
                Some(c) => Some(c - 1),
            };
        }
    }

    /// Undo the entry before the cursor.
    ///
    /// Returns `None` when there is nothing to undo, otherwise the label on
    /// success. The cursor moves even when the replay fails.
    pub fn undo(&mut self, session: &mut Session) -> Option<Result<String, ReplayError>> {
        if self.index == 0 {
            return None;
        }
        let was_clean = self.is_clean();
        self.index -= 1;
        let command = &mut self.commands[self.index];
        let label = command.label().to_string();
        let result = command.undo(session).map(|()| label);
        self.log_replay("undo", &result);
        self.emit_clean(was_clean);
        Some(result)
    }

    /// Redo the entry at the cursor. Same contract as [`undo`](Self::undo).
    pub fn redo(&mut self, session: &mut Session) -> Option<Result<String, ReplayError>> {
        if self.index >= self.commands.len() {
            return None;
        }
        let was_clean = self.is_clean();
        let command = &mut self.commands[self.index];
        self.index += 1;
        let label = command.label().to_string();
        let result = command.redo(session).map(|()| label);
        self.log_replay("redo", &result);
        self.emit_clean(was_clean);
        Some(result)
    }

    fn log_replay(&self, action: &'static str, result: &Result<String, ReplayError>) {
        match result {
            Ok(label) => info!(
                target: "graphedit.undo",
                action,
                label = %label,
                index = self.index,
                "history replay"
            ),
            Err(err) => warn!(
                target: "graphedit.undo",
                action,
                label = %err.label,
                index = self.index,
                failures = err.failures.len(),
                "history replay refused by engine"
            ),
        }
    }

    /// Mark the current position as saved.
    pub fn set_clean(&mut self) {
        let was_clean = self.is_clean();
        self.clean = Some(self.index);
        self.emit_clean(was_clean);
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.clean == Some(self.index)
    }

    /// Drop the whole history with the document. Not undoable.
    pub fn clear(&mut self) {
        let was_clean = self.is_clean();
        let dropped = self.commands.len();
        self.commands.clear();
        self.index = 0;
        self.clean = Some(0);
        info!(target: "graphedit.undo", dropped, "history cleared");
        self.hub.publish(&Event::DocumentCleared);
        self.emit_clean(was_clean);
    }

    fn emit_clean(&self, was_clean: bool) {
        let clean = self.is_clean();
        if clean != was_clean {
            self.hub.publish(&Event::CleanChanged(clean));
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index < self.commands.len()
    }

    /// Number of entries, done and undone.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of done entries.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    /// The entry [`undo`](Self::undo) would replay.
    #[must_use]
    pub fn top(&self) -> Option<&Command> {
        self.index.checked_sub(1).and_then(|i| self.commands.get(i))
    }

    #[must_use]
    pub fn undo_label(&self) -> Option<&str> {
        self.top().map(Command::label)
    }

    #[must_use]
    pub fn redo_label(&self) -> Option<&str> {
        self.commands.get(self.index).map(Command::label)
    }

    /// Labels of done entries, most recent first.
    #[must_use]
    pub fn undo_labels(&self, limit: usize) -> Vec<&str> {
        self.commands
            .iter()
            .take(self.index)
            .rev()
            .take(limit)
            .map(Command::label)
            .collect()
    }

    /// Labels of undone entries, next redo first.
    #[must_use]
    pub fn redo_labels(&self, limit: usize) -> Vec<&str> {
        self.commands
            .iter()
            .skip(self.index)
            .take(limit)
            .map(Command::label)
            .collect()
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    #[must_use]
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }
}

// ============================================================================
// Tests
// ============================================================================
