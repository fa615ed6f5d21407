#![forbid(unsafe_code)]

//! Events fanned out by the [`NotificationHub`](crate::hub::NotificationHub).

use std::fmt;

use graphedit_core::{EntityPath, MetaKey, NodeName, OperatorState, ParamPath, PlugPath, Value};

/// What a resolved engine call touched.
///
/// On success the value fields carry what the engine confirmed. On failure
/// they carry what was requested.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    NodeCreated {
        name: NodeName,
        node_type: String,
    },
    NodeErased {
        name: NodeName,
    },
    NodeRenamed {
        old: NodeName,
        new: NodeName,
    },
    /// `component` is `None` when the whole vector was written at once.
    Parameter {
        path: ParamPath,
        component: Option<usize>,
        value: Value,
    },
    Meta {
        entity: EntityPath,
        key: MetaKey,
        value: Option<Value>,
    },
    Selection {
        entity: EntityPath,
        selected: bool,
    },
    OperatorState {
        node: NodeName,
        state: OperatorState,
    },
    /// An empty `output` means `input` was disconnected.
    Feed {
        input: PlugPath,
        output: PlugPath,
    },
    PlugFlag {
        plug: PlugPath,
        flag: bool,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeCreated { name, node_type } => write!(f, "create {node_type} '{name}'"),
            Self::NodeErased { name } => write!(f, "erase '{name}'"),
            Self::NodeRenamed { old, new } => write!(f, "rename '{old}' to '{new}'"),
            Self::Parameter {
                path,
                component: Some(i),
                value,
            } => write!(f, "set {path}[{i}] = {value}"),
            Self::Parameter { path, value, .. } => write!(f, "set {path} = {value}"),
            Self::Meta {
                entity,
                key,
                value: Some(value),
            } => write!(f, "set {key} on '{entity}' = {value}"),
            Self::Meta { entity, key, .. } => write!(f, "clear {key} on '{entity}'"),
            Self::Selection {
                entity,
                selected: true,
            } => write!(f, "select '{entity}'"),
            Self::Selection { entity, .. } => write!(f, "deselect '{entity}'"),
            Self::OperatorState { node, state } => write!(f, "set '{node}' {state}"),
            Self::Feed { input, output } if output.is_empty() => write!(f, "unfeed {input}"),
            Self::Feed { input, output } => write!(f, "feed {output} into {input}"),
            Self::PlugFlag { plug, flag } => write!(f, "set group flag on {plug} = {flag}"),
        }
    }
}

/// Why an engine call was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A fresh user or programmatic edit.
    Edit,
    Undo,
    Redo,
}

impl Origin {
    #[must_use]
    pub const fn is_undo(self) -> bool {
        matches!(self, Self::Undo)
    }

    /// `old` when undoing, `new` otherwise.
    pub(crate) fn pick<'a, T>(self, old: &'a T, new: &'a T) -> &'a T {
        if self.is_undo() { old } else { new }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Edit => "edit",
            Self::Undo => "undo",
            Self::Redo => "redo",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One notification delivered to every observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// One resolved engine call.
    Changed {
        change: Change,
        origin: Origin,
        success: bool,
    },
    /// A line for the message log.
    Message { severity: Severity, text: String },
    /// The undo stack's clean flag flipped.
    CleanChanged(bool),
    /// The undo stack was reset with the document.
    DocumentCleared,
}

impl Event {
    /// The change carried by a `Changed` event.
    #[must_use]
    pub fn change(&self) -> Option<&Change> {
        match self {
            Self::Changed { change, .. } => Some(change),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Changed { success: false, .. })
    }
}
