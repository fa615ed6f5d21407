#![forbid(unsafe_code)]

//! Metadata batches: selection, positions, frame bounds and arbitrary keys.
//!
//! Selection is re-derived idempotently: an unset `selected` key reads as
//! `false`, so deselecting a node that was never selected is a no-op and
//! never reaches the engine.

use std::collections::BTreeSet;
use std::fmt;

use graphedit_core::{Callback, Engine, EntityPath, MetaKey, NodeName, Value};

use crate::event::Change;
use crate::session::Session;
use crate::undo::{ArgsList, BatchCmd, BatchKind, BatchOutcome, Command, Mode};

/// One metadata slot: `key` on `entity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaTarget {
    pub entity: EntityPath,
    pub key: MetaKey,
}

impl MetaTarget {
    #[must_use]
    pub fn new(entity: impl Into<EntityPath>, key: MetaKey) -> Self {
        Self {
            entity: entity.into(),
            key,
        }
    }
}

impl fmt::Display for MetaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.key)
    }
}

/// Batch kind for [`Engine::set_meta_value`]. A `None` value is an unset key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaEdit;

impl BatchKind for MetaEdit {
    type Target = MetaTarget;
    type Value = Option<Value>;

    const OPERATION: &'static str = "set_meta_value";

    fn current(engine: &dyn Engine, target: &MetaTarget) -> Option<Option<Value>> {
        if !engine.entity_exists(&target.entity) {
            return None;
        }
        let value = engine.meta(&target.entity, &target.key);
        if target.key.is_selection() {
            return Some(value.or(Some(Value::Bool(false))));
        }
        Some(value)
    }

    fn issue(
        engine: &mut dyn Engine,
        target: &MetaTarget,
        value: &Option<Value>,
        cb: &mut dyn Callback,
    ) {
        engine.set_meta_value(&target.entity, &target.key, value.as_ref(), cb);
    }

    fn change(target: &MetaTarget, value: &Option<Value>) -> Change {
        if target.key.is_selection() {
            return Change::Selection {
                entity: target.entity.clone(),
                selected: value.as_ref().and_then(Value::as_bool).unwrap_or(false),
            };
        }
        Change::Meta {
            entity: target.entity.clone(),
            key: target.key.clone(),
            value: value.clone(),
        }
    }

    fn wrap(cmd: BatchCmd<Self>) -> Command {
        Command::SetMeta(cmd)
    }
}

pub type SetMetaCmd = BatchCmd<MetaEdit>;

fn count_label(verb: &str, nodes: &[NodeName]) -> String {
    match nodes {
        [only] => format!("{verb} {only}"),
        _ => format!("{verb} {} nodes", nodes.len()),
    }
}

/// Select or deselect every node of `nodes`.
pub fn select(
    session: &mut Session,
    mode: Mode<'_>,
    nodes: &[NodeName],
    selected: bool,
) -> BatchOutcome<MetaTarget> {
    let list: ArgsList<MetaTarget, Option<Value>> = nodes
        .iter()
        .map(|n| (MetaTarget::new(n, MetaKey::selected()), Some(Value::Bool(selected))))
        .collect();
    let verb = if selected { "Select" } else { "Deselect" };
    SetMetaCmd::apply(session, mode, count_label(verb, nodes), &list, false)
}

/// Make `selected` the exact selection among `candidates`.
///
/// Nodes in both lists end up selected, the rest of `candidates` end up
/// deselected, and nodes already in the right state are skipped.
pub fn set_selection(
    session: &mut Session,
    mode: Mode<'_>,
    selected: &[NodeName],
    candidates: &[NodeName],
) -> BatchOutcome<MetaTarget> {
    let wanted: BTreeSet<&NodeName> = selected.iter().collect();
    let list: ArgsList<MetaTarget, Option<Value>> = candidates
        .iter()
        .map(|n| {
            (
                MetaTarget::new(n, MetaKey::selected()),
                Some(Value::Bool(wanted.contains(n))),
            )
        })
        .collect();
    SetMetaCmd::apply(session, mode, "Change selection", &list, false)
}

/// Move nodes in the graph view. Mergeable moves coalesce while dragging.
pub fn move_nodes(
    session: &mut Session,
    mode: Mode<'_>,
    moves: &[(NodeName, [f64; 2])],
    mergeable: bool,
) -> BatchOutcome<MetaTarget> {
    let list: ArgsList<MetaTarget, Option<Value>> = moves
        .iter()
        .map(|(n, at)| (MetaTarget::new(n, MetaKey::position()), Some(Value::Vec2(*at))))
        .collect();
    let names: Vec<NodeName> = moves.iter().map(|(n, _)| n.clone()).collect();
    SetMetaCmd::apply(session, mode, count_label("Move", &names), &list, mergeable)
}

/// Set the document frame range on the root entity.
pub fn set_frame_bounds(
    session: &mut Session,
    mode: Mode<'_>,
    start: f64,
    end: f64,
    mergeable: bool,
) -> BatchOutcome<MetaTarget> {
    let list = ArgsList::new().with(
        MetaTarget::new(EntityPath::root(), MetaKey::frame_bounds()),
        Some(Value::Vec2([start, end])),
    );
    SetMetaCmd::apply(session, mode, format!("Frame range {start}..{end}"), &list, mergeable)
}

/// Arbitrary metadata batch.
pub fn set_meta(
    session: &mut Session,
    mode: Mode<'_>,
    label: impl Into<String>,
    list: &ArgsList<MetaTarget, Option<Value>>,
    mergeable: bool,
) -> BatchOutcome<MetaTarget> {
    SetMetaCmd::apply(session, mode, label, list, mergeable)
}
