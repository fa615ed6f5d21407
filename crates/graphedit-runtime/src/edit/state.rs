#![forbid(unsafe_code)]

//! Operator state batches (enable / disable / bypass).

use graphedit_core::{Callback, Engine, NodeName, OperatorState};

use crate::event::Change;
use crate::session::Session;
use crate::undo::{ArgsList, BatchCmd, BatchKind, BatchOutcome, Command, Mode};

/// Batch kind for [`Engine::set_operator_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEdit;

impl BatchKind for StateEdit {
    type Target = NodeName;
    type Value = OperatorState;

    const OPERATION: &'static str = "set_operator_state";

    fn current(engine: &dyn Engine, target: &NodeName) -> Option<OperatorState> {
        engine.operator_state(target)
    }

    fn issue(
        engine: &mut dyn Engine,
        target: &NodeName,
        value: &OperatorState,
        cb: &mut dyn Callback,
    ) {
        engine.set_operator_state(target, *value, cb);
    }

    fn change(target: &NodeName, value: &OperatorState) -> Change {
        Change::OperatorState {
            node: target.clone(),
            state: *value,
        }
    }

    fn wrap(cmd: BatchCmd<Self>) -> Command {
        Command::SetOperatorState(cmd)
    }
}

pub type SetOperatorStateCmd = BatchCmd<StateEdit>;

/// Put every node of `nodes` into `state`.
pub fn set_operator_state(
    session: &mut Session,
    mode: Mode<'_>,
    nodes: &[NodeName],
    state: OperatorState,
) -> BatchOutcome<NodeName> {
    let list: ArgsList<NodeName, OperatorState> =
        nodes.iter().map(|n| (n.clone(), state)).collect();
    let label = match nodes {
        [only] => format!("Set {only} {state}"),
        _ => format!("Set {} nodes {state}", nodes.len()),
    };
    SetOperatorStateCmd::apply(session, mode, label, &list, false)
}

/// Apply a per-node list of states as one batch.
pub fn set_operator_states(
    session: &mut Session,
    mode: Mode<'_>,
    list: &ArgsList<NodeName, OperatorState>,
) -> BatchOutcome<NodeName> {
    SetOperatorStateCmd::apply(session, mode, "Set operator states", list, false)
}
