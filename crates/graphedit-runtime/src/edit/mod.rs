#![forbid(unsafe_code)]

//! Concrete edit commands.
//!
//! Each single-target command snapshots its old value through
//! [`GraphQuery`](graphedit_core::GraphQuery) before calling the engine; if
//! there is nothing to snapshot the edit is refused without an engine call.
//! Batch edits ([`meta`], [`state`]) go through
//! [`BatchCmd`](crate::undo::BatchCmd).

pub mod feed;
pub mod meta;
pub mod node;
pub mod param;
pub mod plug;
pub mod state;

pub use feed::ConnectFeedCmd;
pub use meta::{
    MetaEdit, MetaTarget, SetMetaCmd, move_nodes, select, set_frame_bounds, set_meta,
    set_selection,
};
pub use node::{CreateNodeCmd, EraseNodeCmd, RenameNodeCmd, unfeed_and_erase};
pub use param::{SetParameterCmd, SetVector3Cmd};
pub use plug::SetPlugFlagCmd;
pub use state::{SetOperatorStateCmd, StateEdit, set_operator_state, set_operator_states};

/// Failure message of an engine verdict, for
/// [`Session::announce`](crate::session::Session::announce).
fn err_str<T>(result: &Result<T, String>) -> Option<&str> {
    result.as_ref().err().map(String::as_str)
}
