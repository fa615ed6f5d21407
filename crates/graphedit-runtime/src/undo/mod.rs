#![forbid(unsafe_code)]

//! Command, batch, merge and history machinery.
//!
//! - [`command`]: the closed [`Command`] enum, [`Mode`] and the error types
//! - [`args`] / [`batch`]: multi-target edits with no-op filtering and
//!   per-item partial success
//! - [`compound`]: atomic groups of child commands
//! - [`merge`]: coalescing into the top of the stack
//! - [`history`]: the bounded [`UndoStack`] with its clean marker
//!
//! # Architecture
//!
//! ```text
//!  UI action ──► XxxCmd::on_stack(session, stack, ..)
//!                   │
//!                   ├─► snapshot old value (GraphQuery)
//!                   ├─► Session::invoke ──► Engine ──► Callback resolved
//!                   ├─► Session::announce ──► NotificationHub
//!                   └─► Mode::Stack ──► UndoStack::push ──► merge or append
//! ```

pub mod args;
pub mod batch;
pub mod command;
pub mod compound;
pub mod history;
pub mod merge;

pub use args::{Args, ArgsList, Filtered, Staged};
pub use batch::{BatchCmd, BatchItem, BatchKind, BatchOutcome};
pub use command::{Command, CommandMetadata, Mode, Rejection, ReplayError};
pub use compound::CompoundCmd;
pub use history::{Pushed, UndoStack};
pub use merge::MergePolicy;
