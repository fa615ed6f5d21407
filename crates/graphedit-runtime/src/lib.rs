#![forbid(unsafe_code)]

//! graphedit runtime
//!
//! The command / callback / undo framework of the graph editor:
//!
//! - [`session`]: the [`Session`] that owns the engine and routes every
//!   mutation through the callback protocol
//! - [`hub`] / [`event`]: synchronous fan-out of [`Event`]s to UI observers
//! - [`undo`]: the [`Command`] enum, batches, merging and the [`UndoStack`]
//! - [`edit`]: every concrete edit with its `once` / `as_child` /
//!   `on_stack` entry points
//! - [`config`]: [`EditorConfig`], loadable from TOML or JSON with the
//!   `config` feature
//! - [`message_log`]: the bounded model behind the message-log panel
//!
//! # Example
//!
//! ```ignore
//! let mut session = Session::new(engine);
//! let mut stack = UndoStack::for_session(&session, HistoryConfig::default());
//! let foo = CreateNodeCmd::on_stack(&mut session, &mut stack, "Body", &"Foo".into())?;
//! move_nodes(&mut session, Mode::Stack(&mut stack), &[(foo, [10.0, 20.0])], true);
//! stack.undo(&mut session);
//! ```
//!
//! # Logging
//!
//! Spans `engine.call`, `edit.scope` and `command.replay`; events on targets
//! `graphedit.edit` (rejections) and `graphedit.undo` (history changes). No
//! subscriber is installed by this crate.

pub mod config;
pub mod edit;
pub mod event;
pub mod hub;
pub mod message_log;
pub mod session;
pub mod undo;

pub use config::{ConfigError, EditorConfig, HistoryConfig, MessageLogConfig};
pub use edit::{
    ConnectFeedCmd, CreateNodeCmd, EraseNodeCmd, MetaTarget, RenameNodeCmd, SetParameterCmd,
    SetPlugFlagCmd, SetVector3Cmd, move_nodes, select, set_frame_bounds, set_meta,
    set_operator_state, set_selection, unfeed_and_erase,
};
pub use event::{Change, Event, Origin, Severity};
pub use hub::{NotificationHub, Subscription};
pub use message_log::{LogEntry, MessageLog};
pub use session::{CallStack, Session};
pub use undo::{
    ArgsList, BatchOutcome, Command, CommandMetadata, CompoundCmd, MergePolicy, Mode, Pushed,
    Rejection, ReplayError, UndoStack,
};
