#![forbid(unsafe_code)]

//! graphedit core
//!
//! Shared vocabulary between the editor front-end and the simulation
//! engine that owns the graph:
//!
//! - [`ident`]: node, parameter, plug, entity and metadata identities
//! - [`value`]: typed parameter/metadata values with bit-exact equality
//! - [`engine`]: the [`Engine`] facade and its read-only [`GraphQuery`] half
//! - [`callback`]: the synchronous [`Callback`] protocol every mutating
//!   engine call follows
//!
//! # Role in graphedit
//! `graphedit-core` has no notion of history or UI. `graphedit-runtime`
//! builds commands, the undo stack and the notification hub on top of it,
//! and `graphedit-harness` provides an in-memory engine for tests.

pub mod callback;
pub mod engine;
pub mod ident;
pub mod value;

pub use callback::{Callback, Capture, Pending, Phase, Resolution, invoke};
pub use engine::{Engine, ExportFormat, Feed, GraphQuery, Reply};
pub use ident::{EntityPath, MetaKey, NodeName, ParamPath, PlugPath};
pub use value::{OperatorState, Value};
