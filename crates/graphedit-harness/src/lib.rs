#![forbid(unsafe_code)]

//! Test harness for graphedit.
//!
//! [`MemoryEngine`] is a complete in-memory [`Engine`](graphedit_core::Engine)
//! and [`EngineProbe`] observes and steers it from outside once the engine
//! has been moved into a session.

pub mod fixtures;
pub mod memory_engine;
pub mod probe;

pub use fixtures::standard_engine;
pub use memory_engine::{MemoryEngine, NodeType, ParamSpec};
pub use probe::{EngineCall, EngineProbe};
