#![forbid(unsafe_code)]

//! The engine facade: the only surface through which the editor reads or
//! mutates authoritative graph state.
//!
//! # Contract
//!
//! Every mutating operation takes an explicit [`Callback`] continuation and
//! must resolve it exactly once before returning: `success(reply)` after the
//! graph was mutated, `failure(message)` when validation refused the call and
//! nothing changed. An implementation may itself issue further engine calls
//! while handling one (erase unfeeding attached plugs, for example); each of
//! those gets its own callback and is resolved first.
//!
//! Queries on [`GraphQuery`] never mutate and never take a callback. The
//! editor uses them to snapshot "before" values so edits can be undone.

use crate::callback::Callback;
use crate::ident::{EntityPath, MetaKey, NodeName, ParamPath, PlugPath};
use crate::value::{OperatorState, Value};

/// Authoritative result handed to [`Callback::success`].
///
/// The engine may normalize what it was asked to store (clamp a parameter,
/// uniquify a name); the reply carries what actually landed.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Done,
    Name(NodeName),
    Value(Value),
    Blob(Vec<u8>),
}

impl Reply {
    #[must_use]
    pub fn into_name(self) -> Option<NodeName> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_blob(self) -> Option<Vec<u8>> {
        match self {
            Self::Blob(blob) => Some(blob),
            _ => None,
        }
    }
}

/// Serialized form used to snapshot an entity before it is erased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Native,
    Json,
}

/// One connection: `output` feeds `input`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feed {
    pub input: PlugPath,
    pub output: PlugPath,
}

/// Read-only view of the engine graph.
pub trait GraphQuery {
    fn node_exists(&self, name: &NodeName) -> bool;

    fn node_type(&self, name: &NodeName) -> Option<String>;

    /// Whether `entity` can carry metadata (an existing node or the root).
    fn entity_exists(&self, entity: &EntityPath) -> bool;

    /// Current value of one component of a parameter.
    fn parameter(&self, path: &ParamPath, component: usize) -> Option<Value>;

    fn parameter_vector3(&self, path: &ParamPath) -> Option<[f64; 3]>;

    /// Metadata entry, or `None` when the key is unset.
    fn meta(&self, entity: &EntityPath, key: &MetaKey) -> Option<Value>;

    fn group_plug_flag(&self, plug: &PlugPath) -> Option<bool>;

    fn operator_state(&self, name: &NodeName) -> Option<OperatorState>;

    /// Output currently feeding `input`, if connected.
    fn feed_source(&self, input: &PlugPath) -> Option<PlugPath>;

    /// Every feed with either end on `node`, in a stable order.
    fn feeds_of(&self, node: &NodeName) -> Vec<Feed>;
}

/// Mutating engine surface. Each call resolves `cb` exactly once.
pub trait Engine: GraphQuery {
    /// Replies with `Reply::Name` carrying the name actually assigned.
    fn create_node(&mut self, node_type: &str, suggested: &NodeName, cb: &mut dyn Callback);

    fn erase_node(&mut self, name: &NodeName, cb: &mut dyn Callback);

    /// Replies with `Reply::Name` carrying the normalized new name.
    fn rename_node(&mut self, old: &NodeName, new: &NodeName, cb: &mut dyn Callback);

    /// Connect `output` into `input`; an empty `output` disconnects.
    fn connect_feed(&mut self, input: &PlugPath, output: &PlugPath, cb: &mut dyn Callback);

    /// Replies with `Reply::Value` carrying the stored component value.
    fn set_parameter(
        &mut self,
        path: &ParamPath,
        value: &Value,
        component: usize,
        cb: &mut dyn Callback,
    );

    /// Replies with `Reply::Value(Value::Vec3(..))`.
    fn set_parameter_vector3(&mut self, path: &ParamPath, value: [f64; 3], cb: &mut dyn Callback);

    /// `None` removes the key.
    fn set_meta_value(
        &mut self,
        entity: &EntityPath,
        key: &MetaKey,
        value: Option<&Value>,
        cb: &mut dyn Callback,
    );

    fn set_group_plug_flag(&mut self, plug: &PlugPath, flag: bool, cb: &mut dyn Callback);

    fn set_operator_state(&mut self, name: &NodeName, state: OperatorState, cb: &mut dyn Callback);

    /// Replies with `Reply::Blob`.
    fn export_entity(&mut self, name: &NodeName, format: ExportFormat, cb: &mut dyn Callback);

    /// Recreate an exported entity. Replies with `Reply::Name`.
    fn import_entity(&mut self, blob: &[u8], format: ExportFormat, cb: &mut dyn Callback);
}
