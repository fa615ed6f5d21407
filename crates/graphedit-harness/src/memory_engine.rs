#![forbid(unsafe_code)]

//! In-memory reference engine.
//!
//! [`MemoryEngine`] implements the full [`Engine`] facade over plain maps so
//! that commands, batches and the undo stack can be exercised end to end.
//! It behaves like a real engine in the ways that matter to the editor:
//!
//! - **Validation**: unknown nodes, types, parameters and plugs, malformed
//!   names, self-feeds and cyclic feeds are refused with a message.
//! - **Normalization**: suggested node names are sanitized and uniquified;
//!   ranged float parameters are clamped.
//! - **Nested calls**: erasing a node with feeds attached first unfeeds each
//!   one through its own callback-protected `connect_feed` call.
//! - **Snapshots**: `export_entity`/`import_entity` round-trip a node's full
//!   record (feeds excluded) through JSON.
//!
//! Every call is recorded on the shared [`EngineProbe`], which can also
//! force failures for chosen targets.

use std::collections::{BTreeMap, BTreeSet};

use graphedit_core::callback;
use graphedit_core::{
    Callback, Capture, Engine, EntityPath, ExportFormat, Feed, GraphQuery, MetaKey, NodeName,
    OperatorState, ParamPath, PlugPath, Reply, Value,
};
use serde::{Deserialize, Serialize};

use crate::probe::EngineProbe;

/// Declared parameter of a node type.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub default: Value,
    /// Inclusive clamp range applied to float payloads.
    pub range: Option<(f64, f64)>,
}

/// Schema for nodes created by [`Engine::create_node`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeType {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl NodeType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            default: default.into(),
            range: None,
        });
        self
    }

    #[must_use]
    pub fn with_ranged_param(
        mut self,
        name: impl Into<String>,
        default: impl Into<Value>,
        min: f64,
        max: f64,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            default: default.into(),
            range: Some((min, max)),
        });
        self
    }

    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    fn has_plug(&self, plug: &str) -> bool {
        self.inputs.iter().chain(&self.outputs).any(|p| p == plug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NodeRecord {
    node_type: String,
    params: BTreeMap<String, Value>,
    meta: BTreeMap<String, Value>,
    state: OperatorState,
    plug_flags: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Exported {
    name: NodeName,
    record: NodeRecord,
}

/// Map-backed engine. See the module docs for its behaviour.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    types: BTreeMap<String, NodeType>,
    nodes: BTreeMap<NodeName, NodeRecord>,
    /// input plug -> output plug feeding it
    feeds: BTreeMap<PlugPath, PlugPath>,
    root_meta: BTreeMap<String, Value>,
    probe: EngineProbe,
}

fn settle(cb: &mut dyn Callback, result: Result<Reply, String>) {
    match result {
        Ok(reply) => cb.success(reply),
        Err(message) => cb.failure(&message),
    }
}

fn sanitize(raw: &str) -> Result<String, String> {
    let name: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if name.is_empty() {
        return Err("node name cannot be empty".to_string());
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid node name '{raw}'"));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(format!("node name '{raw}' cannot start with a digit"));
    }
    Ok(name)
}

fn clamp(value: Value, range: Option<(f64, f64)>) -> Value {
    let Some((lo, hi)) = range else {
        return value;
    };
    match value {
        Value::Float(v) => Value::Float(v.clamp(lo, hi)),
        Value::Vec2(v) => Value::Vec2(v.map(|c| c.clamp(lo, hi))),
        Value::Vec3(v) => Value::Vec3(v.map(|c| c.clamp(lo, hi))),
        other => other,
    }
}

fn owned_by(plug: &PlugPath, node: &NodeName) -> bool {
    plug.owner().as_ref() == Some(node)
}

fn rehome(plug: &PlugPath, old: &NodeName, new: &NodeName) -> PlugPath {
    match plug.leaf() {
        Some(leaf) if owned_by(plug, old) => PlugPath::on(new, leaf),
        _ => plug.clone(),
    }
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.register_type(node_type);
        self
    }

    pub fn register_type(&mut self, node_type: NodeType) {
        self.types.insert(node_type.name.clone(), node_type);
    }

    /// Shared handle onto this engine's call log and fault injection.
    #[must_use]
    pub fn probe(&self) -> EngineProbe {
        self.probe.clone()
    }

    #[must_use]
    pub fn node_names(&self) -> Vec<NodeName> {
        self.nodes.keys().cloned().collect()
    }

    /// Every feed in the graph, ordered by input plug.
    #[must_use]
    pub fn feeds(&self) -> Vec<Feed> {
        self.feeds
            .iter()
            .map(|(input, output)| Feed {
                input: input.clone(),
                output: output.clone(),
            })
            .collect()
    }

    fn type_of(&self, node: &NodeName) -> Option<&NodeType> {
        self.nodes
            .get(node)
            .and_then(|record| self.types.get(&record.node_type))
    }

    fn param_range(&self, node: &NodeName, param: &str) -> Option<(f64, f64)> {
        self.type_of(node)?
            .params
            .iter()
            .find(|spec| spec.name == param)?
            .range
    }

    fn unique_name(&self, base: &str) -> NodeName {
        let candidate = NodeName::new(base);
        if !self.nodes.contains_key(&candidate) {
            return candidate;
        }
        let mut n = 1u32;
        loop {
            let candidate = NodeName::new(format!("{base}{n}"));
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn require_node(&self, name: &NodeName) -> Result<(), String> {
        if self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(format!("no node named '{name}'"))
        }
    }

    /// Does `node` take input, directly or transitively, from `source`?
    fn depends_on(&self, node: &NodeName, source: &NodeName) -> bool {
        let mut stack = vec![node.clone()];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for (input, output) in &self.feeds {
                if !owned_by(input, &current) {
                    continue;
                }
                let Some(upstream) = output.owner() else {
                    continue;
                };
                if &upstream == source {
                    return true;
                }
                stack.push(upstream);
            }
        }
        false
    }

    fn try_create(&mut self, node_type: &str, suggested: &NodeName) -> Result<Reply, String> {
        let spec = self
            .types
            .get(node_type)
            .ok_or_else(|| format!("unknown node type '{node_type}'"))?;
        let record = NodeRecord {
            node_type: node_type.to_string(),
            params: spec
                .params
                .iter()
                .map(|p| (p.name.clone(), p.default.clone()))
                .collect(),
            meta: BTreeMap::new(),
            state: OperatorState::default(),
            plug_flags: BTreeMap::new(),
        };
        let name = self.unique_name(&sanitize(suggested.as_str())?);
        self.nodes.insert(name.clone(), record);
        Ok(Reply::Name(name))
    }

    fn try_erase(&mut self, name: &NodeName) -> Result<Reply, String> {
        self.require_node(name)?;
        let attached: Vec<PlugPath> = self
            .feeds
            .iter()
            .filter(|(input, output)| owned_by(input, name) || owned_by(output, name))
            .map(|(input, _)| input.clone())
            .collect();
        for input in attached {
            let mut unfeed = Capture::new(());
            callback::invoke(self, "connect_feed", &mut unfeed, |engine, cb| {
                engine.connect_feed(&input, &PlugPath::none(), cb);
            });
            if let (_, Err(message)) = unfeed.into_outcome() {
                return Err(format!("cannot unfeed '{input}': {message}"));
            }
        }
        self.nodes.remove(name);
        Ok(Reply::Done)
    }

    fn try_rename(&mut self, old: &NodeName, new: &NodeName) -> Result<Reply, String> {
        self.require_node(old)?;
        let new = NodeName::new(sanitize(new.as_str())?);
        if &new == old {
            return Ok(Reply::Name(new));
        }
        if self.nodes.contains_key(&new) {
            return Err(format!("name '{new}' is already in use"));
        }
        if let Some(record) = self.nodes.remove(old) {
            self.nodes.insert(new.clone(), record);
        }
        self.feeds = std::mem::take(&mut self.feeds)
            .into_iter()
            .map(|(input, output)| (rehome(&input, old, &new), rehome(&output, old, &new)))
            .collect();
        Ok(Reply::Name(new))
    }

    fn try_connect(&mut self, input: &PlugPath, output: &PlugPath) -> Result<Reply, String> {
        let (Some(target), Some(in_plug)) = (input.owner(), input.leaf()) else {
            return Err(format!("malformed plug path '{input}'"));
        };
        let accepts = self
            .type_of(&target)
            .is_some_and(|t| t.inputs.iter().any(|p| p == in_plug));
        if !accepts {
            return Err(format!("no input plug '{input}'"));
        }
        if output.is_empty() {
            return match self.feeds.remove(input) {
                Some(_) => Ok(Reply::Done),
                None => Err(format!("'{input}' is not connected")),
            };
        }
        let (Some(source), Some(out_plug)) = (output.owner(), output.leaf()) else {
            return Err(format!("malformed plug path '{output}'"));
        };
        let provides = self
            .type_of(&source)
            .is_some_and(|t| t.outputs.iter().any(|p| p == out_plug));
        if !provides {
            return Err(format!("no output plug '{output}'"));
        }
        if source == target {
            return Err(format!("cannot feed '{target}' into itself"));
        }
        if self.depends_on(&source, &target) {
            return Err(format!("feeding '{output}' into '{input}' would create a cycle"));
        }
        self.feeds.insert(input.clone(), output.clone());
        Ok(Reply::Done)
    }

    fn try_set_parameter(
        &mut self,
        path: &ParamPath,
        value: &Value,
        component: usize,
    ) -> Result<Reply, String> {
        let (Some(node), Some(leaf)) = (path.owner(), path.leaf()) else {
            return Err(format!("malformed parameter path '{path}'"));
        };
        let range = self.param_range(&node, leaf);
        let record = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| format!("no node named '{node}'"))?;
        let current = record
            .params
            .get(leaf)
            .ok_or_else(|| format!("no parameter '{path}'"))?;
        let updated = current.with_component(component, value).ok_or_else(|| {
            format!(
                "cannot store {} into component {component} of {} parameter '{path}'",
                value.type_name(),
                current.type_name()
            )
        })?;
        let updated = clamp(updated, range);
        let stored = updated
            .component(component)
            .ok_or_else(|| format!("component {component} of '{path}' is out of range"))?;
        record.params.insert(leaf.to_string(), updated);
        Ok(Reply::Value(stored))
    }

    fn try_set_vector3(&mut self, path: &ParamPath, value: [f64; 3]) -> Result<Reply, String> {
        let (Some(node), Some(leaf)) = (path.owner(), path.leaf()) else {
            return Err(format!("malformed parameter path '{path}'"));
        };
        let range = self.param_range(&node, leaf);
        let record = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| format!("no node named '{node}'"))?;
        match record.params.get(leaf) {
            Some(Value::Vec3(_)) => {}
            Some(other) => {
                return Err(format!(
                    "parameter '{path}' is {}, not vec3",
                    other.type_name()
                ));
            }
            None => return Err(format!("no parameter '{path}'")),
        }
        let stored = clamp(Value::Vec3(value), range);
        record.params.insert(leaf.to_string(), stored.clone());
        Ok(Reply::Value(stored))
    }

    fn try_set_meta(
        &mut self,
        entity: &EntityPath,
        key: &MetaKey,
        value: Option<&Value>,
    ) -> Result<Reply, String> {
        let meta = if entity.is_root() {
            &mut self.root_meta
        } else {
            &mut self
                .nodes
                .get_mut(&NodeName::new(entity.as_str()))
                .ok_or_else(|| format!("no entity '{entity}'"))?
                .meta
        };
        match value {
            Some(value) => {
                meta.insert(key.as_str().to_string(), value.clone());
            }
            None => {
                meta.remove(key.as_str());
            }
        }
        Ok(Reply::Done)
    }

    fn try_set_plug_flag(&mut self, plug: &PlugPath, flag: bool) -> Result<Reply, String> {
        let (Some(node), Some(leaf)) = (plug.owner(), plug.leaf()) else {
            return Err(format!("malformed plug path '{plug}'"));
        };
        if !self.type_of(&node).is_some_and(|t| t.has_plug(leaf)) {
            return Err(format!("no plug '{plug}'"));
        }
        if let Some(record) = self.nodes.get_mut(&node) {
            record.plug_flags.insert(leaf.to_string(), flag);
        }
        Ok(Reply::Done)
    }

    fn try_set_state(&mut self, name: &NodeName, state: OperatorState) -> Result<Reply, String> {
        let record = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| format!("no node named '{name}'"))?;
        record.state = state;
        Ok(Reply::Done)
    }

    fn try_export(&self, name: &NodeName, format: ExportFormat) -> Result<Reply, String> {
        let record = self
            .nodes
            .get(name)
            .ok_or_else(|| format!("no node named '{name}'"))?;
        let exported = Exported {
            name: name.clone(),
            record: record.clone(),
        };
        let blob = match format {
            ExportFormat::Native => serde_json::to_vec(&exported),
            ExportFormat::Json => serde_json::to_vec_pretty(&exported),
        }
        .map_err(|e| format!("export of '{name}' failed: {e}"))?;
        Ok(Reply::Blob(blob))
    }

    fn try_import(&mut self, blob: &[u8]) -> Result<Reply, String> {
        let exported: Exported =
            serde_json::from_slice(blob).map_err(|e| format!("unreadable snapshot: {e}"))?;
        if !self.types.contains_key(&exported.record.node_type) {
            return Err(format!(
                "unknown node type '{}'",
                exported.record.node_type
            ));
        }
        if self.nodes.contains_key(&exported.name) {
            return Err(format!("name '{}' is already in use", exported.name));
        }
        self.nodes.insert(exported.name.clone(), exported.record);
        Ok(Reply::Name(exported.name))
    }
}

impl GraphQuery for MemoryEngine {
    fn node_exists(&self, name: &NodeName) -> bool {
        self.nodes.contains_key(name)
    }

    fn node_type(&self, name: &NodeName) -> Option<String> {
        self.nodes.get(name).map(|record| record.node_type.clone())
    }

    fn entity_exists(&self, entity: &EntityPath) -> bool {
        entity.is_root() || self.nodes.contains_key(&NodeName::new(entity.as_str()))
    }

    fn parameter(&self, path: &ParamPath, component: usize) -> Option<Value> {
        let record = self.nodes.get(&path.owner()?)?;
        record.params.get(path.leaf()?)?.component(component)
    }

    fn parameter_vector3(&self, path: &ParamPath) -> Option<[f64; 3]> {
        let record = self.nodes.get(&path.owner()?)?;
        match record.params.get(path.leaf()?)? {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    fn meta(&self, entity: &EntityPath, key: &MetaKey) -> Option<Value> {
        if entity.is_root() {
            return self.root_meta.get(key.as_str()).cloned();
        }
        self.nodes
            .get(&NodeName::new(entity.as_str()))?
            .meta
            .get(key.as_str())
            .cloned()
    }

    fn group_plug_flag(&self, plug: &PlugPath) -> Option<bool> {
        let node = plug.owner()?;
        let leaf = plug.leaf()?;
        if !self.type_of(&node)?.has_plug(leaf) {
            return None;
        }
        let record = self.nodes.get(&node)?;
        Some(record.plug_flags.get(leaf).copied().unwrap_or(false))
    }

    fn operator_state(&self, name: &NodeName) -> Option<OperatorState> {
        self.nodes.get(name).map(|record| record.state)
    }

    fn feed_source(&self, input: &PlugPath) -> Option<PlugPath> {
        self.feeds.get(input).cloned()
    }

    fn feeds_of(&self, node: &NodeName) -> Vec<Feed> {
        self.feeds
            .iter()
            .filter(|(input, output)| owned_by(input, node) || owned_by(output, node))
            .map(|(input, output)| Feed {
                input: input.clone(),
                output: output.clone(),
            })
            .collect()
    }
}

impl Engine for MemoryEngine {
    fn create_node(&mut self, node_type: &str, suggested: &NodeName, cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("create_node", suggested.as_str())
            .and_then(|()| self.try_create(node_type, suggested));
        settle(cb, result);
    }

    fn erase_node(&mut self, name: &NodeName, cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("erase_node", name.as_str())
            .and_then(|()| self.try_erase(name));
        settle(cb, result);
    }

    fn rename_node(&mut self, old: &NodeName, new: &NodeName, cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("rename_node", old.as_str())
            .and_then(|()| self.try_rename(old, new));
        settle(cb, result);
    }

    fn connect_feed(&mut self, input: &PlugPath, output: &PlugPath, cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("connect_feed", input.as_str())
            .and_then(|()| self.try_connect(input, output));
        settle(cb, result);
    }

    fn set_parameter(
        &mut self,
        path: &ParamPath,
        value: &Value,
        component: usize,
        cb: &mut dyn Callback,
    ) {
        let result = self
            .probe
            .admit("set_parameter", path.as_str())
            .and_then(|()| self.try_set_parameter(path, value, component));
        settle(cb, result);
    }

    fn set_parameter_vector3(&mut self, path: &ParamPath, value: [f64; 3], cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("set_parameter_vector3", path.as_str())
            .and_then(|()| self.try_set_vector3(path, value));
        settle(cb, result);
    }

    fn set_meta_value(
        &mut self,
        entity: &EntityPath,
        key: &MetaKey,
        value: Option<&Value>,
        cb: &mut dyn Callback,
    ) {
        let result = self
            .probe
            .admit("set_meta_value", entity.as_str())
            .and_then(|()| self.try_set_meta(entity, key, value));
        settle(cb, result);
    }

    fn set_group_plug_flag(&mut self, plug: &PlugPath, flag: bool, cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("set_group_plug_flag", plug.as_str())
            .and_then(|()| self.try_set_plug_flag(plug, flag));
        settle(cb, result);
    }

    fn set_operator_state(&mut self, name: &NodeName, state: OperatorState, cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("set_operator_state", name.as_str())
            .and_then(|()| self.try_set_state(name, state));
        settle(cb, result);
    }

    fn export_entity(&mut self, name: &NodeName, format: ExportFormat, cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("export_entity", name.as_str())
            .and_then(|()| self.try_export(name, format));
        settle(cb, result);
    }

    fn import_entity(&mut self, blob: &[u8], _format: ExportFormat, cb: &mut dyn Callback) {
        let result = self
            .probe
            .admit("import_entity", "")
            .and_then(|()| self.try_import(blob));
        settle(cb, result);
    }
}
