#![forbid(unsafe_code)]

//! Parameter edits, one component at a time or a whole vector3.
//!
//! The stored new value is what the engine confirmed, which may differ from
//! what was requested (ranged parameters are clamped). Both commands merge
//! into a previous edit of the same target when flagged mergeable, which is
//! how a drag collapses into one undo step.

use graphedit_core::{Capture, ParamPath, Value};

use super::err_str;
use crate::event::{Change, Origin};
use crate::session::Session;
use crate::undo::{Command, CommandMetadata, CompoundCmd, Mode, Rejection, UndoStack};

fn confirmed_value(
    result: Result<graphedit_core::Reply, String>,
    requested: &Value,
) -> Result<Value, String> {
    result.map(|reply| reply.into_value().unwrap_or_else(|| requested.clone()))
}

fn issue_parameter(
    session: &mut Session,
    path: &ParamPath,
    component: usize,
    value: &Value,
    origin: Origin,
) -> Result<Value, String> {
    let result = session.call("set_parameter", |e, cb| e.set_parameter(path, value, component, cb));
    let result = confirmed_value(result, value);
    session.announce(
        Change::Parameter {
            path: path.clone(),
            component: Some(component),
            value: result.as_ref().unwrap_or(value).clone(),
        },
        origin,
        err_str(&result),
    );
    result
}

#[derive(Debug, Clone)]
pub struct SetParameterCmd {
    pub(crate) meta: CommandMetadata,
    pub(crate) path: ParamPath,
    pub(crate) component: usize,
    pub(crate) old: Value,
    pub(crate) new: Value,
}

impl SetParameterCmd {
    pub fn once(
        session: &mut Session,
        path: &ParamPath,
        component: usize,
        value: &Value,
    ) -> Result<Value, Rejection> {
        Self::apply(session, Mode::Once, path, component, value, false)
    }

    pub fn as_child(
        session: &mut Session,
        parent: &mut CompoundCmd,
        path: &ParamPath,
        component: usize,
        value: &Value,
    ) -> Result<Value, Rejection> {
        Self::apply(session, Mode::Child(parent), path, component, value, false)
    }

    pub fn on_stack(
        session: &mut Session,
        stack: &mut UndoStack,
        path: &ParamPath,
        component: usize,
        value: &Value,
        mergeable: bool,
    ) -> Result<Value, Rejection> {
        Self::apply(session, Mode::Stack(stack), path, component, value, mergeable)
    }

    /// Returns the value the engine stored.
    pub fn apply(
        session: &mut Session,
        mode: Mode<'_>,
        path: &ParamPath,
        component: usize,
        value: &Value,
        mergeable: bool,
    ) -> Result<Value, Rejection> {
        let Some(old) = session.engine().parameter(path, component) else {
            return Err(session.reject(
                "set_parameter",
                format!("no component {component} on parameter '{path}'"),
            ));
        };
        let mut capture = Capture::new(old);
        session.invoke("set_parameter", &mut capture, |e, cb| {
            e.set_parameter(path, value, component, cb);
        });
        let (old, result) = capture.into_outcome();
        let result = confirmed_value(result, value);
        session.announce(
            Change::Parameter {
                path: path.clone(),
                component: Some(component),
                value: result.as_ref().unwrap_or(value).clone(),
            },
            Origin::Edit,
            err_str(&result),
        );
        let new = result.map_err(|message| Rejection::new("set_parameter", message))?;

        mode.materialize(Command::SetParameter(Self {
            meta: CommandMetadata::new(format!("Set {path}")).with_mergeable(mergeable),
            path: path.clone(),
            component,
            old,
            new: new.clone(),
        }));
        Ok(new)
    }

    #[must_use]
    pub fn path(&self) -> &ParamPath {
        &self.path
    }

    #[must_use]
    pub fn component(&self) -> usize {
        self.component
    }

    #[must_use]
    pub fn old(&self) -> &Value {
        &self.old
    }

    #[must_use]
    pub fn new_value(&self) -> &Value {
        &self.new
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        let target = origin.pick(&self.old, &self.new).clone();
        match issue_parameter(session, &self.path, self.component, &target, origin) {
            Ok(value) if origin.is_undo() => self.old = value,
            Ok(value) => self.new = value,
            Err(message) => failures.push(message),
        }
    }
}

// ============================================================================
// Vector3
// ============================================================================

fn issue_vector3(
    session: &mut Session,
    path: &ParamPath,
    value: [f64; 3],
    origin: Origin,
) -> Result<[f64; 3], String> {
    let result = session
        .call("set_parameter_vector3", |e, cb| e.set_parameter_vector3(path, value, cb))
        .map(|reply| match reply.into_value() {
            Some(Value::Vec3(v)) => v,
            _ => value,
        });
    session.announce(
        Change::Parameter {
            path: path.clone(),
            component: None,
            value: Value::Vec3(*result.as_ref().unwrap_or(&value)),
        },
        origin,
        err_str(&result),
    );
    result
}

/// Whole-vector write of a vector3 parameter.
#[derive(Debug, Clone)]
pub struct SetVector3Cmd {
    pub(crate) meta: CommandMetadata,
    pub(crate) path: ParamPath,
    pub(crate) old: [f64; 3],
    pub(crate) new: [f64; 3],
}

impl SetVector3Cmd {
    pub fn once(
        session: &mut Session,
        path: &ParamPath,
        value: [f64; 3],
    ) -> Result<[f64; 3], Rejection> {
        Self::apply(session, Mode::Once, path, value, false)
    }

    pub fn as_child(
        session: &mut Session,
        parent: &mut CompoundCmd,
        path: &ParamPath,
        value: [f64; 3],
    ) -> Result<[f64; 3], Rejection> {
        Self::apply(session, Mode::Child(parent), path, value, false)
    }

    pub fn on_stack(
        session: &mut Session,
        stack: &mut UndoStack,
        path: &ParamPath,
        value: [f64; 3],
        mergeable: bool,
    ) -> Result<[f64; 3], Rejection> {
        Self::apply(session, Mode::Stack(stack), path, value, mergeable)
    }

    pub fn apply(
        session: &mut Session,
        mode: Mode<'_>,
        path: &ParamPath,
        value: [f64; 3],
        mergeable: bool,
    ) -> Result<[f64; 3], Rejection> {
        let Some(old) = session.engine().parameter_vector3(path) else {
            return Err(session.reject(
                "set_parameter_vector3",
                format!("'{path}' is not a vector3 parameter"),
            ));
        };
        let new = issue_vector3(session, path, value, Origin::Edit)
            .map_err(|message| Rejection::new("set_parameter_vector3", message))?;
        mode.materialize(Command::SetVector3(Self {
            meta: CommandMetadata::new(format!("Set {path}")).with_mergeable(mergeable),
            path: path.clone(),
            old,
            new,
        }));
        Ok(new)
    }

    #[must_use]
    pub fn path(&self) -> &ParamPath {
        &self.path
    }

    #[must_use]
    pub fn old(&self) -> [f64; 3] {
        self.old
    }

    #[must_use]
    pub fn new_value(&self) -> [f64; 3] {
        self.new
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        let target = *origin.pick(&self.old, &self.new);
        match issue_vector3(session, &self.path, target, origin) {
            Ok(value) if origin.is_undo() => self.old = value,
            Ok(value) => self.new = value,
            Err(message) => failures.push(message),
        }
    }
}
