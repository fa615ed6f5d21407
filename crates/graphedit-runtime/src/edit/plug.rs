#![forbid(unsafe_code)]

//! Group plug flags. The old flag is read before the write, so a plug the
//! engine does not know is refused without an engine call.

use graphedit_core::PlugPath;

use super::err_str;
use crate::event::{Change, Origin};
use crate::session::Session;
use crate::undo::{Command, CommandMetadata, CompoundCmd, Mode, Rejection, UndoStack};

fn issue_flag(
    session: &mut Session,
    plug: &PlugPath,
    flag: bool,
    origin: Origin,
) -> Result<(), String> {
    let result = session
        .call("set_group_plug_flag", |e, cb| e.set_group_plug_flag(plug, flag, cb))
        .map(drop);
    session.announce(
        Change::PlugFlag {
            plug: plug.clone(),
            flag,
        },
        origin,
        err_str(&result),
    );
    result
}

/// Toggle of a plug's group-exposure flag.
#[derive(Debug, Clone)]
pub struct SetPlugFlagCmd {
    pub(crate) meta: CommandMetadata,
    pub(crate) plug: PlugPath,
    pub(crate) old: bool,
    pub(crate) new: bool,
}

impl SetPlugFlagCmd {
    pub fn once(session: &mut Session, plug: &PlugPath, flag: bool) -> Result<(), Rejection> {
        Self::apply(session, Mode::Once, plug, flag)
    }

    pub fn as_child(
        session: &mut Session,
        parent: &mut CompoundCmd,
        plug: &PlugPath,
        flag: bool,
    ) -> Result<(), Rejection> {
        Self::apply(session, Mode::Child(parent), plug, flag)
    }

    pub fn on_stack(
        session: &mut Session,
        stack: &mut UndoStack,
        plug: &PlugPath,
        flag: bool,
    ) -> Result<(), Rejection> {
        Self::apply(session, Mode::Stack(stack), plug, flag)
    }

    pub fn apply(
        session: &mut Session,
        mode: Mode<'_>,
        plug: &PlugPath,
        flag: bool,
    ) -> Result<(), Rejection> {
        let Some(old) = session.engine().group_plug_flag(plug) else {
            return Err(session.reject("set_group_plug_flag", format!("no plug '{plug}'")));
        };
        issue_flag(session, plug, flag, Origin::Edit)
            .map_err(|message| Rejection::new("set_group_plug_flag", message))?;
        let verb = if flag { "Expose" } else { "Hide" };
        mode.materialize(Command::SetPlugFlag(Self {
            meta: CommandMetadata::new(format!("{verb} {plug}")),
            plug: plug.clone(),
            old,
            new: flag,
        }));
        Ok(())
    }

    #[must_use]
    pub fn plug(&self) -> &PlugPath {
        &self.plug
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        let flag = *origin.pick(&self.old, &self.new);
        if let Err(message) = issue_flag(session, &self.plug, flag, origin) {
            failures.push(message);
        }
    }
}
