#![forbid(unsafe_code)]

//! Feed connections between plugs.

use graphedit_core::{Capture, PlugPath};

use super::err_str;
use crate::event::{Change, Origin};
use crate::session::Session;
use crate::undo::{Command, CommandMetadata, CompoundCmd, Mode, Rejection, UndoStack};

pub(super) fn issue_connect(
    session: &mut Session,
    input: &PlugPath,
    output: &PlugPath,
    origin: Origin,
) -> Result<(), String> {
    let result = session
        .call("connect_feed", |e, cb| e.connect_feed(input, output, cb))
        .map(drop);
    session.announce(
        Change::Feed {
            input: input.clone(),
            output: output.clone(),
        },
        origin,
        err_str(&result),
    );
    result
}

/// Connects `new` into `input`, remembering what fed it before. An empty
/// plug on either side means "disconnected".
#[derive(Debug, Clone)]
pub struct ConnectFeedCmd {
    pub(crate) meta: CommandMetadata,
    pub(crate) input: PlugPath,
    pub(crate) old: PlugPath,
    pub(crate) new: PlugPath,
}

impl ConnectFeedCmd {
    pub fn once(
        session: &mut Session,
        input: &PlugPath,
        output: &PlugPath,
    ) -> Result<(), Rejection> {
        Self::apply(session, Mode::Once, input, output)
    }

    pub fn as_child(
        session: &mut Session,
        parent: &mut CompoundCmd,
        input: &PlugPath,
        output: &PlugPath,
    ) -> Result<(), Rejection> {
        Self::apply(session, Mode::Child(parent), input, output)
    }

    pub fn on_stack(
        session: &mut Session,
        stack: &mut UndoStack,
        input: &PlugPath,
        output: &PlugPath,
    ) -> Result<(), Rejection> {
        Self::apply(session, Mode::Stack(stack), input, output)
    }

    /// Disconnect `input`.
    pub fn unfeed(
        session: &mut Session,
        mode: Mode<'_>,
        input: &PlugPath,
    ) -> Result<(), Rejection> {
        Self::apply(session, mode, input, &PlugPath::none())
    }

    pub fn apply(
        session: &mut Session,
        mode: Mode<'_>,
        input: &PlugPath,
        output: &PlugPath,
    ) -> Result<(), Rejection> {
        let mut capture = Capture::new(session.engine().feed_source(input).unwrap_or_default());
        session.invoke("connect_feed", &mut capture, |e, cb| {
            e.connect_feed(input, output, cb);
        });
        let (old, result) = capture.into_outcome();
        let result = result.map(drop);
        session.announce(
            Change::Feed {
                input: input.clone(),
                output: output.clone(),
            },
            Origin::Edit,
            err_str(&result),
        );
        result.map_err(|message| Rejection::new("connect_feed", message))?;

        let label = if output.is_empty() {
            format!("Unfeed {input}")
        } else {
            format!("Feed {output} into {input}")
        };
        mode.materialize(Command::ConnectFeed(Self {
            meta: CommandMetadata::new(label),
            input: input.clone(),
            old,
            new: output.clone(),
        }));
        Ok(())
    }

    #[must_use]
    pub fn input(&self) -> &PlugPath {
        &self.input
    }

    /// Output that fed `input` before the edit (empty if none).
    #[must_use]
    pub fn old_output(&self) -> &PlugPath {
        &self.old
    }

    #[must_use]
    pub fn new_output(&self) -> &PlugPath {
        &self.new
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        let output = origin.pick(&self.old, &self.new).clone();
        if let Err(message) = issue_connect(session, &self.input, &output, origin) {
            failures.push(message);
        }
    }
}
