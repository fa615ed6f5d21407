#![forbid(unsafe_code)]

//! The editing session: one engine, one hub, one stack of in-flight calls.
//!
//! Every mutation of the graph goes through [`Session::invoke`], which runs
//! the engine operation under the callback protocol inside an `engine.call`
//! span. The session only hands out a shared reference to the engine, so
//! queries are free but there is no way to mutate it without a callback.
//!
//! ```text
//!   Session::invoke ──► CallStack::push ──► Engine op ──► cb.success/failure
//!          ▲                                                     │
//!          └───────────── CallStack::pop ◄───────────────────────┘
//! ```

use graphedit_core::{Callback, Capture, Engine, Pending, Phase, Reply};
use tracing::field;

use crate::event::{Change, Event, Origin, Severity};
use crate::hub::NotificationHub;
use crate::undo::Rejection;

/// Labels of the engine calls and edit scopes currently in flight,
/// outermost first.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<&'static str>,
    deepest: usize,
}

impl CallStack {
    pub fn push(&mut self, label: &'static str) {
        self.frames.push(label);
        self.deepest = self.deepest.max(self.frames.len());
    }

    pub fn pop(&mut self) -> Option<&'static str> {
        self.frames.pop()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Deepest nesting seen since the session started.
    #[must_use]
    pub fn deepest(&self) -> usize {
        self.deepest
    }

    #[must_use]
    pub fn current(&self) -> Option<&'static str> {
        self.frames.last().copied()
    }

    #[must_use]
    pub fn frames(&self) -> &[&'static str] {
        &self.frames
    }
}

pub struct Session {
    engine: Box<dyn Engine>,
    hub: NotificationHub,
    calls: CallStack,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("hub", &self.hub)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session over `engine` with a fresh hub.
    #[must_use]
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self::with_hub(engine, NotificationHub::new())
    }

    #[must_use]
    pub fn with_hub(engine: impl Engine + 'static, hub: NotificationHub) -> Self {
        Self {
            engine: Box::new(engine),
            hub,
            calls: CallStack::default(),
        }
    }

    /// Read-only view of the engine for snapshots and queries.
    #[must_use]
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    #[must_use]
    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    #[must_use]
    pub fn call_stack(&self) -> &CallStack {
        &self.calls
    }

    /// Issue one engine operation with `callback` as its continuation.
    ///
    /// Panics if the engine resolves the callback twice or returns without
    /// resolving it.
    pub fn invoke(
        &mut self,
        label: &'static str,
        callback: &mut dyn Callback,
        op: impl FnOnce(&mut dyn Engine, &mut dyn Callback),
    ) -> Phase {
        let span = tracing::debug_span!(
            "engine.call",
            call = label,
            depth = self.calls.depth() + 1,
            phase = field::Empty
        );
        let _guard = span.enter();

        self.calls.push(label);
        let mut pending = Pending::request(label, callback);
        op(self.engine.as_mut(), &mut pending);
        let phase = pending.finish();
        self.calls.pop();

        span.record("phase", field::debug(phase));
        phase
    }

    /// [`invoke`](Self::invoke) with a throwaway callback, returning the verdict.
    pub fn call(
        &mut self,
        label: &'static str,
        op: impl FnOnce(&mut dyn Engine, &mut dyn Callback),
    ) -> Result<Reply, String> {
        let mut capture = Capture::new(());
        self.invoke(label, &mut capture, op);
        capture.into_outcome().1
    }

    /// Run `f` as one named scope of nested engine calls.
    pub fn nested<R>(&mut self, label: &'static str, f: impl FnOnce(&mut Self) -> R) -> R {
        let span = tracing::debug_span!("edit.scope", scope = label, depth = self.calls.depth());
        let _guard = span.enter();
        self.calls.push(label);
        let result = f(self);
        self.calls.pop();
        result
    }

    /// Publish the outcome of one resolved engine call.
    pub fn announce(&self, change: Change, origin: Origin, failure: Option<&str>) {
        if let Some(message) = failure {
            tracing::warn!(
                target: "graphedit.edit",
                %origin,
                change = %change,
                reason = message,
                "engine rejected call"
            );
            self.hub.publish(&Event::Message {
                severity: Severity::Error,
                text: format!("{change} failed: {message}"),
            });
        }
        self.hub.publish(&Event::Changed {
            change,
            origin,
            success: failure.is_none(),
        });
    }

    /// Put one line on the message log.
    pub fn report(&self, severity: Severity, text: impl Into<String>) {
        self.hub.publish(&Event::Message {
            severity,
            text: text.into(),
        });
    }

    /// Refuse an edit before any engine call was issued.
    pub(crate) fn reject(&self, operation: &'static str, message: impl Into<String>) -> Rejection {
        let message = message.into();
        tracing::warn!(target: "graphedit.edit", operation, reason = %message, "edit refused");
        self.report(Severity::Error, format!("{operation}: {message}"));
        Rejection::new(operation, message)
    }
}
