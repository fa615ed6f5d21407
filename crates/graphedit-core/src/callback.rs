#![forbid(unsafe_code)]

//! Request/response protocol between the editor and the engine.
//!
//! A caller snapshots whatever it needs to undo into a [`Callback`], then
//! hands that callback to exactly one engine operation through [`invoke`].
//! The engine resolves it before returning, so when `invoke` returns the
//! edit is either confirmed or rejected. Nothing is left pending.
//!
//! ```text
//!   Idle ──invoke──► Requested ──success──► Confirmed
//!                              └─failure──► Rejected
//! ```
//!
//! The continuation is an explicit argument rather than an ambient
//! registration, so nested calls are just nested `invoke`s: each inner
//! call is resolved and popped before its caller's call returns.
//!
//! # Failure Modes
//!
//! - **Double resolution**: an engine calling `success` and then `failure`
//!   (or either twice) panics. This is a broken engine, not a user error.
//! - **Unresolved return**: an engine returning without resolving panics
//!   when `invoke` finishes.

use std::fmt;

use crate::engine::Reply;

/// Continuation resolved by the engine once per call.
pub trait Callback {
    /// The call succeeded and the graph now reflects `reply`.
    fn success(&mut self, reply: Reply);

    /// The call was refused and nothing changed.
    fn failure(&mut self, message: &str);
}

/// Lifecycle of one engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Requested,
    Confirmed,
    Rejected,
}

impl Phase {
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected)
    }

    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Verdict recorded by a [`Capture`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Confirmed(Reply),
    Rejected(String),
}

/// Callback holding the snapshotted old value of one edit next to the
/// engine's verdict.
#[derive(Debug, Clone)]
pub struct Capture<T> {
    old: T,
    resolution: Option<Resolution>,
}

impl<T> Capture<T> {
    /// Capture `old` before the call is issued.
    #[must_use]
    pub fn new(old: T) -> Self {
        Self {
            old,
            resolution: None,
        }
    }

    #[must_use]
    pub fn old(&self) -> &T {
        &self.old
    }

    #[must_use]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Split into the snapshot and the verdict.
    ///
    /// A capture that never went through an engine call reports an error
    /// rather than a silent success.
    pub fn into_outcome(self) -> (T, Result<Reply, String>) {
        let outcome = match self.resolution {
            Some(Resolution::Confirmed(reply)) => Ok(reply),
            Some(Resolution::Rejected(message)) => Err(message),
            None => Err("engine call left unresolved".to_string()),
        };
        (self.old, outcome)
    }
}

impl<T> Callback for Capture<T> {
    fn success(&mut self, reply: Reply) {
        self.resolution = Some(Resolution::Confirmed(reply));
    }

    fn failure(&mut self, message: &str) {
        self.resolution = Some(Resolution::Rejected(message.to_string()));
    }
}

/// Guard that binds a callback to exactly one call and enforces the
/// `Requested → {Confirmed, Rejected}` transition.
pub struct Pending<'a> {
    label: &'static str,
    phase: Phase,
    inner: &'a mut dyn Callback,
}

impl fmt::Debug for Pending<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("label", &self.label)
            .field("phase", &self.phase)
            .finish()
    }
}

impl<'a> Pending<'a> {
    /// Register `inner` as the continuation of the call named `label`.
    #[must_use]
    pub fn request(label: &'static str, inner: &'a mut dyn Callback) -> Self {
        Self {
            label,
            phase: Phase::Requested,
            inner,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Close the call. Panics if the engine never resolved it.
    pub fn finish(self) -> Phase {
        assert!(
            self.phase.is_resolved(),
            "engine call `{}` returned without resolving its callback",
            self.label
        );
        self.phase
    }

    fn settle(&mut self, next: Phase) {
        assert!(
            self.phase == Phase::Requested,
            "callback for `{}` resolved twice ({:?} then {:?})",
            self.label,
            self.phase,
            next
        );
        self.phase = next;
    }
}

impl Callback for Pending<'_> {
    fn success(&mut self, reply: Reply) {
        self.settle(Phase::Confirmed);
        self.inner.success(reply);
    }

    fn failure(&mut self, message: &str) {
        self.settle(Phase::Rejected);
        self.inner.failure(message);
    }
}

/// Issue one engine operation under the callback protocol.
///
/// `op` receives the engine and the guarded callback; the returned phase is
/// always resolved.
pub fn invoke<E, F>(
    engine: &mut E,
    label: &'static str,
    callback: &mut dyn Callback,
    op: F,
) -> Phase
where
    E: ?Sized,
    F: FnOnce(&mut E, &mut dyn Callback),
{
    let mut pending = Pending::request(label, callback);
    op(engine, &mut pending);
    pending.finish()
}
