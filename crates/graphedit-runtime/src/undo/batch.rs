#![forbid(unsafe_code)]

//! Multi-target edits with per-item partial success.
//!
//! ```text
//!   ArgsList ──without_noops──► staged ──one engine call each──► applied
//!                 │                                   │
//!                 └─► skipped / unknown               └─► rejected
//! ```
//!
//! A batch is not all-or-nothing. Only the applied subset is materialized,
//! as exactly one [`BatchCmd`], and only if that subset is non-empty.
//! Replaying rebuilds a fresh list from the stored values and issues every
//! item again without filtering.

use std::fmt;

use graphedit_core::{Callback, Capture, Engine, Reply};

use super::args::{ArgsList, Filtered, Staged};
use super::command::{Command, CommandMetadata, Mode};
use crate::event::{Change, Origin};
use crate::session::Session;

/// One kind of batchable engine edit.
pub trait BatchKind: Sized {
    type Target: Clone + PartialEq + fmt::Debug + fmt::Display;
    type Value: Clone + PartialEq + fmt::Debug;

    /// Engine operation name, used as the call label.
    const OPERATION: &'static str;

    /// Current value of `target`, or `None` if it does not exist.
    fn current(engine: &dyn Engine, target: &Self::Target) -> Option<Self::Value>;

    fn issue(
        engine: &mut dyn Engine,
        target: &Self::Target,
        value: &Self::Value,
        cb: &mut dyn Callback,
    );

    /// Value that actually landed, given the engine's reply.
    fn confirmed(_reply: Reply, requested: &Self::Value) -> Self::Value {
        requested.clone()
    }

    fn change(target: &Self::Target, value: &Self::Value) -> Change;

    fn wrap(cmd: BatchCmd<Self>) -> Command;
}

/// One applied element of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem<K: BatchKind> {
    pub target: K::Target,
    pub old: K::Value,
    pub new: K::Value,
}

/// What happened to each element of a submitted list.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    /// Targets the engine confirmed, in original order.
    pub applied: Vec<T>,
    /// Targets refused, with the reason.
    pub rejected: Vec<(T, String)>,
    /// Elements dropped as no-ops.
    pub skipped: usize,
}

impl<T> BatchOutcome<T> {
    /// At least one element landed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.applied.is_empty()
    }

    #[must_use]
    pub fn changed(&self) -> usize {
        self.applied.len()
    }
}

/// Materialized batch: the applied subset of one submitted list.
#[derive(Debug)]
pub struct BatchCmd<K: BatchKind> {
    pub(crate) meta: CommandMetadata,
    pub(crate) items: Vec<BatchItem<K>>,
}

impl<K: BatchKind> BatchCmd<K> {
    /// Stage `list`, issue every element that changes something, and
    /// materialize the applied subset into `mode`.
    pub fn apply(
        session: &mut Session,
        mode: Mode<'_>,
        label: impl Into<String>,
        list: &ArgsList<K::Target, K::Value>,
        mergeable: bool,
    ) -> BatchOutcome<K::Target> {
        let Filtered {
            staged,
            unknown,
            skipped,
        } = list.without_noops(|target| K::current(session.engine(), target));

        let mut outcome = BatchOutcome {
            applied: Vec::with_capacity(staged.len()),
            rejected: Vec::new(),
            skipped,
        };
        for target in unknown {
            let rejection =
                session.reject(K::OPERATION, format!("'{target}' has no current value"));
            outcome.rejected.push((target, rejection.message));
        }

        let mut items = Vec::with_capacity(staged.len());
        for Staged { target, old, new } in staged {
            let mut capture = Capture::new(old);
            session.invoke(K::OPERATION, &mut capture, |e, cb| K::issue(e, &target, &new, cb));
            let (old, result) = capture.into_outcome();
            let result = result.map(|reply| K::confirmed(reply, &new));
            session.announce(
                K::change(&target, result.as_ref().unwrap_or(&new)),
                Origin::Edit,
                result.as_ref().err().map(String::as_str),
            );
            match result {
                Ok(new) => {
                    outcome.applied.push(target.clone());
                    items.push(BatchItem { target, old, new });
                }
                Err(message) => outcome.rejected.push((target, message)),
            }
        }

        if items.is_empty() {
            tracing::debug!(
                target: "graphedit.edit",
                operation = K::OPERATION,
                skipped,
                rejected = outcome.rejected.len(),
                "batch changed nothing"
            );
        } else {
            let meta = CommandMetadata::new(label).with_mergeable(mergeable);
            mode.materialize(K::wrap(Self { meta, items }));
        }
        outcome
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.meta.label
    }

    #[must_use]
    pub fn items(&self) -> &[BatchItem<K>] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Same length and element-wise equal targets, in the same order.
    #[must_use]
    pub fn same_targets(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.target == b.target)
    }

    /// Take every new value of `other`, keeping our old values and label.
    pub(crate) fn absorb(&mut self, other: Self) {
        for (mine, theirs) in self.items.iter_mut().zip(other.items) {
            mine.new = theirs.new;
        }
        self.meta.timestamp = other.meta.timestamp;
    }

    pub(crate) fn replay(
        &mut self,
        session: &mut Session,
        origin: Origin,
        failures: &mut Vec<String>,
    ) {
        let list: ArgsList<K::Target, K::Value> = self
            .items
            .iter()
            .map(|item| (item.target.clone(), origin.pick(&item.old, &item.new).clone()))
            .collect();
        for (item, args) in self.items.iter_mut().zip(&list) {
            let result = session
                .call(K::OPERATION, |e, cb| K::issue(e, &args.target, &args.value, cb))
                .map(|reply| K::confirmed(reply, &args.value));
            session.announce(
                K::change(&args.target, result.as_ref().unwrap_or(&args.value)),
                origin,
                result.as_ref().err().map(String::as_str),
            );
            match result {
                Ok(value) if origin.is_undo() => item.old = value,
                Ok(value) => item.new = value,
                Err(message) => failures.push(format!("{}: {message}", args.target)),
            }
        }
    }
}
