#![forbid(unsafe_code)]

//! Call recording and fault injection for [`MemoryEngine`](crate::MemoryEngine).
//!
//! The probe is a shared handle: clone it out of the engine before the
//! engine is boxed into a session, then use it from the test to reject
//! specific targets or to count which calls reached the engine.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// One engine operation as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub op: &'static str,
    pub target: String,
}

#[derive(Debug, Default)]
struct ProbeState {
    calls: Vec<EngineCall>,
    rejects: BTreeSet<String>,
}

/// Shared handle onto the engine's call log and reject list.
#[derive(Debug, Clone, Default)]
pub struct EngineProbe {
    inner: Rc<RefCell<ProbeState>>,
}

impl EngineProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call whose primary target is `target` fail.
    pub fn reject(&self, target: impl Into<String>) {
        self.inner.borrow_mut().rejects.insert(target.into());
    }

    /// Stop rejecting `target`.
    pub fn allow(&self, target: &str) {
        self.inner.borrow_mut().rejects.remove(target);
    }

    pub fn allow_all(&self) {
        self.inner.borrow_mut().rejects.clear();
    }

    /// Every call recorded so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.borrow().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.borrow().calls.len()
    }

    /// Number of recorded calls of operation `op`.
    #[must_use]
    pub fn count(&self, op: &str) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| call.op == op)
            .count()
    }

    /// Targets of recorded calls of operation `op`, in call order.
    #[must_use]
    pub fn targets(&self, op: &str) -> Vec<String> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| call.op == op)
            .map(|call| call.target.clone())
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    /// Record a call and report whether it must be rejected.
    pub(crate) fn admit(&self, op: &'static str, target: &str) -> Result<(), String> {
        let mut state = self.inner.borrow_mut();
        state.calls.push(EngineCall {
            op,
            target: target.to_string(),
        });
        if state.rejects.contains(target) {
            tracing::debug!(op, target, "probe rejecting call");
            return Err(format!("injected failure for '{target}'"));
        }
        Ok(())
    }
}
