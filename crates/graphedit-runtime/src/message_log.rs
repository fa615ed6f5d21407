#![forbid(unsafe_code)]

//! Model behind the message-log panel: a bounded ring of hub messages.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::config::MessageLogConfig;
use crate::event::{Event, Severity};
use crate::hub::{NotificationHub, Subscription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Monotonic across the log's lifetime, including evicted entries.
    pub sequence: u64,
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug)]
struct Ring {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl Ring {
    fn record(&mut self, severity: Severity, text: &str) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            sequence: self.next_sequence,
            severity,
            text: text.to_string(),
        });
        self.next_sequence += 1;
    }
}

/// Subscribes to [`Event::Message`] for as long as it lives.
#[derive(Debug)]
pub struct MessageLog {
    ring: Rc<RefCell<Ring>>,
    _subscription: Subscription,
}

impl MessageLog {
    /// Start recording messages published on `hub`.
    #[must_use]
    pub fn attach(hub: &NotificationHub, config: &MessageLogConfig) -> Self {
        let ring = Rc::new(RefCell::new(Ring {
            entries: VecDeque::with_capacity(config.capacity.min(1024)),
            capacity: config.capacity.max(1),
            next_sequence: 0,
        }));
        let sink = Rc::clone(&ring);
        let subscription = hub.subscribe(move |event| {
            if let Event::Message { severity, text } = event {
                sink.borrow_mut().record(*severity, text);
            }
        });
        Self {
            ring,
            _subscription: subscription,
        }
    }

    /// Entries currently held, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.ring.borrow().entries.iter().cloned().collect()
    }

    #[must_use]
    pub fn latest(&self) -> Option<LogEntry> {
        self.ring.borrow().entries.back().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.borrow().entries.is_empty()
    }

    /// Held entries at `severity` or above.
    #[must_use]
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.ring
            .borrow()
            .entries
            .iter()
            .filter(|e| e.severity >= severity)
            .count()
    }

    pub fn clear(&self) {
        self.ring.borrow_mut().entries.clear();
    }
}
