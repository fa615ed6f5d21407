#![forbid(unsafe_code)]

//! Payload of multi-target edits.
//!
//! An [`ArgsList`] is an ordered list of `(target, desired value)` pairs
//! with no history semantics of its own. Before a batch reaches the engine
//! it is staged with [`ArgsList::without_noops`], which drops every element
//! whose desired value already equals the current one.

/// One `(target, desired value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Args<T, V> {
    pub target: T,
    pub value: V,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgsList<T, V> {
    items: Vec<Args<T, V>>,
}

impl<T, V> Default for ArgsList<T, V> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T, V> ArgsList<T, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: T, value: V) {
        self.items.push(Args { target, value });
    }

    #[must_use]
    pub fn with(mut self, target: T, value: V) -> Self {
        self.push(target, value);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Args<T, V>> {
        self.items.iter()
    }
}

impl<T, V> FromIterator<(T, V)> for ArgsList<T, V> {
    fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|(target, value)| Args { target, value })
                .collect(),
        }
    }
}

impl<'a, T, V> IntoIterator for &'a ArgsList<T, V> {
    type Item = &'a Args<T, V>;
    type IntoIter = std::slice::Iter<'a, Args<T, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An element that survived no-op filtering, with its snapshotted old value.
#[derive(Debug, Clone, PartialEq)]
pub struct Staged<T, V> {
    pub target: T,
    pub old: V,
    pub new: V,
}

/// Result of [`ArgsList::without_noops`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered<T, V> {
    /// Elements that change something, in original order.
    pub staged: Vec<Staged<T, V>>,
    /// Targets whose current value could not be read.
    pub unknown: Vec<T>,
    /// Number of elements dropped because they would change nothing.
    pub skipped: usize,
}

impl<T: Clone, V: Clone + PartialEq> ArgsList<T, V> {
    /// Stage the list against current state.
    ///
    /// `current` returns `None` for a target that does not exist.
    pub fn without_noops(&self, mut current: impl FnMut(&T) -> Option<V>) -> Filtered<T, V> {
        let mut filtered = Filtered {
            staged: Vec::with_capacity(self.items.len()),
            unknown: Vec::new(),
            skipped: 0,
        };
        for Args { target, value } in &self.items {
            match current(target) {
                None => filtered.unknown.push(target.clone()),
                Some(old) if old == *value => filtered.skipped += 1,
                Some(old) => filtered.staged.push(Staged {
                    target: target.clone(),
                    old,
                    new: value.clone(),
                }),
            }
        }
        filtered
    }
}
