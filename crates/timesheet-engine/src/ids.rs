//! Identifier source for events minted by the engine (recurrence instances,
//! day fragments and working-hours events).

use std::cell::Cell;
use std::collections::HashSet;

use tracing::warn;

pub trait IdGenerator {
    fn next_id(&self) -> String;

    /// Restart the sequence. Called at the start of every build so the same
    /// input yields the same ids; generators without a sequence ignore it.
    fn reset(&self) {}
}

/// Hands out `"{prefix}-{n}"` with `n` counting up from 1.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("gen")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}-{}", self.prefix, n)
    }

    fn reset(&self) {
        self.next.set(1);
    }
}

/// Skips every id in `taken`, so minted events never share an id with the
/// caller's events.
pub(crate) struct FreshIds<'a> {
    inner: &'a dyn IdGenerator,
    taken: HashSet<String>,
}

impl<'a> FreshIds<'a> {
    pub(crate) fn new(inner: &'a dyn IdGenerator, taken: HashSet<String>) -> Self {
        Self { inner, taken }
    }
}

impl IdGenerator for FreshIds<'_> {
    fn next_id(&self) -> String {
        // A generator that keeps repeating itself gives up after one pass
        // over the taken set.
        let mut id = self.inner.next_id();
        for _ in 0..self.taken.len() {
            if !self.taken.contains(&id) {
                return id;
            }
            id = self.inner.next_id();
        }
        if self.taken.contains(&id) {
            warn!("minted id {} repeats an input event id", id);
        }
        id
    }

    fn reset(&self) {
        self.inner.reset();
    }
}
