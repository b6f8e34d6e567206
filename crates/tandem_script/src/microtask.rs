//! Microtask suppression
//!
//! While a suppression scope is alive the host skips its microtask
//! checkpoint, so callbacks drained by another runtime cannot interleave
//! with the host's own promise jobs.

use std::cell::Cell;
use std::rc::Rc;

/// Clonable handle over the host's suppression depth.
#[derive(Debug, Clone, Default)]
pub struct MicrotaskSuppression {
    depth: Rc<Cell<usize>>,
}

impl MicrotaskSuppression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the checkpoint until the returned scope is dropped. Scopes nest.
    pub fn scope(&self) -> SuppressionScope {
        self.depth.set(self.depth.get() + 1);
        SuppressionScope {
            depth: Rc::clone(&self.depth),
        }
    }

    pub fn is_active(&self) -> bool {
        self.depth.get() > 0
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

#[must_use = "suppression ends as soon as the scope is dropped"]
#[derive(Debug)]
pub struct SuppressionScope {
    depth: Rc<Cell<usize>>,
}

impl Drop for SuppressionScope {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_nest_and_unwind() {
        let suppression = MicrotaskSuppression::new();
        assert!(!suppression.is_active());

        let outer = suppression.scope();
        let clone = suppression.clone();
        {
            let _inner = clone.scope();
            assert_eq!(suppression.depth(), 2);
        }
        assert!(suppression.is_active());
        drop(outer);
        assert!(!suppression.is_active());
    }
}
