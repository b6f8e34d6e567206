//! Script host management
//!
//! One QuickJS runtime shared by every context the host creates, so values
//! can travel between contexts without being copied.

use std::cell::{Cell, RefCell};

use rquickjs::{Context, Runtime};
use tracing::{debug, trace, warn};

use crate::context::{ContextId, ScriptContext};
use crate::error::ScriptError;
use crate::microtask::MicrotaskSuppression;

/// The host engine.
pub struct ScriptHost {
    runtime: Runtime,
    next_context: Cell<u64>,
    entered: RefCell<Vec<ContextId>>,
    suppression: MicrotaskSuppression,
}

impl ScriptHost {
    pub fn new() -> Result<Self, ScriptError> {
        let runtime = Runtime::new()?;

        Ok(Self {
            runtime,
            next_context: Cell::new(1),
            entered: RefCell::new(Vec::new()),
            suppression: MicrotaskSuppression::new(),
        })
    }

    /// Create a fresh context with the full set of intrinsics.
    ///
    /// The new context has no security token and no embedder data.
    pub fn create_context(&self, name: impl Into<String>) -> Result<ScriptContext, ScriptError> {
        let context = Context::full(&self.runtime)?;
        let id = ContextId(self.next_context.get());
        self.next_context.set(id.0 + 1);

        let name = name.into();
        debug!(context = %id, name = %name, "created script context");
        Ok(ScriptContext::new(id, name, context))
    }

    /// Enter `context` until the returned scope is dropped.
    pub fn enter(&self, context: &ScriptContext) -> ContextScope<'_> {
        self.entered.borrow_mut().push(context.id());
        ContextScope {
            host: self,
            id: context.id(),
        }
    }

    /// The innermost entered context, if any.
    pub fn entered_context(&self) -> Option<ContextId> {
        self.entered.borrow().last().copied()
    }

    pub fn microtask_suppression(&self) -> MicrotaskSuppression {
        self.suppression.clone()
    }

    pub fn has_pending_microtasks(&self) -> bool {
        self.runtime.is_job_pending()
    }

    /// Run queued promise jobs until the queue is empty.
    ///
    /// Does nothing while microtasks are suppressed. Returns the number of
    /// jobs run.
    pub fn perform_microtask_checkpoint(&self) -> Result<usize, ScriptError> {
        if self.suppression.is_active() {
            trace!(depth = self.suppression.depth(), "microtask checkpoint suppressed");
            return Ok(0);
        }

        let mut ran = 0;
        loop {
            match self.runtime.execute_pending_job() {
                Ok(true) => ran += 1,
                Ok(false) => break,
                Err(_) => return Err(ScriptError::JobFailed),
            }
        }
        Ok(ran)
    }
}

/// Keeps a context entered; exits it on drop.
#[must_use = "the context is exited as soon as the scope is dropped"]
pub struct ContextScope<'a> {
    host: &'a ScriptHost,
    id: ContextId,
}

impl ContextScope<'_> {
    pub fn context(&self) -> ContextId {
        self.id
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        let mut entered = self.host.entered.borrow_mut();
        let Some(position) = entered.iter().rposition(|id| *id == self.id) else {
            return;
        };
        if position + 1 != entered.len() {
            warn!(context = %self.id, "context scope exited out of order");
        }
        entered.remove(position);
    }
}
