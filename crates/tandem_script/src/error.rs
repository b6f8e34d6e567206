use crate::context::ContextId;
use thiserror::Error;

/// Errors raised by the host engine.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script engine error: {0}")]
    Engine(#[from] rquickjs::Error),

    #[error("uncaught exception in context '{context}': {message}")]
    Exception { context: String, message: String },

    #[error("context {to} may not receive values owned by context {from}: security tokens differ")]
    SecurityTokenMismatch { from: ContextId, to: ContextId },

    #[error("global '{key}' of context '{context}' holds a non-object value")]
    NotAnObject { context: String, key: String },

    #[error("object belongs to context {owner}, not context {context}")]
    ForeignObject { owner: ContextId, context: ContextId },

    #[error("a pending microtask threw during the checkpoint")]
    JobFailed,
}
