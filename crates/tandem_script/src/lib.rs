//! Tandem Scripting Host
//!
//! The host side of the engine: one QuickJS runtime and any number of
//! script contexts living inside it.
//!
//! ## Architecture
//!
//! - **ScriptHost:** owns the runtime, mints contexts, tracks which context
//!   is entered, and runs the microtask checkpoint
//! - **ScriptContext:** one execution context (page, frame, or the
//!   secondary runtime's own context) with a security token and
//!   embedder-data slots
//! - **SharedValue / SharedObject:** handles that carry engine values across
//!   contexts by reference; the same object is observed from both sides
//!
//! All handles are `!Send`. Everything here runs on the host's single
//! context-creation sequence.

pub mod context;
pub mod error;
pub mod microtask;
pub mod runtime;
pub mod shared;
pub mod token;

pub use context::{ContextId, ScriptContext};
pub use error::ScriptError;
pub use microtask::{MicrotaskSuppression, SuppressionScope};
pub use runtime::{ContextScope, ScriptHost};
pub use shared::{SharedObject, SharedValue};
pub use token::SecurityToken;

pub use rquickjs;
