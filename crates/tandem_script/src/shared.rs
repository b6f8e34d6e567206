//! Cross-context value handles
//!
//! A [`SharedValue`] pins an engine value so it can be installed into a
//! different context of the same host. Nothing is copied: after the value
//! is defined elsewhere, mutations made through either context are visible
//! through the other.

use std::fmt;

use rquickjs::{Object, Persistent, Value};

use crate::context::ContextId;
use crate::token::SecurityToken;

/// A value read out of one context, carrying its origin and that origin's
/// security token at the time it was read.
#[derive(Clone)]
pub struct SharedValue {
    origin: ContextId,
    token: Option<SecurityToken>,
    value: Persistent<Value<'static>>,
}

impl SharedValue {
    pub(crate) fn new(
        origin: ContextId,
        token: Option<SecurityToken>,
        value: Persistent<Value<'static>>,
    ) -> Self {
        Self {
            origin,
            token,
            value,
        }
    }

    pub fn origin(&self) -> ContextId {
        self.origin
    }

    pub fn security_token(&self) -> Option<SecurityToken> {
        self.token
    }

    pub(crate) fn persistent(&self) -> Persistent<Value<'static>> {
        self.value.clone()
    }
}

impl fmt::Debug for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedValue")
            .field("origin", &self.origin)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// An object owned by one context, usable as a property target there.
#[derive(Clone)]
pub struct SharedObject {
    context: ContextId,
    object: Persistent<Object<'static>>,
}

impl SharedObject {
    pub(crate) fn new(context: ContextId, object: Persistent<Object<'static>>) -> Self {
        Self { context, object }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub(crate) fn persistent(&self) -> Persistent<Object<'static>> {
        self.object.clone()
    }
}

impl fmt::Debug for SharedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedObject")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
