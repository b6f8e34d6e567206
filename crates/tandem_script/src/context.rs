//! Script execution contexts
//!
//! A context is created by [`ScriptHost::create_context`](crate::ScriptHost::create_context)
//! and handed out as a cheap, clonable handle. The host owns its lifetime;
//! embedders only attach data to it.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rquickjs::{CatchResultExt, Context, Ctx, FromJs, Object, Persistent, Value};

use crate::error::ScriptError;
use crate::shared::{SharedObject, SharedValue};
use crate::token::SecurityToken;

/// Identity of a context within its host.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to one execution context. Clones refer to the same context.
#[derive(Clone)]
pub struct ScriptContext {
    inner: Rc<ContextInner>,
}

struct ContextInner {
    id: ContextId,
    name: String,
    context: Context,
    security_token: Cell<Option<SecurityToken>>,
    embedder_data: RefCell<BTreeMap<usize, Rc<dyn Any>>>,
}

impl ScriptContext {
    pub(crate) fn new(id: ContextId, name: String, context: Context) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                id,
                name,
                context,
                security_token: Cell::new(None),
                embedder_data: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn security_token(&self) -> Option<SecurityToken> {
        self.inner.security_token.get()
    }

    pub fn set_security_token(&self, token: SecurityToken) {
        self.inner.security_token.set(Some(token));
    }

    /// Whether values owned by `other` may be installed into this context.
    pub fn can_access(&self, other: ContextId, token: Option<SecurityToken>) -> bool {
        if other == self.id() {
            return true;
        }
        matches!((self.security_token(), token), (Some(mine), Some(theirs)) if mine == theirs)
    }

    /// Store embedder data at `index`, replacing whatever was there.
    pub fn set_embedder_data(&self, index: usize, data: Rc<dyn Any>) {
        self.inner.embedder_data.borrow_mut().insert(index, data);
    }

    /// Remove and return the embedder data at `index`.
    pub fn take_embedder_data(&self, index: usize) -> Option<Rc<dyn Any>> {
        self.inner.embedder_data.borrow_mut().remove(&index)
    }

    /// Fetch the embedder data at `index` if it holds a `T`.
    pub fn embedder_data<T: Any>(&self, index: usize) -> Option<Rc<T>> {
        let data = self.inner.embedder_data.borrow().get(&index).cloned()?;
        data.downcast::<T>().ok()
    }

    /// Raw engine access. Must not be nested inside another context's `with`.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Ctx<'_>) -> R,
    {
        self.inner.context.with(f)
    }

    /// Evaluate a classic script, surfacing uncaught exceptions with their message.
    pub fn eval<T>(&self, source: &str) -> Result<T, ScriptError>
    where
        T: for<'js> FromJs<'js>,
    {
        self.with(|ctx| {
            ctx.eval::<T, _>(source)
                .catch(&ctx)
                .map_err(|err| ScriptError::Exception {
                    context: self.name().to_owned(),
                    message: err.to_string(),
                })
        })
    }

    /// Read a property of the global object as a shareable handle.
    ///
    /// `undefined` reads as absent.
    pub fn global(&self, key: &str) -> Result<Option<SharedValue>, ScriptError> {
        let value = self.with(|ctx| -> Result<_, ScriptError> {
            let value: Value<'_> = ctx.globals().get(key)?;
            if value.is_undefined() {
                return Ok(None);
            }
            Ok(Some(Persistent::save(&ctx, value)))
        })?;
        Ok(value.map(|value| SharedValue::new(self.id(), self.security_token(), value)))
    }

    /// Find the object stored under `key` on the global object, creating and
    /// installing an empty one if the property is undefined.
    ///
    /// Returns the object and whether it was created by this call.
    pub fn locate_or_create_object(&self, key: &str) -> Result<(SharedObject, bool), ScriptError> {
        let (object, created) = self.with(|ctx| -> Result<_, ScriptError> {
            let globals = ctx.globals();
            let existing: Value<'_> = globals.get(key)?;
            if existing.is_undefined() {
                let object = Object::new(ctx.clone())?;
                globals.set(key, object.clone())?;
                return Ok((Persistent::save(&ctx, object), true));
            }
            match existing.into_object() {
                Some(object) => Ok((Persistent::save(&ctx, object), false)),
                None => Err(ScriptError::NotAnObject {
                    context: self.name().to_owned(),
                    key: key.to_owned(),
                }),
            }
        })?;
        Ok((SharedObject::new(self.id(), object), created))
    }

    /// Set `target[key] = value` by reference.
    pub fn define(
        &self,
        target: &SharedObject,
        key: &str,
        value: &SharedValue,
    ) -> Result<(), ScriptError> {
        if target.context() != self.id() {
            return Err(ScriptError::ForeignObject {
                owner: target.context(),
                context: self.id(),
            });
        }
        self.check_access(value)?;
        let object = target.persistent();
        let value = value.persistent();
        self.with(|ctx| -> Result<(), ScriptError> {
            let object = object.restore(&ctx)?;
            let value = value.restore(&ctx)?;
            object.set(key, value)?;
            Ok(())
        })
    }

    /// Set `globalThis[key] = value` by reference.
    pub fn define_global(&self, key: &str, value: &SharedValue) -> Result<(), ScriptError> {
        self.check_access(value)?;
        let value = value.persistent();
        self.with(|ctx| -> Result<(), ScriptError> {
            let value = value.restore(&ctx)?;
            ctx.globals().set(key, value)?;
            Ok(())
        })
    }

    fn check_access(&self, value: &SharedValue) -> Result<(), ScriptError> {
        if self.can_access(value.origin(), value.security_token()) {
            Ok(())
        } else {
            Err(ScriptError::SecurityTokenMismatch {
                from: value.origin(),
                to: self.id(),
            })
        }
    }
}

impl PartialEq for ScriptContext {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ScriptContext {}

impl fmt::Debug for ScriptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptContext")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("security_token", &self.security_token())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::{ScriptError, ScriptHost, SecurityToken};
    use std::rc::Rc;

    #[test]
    fn embedder_data_round_trips_by_type() {
        let host = ScriptHost::new().unwrap();
        let ctx = host.create_context("page").unwrap();
        let marker: Rc<String> = Rc::new("tandem".to_string());
        ctx.set_embedder_data(0, marker.clone());

        let fetched = ctx.embedder_data::<String>(0).unwrap();
        assert!(Rc::ptr_eq(&fetched, &marker));
        assert!(ctx.embedder_data::<u32>(0).is_none());
        assert!(ctx.embedder_data::<String>(1).is_none());

        assert!(ctx.take_embedder_data(0).is_some());
        assert!(ctx.embedder_data::<String>(0).is_none());
    }

    #[test]
    fn exceptions_carry_their_message() {
        let host = ScriptHost::new().unwrap();
        let ctx = host.create_context("page").unwrap();
        let err = ctx.eval::<()>("throw new Error('boom')").unwrap_err();
        match err {
            ScriptError::Exception { context, message } => {
                assert_eq!(context, "page");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undefined_globals_read_as_absent() {
        let host = ScriptHost::new().unwrap();
        let ctx = host.create_context("page").unwrap();
        ctx.eval::<()>("globalThis.present = { n: 1 };").unwrap();

        assert!(ctx.global("present").unwrap().is_some());
        assert!(ctx.global("missing").unwrap().is_none());
    }

    #[test]
    fn locate_or_create_reuses_existing_object() {
        let host = ScriptHost::new().unwrap();
        let ctx = host.create_context("page").unwrap();

        let (_, created) = ctx.locate_or_create_object("ns").unwrap();
        assert!(created);
        ctx.eval::<()>("globalThis.first = ns;").unwrap();

        let (_, created) = ctx.locate_or_create_object("ns").unwrap();
        assert!(!created);
        assert!(ctx.eval::<bool>("first === ns").unwrap());
    }

    #[test]
    fn locate_or_create_rejects_non_objects() {
        let host = ScriptHost::new().unwrap();
        let ctx = host.create_context("page").unwrap();
        ctx.eval::<()>("globalThis.ns = 5;").unwrap();

        let err = ctx.locate_or_create_object("ns").unwrap_err();
        assert!(matches!(err, ScriptError::NotAnObject { .. }));
        assert_eq!(ctx.eval::<i32>("ns").unwrap(), 5);
    }

    #[test]
    fn foreign_values_need_matching_tokens() {
        let host = ScriptHost::new().unwrap();
        let owner = host.create_context("owner").unwrap();
        let page = host.create_context("page").unwrap();
        owner.eval::<()>("globalThis.shared = { count: 0 };").unwrap();

        let shared = owner.global("shared").unwrap().unwrap();
        let err = page.define_global("shared", &shared).unwrap_err();
        assert!(matches!(err, ScriptError::SecurityTokenMismatch { .. }));

        let token = SecurityToken::fresh();
        owner.set_security_token(token);
        page.set_security_token(token);
        let shared = owner.global("shared").unwrap().unwrap();
        page.define_global("shared", &shared).unwrap();

        page.eval::<()>("shared.count += 1;").unwrap();
        assert_eq!(owner.eval::<i32>("shared.count").unwrap(), 1);
    }

    #[test]
    fn define_rejects_objects_of_other_contexts() {
        let host = ScriptHost::new().unwrap();
        let a = host.create_context("a").unwrap();
        let b = host.create_context("b").unwrap();
        let (target, _) = a.locate_or_create_object("ns").unwrap();
        a.eval::<()>("globalThis.v = 1;").unwrap();
        let value = a.global("v").unwrap().unwrap();

        let err = b.define(&target, "v", &value).unwrap_err();
        assert!(matches!(err, ScriptError::ForeignObject { .. }));
        a.define(&target, "v", &value).unwrap();
        assert_eq!(a.eval::<i32>("ns.v").unwrap(), 1);
    }
}
