//! The secondary runtime
//!
//! A [`RuntimeInstance`] is configured first (argument vector, tick
//! callback), then started inside its own entered context, which turns it
//! into the process-wide [`Environment`].

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use tandem_script::rquickjs::{self, CatchResultExt, Ctx, Exception, Function, Object, TypedArray};
use tandem_script::{ScriptContext, ScriptError, ScriptHost};
use tracing::{debug, trace};

use crate::error::BridgeError;
use crate::ENVIRONMENT_SLOT;

const PRELUDE: &str = include_str!("js/prelude.js");

/// Drains the runtime's pending callbacks on its behalf.
///
/// Returns the number of callbacks run.
pub type TickCallback = Rc<dyn Fn(&Environment) -> Result<usize, BridgeError>>;

/// A secondary runtime that has not been started yet.
pub struct RuntimeInstance {
    argv: Vec<String>,
    preload: Option<String>,
    tick_callback: Option<TickCallback>,
}

impl RuntimeInstance {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            preload: None,
            tick_callback: None,
        }
    }

    /// Script evaluated in the runtime's context right after the prelude.
    pub fn set_preload(&mut self, source: impl Into<String>) {
        self.preload = Some(source.into());
    }

    pub fn set_tick_callback(&mut self, callback: TickCallback) {
        self.tick_callback = Some(callback);
    }

    /// Install the runtime into `context`, which must be the host's entered context.
    pub fn start(self, host: &ScriptHost, context: &ScriptContext) -> Result<Environment, BridgeError> {
        if host.entered_context() != Some(context.id()) {
            return Err(BridgeError::ContextNotEntered {
                expected: context.id(),
            });
        }

        let argv = self.argv.clone();
        context.with(|ctx| -> Result<(), BridgeError> {
            let installed = install(&ctx, &argv);
            caught(&ctx, context, installed)
        })?;
        if let Some(preload) = &self.preload {
            context.eval::<()>(preload)?;
        }

        debug!(context = %context.id(), argv = ?self.argv, "secondary runtime started");
        Ok(Environment {
            context: context.clone(),
            argv: self.argv,
            tick_callback: self.tick_callback,
        })
    }
}

/// A started secondary runtime.
pub struct Environment {
    context: ScriptContext,
    argv: Vec<String>,
    tick_callback: Option<TickCallback>,
}

impl Environment {
    /// The environment `context` is linked to: the secondary context itself
    /// or any host context bridged to it.
    pub fn current(context: &ScriptContext) -> Option<Rc<Environment>> {
        context.embedder_data::<Environment>(ENVIRONMENT_SLOT)
    }

    /// Point `context`'s environment slot at this environment.
    pub(crate) fn link(self: &Rc<Self>, context: &ScriptContext) {
        context.set_embedder_data(ENVIRONMENT_SLOT, Rc::clone(self) as Rc<dyn Any>);
    }

    /// The runtime's own context.
    pub fn context(&self) -> &ScriptContext {
        &self.context
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Run the runtime's pending callbacks through the registered tick
    /// callback, or drain them directly when none is registered.
    pub fn tick(&self) -> Result<usize, BridgeError> {
        match &self.tick_callback {
            Some(callback) => callback(self),
            None => self.drain_ticks(),
        }
    }

    /// Run every `process.nextTick` callback queued so far.
    pub fn drain_ticks(&self) -> Result<usize, BridgeError> {
        let ran = self.context.with(|ctx| -> Result<usize, BridgeError> {
            let drained = (|| {
                let process: Object<'_> = ctx.globals().get("process")?;
                let drain: Function<'_> = process.get("_tickCallback")?;
                drain.call::<_, u32>(())
            })();
            caught(&ctx, &self.context, drained).map(|ran| ran as usize)
        })?;
        trace!(ran, "drained secondary ticks");
        Ok(ran)
    }

    pub fn pending_ticks(&self) -> Result<usize, BridgeError> {
        let pending = self.context.eval::<u32>("process._pendingTicks()")?;
        Ok(pending as usize)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("context", &self.context)
            .field("argv", &self.argv)
            .field("tick_callback", &self.tick_callback.is_some())
            .finish()
    }
}

fn caught<'js, T>(
    ctx: &Ctx<'js>,
    context: &ScriptContext,
    result: rquickjs::Result<T>,
) -> Result<T, BridgeError> {
    result.catch(ctx).map_err(|err| {
        BridgeError::Script(ScriptError::Exception {
            context: context.name().to_owned(),
            message: err.to_string(),
        })
    })
}

fn install<'js>(ctx: &Ctx<'js>, argv: &[String]) -> rquickjs::Result<()> {
    let native = natives(ctx)?;
    let info = process_info(ctx, argv)?;
    let init: Function<'js> = ctx.eval(PRELUDE)?;
    init.call::<_, ()>((native, info))
}

fn process_info<'js>(ctx: &Ctx<'js>, argv: &[String]) -> rquickjs::Result<Object<'js>> {
    let info = Object::new(ctx.clone())?;
    info.set("argv", argv.to_vec())?;
    let exec_path = std::env::current_exe()
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_default();
    info.set("execPath", exec_path)?;
    info.set("platform", std::env::consts::OS)?;
    info.set("arch", std::env::consts::ARCH)?;
    info.set("pid", std::process::id())?;
    info.set("sep", std::path::MAIN_SEPARATOR.to_string())?;

    let env = Object::new(ctx.clone())?;
    for (key, value) in std::env::vars_os() {
        if let (Some(key), Some(value)) = (key.to_str(), value.to_str()) {
            env.set(key, value)?;
        }
    }
    info.set("env", env)?;
    Ok(info)
}

fn io_error(ctx: &Ctx<'_>, path: &str, err: std::io::Error) -> rquickjs::Error {
    Exception::throw_message(ctx, &format!("{err}: '{path}'"))
}

/// The bytes a `Uint8Array` views; throws when its buffer was detached.
fn view_bytes<'a>(ctx: &Ctx<'_>, array: &'a TypedArray<'_, u8>) -> rquickjs::Result<&'a [u8]> {
    match array.as_bytes() {
        Some(bytes) => Ok(bytes),
        None => Err(Exception::throw_type(ctx, "byte array is detached")),
    }
}

fn natives<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<Object<'js>> {
    let native = Object::new(ctx.clone())?;

    native.set(
        "readFile",
        Function::new(ctx.clone(), |ctx: Ctx<'_>, path: String| -> rquickjs::Result<String> {
            std::fs::read_to_string(&path).map_err(|err| io_error(&ctx, &path, err))
        })?,
    )?;
    native.set(
        "readFileBytes",
        Function::new(
            ctx.clone(),
            |ctx: Ctx<'js>, path: String| -> rquickjs::Result<TypedArray<'js, u8>> {
                let bytes = std::fs::read(&path).map_err(|err| io_error(&ctx, &path, err))?;
                TypedArray::new(ctx, bytes)
            },
        )?,
    )?;
    native.set(
        "writeFile",
        Function::new(
            ctx.clone(),
            |ctx: Ctx<'_>, path: String, contents: String| -> rquickjs::Result<()> {
                std::fs::write(&path, contents).map_err(|err| io_error(&ctx, &path, err))
            },
        )?,
    )?;
    native.set(
        "writeFileBytes",
        Function::new(
            ctx.clone(),
            |ctx: Ctx<'js>, path: String, bytes: TypedArray<'js, u8>| -> rquickjs::Result<()> {
                let bytes = view_bytes(&ctx, &bytes)?;
                std::fs::write(&path, bytes).map_err(|err| io_error(&ctx, &path, err))
            },
        )?,
    )?;
    native.set(
        "exists",
        Function::new(ctx.clone(), |path: String| std::path::Path::new(&path).exists())?,
    )?;
    native.set(
        "isFile",
        Function::new(ctx.clone(), |path: String| std::path::Path::new(&path).is_file())?,
    )?;
    native.set(
        "readDir",
        Function::new(ctx.clone(), |ctx: Ctx<'_>, path: String| -> rquickjs::Result<Vec<String>> {
            let entries = std::fs::read_dir(&path).map_err(|err| io_error(&ctx, &path, err))?;
            let mut names = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|err| io_error(&ctx, &path, err))?;
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();
            Ok(names)
        })?,
    )?;
    native.set(
        "cwd",
        Function::new(ctx.clone(), |ctx: Ctx<'_>| -> rquickjs::Result<String> {
            std::env::current_dir()
                .map(|dir| dir.to_string_lossy().into_owned())
                .map_err(|err| io_error(&ctx, ".", err))
        })?,
    )?;
    native.set(
        "utf8Encode",
        Function::new(
            ctx.clone(),
            |ctx: Ctx<'js>, text: String| -> rquickjs::Result<TypedArray<'js, u8>> {
                TypedArray::new(ctx, text.into_bytes())
            },
        )?,
    )?;
    native.set(
        "utf8Decode",
        Function::new(
            ctx.clone(),
            |ctx: Ctx<'js>, bytes: TypedArray<'js, u8>| -> rquickjs::Result<String> {
                Ok(String::from_utf8_lossy(view_bytes(&ctx, &bytes)?).into_owned())
            },
        )?,
    )?;

    Ok(native)
}
