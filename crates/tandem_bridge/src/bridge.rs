//! Per-context bridging
//!
//! [`ContextBridge::on_context_created`] runs for every context the host
//! creates. The first call bootstraps the secondary runtime; every call
//! then links the context to it and fills the namespace object.

use std::rc::Rc;

use tandem_metrics::{Counter, PhaseTimer};
use tandem_script::{ScriptContext, ScriptError, ScriptHost};
use tracing::{debug, info, warn};

use crate::bootstrap::Bootstrapper;
use crate::environment::Environment;
use crate::error::BridgeError;
use crate::exporter;
use crate::settings::BridgeSettings;

/// Process-scoped bridge state: the bootstrapper, the reference context,
/// and bookkeeping. Create one per host and drop it at shutdown.
pub struct ContextBridge {
    host: Rc<ScriptHost>,
    settings: BridgeSettings,
    bootstrapper: Bootstrapper,
    reference: Option<ScriptContext>,
    counters: Counter,
    phases: PhaseTimer,
}

impl ContextBridge {
    pub fn new(host: Rc<ScriptHost>, settings: BridgeSettings) -> Self {
        let bootstrapper =
            Bootstrapper::new(settings.argv.clone()).with_preload(settings.preload.clone());
        Self {
            host,
            settings,
            bootstrapper,
            reference: None,
            counters: Counter::new(),
            phases: PhaseTimer::new(),
        }
    }

    pub fn host(&self) -> &Rc<ScriptHost> {
        &self.host
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn bootstrapper(&self) -> &Bootstrapper {
        &self.bootstrapper
    }

    /// The secondary runtime, once bootstrapped.
    pub fn environment(&self) -> Option<Rc<Environment>> {
        self.bootstrapper.environment().cloned()
    }

    /// The first context ever bridged. Never replaced.
    pub fn reference_context(&self) -> Option<&ScriptContext> {
        self.reference.as_ref()
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }

    pub fn phases(&self) -> &PhaseTimer {
        &self.phases
    }

    /// Bridge a freshly created host context.
    ///
    /// Safe to call any number of times, including repeatedly for the same
    /// context. Only a bootstrap failure is an error, and it is fatal.
    pub fn on_context_created(&mut self, context: &ScriptContext) -> Result<(), BridgeError> {
        let env = self
            .phases
            .time("bootstrap", || self.bootstrapper.ensure(&self.host))?;
        self.phases.time("bridge", || {
            bridge_context(&self.host, &self.settings, &mut self.counters, &env, context)
        })?;

        if self.reference.is_none() {
            info!(context = %context.id(), name = context.name(), "recorded reference context");
            self.reference = Some(context.clone());
        }
        self.counters.increment("bridge.contexts", 1);
        Ok(())
    }

    /// Drain the pending ticks of the runtime `context` is linked to.
    ///
    /// Contexts that were never bridged have nothing to drain.
    pub fn tick_context(&self, context: &ScriptContext) -> Result<usize, BridgeError> {
        match Environment::current(context) {
            Some(env) => env.tick(),
            None => Ok(0),
        }
    }

    /// Drain the secondary runtime's pending ticks, if it is running.
    pub fn tick(&self) -> Result<usize, BridgeError> {
        match self.bootstrapper.environment() {
            Some(env) => env.tick(),
            None => Ok(0),
        }
    }
}

fn bridge_context(
    host: &ScriptHost,
    settings: &BridgeSettings,
    counters: &mut Counter,
    env: &Rc<Environment>,
    context: &ScriptContext,
) -> Result<(), BridgeError> {
    let secondary = env.context();
    env.link(context);
    if let Some(token) = secondary.security_token() {
        context.set_security_token(token);
    }

    let namespace = match context.locate_or_create_object(&settings.namespace) {
        Ok((namespace, created)) => {
            counters.increment(
                if created {
                    "bridge.namespace_created"
                } else {
                    "bridge.namespace_reused"
                },
                1,
            );
            namespace
        }
        Err(ScriptError::NotAnObject { .. }) => {
            warn!(
                context = %context.id(),
                namespace = %settings.namespace,
                "namespace property holds a non-object; leaving the context without it"
            );
            counters.increment("bridge.namespace_occupied", 1);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let report = exporter::export(host, secondary, context, &namespace)?;
    counters.increment("export.symbols", report.exported.len() as u64);
    counters.increment("export.missing", report.missing.len() as u64);
    debug!(
        context = %context.id(),
        exported = ?report.exported,
        missing = ?report.missing,
        "bridged context"
    );
    Ok(())
}
